//! Event Parser — decodes the JSON event envelope the host AI assistant
//! writes to stdin into a normalized [`HookContext`].

use serde::Deserialize;
use strum::{Display, EnumString};

/// What point in the tool-call lifecycle this invocation represents.
///
/// Only `PreToolUse` is validated; `PostToolUse` and `Notification` pass
/// through untouched (see [`HookContext::requires_validation`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum EventKind {
    PreToolUse,
    PostToolUse,
    Notification,
}

/// The tool the assistant is about to invoke (or just invoked).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ToolKind {
    Shell,
    Write,
    Edit,
    Read,
    #[strum(default)]
    Unknown,
}

/// Tool-specific payload. A shell tool carries the raw command string; file
/// tools carry a path and, for writes, the new content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolPayload {
    Shell {
        command: String,
    },
    File {
        path: String,
        content: Option<String>,
    },
    Unknown,
}

/// Normalized view of one hook invocation. Everything downstream (shell
/// parser, rule engine, validators) operates on this, never on the raw JSON.
#[derive(Debug, Clone)]
pub struct HookContext {
    pub event_kind: EventKind,
    pub tool_kind: ToolKind,
    pub payload: ToolPayload,
    pub session_id: Option<String>,
    pub tool_use_id: Option<String>,
    pub transcript_path: Option<String>,
    pub cwd: Option<String>,
    pub permission_mode: Option<String>,
}

impl HookContext {
    /// Per spec.md §3: notification events never run validation; the caller
    /// should emit a bell and exit 0.
    pub fn requires_validation(&self) -> bool {
        self.event_kind == EventKind::PreToolUse
    }

    /// The raw shell command string, if this is a shell-tool invocation.
    pub fn shell_command(&self) -> Option<&str> {
        match &self.payload {
            ToolPayload::Shell { command } => Some(command),
            _ => None,
        }
    }
}

/// Raw wire shape of the event envelope (spec.md §6). Field names match the
/// JSON keys the host emits; `tool_input` is tool-shaped and decoded
/// separately based on `tool_name`.
#[derive(Debug, Deserialize)]
struct RawEvent {
    hook_event_name: Option<String>,
    tool_name: Option<String>,
    #[serde(default)]
    tool_input: serde_json::Value,
    session_id: Option<String>,
    tool_use_id: Option<String>,
    transcript_path: Option<String>,
    cwd: Option<String>,
    permission_mode: Option<String>,
}

/// Parse a raw JSON event. `hook_type_flag` is the `--hook-type` CLI
/// override, which per DESIGN.md takes precedence over `hook_event_name`
/// when both are present.
pub fn parse_event(json: &str, hook_type_flag: Option<&str>) -> Result<HookContext, String> {
    let raw: RawEvent = serde_json::from_str(json).map_err(|e| e.to_string())?;

    let event_kind_str = hook_type_flag
        .map(str::to_string)
        .or(raw.hook_event_name)
        .ok_or_else(|| "missing hook_event_name".to_string())?;
    let event_kind = parse_event_kind(&event_kind_str)
        .ok_or_else(|| format!("unrecognized hook_event_name: {event_kind_str}"))?;

    let tool_name = raw.tool_name.unwrap_or_default();
    let tool_kind = classify_tool(&tool_name);

    let payload = match tool_kind {
        ToolKind::Shell => {
            let command = raw
                .tool_input
                .get("command")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            ToolPayload::Shell { command }
        }
        ToolKind::Write | ToolKind::Edit | ToolKind::Read => {
            let path = raw
                .tool_input
                .get("file_path")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let content = raw
                .tool_input
                .get("content")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            ToolPayload::File { path, content }
        }
        ToolKind::Unknown => ToolPayload::Unknown,
    };

    Ok(HookContext {
        event_kind,
        tool_kind,
        payload,
        session_id: raw.session_id,
        tool_use_id: raw.tool_use_id,
        transcript_path: raw.transcript_path,
        cwd: raw.cwd,
        permission_mode: raw.permission_mode,
    })
}

fn parse_event_kind(raw: &str) -> Option<EventKind> {
    match raw {
        "PreToolUse" | "pre-tool-use" | "pre_tool_use" => Some(EventKind::PreToolUse),
        "PostToolUse" | "post-tool-use" | "post_tool_use" => Some(EventKind::PostToolUse),
        "Notification" | "notification" => Some(EventKind::Notification),
        _ => None,
    }
}

/// Unknown tool names become `ToolKind::Unknown` and pass through (spec.md §6).
fn classify_tool(name: &str) -> ToolKind {
    match name {
        "Bash" | "Shell" | "shell" | "bash" => ToolKind::Shell,
        "Write" | "write" => ToolKind::Write,
        "Edit" | "edit" => ToolKind::Edit,
        "Read" | "read" => ToolKind::Read,
        _ => ToolKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_shell_pre_tool_use() {
        let json = r#"{
            "hook_event_name": "PreToolUse",
            "tool_name": "Bash",
            "tool_input": {"command": "git status"},
            "session_id": "abc"
        }"#;
        let ctx = parse_event(json, None).unwrap();
        assert_eq!(ctx.event_kind, EventKind::PreToolUse);
        assert_eq!(ctx.tool_kind, ToolKind::Shell);
        assert_eq!(ctx.shell_command(), Some("git status"));
        assert!(ctx.requires_validation());
    }

    #[test]
    fn notification_skips_validation() {
        let json = r#"{"hook_event_name": "Notification", "tool_name": "Bash", "tool_input": {}}"#;
        let ctx = parse_event(json, None).unwrap();
        assert!(!ctx.requires_validation());
    }

    #[test]
    fn unknown_tool_passes_through() {
        let json = r#"{"hook_event_name": "PreToolUse", "tool_name": "WebFetch", "tool_input": {}}"#;
        let ctx = parse_event(json, None).unwrap();
        assert_eq!(ctx.tool_kind, ToolKind::Unknown);
    }

    #[test]
    fn cli_flag_overrides_json_event_kind() {
        let json = r#"{"hook_event_name": "Notification", "tool_name": "Bash", "tool_input": {"command": "ls"}}"#;
        let ctx = parse_event(json, Some("pre-tool-use")).unwrap();
        assert_eq!(ctx.event_kind, EventKind::PreToolUse);
    }

    #[test]
    fn missing_event_kind_is_an_error() {
        let json = r#"{"tool_name": "Bash", "tool_input": {}}"#;
        assert!(parse_event(json, None).is_err());
    }

    #[test]
    fn file_write_payload_captures_content() {
        let json = r#"{
            "hook_event_name": "PreToolUse",
            "tool_name": "Write",
            "tool_input": {"file_path": "/tmp/x.txt", "content": "hi"}
        }"#;
        let ctx = parse_event(json, None).unwrap();
        match ctx.payload {
            ToolPayload::File { path, content } => {
                assert_eq!(path, "/tmp/x.txt");
                assert_eq!(content.as_deref(), Some("hi"));
            }
            _ => panic!("expected file payload"),
        }
    }
}
