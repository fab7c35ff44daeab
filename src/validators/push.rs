//! Push remote safety (spec.md §4.7): blocks pushes to a configured
//! denylist and flags pushes to a remote that doesn't exist.

use crate::config::Config;
use crate::gitquery::{resolve_working_directory, GitQuery, GitQueryView};
use crate::validator::{Category, ValidationContext, ValidationResult, Validator};
use crate::vcs::{parse_git, GitCommand};

pub struct PushValidator {
    blocked_remotes: Vec<String>,
    allowed_remote_priority: Vec<String>,
}

impl PushValidator {
    pub fn new(config: &Config) -> Self {
        PushValidator {
            blocked_remotes: config.push.blocked_remotes.clone(),
            allowed_remote_priority: config.push.allowed_remote_priority.clone(),
        }
    }
}

impl Validator for PushValidator {
    fn name(&self) -> &str {
        "push"
    }

    fn category(&self) -> Category {
        Category::Push
    }

    fn is_io_heavy(&self) -> bool {
        true
    }

    fn applies(&self, ctx: &ValidationContext) -> bool {
        let Some(pipeline) = &ctx.pipeline else {
            return false;
        };
        pipeline
            .simple_commands()
            .iter()
            .filter_map(parse_git)
            .any(|g| g.subcommand.as_deref() == Some("push"))
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let pipeline = ctx.pipeline.as_ref().expect("applies() checked pipeline");
        let push = pipeline
            .simple_commands()
            .iter()
            .filter_map(parse_git)
            .find(|g| g.subcommand.as_deref() == Some("push"))
            .expect("applies() checked for a push subcommand");

        let view = view_for(&push, ctx);
        let remote = resolve_remote(&push, view.as_ref());

        if self.blocked_remotes.iter().any(|b| b == &remote) {
            let mut suggestion = self
                .allowed_remote_priority
                .first()
                .cloned()
                .unwrap_or_else(|| "a non-blocked remote".to_string());
            if let Some(preferred) = self
                .allowed_remote_priority
                .iter()
                .find(|r| !self.blocked_remotes.contains(r))
            {
                suggestion = preferred.clone();
            }
            return ValidationResult::fail_with_ref(
                self.name(),
                "GIT-BLOCKED-REMOTE",
                format!("pushing to `{remote}` is blocked by configuration"),
            )
            .with_fix_hint(format!("push to `{suggestion}` instead"));
        }

        if let Ok(remotes) = view.remotes() {
            if !remotes.is_empty() && !remotes.contains(&remote) {
                return ValidationResult::fail_with_ref(
                    self.name(),
                    "GIT-UNKNOWN-REMOTE",
                    format!("`{remote}` is not a configured remote"),
                )
                .with_fix_hint(format!("available remotes: {}", remotes.join(", ")));
            }
        }

        ValidationResult::pass(self.name())
    }
}

fn view_for(push: &GitCommand, ctx: &ValidationContext) -> std::sync::Arc<GitQueryView> {
    match resolve_working_directory(None, push.working_directory_override().as_deref()) {
        Some(dir) => GitQueryView::for_directory(Some(&dir)),
        None => ctx.git.clone(),
    }
}

/// Remote precedence: explicit positional argument, else the current
/// branch's tracking remote, else `origin`.
fn resolve_remote(push: &GitCommand, view: &GitQueryView) -> String {
    let positional = push
        .args
        .iter()
        .find(|a| !a.starts_with('-'))
        .cloned();
    if let Some(remote) = positional {
        return remote;
    }
    if let Ok(branch) = view.current_branch() {
        if let Ok(Some(upstream)) = view.branch_tracking(&branch) {
            if let Some((remote, _)) = upstream.split_once('/') {
                return remote.to_string();
            }
        }
    }
    "origin".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::{EventKind, HookContext, ToolKind, ToolPayload};
    use crate::shell::parse_pipeline;
    use std::sync::Arc;

    fn context(command: &str) -> ValidationContext {
        ValidationContext {
            hook: Arc::new(HookContext {
                event_kind: EventKind::PreToolUse,
                tool_kind: ToolKind::Shell,
                payload: ToolPayload::Shell {
                    command: command.to_string(),
                },
                session_id: None,
                tool_use_id: None,
                transcript_path: None,
                cwd: None,
                permission_mode: None,
            }),
            pipeline: Some(Arc::new(parse_pipeline(command).unwrap())),
            git: Arc::new(GitQueryView::unavailable("no repository in test")),
        }
    }

    #[test]
    fn blocked_remote_is_blocked_with_suggestion() {
        let mut config = Config::default();
        config.push.blocked_remotes = vec!["origin".to_string()];
        config.push.allowed_remote_priority = vec!["upstream".to_string()];
        let validator = PushValidator::new(&config);
        let ctx = context("git push origin feature");
        let result = validator.validate(&ctx);
        assert!(result.should_block);
        assert_eq!(result.reference.as_deref(), Some("GIT-BLOCKED-REMOTE"));
        assert!(result.fix_hint.unwrap().contains("upstream"));
    }

    #[test]
    fn unblocked_remote_with_unknown_view_passes() {
        let validator = PushValidator::new(&Config::default());
        let ctx = context("git push origin feature");
        let result = validator.validate(&ctx);
        assert!(result.passed);
    }

    #[test]
    fn non_push_command_does_not_apply() {
        let validator = PushValidator::new(&Config::default());
        let ctx = context("git pull");
        assert!(!validator.applies(&ctx));
    }

    #[test]
    fn defaults_to_origin_when_no_remote_given() {
        let validator = PushValidator::new(&Config::default());
        let ctx = context("git push");
        let result = validator.validate(&ctx);
        assert!(result.passed);
    }
}
