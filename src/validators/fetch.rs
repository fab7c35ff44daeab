//! Fetch remote safety (spec.md §4.7): validates the target remote exists,
//! honoring a `git remote add <name>` earlier in the same pipeline as
//! having registered that remote for the rest of the pipeline only.

use crate::config::Config;
use crate::gitquery::GitQuery;
use crate::validator::{Category, ValidationContext, ValidationResult, Validator};
use crate::vcs::{parse_git, GitCommand};

pub struct FetchValidator;

impl FetchValidator {
    pub fn new(_config: &Config) -> Self {
        FetchValidator
    }
}

impl Validator for FetchValidator {
    fn name(&self) -> &str {
        "fetch"
    }

    fn category(&self) -> Category {
        Category::Fetch
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
            .any(|g| g.subcommand.as_deref() == Some("fetch"))
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let pipeline = ctx.pipeline.as_ref().expect("applies() checked pipeline");
        let commands: Vec<GitCommand> = pipeline.simple_commands().iter().filter_map(parse_git).collect();

        let fetch = commands
            .iter()
            .find(|g| g.subcommand.as_deref() == Some("fetch"))
            .expect("applies() checked for a fetch subcommand");

        let Some(remote) = fetch.args.iter().find(|a| !a.starts_with('-')).cloned() else {
            return ValidationResult::pass(self.name());
        };

        let pending_remotes: Vec<&str> = commands
            .iter()
            .filter(|g| g.subcommand.as_deref() == Some("remote"))
            .filter(|g| g.args.first().map(String::as_str) == Some("add"))
            .filter_map(|g| g.args.get(1).map(String::as_str))
            .collect();

        if pending_remotes.contains(&remote.as_str()) {
            return ValidationResult::pass(self.name());
        }

        match ctx.git.remotes() {
            Ok(remotes) if !remotes.is_empty() && !remotes.contains(&remote) => {
                ValidationResult::fail_with_ref(
                    self.name(),
                    "GIT-UNKNOWN-REMOTE",
                    format!("`{remote}` is not a configured remote"),
                )
                .with_fix_hint(format!("available remotes: {}", remotes.join(", ")))
            }
            _ => ValidationResult::pass(self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitquery::GitQueryView;
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
    fn fetch_without_remote_arg_passes() {
        let validator = FetchValidator::new(&Config::default());
        let ctx = context("git fetch");
        assert!(validator.validate(&ctx).passed);
    }

    #[test]
    fn remote_added_earlier_in_pipeline_is_treated_as_registered() {
        let validator = FetchValidator::new(&Config::default());
        let ctx = context("git remote add scratch https://example.com/r.git && git fetch scratch");
        let result = validator.validate(&ctx);
        assert!(result.passed);
    }

    #[test]
    fn non_fetch_command_does_not_apply() {
        let validator = FetchValidator::new(&Config::default());
        let ctx = context("git push origin main");
        assert!(!validator.applies(&ctx));
    }
}
