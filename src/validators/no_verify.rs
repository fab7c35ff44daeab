//! Sibling of [`crate::validators::commit_message`] (spec.md §4.6's
//! preflight list, item 2): blocks `--no-verify`/`-n` on `git commit`
//! independently so it can be toggled or documented without touching the
//! much larger commit-message rule table.

use crate::config::Config;
use crate::validator::{Category, ValidationContext, ValidationResult, Validator};
use crate::vcs::parse_git;

pub struct NoVerifyValidator;

impl NoVerifyValidator {
    pub fn new(_config: &Config) -> Self {
        NoVerifyValidator
    }
}

impl Validator for NoVerifyValidator {
    fn name(&self) -> &str {
        "no-verify"
    }

    fn category(&self) -> Category {
        Category::CommitMessage
    }

    fn applies(&self, ctx: &ValidationContext) -> bool {
        let Some(pipeline) = &ctx.pipeline else {
            return false;
        };
        pipeline
            .simple_commands()
            .iter()
            .filter_map(parse_git)
            .any(|g| g.subcommand.as_deref() == Some("commit"))
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let pipeline = ctx.pipeline.as_ref().expect("applies() checked pipeline");
        let bypasses_hooks = pipeline
            .simple_commands()
            .iter()
            .filter_map(parse_git)
            .filter(|g| g.subcommand.as_deref() == Some("commit"))
            .any(|g| g.has_flag("--no-verify") || g.has_flag("-n"));

        if bypasses_hooks {
            ValidationResult::fail_with_ref(
                self.name(),
                "GIT-NO-VERIFY",
                "commit bypasses hooks with --no-verify",
            )
            .with_fix_hint("remove --no-verify and let the repository's hooks run")
        } else {
            ValidationResult::pass(self.name())
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
    fn no_verify_flag_is_blocked() {
        let validator = NoVerifyValidator::new(&Config::default());
        let ctx = context(r#"git commit --no-verify -m "feat: add thing""#);
        let result = validator.validate(&ctx);
        assert!(result.should_block);
        assert_eq!(result.reference.as_deref(), Some("GIT-NO-VERIFY"));
    }

    #[test]
    fn short_flag_is_also_blocked() {
        let validator = NoVerifyValidator::new(&Config::default());
        let ctx = context(r#"git commit -n -m "feat: add thing""#);
        let result = validator.validate(&ctx);
        assert!(result.should_block);
    }

    #[test]
    fn normal_commit_passes() {
        let validator = NoVerifyValidator::new(&Config::default());
        let ctx = context(r#"git commit -sS -m "feat: add thing""#);
        let result = validator.validate(&ctx);
        assert!(result.passed);
    }

    #[test]
    fn non_commit_command_does_not_apply() {
        let validator = NoVerifyValidator::new(&Config::default());
        let ctx = context("git push origin main");
        assert!(!validator.applies(&ctx));
    }
}
