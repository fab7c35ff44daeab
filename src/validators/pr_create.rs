//! PR-create structure checks (spec.md §4.7): title format, required body
//! sections, changelog trailer placement, placeholder detection, and an
//! optional external `markdownlint` pass.

use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use wait_timeout::ChildExt;

use crate::config::Config;
use crate::validator::{Category, ValidationContext, ValidationResult, Validator};
use crate::vcs::parse_gh;

const MARKDOWNLINT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_TITLE_MAX: usize = 72;

static PR_REF_OVERLONG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\d{11,}\b").unwrap());
static CONVENTIONAL_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<type>[a-zA-Z]{1,20})(\([-_a-zA-Z0-9/]{1,60}\))?!?: .{1,300}$").unwrap());
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(n/a|none|tbd|-|…)\s*\.?\s*$").unwrap());
static CHANGELOG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^>\s*Changelog:\s*(?P<value>.+)$").unwrap());

struct Finding {
    reference: &'static str,
    priority: u8,
    blocking: bool,
    message: String,
    fix_hint: Option<String>,
}

pub struct PrCreateValidator {
    title_max: usize,
    markdownlint_disabled_rules: Vec<String>,
    run_markdownlint: bool,
}

impl PrCreateValidator {
    pub fn new(config: &Config) -> Self {
        let cfg = &config.pr_create;
        PrCreateValidator {
            title_max: cfg.title_max.unwrap_or(DEFAULT_TITLE_MAX),
            markdownlint_disabled_rules: cfg.markdownlint_disabled_rules.clone(),
            run_markdownlint: cfg.run_markdownlint.unwrap_or(false),
        }
    }
}

impl Validator for PrCreateValidator {
    fn name(&self) -> &str {
        "pr-create"
    }

    fn category(&self) -> Category {
        Category::PrCreate
    }

    fn is_io_heavy(&self) -> bool {
        true
    }

    fn applies(&self, ctx: &ValidationContext) -> bool {
        let Some(pipeline) = &ctx.pipeline else {
            return false;
        };
        pipeline.simple_commands().iter().filter_map(parse_gh).any(|g| {
            g.command.as_deref() == Some("pr") && g.action.as_deref() == Some("create")
        })
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let pipeline = ctx.pipeline.as_ref().expect("applies() checked pipeline");
        let pr = pipeline
            .simple_commands()
            .iter()
            .filter_map(parse_gh)
            .find(|g| g.command.as_deref() == Some("pr") && g.action.as_deref() == Some("create"))
            .expect("applies() checked for a pr create command");

        let mut findings = Vec::new();

        let title = pr.title().unwrap_or_default();
        check_title(&title, self.title_max, &mut findings);
        check_label_suggestion(&title, &pr.labels(), &mut findings);

        let body = pr.body().unwrap_or_default();
        check_sections(&body, &mut findings);
        check_changelog_placement(&body, &mut findings);
        check_pr_reference(&body, &mut findings);
        check_placeholders(&body, &mut findings);

        if self.run_markdownlint {
            check_markdownlint(&body, &self.markdownlint_disabled_rules, &mut findings);
        }

        compose(self.name(), findings)
    }
}

fn check_title(title: &str, title_max: usize, findings: &mut Vec<Finding>) {
    if title.is_empty() {
        return;
    }
    if title.chars().count() > title_max {
        findings.push(Finding {
            reference: "GIT-PR-TITLE",
            priority: 10,
            blocking: true,
            message: format!("PR title is longer than {title_max} characters"),
            fix_hint: Some(format!("shorten the title to {title_max} characters or fewer")),
        });
        return;
    }
    if !CONVENTIONAL_TITLE_RE.is_match(title) {
        findings.push(Finding {
            reference: "GIT-PR-TITLE",
            priority: 10,
            blocking: true,
            message: "PR title is not a conventional commit style title".to_string(),
            fix_hint: Some("use `type(scope): description`, e.g. `fix(auth): handle expired tokens`".to_string()),
        });
    }
}

/// A `ci(...)`/`docs(...)`/`chore(...)`/`style(...)`-typed title is
/// infrastructure-only; suggest a `ci/skip-*` label so CI doesn't spend a
/// full pipeline run on it unless one's already attached (spec.md §4.7).
const CI_SKIP_TYPES: &[&str] = &["ci", "docs", "chore", "style"];

fn check_label_suggestion(title: &str, labels: &[String], findings: &mut Vec<Finding>) {
    let Some(caps) = CONVENTIONAL_TITLE_RE.captures(title) else {
        return;
    };
    let Some(commit_type) = caps.name("type").map(|m| m.as_str().to_lowercase()) else {
        return;
    };
    if !CI_SKIP_TYPES.contains(&commit_type.as_str()) {
        return;
    }
    if labels.iter().any(|l| l.starts_with("ci/skip")) {
        return;
    }
    findings.push(Finding {
        reference: "GIT-PR-LABEL-SUGGESTION",
        priority: 95,
        blocking: false,
        message: format!("`{commit_type}` PRs are usually tagged with a `ci/skip-{commit_type}` label"),
        fix_hint: Some(format!("add a `ci/skip-{commit_type}` label, or explain why CI should still run")),
    });
}

fn check_sections(body: &str, findings: &mut Vec<Finding>) {
    let mut missing = Vec::new();
    if !body.contains("## Motivation") {
        missing.push("## Motivation");
    }
    if !body.contains("## Implementation information") {
        missing.push("## Implementation information");
    }
    if !missing.is_empty() {
        findings.push(Finding {
            reference: "GIT-PR-BODY-SECTION",
            priority: 20,
            blocking: true,
            message: format!("PR body is missing required section(s): {}", missing.join(", ")),
            fix_hint: Some(format!("add a `{}` section", missing.join("` and `"))),
        });
    }
    if !body.contains("## Supporting documentation") {
        findings.push(Finding {
            reference: "GIT-PR-BODY-SUPPORTING",
            priority: 80,
            blocking: false,
            message: "PR body has no `## Supporting documentation` section".to_string(),
            fix_hint: Some("add a `## Supporting documentation` section, even if empty".to_string()),
        });
    }
}

/// A `> Changelog: skip` or `> Changelog: <conventional-commit>` trailer
/// must appear after `## Motivation`, never before it.
fn check_changelog_placement(body: &str, findings: &mut Vec<Finding>) {
    let Some(motivation_pos) = body.find("## Motivation") else {
        return;
    };
    let Some(caps) = CHANGELOG_RE.captures(body) else {
        return;
    };
    let changelog_pos = caps.get(0).unwrap().start();
    let value = caps.name("value").map(|m| m.as_str().trim()).unwrap_or_default();

    if changelog_pos < motivation_pos {
        findings.push(Finding {
            reference: "GIT-CHANGELOG-PLACEMENT",
            priority: 25,
            blocking: true,
            message: "Changelog trailer must appear after the Motivation section".to_string(),
            fix_hint: Some("move `> Changelog: ...` below `## Motivation`".to_string()),
        });
        return;
    }

    let is_skip = value.eq_ignore_ascii_case("skip");
    let is_conventional = CONVENTIONAL_TITLE_RE.is_match(value);
    if !is_skip && !is_conventional {
        findings.push(Finding {
            reference: "GIT-CHANGELOG-PLACEMENT",
            priority: 25,
            blocking: true,
            message: "Changelog trailer must be `skip` or a conventional-commit line".to_string(),
            fix_hint: Some("use `> Changelog: skip` or `> Changelog: type(scope): description`".to_string()),
        });
    }
}

fn check_pr_reference(body: &str, findings: &mut Vec<Finding>) {
    if PR_REF_OVERLONG_RE.is_match(body) {
        findings.push(Finding {
            reference: "GIT-PR-REF",
            priority: 30,
            blocking: true,
            message: "PR/issue reference has an unreasonable number of digits".to_string(),
            fix_hint: Some("double check the issue/PR number".to_string()),
        });
    }
}

/// Only the `## Supporting documentation` section (if present) is checked
/// for placeholder values — a bare `N/A` is fine everywhere else in a PR
/// body, it's only suspicious as the entire content of that section.
fn check_placeholders(body: &str, findings: &mut Vec<Finding>) {
    let Some(start) = body.find("## Supporting documentation") else {
        return;
    };
    let section = &body[start + "## Supporting documentation".len()..];
    let section_body = section
        .split("\n##")
        .next()
        .unwrap_or(section)
        .trim();

    if section_body.is_empty() {
        return;
    }

    if PLACEHOLDER_RE.is_match(section_body) {
        findings.push(Finding {
            reference: "GIT-PR-PLACEHOLDER",
            priority: 40,
            blocking: true,
            message: "Supporting documentation section contains only a placeholder value".to_string(),
            fix_hint: Some("link the actual supporting documentation, or remove the section".to_string()),
        });
    }
}

fn check_markdownlint(body: &str, disabled_rules: &[String], findings: &mut Vec<Finding>) {
    let Ok(markdownlint_path) = which::which("markdownlint") else {
        return;
    };

    let mut command = Command::new(markdownlint_path);
    if !disabled_rules.is_empty() {
        command.arg("--disable").args(disabled_rules);
    }
    command.arg("--stdin");
    command.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::null());

    let Ok(mut child) = command.spawn() else {
        return;
    };

    if let Some(mut stdin) = child.stdin.take() {
        use std::io::Write;
        let _ = stdin.write_all(body.as_bytes());
    }

    match child.wait_timeout(MARKDOWNLINT_TIMEOUT) {
        Ok(Some(status)) if !status.success() => {
            findings.push(Finding {
                reference: "GIT-PR-MARKDOWNLINT",
                priority: 50,
                blocking: false,
                message: "markdownlint reported issues with the PR body".to_string(),
                fix_hint: Some("run `markdownlint` locally against the PR body to see details".to_string()),
            });
        }
        Ok(Some(_)) => {}
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
        }
        Err(_) => {}
    }
}

fn compose(validator_name: &str, mut findings: Vec<Finding>) -> ValidationResult {
    if findings.is_empty() {
        return ValidationResult::pass(validator_name);
    }
    findings.sort_by_key(|f| f.priority);

    let blocking_index = findings.iter().position(|f| f.blocking);

    match blocking_index {
        Some(idx) => {
            let primary = &findings[idx];
            let mut result =
                ValidationResult::fail_with_ref(validator_name, primary.reference, primary.message.clone());
            if let Some(hint) = &primary.fix_hint {
                result = result.with_fix_hint(hint.clone());
            }
            for (i, extra) in findings.iter().enumerate() {
                if i != idx {
                    result = result.with_context_line(format!("{}: {}", extra.reference, extra.message));
                }
            }
            result
        }
        None => {
            let primary = &findings[0];
            let mut result = ValidationResult::warn(validator_name, primary.message.clone());
            result = result.with_reference(primary.reference);
            for extra in &findings[1..] {
                result = result.with_context_line(format!("{}: {}", extra.reference, extra.message));
            }
            result
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
    fn well_formed_pr_passes() {
        let validator = PrCreateValidator::new(&Config::default());
        let body = "## Motivation\n\nBecause.\n\n## Implementation information\n\nDid it.\n\n## Supporting documentation\n\nhttps://example.com\n\n> Changelog: skip";
        let ctx = context(&format!(
            r#"gh pr create --title "feat(api): add endpoint" --body "{body}""#
        ));
        let result = validator.validate(&ctx);
        assert!(result.passed || !result.should_block);
    }

    #[test]
    fn bad_title_and_missing_section_reports_title_as_primary() {
        let validator = PrCreateValidator::new(&Config::default());
        let ctx = context(r#"gh pr create --title "Add endpoint" --body "no sections here""#);
        let result = validator.validate(&ctx);
        assert!(result.should_block);
        assert_eq!(result.reference.as_deref(), Some("GIT-PR-TITLE"));
        assert!(result
            .context_lines
            .iter()
            .any(|l| l.starts_with("GIT-PR-BODY-SECTION")));
    }

    #[test]
    fn changelog_before_motivation_is_blocked() {
        let validator = PrCreateValidator::new(&Config::default());
        let body = "> Changelog: skip\n\n## Motivation\n\nBecause.\n\n## Implementation information\n\nDid it.";
        let ctx = context(&format!(
            r#"gh pr create --title "feat(api): add endpoint" --body "{body}""#
        ));
        let result = validator.validate(&ctx);
        let refs: Vec<_> = std::iter::once(result.reference.clone())
            .chain(result.context_lines.iter().map(|l| Some(l.clone())))
            .collect();
        assert!(refs.iter().any(|r| r.as_deref() == Some("GIT-CHANGELOG-PLACEMENT")));
    }

    #[test]
    fn chore_title_without_label_suggests_ci_skip() {
        let validator = PrCreateValidator::new(&Config::default());
        let body = "## Motivation\n\nBecause.\n\n## Implementation information\n\nDid it.\n\n## Supporting documentation\n\nhttps://example.com\n\n> Changelog: skip";
        let ctx = context(&format!(
            r#"gh pr create --title "chore(deps): bump lockfile" --body "{body}""#
        ));
        let result = validator.validate(&ctx);
        let refs: Vec<_> = std::iter::once(result.reference.clone())
            .chain(result.context_lines.iter().map(|l| Some(l.clone())))
            .collect();
        assert!(refs.iter().any(|r| r.as_deref() == Some("GIT-PR-LABEL-SUGGESTION")));
    }

    #[test]
    fn chore_title_with_ci_skip_label_present_has_no_suggestion() {
        let validator = PrCreateValidator::new(&Config::default());
        let body = "## Motivation\n\nBecause.\n\n## Implementation information\n\nDid it.\n\n## Supporting documentation\n\nhttps://example.com\n\n> Changelog: skip";
        let ctx = context(&format!(
            r#"gh pr create --title "chore(deps): bump lockfile" --label ci/skip-chore --body "{body}""#
        ));
        let result = validator.validate(&ctx);
        let refs: Vec<_> = std::iter::once(result.reference.clone())
            .chain(result.context_lines.iter().map(|l| Some(l.clone())))
            .collect();
        assert!(!refs.iter().any(|r| r.as_deref() == Some("GIT-PR-LABEL-SUGGESTION")));
    }

    #[test]
    fn non_pr_create_command_does_not_apply() {
        let validator = PrCreateValidator::new(&Config::default());
        let ctx = context("gh pr list");
        assert!(!validator.applies(&ctx));
    }
}
