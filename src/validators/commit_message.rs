//! The commit-message validator (spec.md §4.6): the largest single rule
//! table in the crate. Every reference code below corresponds to one
//! documented failure mode; `validate()` composes every triggered one into
//! a single [`ValidationResult`], with the primary message chosen by a
//! fixed fix-priority order so the user sees the most actionable problem
//! first.
//!
//! `--no-verify` is deliberately NOT checked here: it's owned by
//! [`crate::validators::no_verify::NoVerifyValidator`], a sibling that
//! shares the same command parse (spec.md §4.6's preflight list, item 2).

use std::sync::LazyLock;

use regex::Regex;

use crate::commit::{parse_commit_message, ParsedCommit, SCOPE_ONLY_RE};
use crate::config::{Config, TitleStyle};
use crate::gitquery::GitQuery;
use crate::validator::{Category, ValidationContext, ValidationResult, Validator};
use crate::vcs::{parse_git, GitCommand};

/// An overlong PR/issue reference like `#111111111111`: 11+ consecutive
/// digits after `#` is itself the GIT-PR-REF violation (a well-formed
/// reference is capped at 10 digits, spec.md §8's boundary case), and the
/// bounded quantifier keeps matching linear even on pathological input
/// (spec.md §4.6's ReDoS hardening requirement).
static PR_REF_OVERLONG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\d{11,}\b").unwrap());

const DEFAULT_CONVENTIONAL_TYPES: &[&str] = &[
    "feat", "fix", "chore", "docs", "refactor", "test", "perf", "build", "ci", "style", "revert",
];

const DEFAULT_TITLE_MAX: usize = 50;
const DEFAULT_BODY_MAX: usize = 72;
const DEFAULT_BODY_TOLERANCE: usize = 5;

/// How many recent commit subjects `auto` style samples, and the majority
/// threshold (over half, with a minimum absolute count so two out of three
/// scope-only titles in a brand-new repo don't flip the whole convention).
const AUTO_SAMPLE_SIZE: usize = 20;
const AUTO_MIN_MAJORITY: usize = 3;

/// Owns the slice of [`Config`] it needs rather than reaching into
/// `ValidationContext` for it — the registry builds one instance per
/// hook invocation with the resolved config baked in.
pub struct CommitMessageValidator {
    title_style: TitleStyle,
    title_max: usize,
    allow_unlimited_revert_title: bool,
    valid_types: Vec<String>,
    require_scope: bool,
    custom_pattern: Option<Regex>,
    body_max: usize,
    body_tolerance: usize,
    forbidden_patterns: Vec<String>,
    expected_signoff: Option<String>,
    allow_claude_attribution: Option<bool>,
}

impl CommitMessageValidator {
    pub fn new(config: &Config) -> Self {
        let cfg = &config.commit_message;
        let custom_pattern = cfg
            .custom_pattern
            .as_deref()
            .and_then(|pattern| Regex::new(pattern).ok());

        CommitMessageValidator {
            title_style: cfg.title_style,
            title_max: cfg.title_max.unwrap_or(DEFAULT_TITLE_MAX),
            allow_unlimited_revert_title: cfg.allow_unlimited_revert_title.unwrap_or(true),
            valid_types: cfg.valid_types.clone(),
            require_scope: cfg.require_scope.unwrap_or(false),
            custom_pattern,
            body_max: cfg.body_max.unwrap_or(DEFAULT_BODY_MAX),
            body_tolerance: cfg.body_tolerance.unwrap_or(DEFAULT_BODY_TOLERANCE),
            forbidden_patterns: cfg.forbidden_patterns.clone(),
            expected_signoff: cfg.expected_signoff.clone(),
            allow_claude_attribution: cfg.allow_claude_attribution,
        }
    }

    fn conventional_types(&self) -> Vec<&str> {
        if self.valid_types.is_empty() {
            DEFAULT_CONVENTIONAL_TYPES.to_vec()
        } else {
            self.valid_types.iter().map(String::as_str).collect()
        }
    }

    /// Resolves `auto` into a concrete style for this invocation by
    /// majority-sampling recent commit titles; never cached across
    /// invocations (spec.md §9 Open Question). Any other style passes
    /// through unchanged.
    fn resolve_title_style(&self, ctx: &ValidationContext) -> TitleStyle {
        if self.title_style != TitleStyle::Auto {
            return self.title_style;
        }
        let Ok(titles) = ctx.git.recent_commit_titles(AUTO_SAMPLE_SIZE) else {
            return TitleStyle::Conventional;
        };
        if titles.is_empty() {
            return TitleStyle::Conventional;
        }
        let scope_only_count = titles
            .iter()
            .filter(|t| SCOPE_ONLY_RE.is_match(t))
            .count();
        let majority = scope_only_count * 2 > titles.len();
        if majority && scope_only_count >= AUTO_MIN_MAJORITY {
            TitleStyle::ScopeOnly
        } else {
            TitleStyle::Conventional
        }
    }
}

impl Validator for CommitMessageValidator {
    fn name(&self) -> &str {
        "commit-message"
    }

    fn category(&self) -> Category {
        Category::CommitMessage
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
            .filter_map(|c| parse_git(c))
            .any(|g| g.subcommand.as_deref() == Some("commit"))
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let pipeline = ctx.pipeline.as_ref().expect("applies() checked pipeline");
        let has_git_add = pipeline
            .simple_commands()
            .iter()
            .filter_map(|c| parse_git(c))
            .any(|g| g.subcommand.as_deref() == Some("add"));

        let commit = pipeline
            .simple_commands()
            .iter()
            .filter_map(|c| parse_git(c))
            .find(|g| g.subcommand.as_deref() == Some("commit"))
            .expect("applies() checked for a commit subcommand");

        let mut findings: Vec<Finding> = Vec::new();
        let mut commit_preview: Option<String> = None;

        check_flags(&commit, &mut findings);
        check_staged(&commit, has_git_add, ctx, &mut findings);

        match commit.extract_message() {
            Ok(Some(message)) => {
                let parsed = parse_commit_message(&message);
                commit_preview = Some(message.clone());
                let style = self.resolve_title_style(ctx);
                check_title(
                    &parsed,
                    style,
                    self.title_max,
                    self.allow_unlimited_revert_title,
                    self.require_scope,
                    &self.custom_pattern,
                    &self.conventional_types(),
                    &mut findings,
                );
                check_feat_ci(&parsed, &mut findings);
                check_body(&parsed, self.body_max, self.body_tolerance, &mut findings);
                check_pr_reference(&message, &mut findings);
                check_claude_attribution(&parsed, self.allow_claude_attribution, &mut findings);
                check_forbidden_patterns(&message, &self.forbidden_patterns, &mut findings);
                check_signoff_mismatch(&parsed, self.expected_signoff.as_deref(), &mut findings);
            }
            Ok(None) => {
                // No resolvable message source (e.g. `-F -`, or `--amend`
                // with no new message) — nothing to check structurally.
            }
            Err(_) => {
                findings.push(Finding {
                    reference: "GIT-BAD-BODY",
                    priority: 90,
                    message: "could not read the commit message source (e.g. a missing -F file)"
                        .to_string(),
                    fix_hint: Some("verify the file passed to -F/--file exists and is readable".to_string()),
                });
            }
        }

        compose(self.name(), findings, commit_preview)
    }
}

struct Finding {
    reference: &'static str,
    priority: u8,
    message: String,
    fix_hint: Option<String>,
}

fn check_flags(commit: &GitCommand, findings: &mut Vec<Finding>) {
    let has_signoff = commit.has_flag("--signoff") || commit.has_flag("-s");
    let has_gpg_sign = commit.has_flag("--gpg-sign") || commit.has_flag("-S");
    let mut missing = Vec::new();
    if !has_signoff {
        missing.push("--signoff");
    }
    if !has_gpg_sign {
        missing.push("--gpg-sign");
    }
    if !missing.is_empty() {
        findings.push(Finding {
            reference: "GIT-MISSING-FLAGS",
            priority: 10,
            message: format!("commit is missing required flag(s): {}", missing.join(", ")),
            fix_hint: Some(format!("add {} to the commit command", missing.join(" and "))),
        });
    }
}

fn check_staged(commit: &GitCommand, has_git_add: bool, ctx: &ValidationContext, findings: &mut Vec<Finding>) {
    if has_git_add || commit.has_flag("-a") || commit.has_flag("--all") || commit.has_flag("--amend") {
        return;
    }
    if let Ok(staged) = ctx.git.staged_files() {
        if staged.is_empty() {
            findings.push(Finding {
                reference: "GIT-NO-STAGED",
                priority: 20,
                message: "no files are staged for this commit".to_string(),
                fix_hint: Some("run `git add` first, or commit with -a".to_string()),
            });
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn check_title(
    parsed: &ParsedCommit,
    style: TitleStyle,
    title_max: usize,
    allow_unlimited_revert_title: bool,
    require_scope: bool,
    custom_pattern: &Option<Regex>,
    conventional_types: &[&str],
    findings: &mut Vec<Finding>,
) {
    let skip_length_check = parsed.is_revert && allow_unlimited_revert_title;

    if !skip_length_check && parsed.title_len_chars() > title_max {
        findings.push(Finding {
            reference: "GIT-BAD-TITLE",
            priority: 35,
            message: format!(
                "title is {} characters, longer than the {} character limit",
                parsed.title_len_chars(),
                title_max
            ),
            fix_hint: Some(format!("shorten the title to {title_max} characters or fewer")),
        });
    }

    if parsed.is_revert {
        return;
    }

    match style {
        TitleStyle::None => {}
        TitleStyle::Custom => {
            if let Some(pattern) = custom_pattern {
                if !pattern.is_match(&parsed.title) {
                    findings.push(Finding {
                        reference: "GIT-CONVENTIONAL-COMMIT",
                        priority: 30,
                        message: "title does not match the configured custom pattern".to_string(),
                        fix_hint: None,
                    });
                }
            }
        }
        TitleStyle::Conventional => {
            if !parsed.valid {
                findings.push(Finding {
                    reference: "GIT-CONVENTIONAL-COMMIT",
                    priority: 30,
                    message: parsed
                        .parse_error
                        .clone()
                        .unwrap_or_else(|| "title is not a conventional commit".to_string()),
                    fix_hint: Some("use `type(scope): description`, e.g. `fix(auth): handle expired tokens`".to_string()),
                });
            } else if let Some(t) = &parsed.commit_type {
                if !conventional_types.contains(&t.as_str()) {
                    findings.push(Finding {
                        reference: "GIT-CONVENTIONAL-COMMIT",
                        priority: 30,
                        message: format!("`{t}` is not a recognized conventional commit type"),
                        fix_hint: Some(format!("use one of: {}", conventional_types.join(", "))),
                    });
                } else if require_scope && parsed.scope.is_none() {
                    findings.push(Finding {
                        reference: "GIT-CONVENTIONAL-COMMIT",
                        priority: 30,
                        message: "title is missing a required scope".to_string(),
                        fix_hint: Some("use `type(scope): description`".to_string()),
                    });
                }
            }
        }
        TitleStyle::ScopeOnly => {
            if !SCOPE_ONLY_RE.is_match(&parsed.title) {
                findings.push(Finding {
                    reference: "GIT-CONVENTIONAL-COMMIT",
                    priority: 30,
                    message: "title does not match `scope: description`".to_string(),
                    fix_hint: Some("use `scope: description`, e.g. `auth: handle expired tokens`".to_string()),
                });
            }
        }
        TitleStyle::Auto => unreachable!("resolve_title_style never returns Auto"),
    }
}

/// `feat`/`fix` paired with an infrastructure-only scope (`ci`, `test`,
/// `docs`, `build`) misrepresents tooling work as a user-facing change.
fn check_feat_ci(parsed: &ParsedCommit, findings: &mut Vec<Finding>) {
    const INFRA_SCOPES: &[&str] = &["ci", "test", "docs", "build"];
    let is_feat_or_fix = matches!(parsed.commit_type.as_deref(), Some("feat") | Some("fix"));
    let is_infra_scope = parsed
        .scope
        .as_deref()
        .is_some_and(|s| INFRA_SCOPES.contains(&s));

    if is_feat_or_fix && is_infra_scope {
        let commit_type = parsed.commit_type.as_deref().unwrap_or_default();
        let scope = parsed.scope.as_deref().unwrap_or_default();
        findings.push(Finding {
            reference: "GIT-FEAT-CI",
            priority: 15,
            message: format!(
                "`{commit_type}({scope})` is not meaningful — {scope} changes aren't user-facing"
            ),
            fix_hint: Some(format!("use `{scope}:` or `chore({scope}):` instead")),
        });
    }
}

fn check_body(parsed: &ParsedCommit, body_max: usize, body_tolerance: usize, findings: &mut Vec<Finding>) {
    if parsed.body.is_empty() {
        return;
    }

    let limit = body_max + body_tolerance;
    for line in parsed.body.lines() {
        if line.contains("://") {
            continue;
        }
        let len = line.chars().count();
        if len > limit {
            findings.push(Finding {
                reference: "GIT-BAD-BODY",
                priority: 65,
                message: format!("body line is {len} characters, longer than the {limit} character limit"),
                fix_hint: Some(format!("wrap body lines at ~{body_max} characters")),
            });
            break;
        }
    }

    check_list_format(parsed, findings);
}

/// A bullet line (`-`, `*`, or `N.`) must be preceded by a blank line;
/// trailer-shaped lines are already excluded from `body` by
/// [`crate::commit::parse_commit_message`], so this only sees prose/list
/// content.
fn check_list_format(parsed: &ParsedCommit, findings: &mut Vec<Finding>) {
    let lines: Vec<&str> = parsed.body.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        if !is_bullet_line(line) {
            continue;
        }
        let preceded_by_blank = i == 0 || lines[i - 1].trim().is_empty();
        let preceded_by_bullet = i > 0 && is_bullet_line(lines[i - 1]);
        if !preceded_by_blank && !preceded_by_bullet {
            findings.push(Finding {
                reference: "GIT-LIST-FORMAT",
                priority: 70,
                message: "list item is not preceded by a blank line".to_string(),
                fix_hint: Some("add a blank line before the list".to_string()),
            });
            break;
        }
    }
}

fn is_bullet_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.starts_with("- ") || trimmed.starts_with("* ") {
        return true;
    }
    let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
    !digits.is_empty() && trimmed[digits.len()..].starts_with(". ")
}

fn check_pr_reference(message: &str, findings: &mut Vec<Finding>) {
    if PR_REF_OVERLONG_RE.is_match(message) {
        findings.push(Finding {
            reference: "GIT-PR-REF",
            priority: 40,
            message: "PR/issue reference has an unreasonable number of digits".to_string(),
            fix_hint: Some("double check the issue/PR number".to_string()),
        });
    }
}

const ATTRIBUTION_PHRASES: &[&str] = &[
    "Co-Authored-By: Claude",
    "Generated with Claude Code",
    "Written by Claude",
];

/// Body + footers are scanned for a fixed set of attribution phrases.
/// Intentionally case-sensitive: matching only the mixed-case "Claude"
/// spelling means a literal all-caps `CLAUDE.md` reference, or a backticked
/// `CLAUDE` constant name, never trips this check — the quirk preserved
/// from the original tool (spec.md §9 Open Questions).
fn check_claude_attribution(parsed: &ParsedCommit, allow_claude_attribution: Option<bool>, findings: &mut Vec<Finding>) {
    if allow_claude_attribution != Some(false) {
        return;
    }
    let footer_hit = parsed
        .footers
        .iter()
        .any(|(k, v)| k.eq_ignore_ascii_case("Co-Authored-By") && v.contains("Claude"));
    let body_hit = ATTRIBUTION_PHRASES.iter().any(|p| parsed.body.contains(p));
    if footer_hit || body_hit {
        findings.push(Finding {
            reference: "GIT-CLAUDE-ATTR",
            priority: 45,
            message: "commit message attributes authorship to Claude".to_string(),
            fix_hint: Some("remove the Claude attribution footer before committing".to_string()),
        });
    }
}

fn check_forbidden_patterns(message: &str, forbidden_patterns: &[String], findings: &mut Vec<Finding>) {
    for pattern in forbidden_patterns {
        if let Ok(re) = Regex::new(pattern) {
            if re.is_match(message) {
                findings.push(Finding {
                    reference: "GIT-FORBIDDEN-PATTERN",
                    priority: 50,
                    message: format!("commit message matches forbidden pattern `{pattern}`"),
                    fix_hint: None,
                });
            }
        }
    }
}

/// When `expected_signoff` is configured and a `Signed-off-by:` trailer is
/// present, it must equal that value exactly (spec.md §4.6). A commit with
/// no trailer at all is not this validator's concern — that's
/// `GIT-MISSING-FLAGS`/`--signoff` handling, not a mismatch.
fn check_signoff_mismatch(parsed: &ParsedCommit, expected_signoff: Option<&str>, findings: &mut Vec<Finding>) {
    let Some(expected) = expected_signoff else {
        return;
    };
    let Some(actual) = parsed.footer("Signed-off-by") else {
        return;
    };
    if actual != expected {
        findings.push(Finding {
            reference: "GIT-SIGNOFF-MISMATCH",
            priority: 60,
            message: format!("commit is signed off as `{actual}`, expected `{expected}`"),
            fix_hint: Some(format!("use `git commit --signoff` with the configured identity, or set `Signed-off-by: {expected}` explicitly")),
        });
    }
}

fn compose(validator_name: &str, mut findings: Vec<Finding>, commit_preview: Option<String>) -> ValidationResult {
    if findings.is_empty() {
        return ValidationResult::pass(validator_name);
    }
    findings.sort_by_key(|f| f.priority);
    let primary = &findings[0];
    let mut result = ValidationResult::fail_with_ref(validator_name, primary.reference, primary.message.clone());
    if let Some(hint) = &primary.fix_hint {
        result = result.with_fix_hint(hint.clone());
    }
    for extra in &findings[1..] {
        result = result.with_context_line(format!("{}: {}", extra.reference, extra.message));
    }
    if let Some(preview) = commit_preview {
        result = result.with_detail("commit_preview", preview);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitquery::GitQueryView;
    use crate::hook::{EventKind, HookContext, ToolKind, ToolPayload};
    use crate::shell::parse_pipeline;
    use rstest::rstest;
    use std::sync::Arc;

    fn context(command: &str) -> ValidationContext {
        let view = GitQueryView::unavailable("no repository in test");
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
            git: Arc::new(view),
        }
    }

    #[test]
    fn missing_flags_is_reported() {
        let validator = CommitMessageValidator::new(&Config::default());
        let ctx = context(r#"git commit -m "feat: add thing""#);
        assert!(validator.applies(&ctx));
        let result = validator.validate(&ctx);
        assert!(result.should_block);
        assert_eq!(result.reference.as_deref(), Some("GIT-MISSING-FLAGS"));
    }

    #[test]
    fn fully_compliant_commit_passes() {
        let validator = CommitMessageValidator::new(&Config::default());
        let ctx = context(r#"git add . && git commit -S --signoff -m "feat: add thing""#);
        let result = validator.validate(&ctx);
        assert!(result.passed);
    }

    #[test]
    fn combined_short_flags_satisfy_signoff_and_gpg_sign() {
        let validator = CommitMessageValidator::new(&Config::default());
        let ctx = context(r#"git add . && git commit -sS -m "feat(api): add endpoint""#);
        let result = validator.validate(&ctx);
        assert!(result.passed);
    }

    #[test]
    fn feat_ci_is_blocked() {
        let validator = CommitMessageValidator::new(&Config::default());
        let ctx = context(r#"git add . && git commit -S --signoff -m "feat(ci): add workflow""#);
        let result = validator.validate(&ctx);
        assert!(result.should_block);
        let refs: Vec<_> = std::iter::once(result.reference.clone())
            .chain(result.context_lines.iter().map(|l| Some(l.clone())))
            .collect();
        assert!(refs.iter().any(|r| r.as_deref() == Some("GIT-FEAT-CI")));
    }

    #[test]
    fn fix_test_scope_is_also_blocked() {
        let validator = CommitMessageValidator::new(&Config::default());
        let ctx = context(r#"git add . && git commit -S --signoff -m "fix(test): flaky test""#);
        let result = validator.validate(&ctx);
        let refs: Vec<_> = std::iter::once(result.reference.clone())
            .chain(result.context_lines.iter().map(|l| Some(l.clone())))
            .collect();
        assert!(refs.iter().any(|r| r.as_deref() == Some("GIT-FEAT-CI")));
    }

    #[test]
    fn overlong_pr_reference_is_blocked() {
        let validator = CommitMessageValidator::new(&Config::default());
        let ctx = context(r#"git add . && git commit -S --signoff -m "fix: patch things (#123456789012)""#);
        let result = validator.validate(&ctx);
        let flagged = result.reference.as_deref() == Some("GIT-PR-REF")
            || result.context_lines.iter().any(|l| l.starts_with("GIT-PR-REF"));
        assert!(flagged);
    }

    #[rstest]
    #[case::ten_digits_matches_well_formed("#1234567890", false)]
    #[case::eleven_digits_is_overlong("#12345678901", true)]
    #[case::thousand_digits_is_overlong(&format!("#{}", "1".repeat(1000)), true)]
    fn pr_reference_digit_run_boundary(#[case] reference: &str, #[case] should_flag: bool) {
        assert_eq!(PR_REF_OVERLONG_RE.is_match(reference), should_flag);
    }

    #[test]
    fn pr_reference_digit_run_completes_in_linear_time() {
        let pathological = format!("see #{}", "9".repeat(1_000_000));
        let start = std::time::Instant::now();
        assert!(PR_REF_OVERLONG_RE.is_match(&pathological));
        assert!(start.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn non_commit_command_does_not_apply() {
        let validator = CommitMessageValidator::new(&Config::default());
        let ctx = context("git status");
        assert!(!validator.applies(&ctx));
    }

    #[test]
    fn title_over_configured_max_is_blocked() {
        let mut config = Config::default();
        config.commit_message.title_max = Some(20);
        let validator = CommitMessageValidator::new(&config);
        let ctx = context(r#"git add . && git commit -S --signoff -m "feat: this title is definitely too long""#);
        let result = validator.validate(&ctx);
        let refs: Vec<_> = std::iter::once(result.reference.clone())
            .chain(result.context_lines.iter().map(|l| Some(l.clone())))
            .collect();
        assert!(refs.iter().any(|r| r.as_deref() == Some("GIT-BAD-TITLE")));
    }

    #[test]
    fn revert_title_skips_length_check_by_default() {
        let mut config = Config::default();
        config.commit_message.title_max = Some(5);
        let validator = CommitMessageValidator::new(&config);
        let ctx = context(
            r#"git add . && git commit -S --signoff -m "Revert \"feat: add a very long feature title here\"""#,
        );
        let result = validator.validate(&ctx);
        assert!(result.passed);
    }

    #[test]
    fn signoff_mismatch_blocks_when_trailer_differs_from_expected() {
        let mut config = Config::default();
        config.commit_message.expected_signoff = Some("Jane Doe <jane@example.com>".to_string());
        let validator = CommitMessageValidator::new(&config);
        let ctx = context(
            "git add . && git commit -S --signoff -m \"feat: add thing\n\nSigned-off-by: John Roe <john@example.com>\"",
        );
        let result = validator.validate(&ctx);
        let refs: Vec<_> = std::iter::once(result.reference.clone())
            .chain(result.context_lines.iter().map(|l| Some(l.clone())))
            .collect();
        assert!(refs.iter().any(|r| r.as_deref() == Some("GIT-SIGNOFF-MISMATCH")));
    }

    #[test]
    fn list_item_without_blank_line_is_blocked() {
        let validator = CommitMessageValidator::new(&Config::default());
        let ctx = context(
            "git add . && git commit -S --signoff -m \"feat: add thing\n\nSome prose.\n- item one\n- item two\"",
        );
        let result = validator.validate(&ctx);
        let refs: Vec<_> = std::iter::once(result.reference.clone())
            .chain(result.context_lines.iter().map(|l| Some(l.clone())))
            .collect();
        assert!(refs.iter().any(|r| r.as_deref() == Some("GIT-LIST-FORMAT")));
    }

    #[test]
    fn list_item_with_blank_line_passes() {
        let validator = CommitMessageValidator::new(&Config::default());
        let ctx = context(
            "git add . && git commit -S --signoff -m \"feat: add thing\n\nSome prose.\n\n- item one\n- item two\"",
        );
        let result = validator.validate(&ctx);
        assert!(result.passed);
    }
}
