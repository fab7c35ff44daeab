//! PR-merge validation (spec.md §4.7): only squash merges are checked,
//! since merge/rebase strategies preserve each commit's own message
//! (already checked at commit time). Fetches the PR's title/body through
//! `gh pr view` the same way [`crate::validators::pr_create`] shells out to
//! `markdownlint` — both are `io-heavy` validators the dispatcher bounds
//! with its own sub-pool, distinct from the git-only `GitQueryView`.

use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use wait_timeout::ChildExt;

use crate::commit::parse_commit_message;
use crate::config::Config;
use crate::validator::{Category, ValidationContext, ValidationResult, Validator};
use crate::vcs::{parse_gh, GHCommand, MergeStrategy};

const GH_TIMEOUT: Duration = Duration::from_secs(30);

static CONVENTIONAL_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<type>[a-zA-Z]{1,20})(\([-_a-zA-Z0-9/]{1,60}\))?!?: .{1,300}$").unwrap());

pub struct PrMergeValidator {
    validate_automerge: bool,
}

impl PrMergeValidator {
    pub fn new(config: &Config) -> Self {
        PrMergeValidator {
            validate_automerge: config.pr_merge.validate_automerge.unwrap_or(false),
        }
    }

    fn should_validate(&self, strategy: MergeStrategy) -> bool {
        match strategy {
            MergeStrategy::Squash => true,
            MergeStrategy::Auto => self.validate_automerge,
            MergeStrategy::Merge | MergeStrategy::Rebase => false,
        }
    }
}

impl Validator for PrMergeValidator {
    fn name(&self) -> &str {
        "pr-merge"
    }

    fn category(&self) -> Category {
        Category::PrMerge
    }

    fn is_io_heavy(&self) -> bool {
        true
    }

    fn applies(&self, ctx: &ValidationContext) -> bool {
        let Some(pipeline) = &ctx.pipeline else {
            return false;
        };
        pipeline.simple_commands().iter().filter_map(parse_gh).any(|g| {
            g.command.as_deref() == Some("pr")
                && g.action.as_deref() == Some("merge")
                && self.should_validate(g.merge_strategy())
        })
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let pipeline = ctx.pipeline.as_ref().expect("applies() checked pipeline");
        let merge = pipeline
            .simple_commands()
            .iter()
            .filter_map(parse_gh)
            .find(|g| {
                g.command.as_deref() == Some("pr")
                    && g.action.as_deref() == Some("merge")
                    && self.should_validate(g.merge_strategy())
            })
            .expect("applies() checked for a qualifying pr merge command");

        let merge_body = merge.body().unwrap_or_default();
        if !merge_body.contains("Signed-off-by:") {
            return ValidationResult::fail_with_ref(
                self.name(),
                "GIT-MERGE-SIGNOFF-MISSING",
                "squash-merge body has no Signed-off-by trailer",
            )
            .with_fix_hint("add `--body` with a `Signed-off-by:` trailer to the merge command");
        }

        let Some((title, body)) = fetch_pr_title_and_body(&merge) else {
            // Could not reach `gh` (missing binary, network, timeout) — the
            // PR content itself is unreachable, so only the locally visible
            // check above applies; this is not a block (spec.md §7).
            return ValidationResult::pass(self.name());
        };

        if !CONVENTIONAL_TITLE_RE.is_match(&title) {
            return ValidationResult::fail_with_ref(
                self.name(),
                "GIT-MERGE-TITLE",
                "PR title is not a conventional commit style title",
            )
            .with_fix_hint("use `type(scope): description` as the PR title before squash-merging");
        }

        let combined = format!("{title}\n\n{body}");
        let parsed = parse_commit_message(&combined);
        if !parsed.valid && !parsed.is_revert {
            return ValidationResult::fail_with_ref(
                self.name(),
                "GIT-MERGE-TITLE",
                parsed
                    .parse_error
                    .unwrap_or_else(|| "squash-merge title does not parse as a commit message".to_string()),
            );
        }

        ValidationResult::pass(self.name())
    }
}

fn fetch_pr_title_and_body(merge: &GHCommand) -> Option<(String, String)> {
    let pr_number = merge.pr_number()?;
    let gh_path = which::which("gh").ok()?;

    let mut command = Command::new(gh_path);
    command
        .arg("pr")
        .arg("view")
        .arg(pr_number.to_string())
        .arg("--json")
        .arg("title,body")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    let mut child = command.spawn().ok()?;
    let mut stdout_handle = child.stdout.take()?;

    match child.wait_timeout(GH_TIMEOUT).ok()? {
        Some(status) if status.success() => {
            let mut buf = String::new();
            stdout_handle.read_to_string(&mut buf).ok()?;
            let value: serde_json::Value = serde_json::from_str(&buf).ok()?;
            let title = value.get("title")?.as_str()?.to_string();
            let body = value.get("body").and_then(|b| b.as_str()).unwrap_or_default().to_string();
            Some((title, body))
        }
        Some(_) => None,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            None
        }
    }
}
