//! Branch-name policy (spec.md §4.7): applies to branch-creating
//! subcommands only, never to listing/query/delete forms of the same verbs.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::Config;
use crate::validator::{Category, ValidationContext, ValidationResult, Validator};
use crate::vcs::{parse_git, GitCommand};

const DEFAULT_TYPES: &[&str] = &["feature", "fix", "bugfix", "hotfix", "chore", "release"];
const ALWAYS_PROTECTED: &[&str] = &["main", "master"];

static TYPE_SLASH_DESC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<type>[a-z0-9-]{1,40})/(?P<desc>[a-zA-Z0-9/_-]{1,200})$").unwrap());

pub struct BranchNameValidator {
    valid_types: Vec<String>,
    protected_branches: Vec<String>,
    require_lowercase: bool,
}

impl BranchNameValidator {
    pub fn new(config: &Config) -> Self {
        let cfg = &config.branch_name;
        BranchNameValidator {
            valid_types: cfg.valid_types.clone(),
            protected_branches: cfg.protected_branches.clone(),
            require_lowercase: cfg.require_lowercase.unwrap_or(true),
        }
    }

    fn valid_types(&self) -> Vec<&str> {
        if self.valid_types.is_empty() {
            DEFAULT_TYPES.to_vec()
        } else {
            self.valid_types.iter().map(String::as_str).collect()
        }
    }

    fn is_protected(&self, branch: &str) -> bool {
        ALWAYS_PROTECTED.contains(&branch) || self.protected_branches.iter().any(|p| p == branch)
    }
}

impl Validator for BranchNameValidator {
    fn name(&self) -> &str {
        "branch-name"
    }

    fn category(&self) -> Category {
        Category::BranchName
    }

    fn applies(&self, ctx: &ValidationContext) -> bool {
        let Some(pipeline) = &ctx.pipeline else {
            return false;
        };
        pipeline
            .simple_commands()
            .iter()
            .filter_map(parse_git)
            .any(|g| extract_new_branch_name(&g).is_some())
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let pipeline = ctx.pipeline.as_ref().expect("applies() checked pipeline");
        let Some(branch) = pipeline
            .simple_commands()
            .iter()
            .filter_map(parse_git)
            .find_map(|g| extract_new_branch_name(&g))
        else {
            return ValidationResult::pass(self.name());
        };

        if self.is_protected(&branch) {
            return ValidationResult::pass(self.name());
        }

        if self.require_lowercase && branch != branch.to_lowercase() {
            return ValidationResult::fail_with_ref(
                self.name(),
                "GIT-BRANCH-CASE",
                format!("branch name `{branch}` must be lowercase"),
            )
            .with_fix_hint(format!("rename to `{}`", branch.to_lowercase()));
        }

        match TYPE_SLASH_DESC_RE.captures(&branch) {
            Some(caps) => {
                let branch_type = caps.name("type").map(|m| m.as_str()).unwrap_or_default();
                let valid_types = self.valid_types();
                if !valid_types.contains(&branch_type) {
                    ValidationResult::fail_with_ref(
                        self.name(),
                        "GIT-BRANCH-TYPE",
                        format!("`{branch_type}` is not a recognized branch type"),
                    )
                    .with_fix_hint(format!("use one of: {}", valid_types.join(", ")))
                } else {
                    ValidationResult::pass(self.name())
                }
            }
            None => ValidationResult::fail_with_ref(
                self.name(),
                "GIT-BRANCH-FORMAT",
                format!("branch name `{branch}` does not match `type/description`"),
            )
            .with_fix_hint(format!(
                "use `type/description`, e.g. `{}/short-summary`",
                self.valid_types().first().copied().unwrap_or("feature")
            )),
        }
    }
}

/// Returns the branch name this command would create, or `None` if it's
/// not a branch-creating invocation at all (e.g. `git branch -d old`,
/// `git branch --list`, `git checkout main`).
fn extract_new_branch_name(cmd: &GitCommand) -> Option<String> {
    match cmd.subcommand.as_deref() {
        Some("checkout") => {
            cmd.flag_value("-b").or_else(|| cmd.flag_value("--branch"))
        }
        Some("switch") => cmd
            .flag_value("-c")
            .or_else(|| cmd.flag_value("-C"))
            .or_else(|| cmd.flag_value("--create"))
            .or_else(|| cmd.flag_value("--force-create")),
        Some("branch") => {
            let non_flag_args: Vec<&String> = cmd.args.iter().filter(|a| !a.starts_with('-')).collect();
            let has_query_flag = cmd.args.iter().any(|a| {
                matches!(
                    a.as_str(),
                    "-l" | "--list" | "-a" | "--all" | "-r" | "--remotes" | "-d" | "-D"
                        | "--delete" | "-m" | "-M" | "--move" | "-v" | "-vv" | "--verbose"
                )
            });
            if has_query_flag || non_flag_args.len() != 1 {
                None
            } else {
                Some(non_flag_args[0].clone())
            }
        }
        _ => None,
    }
}
