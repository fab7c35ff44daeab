//! `gh` (GitHub CLI) sub-parser: PR create/merge flag extraction and merge
//! strategy selection (spec.md §4.2, §4.7).

use crate::shell::{Heredoc, SimpleCommand};

const VALUE_FLAGS: &[&str] = &[
    "-t", "--title", "-b", "--body", "-B", "--base", "-H", "--head", "-l", "--label", "-R",
    "--repo", "-F", "--body-file", "-r", "--reviewer", "-a", "--assignee",
];

/// How a `gh pr merge` invocation wants the merge performed. `Auto` means no
/// explicit strategy flag was given; validators treat that as "use the
/// repository default", never as an implicit squash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    Squash,
    Merge,
    Rebase,
    Auto,
}

/// A parsed `gh <command> <action> ...` invocation, e.g. `gh pr create`,
/// `gh pr merge`.
#[derive(Debug, Clone)]
pub struct GHCommand {
    pub command: Option<String>,
    pub action: Option<String>,
    pub args: Vec<String>,
    pub heredocs: Vec<Heredoc>,
}

impl GHCommand {
    pub fn has_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }

    pub fn flag_value(&self, flag: &str) -> Option<String> {
        let prefix = format!("{flag}=");
        for (i, arg) in self.args.iter().enumerate() {
            if let Some(val) = arg.strip_prefix(&prefix) {
                return Some(val.to_string());
            }
            if arg == flag && VALUE_FLAGS.contains(&flag) {
                return self.args.get(i + 1).cloned();
            }
        }
        None
    }

    pub fn title(&self) -> Option<String> {
        self.flag_value("-t").or_else(|| self.flag_value("--title"))
    }

    /// `-b`/`--body` wins if given; otherwise a heredoc attached to this
    /// command (e.g. `gh pr create --body "$(cat <<'EOF' ... EOF)"` or a
    /// direct `gh pr create -F- <<EOF ... EOF`-style invocation) supplies
    /// the body text (spec.md §4.2).
    pub fn body(&self) -> Option<String> {
        self.flag_value("-b")
            .or_else(|| self.flag_value("--body"))
            .or_else(|| self.heredocs.first().map(|h| h.body.clone()))
    }

    pub fn base(&self) -> Option<String> {
        self.flag_value("-B").or_else(|| self.flag_value("--base"))
    }

    pub fn labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        let mut i = 0;
        while i < self.args.len() {
            let arg = &self.args[i];
            if arg == "-l" || arg == "--label" {
                if let Some(val) = self.args.get(i + 1) {
                    labels.push(val.clone());
                    i += 2;
                    continue;
                }
            }
            if let Some(val) = arg.strip_prefix("--label=") {
                labels.push(val.to_string());
            }
            i += 1;
        }
        labels
    }

    /// `Some(n)` for `gh pr merge <n>`, `gh pr merge --repo ... <n>`, etc.
    /// Looks for the first positional arg that parses as an integer.
    pub fn pr_number(&self) -> Option<u64> {
        self.positional_args().iter().find_map(|a| a.parse().ok())
    }

    fn positional_args(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < self.args.len() {
            let arg = &self.args[i];
            if arg.starts_with('-') {
                if arg.contains('=') {
                    i += 1;
                    continue;
                }
                if VALUE_FLAGS.contains(&arg.as_str()) {
                    i += 2;
                    continue;
                }
                i += 1;
                continue;
            }
            out.push(arg.clone());
            i += 1;
        }
        out
    }

    /// Per spec.md §4.7: explicit `--squash`/`--merge`/`--rebase` wins;
    /// otherwise `Auto` (repository default, not an implicit squash).
    pub fn merge_strategy(&self) -> MergeStrategy {
        if self.has_flag("--squash") {
            MergeStrategy::Squash
        } else if self.has_flag("--rebase") {
            MergeStrategy::Rebase
        } else if self.has_flag("--merge") {
            MergeStrategy::Merge
        } else {
            MergeStrategy::Auto
        }
    }
}

/// `None` if `cmd` doesn't invoke `gh` at all.
pub fn parse_gh(cmd: &SimpleCommand) -> Option<GHCommand> {
    if cmd.program != "gh" {
        return None;
    }
    let command = cmd.args.first().cloned();
    let action = cmd.args.get(1).filter(|a| !a.starts_with('-')).cloned();
    let skip = if action.is_some() { 2 } else { 1 };
    let args = cmd.args.get(skip..).map(|s| s.to_vec()).unwrap_or_default();

    Some(GHCommand {
        command,
        action,
        args,
        heredocs: cmd.heredocs.clone(),
    })
}
