//! Typed configuration (spec.md §4, §9): loaded from TOML, with the project
//! config at `<repo_root>/.config/hookguard.toml` overriding the user config
//! at `~/.config/hookguard/config.toml` key-by-key.
//!
//! Every validator toggle is `Option<bool>`, not `bool`: `None` (unset)
//! means "use the built-in default", distinct from an explicit `false`
//! (spec.md §9's three-state rule). A plain `bool` can't represent "the
//! user never touched this knob".

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::rules::RawRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TitleStyle {
    Conventional,
    ScopeOnly,
    /// A user-supplied regex (`commit_message.custom_pattern`) replaces both
    /// built-in grammars entirely.
    Custom,
    /// No title-format rule at all; only length and the other independent
    /// checks still run.
    None,
    /// Majority-sample recent commit titles each invocation to infer the
    /// repository's convention; never cached across invocations (spec.md §9).
    Auto,
}

impl Default for TitleStyle {
    fn default() -> Self {
        TitleStyle::Auto
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CommitMessageConfig {
    pub title_style: TitleStyle,
    /// Maximum title length in code points. Default 50 (spec.md §4.6).
    pub title_max: Option<usize>,
    /// Revert commit titles (`Revert "..."`) skip the length check entirely
    /// when this is `Some(true)`.
    pub allow_unlimited_revert_title: Option<bool>,
    /// Conventional-commit types accepted beyond the built-in vocabulary.
    /// Empty means "use the built-in list".
    pub valid_types: Vec<String>,
    /// Conventional style only: `type(scope): desc` requires a non-empty
    /// scope when `Some(true)`.
    pub require_scope: Option<bool>,
    /// Used only when `title_style = "custom"`.
    pub custom_pattern: Option<String>,
    /// Maximum body line length before the `+ tolerance` grace window.
    /// Default 72 (spec.md §4.6).
    pub body_max: Option<usize>,
    /// Grace window added to `body_max` before a body line is flagged.
    /// Default 5.
    pub body_tolerance: Option<usize>,
    pub forbidden_patterns: Vec<String>,
    /// Three-state: unset defers to the repository's own `commit.gpgsign`
    /// and hook setup rather than assuming either way.
    pub require_signoff: Option<bool>,
    /// When set, a present `Signed-off-by:` trailer must equal this value
    /// exactly (spec.md §4.6's `GIT-SIGNOFF-MISMATCH`).
    pub expected_signoff: Option<String>,
    /// The "CLAUDE" all-caps attribution-footer quirk (spec.md §9's Open
    /// Question): `Some(false)` blocks it, `Some(true)`/unset allow it.
    pub allow_claude_attribution: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PushConfig {
    pub blocked_remotes: Vec<String>,
    pub allowed_remote_priority: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BranchNameConfig {
    /// Branch `type/description` prefixes accepted beyond the built-in
    /// list. Empty means "use the built-in list".
    pub valid_types: Vec<String>,
    /// Branches exempt from the `type/description` policy unconditionally.
    /// `main`/`master` are always exempt in addition to this list.
    pub protected_branches: Vec<String>,
    pub require_lowercase: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PrCreateConfig {
    pub title_max: Option<usize>,
    /// Run the configured `markdownlint` binary against the PR body,
    /// disabling these rule codes first (spec.md §4.7). Empty = don't run it.
    pub markdownlint_disabled_rules: Vec<String>,
    pub run_markdownlint: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PrMergeConfig {
    /// Whether `gh pr merge --auto` is itself validated as a squash would
    /// be. Unset/`false`: auto-merge is not validated (spec.md §4.2).
    pub validate_automerge: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    pub general_workers: Option<usize>,
    pub io_workers: Option<usize>,
    pub global_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub concurrency: ConcurrencyConfig,
    pub commit_message: CommitMessageConfig,
    pub branch_name: BranchNameConfig,
    pub push: PushConfig,
    pub pr_create: PrCreateConfig,
    pub pr_merge: PrMergeConfig,
    pub rules: Vec<RawRule>,
    /// Per-validator enable/disable by name. Absent key or `None` value
    /// means "use the validator's own default" (most are on by default).
    pub validators: IndexMap<String, Option<bool>>,
}

impl Config {
    /// `None` = unset (use built-in default), matching the three-state
    /// design note: an absent key is NOT the same as `validators.foo = false`.
    pub fn validator_enabled(&self, name: &str, default: bool) -> bool {
        match self.validators.get(name) {
            Some(Some(explicit)) => *explicit,
            Some(None) | None => default,
        }
    }

    /// Loads and merges user + project config. Neither file existing is
    /// not an error — an all-defaults `Config` is returned. A file that
    /// exists but fails to parse IS an error (`DispatchError::InvalidConfig`).
    pub fn load(repo_root: Option<&str>) -> Result<Config, DispatchError> {
        let user_path = user_config_path();
        let project_path = repo_root.map(project_config_path);

        let user_value = read_toml_table(user_path.as_deref())?;
        let project_value = match &project_path {
            Some(path) => read_toml_table(Some(path.as_path()))?,
            None => toml::value::Table::new(),
        };

        let merged = shallow_merge(user_value, project_value);
        let merged_text = toml::to_string(&toml::Value::Table(merged))
            .map_err(|e| DispatchError::InvalidConfig(e.to_string()))?;
        toml::from_str(&merged_text).map_err(|e| DispatchError::InvalidConfig(e.to_string()))
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hookguard").join("config.toml"))
}

fn project_config_path(repo_root: &str) -> PathBuf {
    Path::new(repo_root).join(".config").join("hookguard.toml")
}

fn read_toml_table(path: Option<&Path>) -> Result<toml::value::Table, DispatchError> {
    let Some(path) = path else {
        return Ok(toml::value::Table::new());
    };
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(toml::value::Table::new()),
        Err(e) => return Err(DispatchError::Io(e)),
    };
    toml::from_str(&contents).map_err(|e| DispatchError::InvalidConfig(e.to_string()))
}

/// Project keys override user keys one level deep; nested tables from the
/// user config that the project doesn't mention are preserved whole rather
/// than recursively merged, matching the "key-by-key" wording in the design
/// notes (a project config that sets `push.blocked-remotes` replaces the
/// user's `push` table entirely rather than splicing fields).
fn shallow_merge(
    mut user: toml::value::Table,
    project: toml::value::Table,
) -> toml::value::Table {
    for (key, value) in project {
        user.insert(key, value);
    }
    user
}
