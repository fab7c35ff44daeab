//! GitQuery façade (spec.md §3, §4.4): read-only repository introspection
//! for validators, backed by `git` subprocess calls, memoized per field and
//! per working directory so a dispatch with many validators issues each
//! `git` call at most once.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{LazyLock, OnceLock};
use std::time::Duration;

use dashmap::DashMap;
use wait_timeout::ChildExt;

/// How long we'll wait for any single `git` subprocess before giving up
/// and recording the field as unavailable. Never fatal to the dispatch.
const GIT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

static VIEW_CACHE: LazyLock<DashMap<PathBuf, std::sync::Arc<GitQueryView>>> =
    LazyLock::new(DashMap::new);

/// Abstraction over "read facts about the repository", so a test or an
/// alternate backend (e.g. libgit2) can stand in for the subprocess-backed
/// implementation without validators knowing the difference (spec.md §9).
pub trait GitQuery: Send + Sync {
    fn in_repo(&self) -> bool;
    fn repo_root(&self) -> Result<String, String>;
    fn current_branch(&self) -> Result<String, String>;
    fn staged_files(&self) -> Result<Vec<String>, String>;
    fn modified_files(&self) -> Result<Vec<String>, String>;
    fn untracked_files(&self) -> Result<Vec<String>, String>;
    fn remotes(&self) -> Result<Vec<String>, String>;
    /// `None` if `name` isn't a configured remote; never a hard error for
    /// that case (spec.md §3's `remotes: map<name,url>`, exposed here as a
    /// lookup rather than materializing the whole map up front).
    fn remote_url(&self, name: &str) -> Result<Option<String>, String>;
    fn branch_tracking(&self, branch: &str) -> Result<Option<String>, String>;
    /// The subject line of the last `limit` commits reachable from HEAD,
    /// most recent first. Used only by the commit-message validator's
    /// `auto` title-style sampling (spec.md §4.6); re-sampled every
    /// invocation, never cached across them (spec.md §9 Open Question).
    fn recent_commit_titles(&self, limit: usize) -> Result<Vec<String>, String>;
}

/// Subprocess-backed, lazily memoized implementation. Each field is
/// computed at most once per `GitQueryView` instance; errors (not a repo,
/// `git` missing, timeout) are recorded per field and never propagate as a
/// dispatch failure — a validator that needs a field it couldn't get just
/// treats that check as skipped.
pub struct GitQueryView {
    cwd: Option<PathBuf>,
    forced_unavailable: Option<String>,
    in_repo: OnceLock<bool>,
    repo_root: OnceLock<Result<String, String>>,
    current_branch: OnceLock<Result<String, String>>,
    staged_files: OnceLock<Result<Vec<String>, String>>,
    modified_files: OnceLock<Result<Vec<String>, String>>,
    untracked_files: OnceLock<Result<Vec<String>, String>>,
    remotes: OnceLock<Result<Vec<String>, String>>,
}

impl GitQueryView {
    fn new(cwd: Option<PathBuf>) -> Self {
        GitQueryView {
            cwd,
            forced_unavailable: None,
            in_repo: OnceLock::new(),
            repo_root: OnceLock::new(),
            current_branch: OnceLock::new(),
            staged_files: OnceLock::new(),
            modified_files: OnceLock::new(),
            untracked_files: OnceLock::new(),
            remotes: OnceLock::new(),
        }
    }

    /// A view that reports every field unavailable without ever shelling
    /// out, for use outside a real repository (tests, sandboxed dry-runs).
    pub fn unavailable(reason: impl Into<String>) -> Self {
        GitQueryView {
            cwd: None,
            forced_unavailable: Some(reason.into()),
            in_repo: OnceLock::from(false),
            repo_root: OnceLock::new(),
            current_branch: OnceLock::new(),
            staged_files: OnceLock::new(),
            modified_files: OnceLock::new(),
            untracked_files: OnceLock::new(),
            remotes: OnceLock::new(),
        }
    }

    /// Returns the memoized view for `cwd` (`None` = process cwd), creating
    /// and caching one if this is the first request for that directory.
    pub fn for_directory(cwd: Option<&str>) -> std::sync::Arc<GitQueryView> {
        let key = cwd
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        if let Some(existing) = VIEW_CACHE.get(&key) {
            return existing.clone();
        }
        let view = std::sync::Arc::new(GitQueryView::new(Some(key.clone())));
        VIEW_CACHE.insert(key, view.clone());
        view
    }

    fn run(&self, args: &[&str]) -> Result<String, String> {
        if let Some(reason) = &self.forced_unavailable {
            return Err(reason.clone());
        }
        let mut command = Command::new("git");
        command.args(args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::null());
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        let mut child = command
            .spawn()
            .map_err(|e| format!("failed to spawn git: {e}"))?;

        let mut stdout_handle = child
            .stdout
            .take()
            .ok_or_else(|| "git produced no stdout handle".to_string())?;

        match child.wait_timeout(GIT_CALL_TIMEOUT) {
            Ok(Some(status)) => {
                use std::io::Read;
                let mut buf = Vec::new();
                let _ = stdout_handle.read_to_end(&mut buf);
                if !status.success() {
                    return Err(format!("git {} exited with {status}", args.join(" ")));
                }
                Ok(String::from_utf8_lossy(&buf).trim_end().to_string())
            }
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(format!("git {} timed out", args.join(" ")))
            }
            Err(e) => Err(format!("failed to wait on git: {e}")),
        }
    }
}

impl GitQuery for GitQueryView {
    fn in_repo(&self) -> bool {
        *self.in_repo.get_or_init(|| {
            self.run(&["rev-parse", "--is-inside-work-tree"])
                .map(|s| s == "true")
                .unwrap_or(false)
        })
    }

    fn repo_root(&self) -> Result<String, String> {
        self.repo_root
            .get_or_init(|| self.run(&["rev-parse", "--show-toplevel"]))
            .clone()
    }

    fn current_branch(&self) -> Result<String, String> {
        self.current_branch
            .get_or_init(|| self.run(&["rev-parse", "--abbrev-ref", "HEAD"]))
            .clone()
    }

    fn staged_files(&self) -> Result<Vec<String>, String> {
        self.staged_files
            .get_or_init(|| {
                self.run(&["diff", "--cached", "--name-only"])
                    .map(|out| lines(&out))
            })
            .clone()
    }

    fn modified_files(&self) -> Result<Vec<String>, String> {
        self.modified_files
            .get_or_init(|| self.run(&["diff", "--name-only"]).map(|out| lines(&out)))
            .clone()
    }

    fn untracked_files(&self) -> Result<Vec<String>, String> {
        self.untracked_files
            .get_or_init(|| {
                self.run(&["ls-files", "--others", "--exclude-standard"])
                    .map(|out| lines(&out))
            })
            .clone()
    }

    fn remotes(&self) -> Result<Vec<String>, String> {
        self.remotes
            .get_or_init(|| self.run(&["remote"]).map(|out| lines(&out)))
            .clone()
    }

    /// Not memoized per-instance (remote-name-specific, like
    /// `branch_tracking`): an unknown remote makes `git remote get-url`
    /// exit non-zero, which we fold into `Ok(None)` rather than an error.
    fn remote_url(&self, name: &str) -> Result<Option<String>, String> {
        match self.run(&["remote", "get-url", name]) {
            Ok(url) => Ok(Some(url)),
            Err(_) => Ok(None),
        }
    }

    /// Not memoized per-instance (branch-specific); still a single `git`
    /// call, and cheap enough that re-running it per query is acceptable.
    fn branch_tracking(&self, branch: &str) -> Result<Option<String>, String> {
        let ref_name = format!("{branch}@{{upstream}}");
        match self.run(&["rev-parse", "--abbrev-ref", &ref_name]) {
            Ok(upstream) => Ok(Some(upstream)),
            Err(_) => Ok(None),
        }
    }

    fn recent_commit_titles(&self, limit: usize) -> Result<Vec<String>, String> {
        let n = limit.to_string();
        self.run(&["log", &format!("-n{n}"), "--pretty=format:%s"])
            .map(|out| out.lines().map(str::to_string).collect())
    }
}

fn lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolves `path` the same way a preceding `-C <path>` would, relative to
/// `base` if both are given. Used by validators that need to honor `git -C`.
pub fn resolve_working_directory(base: Option<&str>, dash_c: Option<&str>) -> Option<String> {
    match (base, dash_c) {
        (_, Some(dash_c)) if Path::new(dash_c).is_absolute() => Some(dash_c.to_string()),
        (Some(base), Some(dash_c)) => Some(Path::new(base).join(dash_c).to_string_lossy().into_owned()),
        (None, Some(dash_c)) => Some(dash_c.to_string()),
        (Some(base), None) => Some(base.to_string()),
        (None, None) => None,
    }
}
