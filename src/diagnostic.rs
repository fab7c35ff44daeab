//! Trace/debug file logging (spec.md §4.8, §6): `--debug`/`--trace` write
//! to `.git/hookguard-logs/trace.log` under the repository root, never to
//! stdout (that channel is reserved for the response envelope). Falls back
//! to a temp directory outside a repository, since a hook invocation must
//! never fail just because logging has nowhere good to go.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

static TRACE_LOG: OnceLock<Mutex<Option<TraceLog>>> = OnceLock::new();

struct TraceLog {
    path: PathBuf,
    file: File,
}

/// Opens (creating if needed) the trace log file. Call once, early in
/// `main`, when `--debug` or `--trace` was passed. A failure to open the
/// file is silent: logging is diagnostic, not load-bearing.
pub fn init() {
    let mutex = TRACE_LOG.get_or_init(|| Mutex::new(None));
    let Ok(mut guard) = mutex.lock() else { return };
    if let Some((path, file)) = try_create_log_file() {
        *guard = Some(TraceLog { path, file });
    }
}

/// Appends one line to the trace log, if it was initialized. Ignores
/// write errors; a hook invocation's outcome must never depend on
/// whether this diagnostic channel is healthy.
pub fn write_line(line: &str) {
    if let Some(mutex) = TRACE_LOG.get() {
        if let Ok(mut guard) = mutex.lock() {
            if let Some(log) = guard.as_mut() {
                let ts = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
                let _ = writeln!(log.file, "[{ts}] {line}");
                let _ = log.file.flush();
            }
        }
    }
}

/// Path to the active trace log file, if one was created. Exposed mostly
/// for tests and for a `--debug` invocation to tell the user where to look.
pub fn log_file_path() -> Option<PathBuf> {
    TRACE_LOG.get().and_then(|mutex| {
        mutex
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|log| log.path.clone()))
    })
}

fn try_create_log_file() -> Option<(PathBuf, File)> {
    let log_dir = repo_log_dir().unwrap_or_else(|| std::env::temp_dir().join("hookguard-logs"));
    std::fs::create_dir_all(&log_dir).ok()?;

    let path = log_dir.join("trace.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;

    Some((path, file))
}

/// `<repo_root>/.git/hookguard-logs`, resolved via a direct `git`
/// invocation rather than [`crate::gitquery::GitQueryView`] — logging must
/// come up before the rest of the dispatch pipeline, and must not share
/// its cache lifecycle.
fn repo_log_dir() -> Option<PathBuf> {
    let output = std::process::Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .stderr(std::process::Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if root.is_empty() {
        return None;
    }
    Some(PathBuf::from(root).join(".git").join("hookguard-logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_line_before_init_does_not_panic() {
        write_line("unreachable without init");
    }
}
