//! Crate-wide error type for the validation core.
//!
//! Mirrors the style used throughout the core: a flat enum with a hand-rolled
//! `Display` impl rather than a `thiserror` derive, so every message is
//! written exactly the way we want it to read on stderr.

use std::fmt;

/// The three error categories from the design: structural parse errors never
/// block, policy violations are surfaced as [`crate::validator::ValidationResult`]
/// blocks, and internal errors exit with code 1 (never 2) so host automation
/// can tell "blocked by policy" apart from "dispatcher failed".
#[derive(Debug)]
pub enum DispatchError {
    /// The event envelope on stdin was not valid JSON, or was missing a
    /// required field. Caller should fall back to allow-with-no-validation.
    InvalidEvent(String),
    /// Config file existed but failed to parse/validate.
    InvalidConfig(String),
    /// A configured rule's action or predicate facet was unrecognized or
    /// failed to compile. Dropped at load time, never fatal, but recorded
    /// for the diagnostic log.
    InvalidRule { index: usize, reason: String },
    /// The dispatcher itself failed to complete (worker pool panic, a
    /// validator-harness invariant violated). Distinct from a validator
    /// *returning* a block result.
    DispatcherFailed(String),
    /// Wraps an I/O failure encountered while reading a `-F` message file or
    /// spawning `git`/`gh`/`markdownlint`.
    Io(std::io::Error),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::InvalidEvent(msg) => {
                write!(f, "could not parse hook event: {msg}")
            }
            DispatchError::InvalidConfig(msg) => {
                write!(f, "invalid configuration: {msg}")
            }
            DispatchError::InvalidRule { index, reason } => {
                write!(f, "rule #{index} dropped at load: {reason}")
            }
            DispatchError::DispatcherFailed(msg) => {
                write!(f, "dispatcher failed: {msg}")
            }
            DispatchError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<std::io::Error> for DispatchError {
    fn from(err: std::io::Error) -> Self {
        DispatchError::Io(err)
    }
}
