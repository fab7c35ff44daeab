//! Validator Framework (spec.md §4.4, §4.5): the `Validator` trait, its
//! result type, and the bounded-parallel dispatcher that runs a registry of
//! validators against one [`ValidationContext`].

mod dispatch;
mod registry;

pub use dispatch::{CancellationToken, Decision, DispatchConfig, DispatchOutcome, Dispatcher};
pub use registry::Registry;

use std::sync::Arc;

use indexmap::IndexMap;

use crate::gitquery::GitQueryView;
use crate::hook::HookContext;
use crate::shell::CommandPipeline;

/// How severe a [`ValidationResult`] is. Used both to decide whether it
/// blocks and to order the final report (severity desc).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Which pool a validator's `validate()` call should run in. Validators
/// that shell out to `git`/`gh`/`markdownlint` are `IoHeavy` and run in the
/// smaller sub-pool so a slow subprocess can't starve the CPU-bound ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    CommitMessage,
    BranchName,
    Push,
    Fetch,
    PrCreate,
    PrMerge,
    Other,
}

/// Inputs available to every validator. Built once per hook invocation and
/// shared across the whole dispatch via `Arc` so it can be cloned cheaply
/// into each worker-pool task (the dispatcher's workers require `'static`
/// closures, spec.md §5).
pub struct ValidationContext {
    pub hook: Arc<HookContext>,
    pub pipeline: Option<Arc<CommandPipeline>>,
    pub git: Arc<GitQueryView>,
}

/// A validator's verdict. Constructed with the `pass`/`warn`/`fail`
/// constructors and refined with the fluent `with_*` methods, built up
/// incrementally rather than via a separate builder struct.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub validator_name: String,
    pub passed: bool,
    pub should_block: bool,
    pub severity: Severity,
    pub reference: Option<String>,
    pub primary_message: Option<String>,
    pub context_lines: Vec<String>,
    pub fix_hint: Option<String>,
    pub details: IndexMap<String, String>,
    pub doc_link: Option<String>,
}

impl ValidationResult {
    pub fn pass(validator_name: impl Into<String>) -> Self {
        ValidationResult {
            validator_name: validator_name.into(),
            passed: true,
            should_block: false,
            severity: Severity::Info,
            reference: None,
            primary_message: None,
            context_lines: Vec::new(),
            fix_hint: None,
            details: IndexMap::new(),
            doc_link: None,
        }
    }

    pub fn warn(validator_name: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationResult {
            validator_name: validator_name.into(),
            passed: false,
            should_block: false,
            severity: Severity::Warning,
            reference: None,
            primary_message: Some(message.into()),
            context_lines: Vec::new(),
            fix_hint: None,
            details: IndexMap::new(),
            doc_link: None,
        }
    }

    pub fn fail(validator_name: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationResult {
            validator_name: validator_name.into(),
            passed: false,
            should_block: true,
            severity: Severity::Error,
            reference: None,
            primary_message: Some(message.into()),
            context_lines: Vec::new(),
            fix_hint: None,
            details: IndexMap::new(),
            doc_link: None,
        }
    }

    pub fn fail_with_ref(
        validator_name: impl Into<String>,
        reference: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let mut result = Self::fail(validator_name, message);
        result.reference = Some(reference.into());
        result
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn with_context_line(mut self, line: impl Into<String>) -> Self {
        self.context_lines.push(line.into());
        self
    }

    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    pub fn with_doc_link(mut self, link: impl Into<String>) -> Self {
        self.doc_link = Some(link.into());
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// A single check. Implementations live under [`crate::validators`].
/// `predicate` decides whether `validate` is even worth calling (most
/// validators only apply to specific subcommands); keeping that separate
/// from `validate` lets the dispatcher skip irrelevant validators without
/// paying for a subprocess call.
pub trait Validator: Send + Sync {
    fn name(&self) -> &str;
    fn category(&self) -> Category;

    /// Validators that shell out (`git`, `gh`, `markdownlint`) should
    /// return `true` so the dispatcher schedules them on the io-heavy
    /// sub-pool instead of the general one. Default: CPU-only.
    fn is_io_heavy(&self) -> bool {
        false
    }

    fn applies(&self, ctx: &ValidationContext) -> bool;
    fn validate(&self, ctx: &ValidationContext) -> ValidationResult;
}
