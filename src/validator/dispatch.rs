//! Bounded-parallel dispatcher (spec.md §4.4, §5): runs every applicable
//! validator across two Rayon worker pools (CPU-bound and io-heavy), folds
//! their results deterministically, and never hangs past `global_timeout`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel as chan;

use super::registry::Registry;
use super::{Severity, ValidationContext, ValidationResult};
use crate::error::DispatchError;

/// Cooperative cancellation flag threaded through every validator call and
/// every `GitQuery`/subprocess invocation. Checking it is cheap (an atomic
/// load) so validators are expected to poll it at natural suspension
/// points rather than only at entry.
#[derive(Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

pub struct DispatchConfig {
    /// Default: `min(4, available_parallelism)`.
    pub general_workers: usize,
    /// Default: 2. Subprocess-backed validators (`git`, `gh`,
    /// `markdownlint`) run here so a slow external tool can't starve the
    /// CPU-bound checks.
    pub io_workers: usize,
    /// Default: 30s. Once elapsed, the dispatcher cancels outstanding work
    /// and folds whatever results arrived in time.
    pub global_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        DispatchConfig {
            general_workers: available.min(4),
            io_workers: 2,
            global_timeout: Duration::from_secs(30),
        }
    }
}

/// The dispatcher's overall verdict, derived from the deterministic fold
/// rule: any `should_block` result wins over any mere warning, which wins
/// over an unqualified allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Block,
    AllowWithWarnings,
    Allow,
}

pub struct DispatchOutcome {
    pub decision: Decision,
    /// Non-passing results only, sorted severity desc, then reference
    /// code asc, then validator name asc — the order is deterministic
    /// regardless of the nondeterministic completion order of the workers
    /// that produced them (spec.md §5).
    pub results: Vec<ValidationResult>,
    /// Set when `global_timeout` elapsed before every validator reported.
    pub timed_out: bool,
}

pub struct Dispatcher {
    registry: Registry,
    general_pool: rayon::ThreadPool,
    io_pool: rayon::ThreadPool,
    global_timeout: Duration,
}

impl Dispatcher {
    pub fn new(registry: Registry, config: DispatchConfig) -> Result<Self, DispatchError> {
        let general_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.general_workers.max(1))
            .thread_name(|i| format!("hookguard-validator-{i}"))
            .build()
            .map_err(|e| DispatchError::DispatcherFailed(e.to_string()))?;
        let io_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.io_workers.max(1))
            .thread_name(|i| format!("hookguard-validator-io-{i}"))
            .build()
            .map_err(|e| DispatchError::DispatcherFailed(e.to_string()))?;

        Ok(Dispatcher {
            registry,
            general_pool,
            io_pool,
            global_timeout: config.global_timeout,
        })
    }

    /// Runs every validator whose `applies()` predicate matches, waits up
    /// to `global_timeout` total, and folds the results.
    pub fn dispatch(&self, ctx: Arc<ValidationContext>, cancel: &CancellationToken) -> DispatchOutcome {
        let applicable: Vec<_> = self
            .registry
            .iter()
            .filter(|v| v.applies(&ctx))
            .cloned()
            .collect();

        if applicable.is_empty() {
            return DispatchOutcome {
                decision: Decision::Allow,
                results: Vec::new(),
                timed_out: false,
            };
        }

        let (tx, rx) = chan::bounded::<ValidationResult>(applicable.len());

        for validator in applicable.iter().cloned() {
            let ctx = Arc::clone(&ctx);
            let tx = tx.clone();
            let cancel = cancel.clone();
            let task = move || {
                if cancel.is_cancelled() {
                    return;
                }
                let result = validator.validate(&ctx);
                let _ = tx.send(result);
            };
            if validator.is_io_heavy() {
                self.io_pool.spawn(task);
            } else {
                self.general_pool.spawn(task);
            }
        }
        drop(tx);

        let deadline = Instant::now() + self.global_timeout;
        let mut results = Vec::with_capacity(applicable.len());
        let mut timed_out = false;

        for _ in 0..applicable.len() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                timed_out = true;
                cancel.cancel();
                break;
            }
            match rx.recv_timeout(remaining) {
                Ok(result) => {
                    let blocked = result.should_block;
                    results.push(result);
                    if blocked {
                        // Block already wins the fold no matter what else
                        // arrives; cancel outstanding work and stop waiting.
                        cancel.cancel();
                        break;
                    }
                }
                Err(_) => {
                    timed_out = true;
                    cancel.cancel();
                    break;
                }
            }
        }

        fold(results, timed_out)
    }
}

fn fold(mut results: Vec<ValidationResult>, timed_out: bool) -> DispatchOutcome {
    results.retain(|r| !r.passed);
    results.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.reference.cmp(&b.reference))
            .then_with(|| a.validator_name.cmp(&b.validator_name))
    });

    let decision = if results.iter().any(|r| r.should_block) {
        Decision::Block
    } else if results.iter().any(|r| r.severity >= Severity::Warning) {
        Decision::AllowWithWarnings
    } else {
        Decision::Allow
    };

    DispatchOutcome {
        decision,
        results,
        timed_out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitquery::GitQueryView;
    use crate::hook::{EventKind, HookContext, ToolKind, ToolPayload};
    use crate::validator::{Category, Validator};

    struct AlwaysBlocks;
    impl Validator for AlwaysBlocks {
        fn name(&self) -> &str {
            "always-blocks"
        }
        fn category(&self) -> Category {
            Category::Other
        }
        fn applies(&self, _ctx: &ValidationContext) -> bool {
            true
        }
        fn validate(&self, _ctx: &ValidationContext) -> ValidationResult {
            ValidationResult::fail_with_ref(self.name(), "TEST-BLOCK", "nope")
        }
    }

    struct AlwaysWarns;
    impl Validator for AlwaysWarns {
        fn name(&self) -> &str {
            "always-warns"
        }
        fn category(&self) -> Category {
            Category::Other
        }
        fn applies(&self, _ctx: &ValidationContext) -> bool {
            true
        }
        fn validate(&self, _ctx: &ValidationContext) -> ValidationResult {
            ValidationResult::warn(self.name(), "careful")
        }
    }

    fn context() -> Arc<ValidationContext> {
        Arc::new(ValidationContext {
            hook: Arc::new(HookContext {
                event_kind: EventKind::PreToolUse,
                tool_kind: ToolKind::Shell,
                payload: ToolPayload::Shell {
                    command: "git push".to_string(),
                },
                session_id: None,
                tool_use_id: None,
                transcript_path: None,
                cwd: None,
                permission_mode: None,
            }),
            pipeline: None,
            git: Arc::new(GitQueryView::unavailable("not a repository")),
        })
    }

    #[test]
    fn blocking_result_wins_over_warning() {
        let mut registry = Registry::new();
        registry.register(Arc::new(AlwaysBlocks));
        registry.register(Arc::new(AlwaysWarns));
        let dispatcher = Dispatcher::new(registry, DispatchConfig::default()).unwrap();
        let outcome = dispatcher.dispatch(context(), &CancellationToken::new());
        assert_eq!(outcome.decision, Decision::Block);
        // The dispatcher cancels outstanding work as soon as a block arrives,
        // so whether the warning also made it in before the cutoff is a race;
        // only the block itself, and its priority in the fold, are guaranteed.
        assert_eq!(outcome.results[0].reference.as_deref(), Some("TEST-BLOCK"));
    }

    #[test]
    fn block_cancels_the_token_for_outstanding_work() {
        let mut registry = Registry::new();
        registry.register(Arc::new(AlwaysBlocks));
        let dispatcher = Dispatcher::new(registry, DispatchConfig::default()).unwrap();
        let cancel = CancellationToken::new();
        let outcome = dispatcher.dispatch(context(), &cancel);
        assert_eq!(outcome.decision, Decision::Block);
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn no_applicable_validators_allows() {
        struct NeverApplies;
        impl Validator for NeverApplies {
            fn name(&self) -> &str {
                "never"
            }
            fn category(&self) -> Category {
                Category::Other
            }
            fn applies(&self, _ctx: &ValidationContext) -> bool {
                false
            }
            fn validate(&self, _ctx: &ValidationContext) -> ValidationResult {
                unreachable!()
            }
        }
        let mut registry = Registry::new();
        registry.register(Arc::new(NeverApplies));
        let dispatcher = Dispatcher::new(registry, DispatchConfig::default()).unwrap();
        let outcome = dispatcher.dispatch(context(), &CancellationToken::new());
        assert_eq!(outcome.decision, Decision::Allow);
        assert!(outcome.results.is_empty());
    }
}
