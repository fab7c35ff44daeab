//! Rule Engine (spec.md §4.3): a short-circuiting overlay that lets a user
//! allow, warn on, or block specific commands by pattern before any
//! validator runs. First match wins; an empty rule set (or "no rule
//! matched") is indistinguishable from having no overlay at all.

use std::collections::HashSet;

use regex::Regex;

use crate::error::DispatchError;
use crate::hook::{EventKind, HookContext, ToolKind, ToolPayload};
use crate::validator::{Registry, ValidationContext};

/// What a matching rule does. `Allow` short-circuits straight to ALLOW,
/// skipping validators entirely — the escape hatch for a known-safe command
/// a validator would otherwise flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    Allow,
    Warn,
    Block,
}

/// The user-facing (TOML) shape of one rule, before its predicate facets are
/// compiled. Every facet is a list; an empty list is a wildcard for that
/// facet (spec.md §4.3).
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct RawRule {
    #[serde(default)]
    pub event_kinds: Vec<String>,
    #[serde(default)]
    pub tool_kinds: Vec<String>,
    /// Regexes matched against the raw shell command string (shell-tool
    /// invocations). A rule with this facet never matches a non-shell tool.
    #[serde(default)]
    pub command_regexes: Vec<String>,
    /// Glob patterns matched against the file path (file-tool invocations).
    /// A rule with this facet never matches a shell-tool invocation.
    #[serde(default)]
    pub path_globs: Vec<String>,
    /// Only fires when the hook invocation would also have run at least one
    /// of these validators (by name), per that validator's own `applies()`.
    #[serde(default)]
    pub validator_names: Vec<String>,
    pub action: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// A rule's compiled predicate: the conjunction of its facets. A facet that
/// was left empty in the [`RawRule`] is a wildcard and never excludes a
/// match; a non-empty facet matches if *any* of its entries do.
pub struct Predicate {
    pub event_kinds: Vec<EventKind>,
    pub tool_kinds: Vec<ToolKind>,
    pub command_regexes: Vec<Regex>,
    pub path_globs: Vec<glob::Pattern>,
    pub validator_names: Vec<String>,
}

impl Predicate {
    fn matches(&self, hook: &HookContext, applicable_validators: &HashSet<&str>) -> bool {
        if !self.event_kinds.is_empty() && !self.event_kinds.contains(&hook.event_kind) {
            return false;
        }
        if !self.tool_kinds.is_empty() && !self.tool_kinds.contains(&hook.tool_kind) {
            return false;
        }
        if !self.command_regexes.is_empty() {
            let Some(command) = hook.shell_command() else {
                return false;
            };
            if !self.command_regexes.iter().any(|re| re.is_match(command)) {
                return false;
            }
        }
        if !self.path_globs.is_empty() {
            let path = match &hook.payload {
                ToolPayload::File { path, .. } => Some(path.as_str()),
                _ => None,
            };
            let Some(path) = path else {
                return false;
            };
            if !self.path_globs.iter().any(|g| g.matches(path)) {
                return false;
            }
        }
        if !self.validator_names.is_empty()
            && !self
                .validator_names
                .iter()
                .any(|name| applicable_validators.contains(name.as_str()))
        {
            return false;
        }
        true
    }
}

/// One compiled rule. Built from a [`RawRule`]; construction never fails —
/// a rule with any unparsable facet entry is dropped at load time (recorded
/// via [`DispatchError::InvalidRule`]) rather than taking down the dispatcher.
pub struct Rule {
    pub predicate: Predicate,
    pub action: RuleAction,
    pub message: Option<String>,
}

/// The outcome of a rule firing.
#[derive(Debug, Clone)]
pub struct RuleOutcome {
    pub action: RuleAction,
    pub message: Option<String>,
}

/// Ordered, compiled rule set. Evaluation is O(R) in the number of rules;
/// the first rule whose predicate matches wins.
pub struct RuleEngine {
    rules: Vec<Rule>,
}

impl RuleEngine {
    pub fn empty() -> Self {
        RuleEngine { rules: Vec::new() }
    }

    /// Compiles `raw` in order, dropping (not erroring on) any rule with an
    /// unrecognized action or an unparsable facet entry. Returns the engine
    /// plus one [`DispatchError::InvalidRule`] per dropped rule, for the
    /// diagnostic log.
    pub fn compile(raw: Vec<RawRule>) -> (Self, Vec<DispatchError>) {
        let mut rules = Vec::with_capacity(raw.len());
        let mut errors = Vec::new();

        'rules: for (index, r) in raw.into_iter().enumerate() {
            let action = match r.action.to_ascii_lowercase().as_str() {
                "allow" => RuleAction::Allow,
                "warn" => RuleAction::Warn,
                "block" => RuleAction::Block,
                other => {
                    errors.push(DispatchError::InvalidRule {
                        index,
                        reason: format!("unrecognized action `{other}`"),
                    });
                    continue;
                }
            };

            let mut event_kinds = Vec::with_capacity(r.event_kinds.len());
            for raw_kind in &r.event_kinds {
                match raw_kind.parse() {
                    Ok(kind) => event_kinds.push(kind),
                    Err(_) => {
                        errors.push(DispatchError::InvalidRule {
                            index,
                            reason: format!("unrecognized event kind `{raw_kind}`"),
                        });
                        continue 'rules;
                    }
                }
            }

            let mut tool_kinds = Vec::with_capacity(r.tool_kinds.len());
            for raw_kind in &r.tool_kinds {
                match raw_kind.parse() {
                    Ok(kind) => tool_kinds.push(kind),
                    Err(_) => {
                        errors.push(DispatchError::InvalidRule {
                            index,
                            reason: format!("unrecognized tool kind `{raw_kind}`"),
                        });
                        continue 'rules;
                    }
                }
            }

            let mut command_regexes = Vec::with_capacity(r.command_regexes.len());
            for pattern in &r.command_regexes {
                match Regex::new(pattern) {
                    Ok(re) => command_regexes.push(re),
                    Err(e) => {
                        errors.push(DispatchError::InvalidRule {
                            index,
                            reason: format!("invalid command regex `{pattern}`: {e}"),
                        });
                        continue 'rules;
                    }
                }
            }

            let mut path_globs = Vec::with_capacity(r.path_globs.len());
            for pattern in &r.path_globs {
                match glob::Pattern::new(pattern) {
                    Ok(g) => path_globs.push(g),
                    Err(e) => {
                        errors.push(DispatchError::InvalidRule {
                            index,
                            reason: format!("invalid path glob `{pattern}`: {e}"),
                        });
                        continue 'rules;
                    }
                }
            }

            rules.push(Rule {
                predicate: Predicate {
                    event_kinds,
                    tool_kinds,
                    command_regexes,
                    path_globs,
                    validator_names: r.validator_names,
                },
                action,
                message: r.message,
            });
        }

        (RuleEngine { rules }, errors)
    }

    /// Returns the first matching rule's outcome, or `None` if no rule
    /// applies (the overlay falls through to validator dispatch).
    ///
    /// `registry` is only consulted (and only once, total) if some rule
    /// carries a `validator_names` facet; a rule set with no such facet
    /// never runs a validator's `applies()` just to evaluate the overlay.
    pub fn evaluate(&self, ctx: &ValidationContext, registry: &Registry) -> Option<RuleOutcome> {
        let needs_validator_names = self.rules.iter().any(|r| !r.predicate.validator_names.is_empty());
        let applicable: HashSet<&str> = if needs_validator_names {
            registry.iter().filter(|v| v.applies(ctx)).map(|v| v.name()).collect()
        } else {
            HashSet::new()
        };

        for rule in &self.rules {
            if rule.predicate.matches(&ctx.hook, &applicable) {
                return Some(RuleOutcome {
                    action: rule.action,
                    message: rule.message.clone(),
                });
            }
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitquery::GitQueryView;
    use crate::hook::{EventKind, ToolPayload};
    use std::sync::Arc;

    fn ctx_with_command(command: &str) -> ValidationContext {
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
            pipeline: None,
            git: Arc::new(GitQueryView::unavailable("not a repository")),
        }
    }

    fn ctx_with_path(path: &str) -> ValidationContext {
        ValidationContext {
            hook: Arc::new(HookContext {
                event_kind: EventKind::PreToolUse,
                tool_kind: ToolKind::Write,
                payload: ToolPayload::File {
                    path: path.to_string(),
                    content: None,
                },
                session_id: None,
                tool_use_id: None,
                transcript_path: None,
                cwd: None,
                permission_mode: None,
            }),
            pipeline: None,
            git: Arc::new(GitQueryView::unavailable("not a repository")),
        }
    }

    fn rule(command_regex: &str, action: &str) -> RawRule {
        RawRule {
            command_regexes: vec![command_regex.to_string()],
            action: action.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn first_match_wins() {
        let (engine, errors) = RuleEngine::compile(vec![
            {
                let mut r = rule("^git push", "block");
                r.message = Some("no direct pushes".to_string());
                r
            },
            rule("^git", "allow"),
        ]);
        assert!(errors.is_empty());
        let registry = Registry::new();
        let outcome = engine
            .evaluate(&ctx_with_command("git push origin main"), &registry)
            .unwrap();
        assert_eq!(outcome.action, RuleAction::Block);
    }

    #[test]
    fn invalid_regex_is_dropped_not_fatal() {
        let (engine, errors) = RuleEngine::compile(vec![rule("(unclosed", "block")]);
        assert_eq!(errors.len(), 1);
        assert!(engine.is_empty());
    }

    #[test]
    fn no_match_falls_through() {
        let (engine, _) = RuleEngine::compile(vec![rule("^git push", "block")]);
        let registry = Registry::new();
        assert!(engine.evaluate(&ctx_with_command("git status"), &registry).is_none());
    }

    #[test]
    fn empty_rule_set_never_matches() {
        let engine = RuleEngine::empty();
        let registry = Registry::new();
        assert!(engine.evaluate(&ctx_with_command("git push"), &registry).is_none());
    }

    #[test]
    fn tool_kinds_facet_restricts_to_listed_tools() {
        let (engine, errors) = RuleEngine::compile(vec![RawRule {
            tool_kinds: vec!["write".to_string()],
            command_regexes: vec![".*".to_string()],
            action: "block".to_string(),
            ..Default::default()
        }]);
        assert!(errors.is_empty());
        let registry = Registry::new();
        // Shell-tool invocation: tool_kinds facet excludes it even though
        // this rule also has a command_regexes facet (no command to match
        // against a Shell-irrelevant rule fires via shell_command() == None).
        assert!(engine.evaluate(&ctx_with_command("git push"), &registry).is_none());
    }

    #[test]
    fn path_globs_facet_matches_file_tool_payload() {
        let (engine, errors) = RuleEngine::compile(vec![RawRule {
            path_globs: vec!["**/*.lock".to_string()],
            action: "warn".to_string(),
            ..Default::default()
        }]);
        assert!(errors.is_empty());
        let registry = Registry::new();
        let outcome = engine.evaluate(&ctx_with_path("Cargo.lock"), &registry).unwrap();
        assert_eq!(outcome.action, RuleAction::Warn);
        assert!(engine.evaluate(&ctx_with_path("Cargo.toml"), &registry).is_none());
    }

    #[test]
    fn invalid_path_glob_is_dropped_not_fatal() {
        let (engine, errors) = RuleEngine::compile(vec![RawRule {
            path_globs: vec!["[unclosed".to_string()],
            action: "block".to_string(),
            ..Default::default()
        }]);
        assert_eq!(errors.len(), 1);
        assert!(engine.is_empty());
    }

    #[test]
    fn validator_names_facet_requires_an_applicable_validator() {
        use crate::validator::{Category, Validator, ValidationResult};

        struct NamedValidator;
        impl Validator for NamedValidator {
            fn name(&self) -> &str {
                "commit-message"
            }
            fn category(&self) -> Category {
                Category::CommitMessage
            }
            fn applies(&self, _ctx: &ValidationContext) -> bool {
                true
            }
            fn validate(&self, _ctx: &ValidationContext) -> ValidationResult {
                ValidationResult::pass(self.name())
            }
        }

        let (engine, errors) = RuleEngine::compile(vec![RawRule {
            validator_names: vec!["commit-message".to_string()],
            action: "allow".to_string(),
            ..Default::default()
        }]);
        assert!(errors.is_empty());

        let mut registry = Registry::new();
        registry.register(Arc::new(NamedValidator));
        let outcome = engine.evaluate(&ctx_with_command("git commit -m x"), &registry);
        assert_eq!(outcome.unwrap().action, RuleAction::Allow);

        let empty_registry = Registry::new();
        assert!(engine
            .evaluate(&ctx_with_command("git commit -m x"), &empty_registry)
            .is_none());
    }
}
