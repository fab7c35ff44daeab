//! Response Builder (spec.md §4.8, §6): turns a [`DispatchOutcome`] (or a
//! rule-engine short-circuit) into the JSON envelope printed on stdout and
//! the process exit code.

use serde::Serialize;

use crate::rules::{RuleAction, RuleOutcome};
use crate::validator::{Decision, DispatchOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionDecision {
    Allow,
    Deny,
}

impl PermissionDecision {
    fn as_str(self) -> &'static str {
        match self {
            PermissionDecision::Allow => "allow",
            PermissionDecision::Deny => "deny",
        }
    }
}

impl Serialize for PermissionDecision {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// The JSON document printed on stdout (spec.md §6). Field names are
/// `camelCase` to match the host AI's own convention, not this crate's.
#[derive(Debug, Serialize)]
pub struct Response {
    #[serde(rename = "permissionDecision")]
    pub permission_decision: PermissionDecision,
    #[serde(rename = "permissionDecisionReason")]
    pub permission_decision_reason: String,
    #[serde(rename = "systemMessage")]
    pub system_message: String,
    #[serde(rename = "additionalContext")]
    pub additional_context: String,
}

impl Response {
    pub fn exit_code(&self) -> i32 {
        match self.permission_decision {
            PermissionDecision::Deny => 2,
            PermissionDecision::Allow => 0,
        }
    }

    pub fn allow() -> Self {
        Response {
            permission_decision: PermissionDecision::Allow,
            permission_decision_reason: String::new(),
            system_message: String::new(),
            additional_context: String::new(),
        }
    }

    pub fn from_rule_outcome(outcome: &RuleOutcome) -> Self {
        match outcome.action {
            RuleAction::Allow => Response::allow(),
            RuleAction::Warn => Response {
                permission_decision: PermissionDecision::Allow,
                permission_decision_reason: outcome.message.clone().unwrap_or_default(),
                system_message: outcome.message.clone().unwrap_or_default(),
                additional_context: "allowed with a warning from a configured rule".to_string(),
            },
            RuleAction::Block => Response {
                permission_decision: PermissionDecision::Deny,
                permission_decision_reason: outcome
                    .message
                    .clone()
                    .unwrap_or_else(|| "blocked by a configured rule".to_string()),
                system_message: outcome.message.clone().unwrap_or_default(),
                additional_context: "blocked by a configured rule before any validator ran".to_string(),
            },
        }
    }

    pub fn from_dispatch_outcome(outcome: &DispatchOutcome) -> Self {
        if outcome.results.is_empty() {
            let mut response = Response::allow();
            if outcome.timed_out {
                response.system_message =
                    "validation timed out before completing; allowed by default".to_string();
            }
            return response;
        }

        let primary = &outcome.results[0];
        let reason = primary
            .primary_message
            .clone()
            .unwrap_or_else(|| "a validator reported an issue".to_string());

        let mut additional_context = String::new();
        for result in &outcome.results {
            let reference = result.reference.as_deref().unwrap_or("UNREFERENCED");
            additional_context.push_str(&format!(
                "[{}] {}: {}\n",
                reference,
                result.validator_name,
                result.primary_message.as_deref().unwrap_or("")
            ));
            for line in &result.context_lines {
                additional_context.push_str(&format!("  - {line}\n"));
            }
            if let Some(hint) = &result.fix_hint {
                additional_context.push_str(&format!("  fix: {hint}\n"));
            }
            if let Some(link) = &result.doc_link {
                additional_context.push_str(&format!("  doc: {link}\n"));
            }
            for (key, value) in &result.details {
                additional_context.push_str(&format!("  {key}: {value}\n"));
            }
        }
        if outcome.timed_out {
            additional_context.push_str("(validation timed out; results above are partial)\n");
        }

        let decision = match outcome.decision {
            Decision::Block => PermissionDecision::Deny,
            Decision::AllowWithWarnings | Decision::Allow => PermissionDecision::Allow,
        };

        let system_message = match outcome.decision {
            Decision::Block => format!(
                "blocked: {} ({})",
                reason,
                primary.reference.as_deref().unwrap_or("UNREFERENCED")
            ),
            Decision::AllowWithWarnings => format!("allowed with warnings: {reason}"),
            Decision::Allow => String::new(),
        };

        Response {
            permission_decision: decision,
            permission_decision_reason: reason,
            system_message,
            additional_context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{Severity, ValidationResult};

    #[test]
    fn empty_outcome_allows_silently() {
        let outcome = DispatchOutcome {
            decision: Decision::Allow,
            results: Vec::new(),
            timed_out: false,
        };
        let response = Response::from_dispatch_outcome(&outcome);
        assert_eq!(response.exit_code(), 0);
        assert_eq!(response.permission_decision, PermissionDecision::Allow);
    }

    #[test]
    fn block_outcome_exits_two_with_primary_reference() {
        let result = ValidationResult::fail_with_ref("commit-message", "GIT-MISSING-FLAGS", "missing flags");
        let outcome = DispatchOutcome {
            decision: Decision::Block,
            results: vec![result],
            timed_out: false,
        };
        let response = Response::from_dispatch_outcome(&outcome);
        assert_eq!(response.exit_code(), 2);
        assert!(response.system_message.contains("GIT-MISSING-FLAGS"));
    }

    #[test]
    fn warn_outcome_allows_with_exit_zero() {
        let mut result = ValidationResult::warn("push", "risky remote");
        result.severity = Severity::Warning;
        let outcome = DispatchOutcome {
            decision: Decision::AllowWithWarnings,
            results: vec![result],
            timed_out: false,
        };
        let response = Response::from_dispatch_outcome(&outcome);
        assert_eq!(response.exit_code(), 0);
    }

    #[test]
    fn rule_block_denies_before_any_validator() {
        let outcome = RuleOutcome {
            action: RuleAction::Block,
            message: Some("nope".to_string()),
        };
        let response = Response::from_rule_outcome(&outcome);
        assert_eq!(response.exit_code(), 2);
    }
}
