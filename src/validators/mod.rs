//! Built-in validators (spec.md §4.6, §4.7). [`build_registry`] wires every
//! one up against a resolved [`Config`], respecting each validator's
//! per-name enable/disable toggle (spec.md §9's three-state design note).

mod branch_name;
mod commit_message;
mod fetch;
mod no_verify;
mod pr_create;
mod pr_merge;
mod push;

use std::sync::Arc;

use crate::config::Config;
use crate::validator::Registry;

pub use branch_name::BranchNameValidator;
pub use commit_message::CommitMessageValidator;
pub use fetch::FetchValidator;
pub use no_verify::NoVerifyValidator;
pub use pr_create::PrCreateValidator;
pub use pr_merge::PrMergeValidator;
pub use push::PushValidator;

/// Every built-in validator is enabled by default; `config.validators`
/// overrides are looked up by this same name (spec.md §4.5).
pub fn build_registry(config: &Config) -> Registry {
    let mut registry = Registry::new();

    if config.validator_enabled("commit-message", true) {
        registry.register(Arc::new(CommitMessageValidator::new(config)));
    }
    if config.validator_enabled("no-verify", true) {
        registry.register(Arc::new(NoVerifyValidator::new(config)));
    }
    if config.validator_enabled("branch-name", true) {
        registry.register(Arc::new(BranchNameValidator::new(config)));
    }
    if config.validator_enabled("push", true) {
        registry.register(Arc::new(PushValidator::new(config)));
    }
    if config.validator_enabled("fetch", true) {
        registry.register(Arc::new(FetchValidator::new(config)));
    }
    if config.validator_enabled("pr-create", true) {
        registry.register(Arc::new(PrCreateValidator::new(config)));
    }
    if config.validator_enabled("pr-merge", true) {
        registry.register(Arc::new(PrMergeValidator::new(config)));
    }

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_registers_every_builtin() {
        let registry = build_registry(&Config::default());
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn explicit_disable_removes_it_from_the_registry() {
        let mut config = Config::default();
        config.validators.insert("push".to_string(), Some(false));
        let registry = build_registry(&config);
        assert_eq!(registry.len(), 6);
        assert!(registry.iter().all(|v| v.name() != "push"));
    }
}
