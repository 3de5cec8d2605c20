//! Content rule use-case service.
//!
//! # Responsibility
//! - Provide a stable rule-authoring API over the rule repository.
//!
//! # Invariants
//! - Service calls never bypass repository validation.

use crate::model::rule::ContentRule;
use crate::repo::rule_repo::{RuleRepository, RuleResult};

/// Use-case service wrapper over a rule repository.
pub struct RuleService<R: RuleRepository> {
    repo: R,
}

impl<R: RuleRepository> RuleService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds one rewrite rule at an explicit position.
    pub fn add_rule(&self, pattern: &str, replacement: &str, rule_order: i64) -> RuleResult<()> {
        self.repo.add_rule(pattern, replacement, rule_order)
    }

    /// Removes one rule; `false` when no rule has that order.
    pub fn delete_rule(&self, rule_order: i64) -> RuleResult<bool> {
        self.repo.delete_rule(rule_order)
    }

    /// Lists all rules ascending by order.
    pub fn list_rules(&self) -> RuleResult<Vec<ContentRule>> {
        self.repo.list_rules()
    }

    /// Applies a complete `(current_order, new_order)` permutation atomically.
    pub fn reorder_rules(&self, assignments: &[(i64, i64)]) -> RuleResult<()> {
        self.repo.reorder_rules(assignments)
    }
}
