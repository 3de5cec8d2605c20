//! Content rewriting over stored, ordered rules.
//!
//! # Responsibility
//! - Load the persisted rule set in order.
//! - Rewrite entry content through the rule pipeline.
//!
//! # Invariants
//! - Rules apply in ascending `rule_order`.
//! - A malformed rule is skipped and logged, never fatal.

pub mod pipeline;

pub use pipeline::{apply_rule_set, apply_rules, RuleApplication, SkippedRule};
