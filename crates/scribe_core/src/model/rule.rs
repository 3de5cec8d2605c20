//! Content rule model.
//!
//! # Responsibility
//! - Represent one pattern/replacement step of the content pipeline.
//!
//! # Invariants
//! - `rule_order` is the positive, unique position of the rule in the
//!   pipeline; rules apply in ascending order.
//! - `pattern` is unique across the rule set and stored exactly as given.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One ordered rewrite rule of the content pipeline.
///
/// `pattern` is a regular expression; `replacement` may interpolate capture
/// groups (`$1`, `$name`) per the usual replacement syntax. Patterns are not
/// compile-checked at authoring time: a stored pattern that fails to compile
/// degrades to a reported no-op when the pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRule {
    /// Pipeline position; also the storage primary key.
    pub rule_order: i64,
    /// Match expression, unique across all rules.
    pub pattern: String,
    /// Replacement text applied for every match.
    pub replacement: String,
}

impl ContentRule {
    /// Creates a rule from its parts.
    pub fn new(
        rule_order: i64,
        pattern: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            rule_order,
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    /// Compiles the stored pattern.
    pub fn compile(&self) -> Result<Regex, regex::Error> {
        Regex::new(&self.pattern)
    }
}
