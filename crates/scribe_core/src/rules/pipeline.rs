//! Ordered rewrite pipeline for entry content.
//!
//! # Responsibility
//! - Apply every stored rule to a content string, in `rule_order`.
//! - Report which rules were skipped because their pattern fails to compile.
//!
//! # Invariants
//! - Rules run in ascending `rule_order`; each rule sees the output of the
//!   rules before it.
//! - A rule whose pattern does not compile is skipped; the remaining rules
//!   still run.
//! - The pipeline never fails a write because of a malformed rule.

use crate::db::DbResult;
use crate::model::rule::ContentRule;
use log::{debug, warn};
use rusqlite::Connection;

/// Outcome of running content through the rule pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleApplication {
    /// Content after every applicable rule ran.
    pub output: String,
    /// Count of rules executed, whether or not they matched.
    pub applied_rules: usize,
    /// Rules that could not run, in the order they were encountered.
    pub skipped: Vec<SkippedRule>,
}

/// A rule the pipeline could not execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRule {
    pub rule_order: i64,
    pub pattern: String,
    pub message: String,
}

/// Loads the persisted rule set and rewrites `content` through it.
///
/// # Errors
/// - Returns `DbError::Sqlite` when the rule set cannot be read.
pub fn apply_rules(conn: &Connection, content: &str) -> DbResult<RuleApplication> {
    let rules = load_rules_ordered(conn)?;
    Ok(apply_rule_set(&rules, content))
}

/// Rewrites `content` through `rules`, assumed sorted by `rule_order`.
///
/// Replacement strings may reference capture groups (`$1`, `$name`).
/// Malformed patterns are skipped and reported in the result.
pub fn apply_rule_set(rules: &[ContentRule], content: &str) -> RuleApplication {
    let mut output = content.to_string();
    let mut applied_rules = 0usize;
    let mut skipped = Vec::new();

    for rule in rules {
        match rule.compile() {
            Ok(regex) => {
                output = regex
                    .replace_all(&output, rule.replacement.as_str())
                    .into_owned();
                applied_rules += 1;
            }
            Err(err) => {
                let message = err.to_string();
                warn!(
                    "event=rule_skip module=rules status=error rule_order={} error={}",
                    rule.rule_order, message
                );
                skipped.push(SkippedRule {
                    rule_order: rule.rule_order,
                    pattern: rule.pattern.clone(),
                    message,
                });
            }
        }
    }

    debug!(
        "event=rules_apply module=rules status=ok applied={} skipped={}",
        applied_rules,
        skipped.len()
    );

    RuleApplication {
        output,
        applied_rules,
        skipped,
    }
}

pub(crate) fn load_rules_ordered(conn: &Connection) -> DbResult<Vec<ContentRule>> {
    let mut stmt = conn.prepare(
        "SELECT rule_order, pattern, replacement FROM content_rules ORDER BY rule_order ASC",
    )?;
    let mut rows = stmt.query([])?;

    let mut rules = Vec::new();
    while let Some(row) = rows.next()? {
        rules.push(ContentRule {
            rule_order: row.get(0)?,
            pattern: row.get(1)?,
            replacement: row.get(2)?,
        });
    }
    Ok(rules)
}
