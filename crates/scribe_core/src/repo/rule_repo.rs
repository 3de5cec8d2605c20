//! Content rule repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the ordered pattern/replacement rule set.
//! - Keep rule ordering changes atomic.
//!
//! # Invariants
//! - `rule_order` is positive and unique; `pattern` is unique.
//! - Reordering accepts only a complete permutation of the stored rules and
//!   persists all of it or none of it.
//! - Patterns are stored as written; compilation is checked at apply time,
//!   not at insert time.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::rule::ContentRule;
use crate::repo::{table_exists, table_has_column};
use crate::rules::pipeline::load_rules_ordered;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RuleResult<T> = Result<T, RuleError>;

/// Errors from rule authoring operations.
#[derive(Debug)]
pub enum RuleError {
    /// Pattern was blank after trimming.
    BlankPattern,
    /// Rule order keys must be positive.
    NonPositiveOrder(i64),
    /// Another rule already uses this pattern.
    DuplicatePattern(String),
    /// Another rule already uses this order key.
    DuplicateOrder(i64),
    /// Reorder input is not a complete permutation of the stored rules.
    InvalidPermutation(String),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RuleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankPattern => write!(f, "rule pattern cannot be blank"),
            Self::NonPositiveOrder(order) => {
                write!(f, "rule order must be positive, got {order}")
            }
            Self::DuplicatePattern(pattern) => {
                write!(f, "a rule with pattern `{pattern}` already exists")
            }
            Self::DuplicateOrder(order) => {
                write!(f, "a rule with order {order} already exists")
            }
            Self::InvalidPermutation(message) => {
                write!(f, "invalid rule permutation: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "rule repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "rule repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "rule repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RuleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RuleError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RuleError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for content rule authoring.
pub trait RuleRepository {
    /// Inserts one rule. The pattern is stored as written and not
    /// compile-checked; a bad pattern degrades to a logged skip at apply time.
    fn add_rule(&self, pattern: &str, replacement: &str, rule_order: i64) -> RuleResult<()>;
    /// Removes one rule; `false` when no rule has that order.
    fn delete_rule(&self, rule_order: i64) -> RuleResult<bool>;
    /// Lists all rules ascending by order.
    fn list_rules(&self) -> RuleResult<Vec<ContentRule>>;
    /// Applies a complete `(current_order, new_order)` permutation, all or
    /// nothing.
    fn reorder_rules(&self, assignments: &[(i64, i64)]) -> RuleResult<()>;
}

/// SQLite-backed rule repository.
pub struct SqliteRuleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRuleRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RuleResult<Self> {
        ensure_rule_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl RuleRepository for SqliteRuleRepository<'_> {
    fn add_rule(&self, pattern: &str, replacement: &str, rule_order: i64) -> RuleResult<()> {
        if pattern.trim().is_empty() {
            return Err(RuleError::BlankPattern);
        }
        if rule_order <= 0 {
            return Err(RuleError::NonPositiveOrder(rule_order));
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let order_taken: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM content_rules WHERE rule_order = ?1);",
            [rule_order],
            |row| row.get(0),
        )?;
        if order_taken == 1 {
            return Err(RuleError::DuplicateOrder(rule_order));
        }

        let pattern_taken: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM content_rules WHERE pattern = ?1);",
            [pattern],
            |row| row.get(0),
        )?;
        if pattern_taken == 1 {
            return Err(RuleError::DuplicatePattern(pattern.to_string()));
        }

        tx.execute(
            "INSERT INTO content_rules (rule_order, pattern, replacement)
             VALUES (?1, ?2, ?3);",
            params![rule_order, pattern, replacement],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete_rule(&self, rule_order: i64) -> RuleResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM content_rules WHERE rule_order = ?1;",
            [rule_order],
        )?;
        Ok(changed == 1)
    }

    fn list_rules(&self) -> RuleResult<Vec<ContentRule>> {
        Ok(load_rules_ordered(self.conn)?)
    }

    fn reorder_rules(&self, assignments: &[(i64, i64)]) -> RuleResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let existing = load_rule_orders(&tx)?;
        validate_permutation(&existing, assignments)?;

        // Two phases keep the primary key unique while orders swap: every
        // rule is first parked at its negated target, then the signs flip.
        for (current_order, new_order) in assignments {
            tx.execute(
                "UPDATE content_rules SET rule_order = ?2 WHERE rule_order = ?1;",
                params![current_order, -new_order],
            )?;
        }
        tx.execute(
            "UPDATE content_rules SET rule_order = -rule_order WHERE rule_order < 0;",
            [],
        )?;

        tx.commit()?;
        Ok(())
    }
}

fn load_rule_orders(conn: &Connection) -> RuleResult<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT rule_order FROM content_rules ORDER BY rule_order ASC;")?;
    let mut rows = stmt.query([])?;

    let mut orders = Vec::new();
    while let Some(row) = rows.next()? {
        orders.push(row.get(0)?);
    }
    Ok(orders)
}

fn validate_permutation(existing: &[i64], assignments: &[(i64, i64)]) -> RuleResult<()> {
    if assignments.len() != existing.len() {
        return Err(RuleError::InvalidPermutation(format!(
            "expected {} assignments, got {}",
            existing.len(),
            assignments.len()
        )));
    }

    let existing_set: HashSet<i64> = existing.iter().copied().collect();
    let mut seen_currents = HashSet::new();
    let mut seen_news = HashSet::new();

    for (current_order, new_order) in assignments {
        if !existing_set.contains(current_order) {
            return Err(RuleError::InvalidPermutation(format!(
                "no rule has order {current_order}"
            )));
        }
        if !seen_currents.insert(*current_order) {
            return Err(RuleError::InvalidPermutation(format!(
                "order {current_order} assigned twice"
            )));
        }
        if *new_order <= 0 {
            return Err(RuleError::InvalidPermutation(format!(
                "new order {new_order} is not positive"
            )));
        }
        if !seen_news.insert(*new_order) {
            return Err(RuleError::InvalidPermutation(format!(
                "new order {new_order} used twice"
            )));
        }
    }

    Ok(())
}

fn ensure_rule_connection_ready(conn: &Connection) -> RuleResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RuleError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "content_rules")? {
        return Err(RuleError::MissingRequiredTable("content_rules"));
    }

    for column in ["rule_order", "pattern", "replacement"] {
        if !table_has_column(conn, "content_rules", column)? {
            return Err(RuleError::MissingRequiredColumn {
                table: "content_rules",
                column,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_permutation, RuleError};

    #[test]
    fn complete_permutation_is_accepted() {
        assert!(validate_permutation(&[1, 2, 3], &[(1, 3), (2, 1), (3, 2)]).is_ok());
    }

    #[test]
    fn missing_assignment_is_rejected() {
        let err = validate_permutation(&[1, 2, 3], &[(1, 3), (2, 1)]).unwrap_err();
        assert!(matches!(err, RuleError::InvalidPermutation(_)));
    }

    #[test]
    fn duplicate_new_order_is_rejected() {
        let err = validate_permutation(&[1, 2], &[(1, 5), (2, 5)]).unwrap_err();
        assert!(matches!(err, RuleError::InvalidPermutation(_)));
    }

    #[test]
    fn unknown_current_order_is_rejected() {
        let err = validate_permutation(&[1, 2], &[(1, 2), (9, 1)]).unwrap_err();
        assert!(matches!(err, RuleError::InvalidPermutation(_)));
    }

    #[test]
    fn non_positive_new_order_is_rejected() {
        let err = validate_permutation(&[1, 2], &[(1, 0), (2, 1)]).unwrap_err();
        assert!(matches!(err, RuleError::InvalidPermutation(_)));
    }
}
