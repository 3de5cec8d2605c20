//! Core domain logic for Scribe.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod rules;
pub mod search;
pub mod service;

pub use config::{ConfigError, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entry::{front_title, Entry, EntryDraft, EntryId, EntryPatch, EntryValidationError};
pub use model::history::HistoryRecord;
pub use model::rule::ContentRule;
pub use repo::entry_repo::{
    EntryListQuery, EntryOrder, EntryRepository, SortDirection, SqliteEntryRepository, StoreError,
    StoreResult,
};
pub use repo::history_repo::{HistoryRepository, SqliteHistoryRepository};
pub use repo::rule_repo::{RuleError, RuleRepository, RuleResult, SqliteRuleRepository};
pub use rules::{apply_rule_set, apply_rules, RuleApplication, SkippedRule};
pub use search::entries::{
    category_counts, search_exact, search_fuzzy, search_regex, search_threshold, search_title,
    sub_category_counts, QueryError, ThresholdHit,
};
pub use service::entry_service::EntryService;
pub use service::rule_service::RuleService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
