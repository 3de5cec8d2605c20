//! Search strategies over stored entries.
//!
//! # Responsibility
//! - Provide the independent content/title query strategies.
//! - Expose category navigation counts.
//!
//! # Invariants
//! - Search paths are read-only.
//! - Result ordering is deterministic per strategy.

pub mod entries;

pub use entries::{
    category_counts, search_exact, search_fuzzy, search_regex, search_threshold, search_title,
    sub_category_counts, QueryError, QueryResult, ThresholdHit,
};
