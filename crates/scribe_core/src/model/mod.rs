//! Domain models for entries, history snapshots, and content rules.
//!
//! # Responsibility
//! - Define the canonical records shared by repositories, search, and services.
//! - Keep derivation and validation rules next to the data they govern.
//!
//! # Invariants
//! - Every entry is identified by a positive, storage-assigned `EntryId`.
//! - History snapshots are immutable copies of prior entry states.

pub mod entry;
pub mod history;
pub mod rule;
