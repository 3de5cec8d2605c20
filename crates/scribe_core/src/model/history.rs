//! Entry history snapshot model.
//!
//! # Responsibility
//! - Represent one captured pre-mutation entry state.
//!
//! # Invariants
//! - A snapshot is written exactly once and never altered afterwards.
//! - `entry.entry_id` names the owning entry, which may no longer exist.

use crate::model::entry::{Entry, EntryId};
use serde::{Deserialize, Serialize};

/// One immutable snapshot of an entry's state before a mutation.
///
/// Snapshots are appended by the entry store inside the same transaction as
/// the edit or delete that displaced them; there is no public write API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Storage-assigned snapshot identity, strictly increasing per append.
    pub history_id: i64,
    /// The full pre-mutation entry state, keyed by its owning `entry_id`.
    pub entry: Entry,
}

impl HistoryRecord {
    /// Returns the owning entry's identifier.
    pub fn entry_id(&self) -> EntryId {
        self.entry.entry_id
    }
}
