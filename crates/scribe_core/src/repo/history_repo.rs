//! Entry history repository: append-only pre-mutation snapshots.
//!
//! # Responsibility
//! - Read the audit trail for one entry.
//! - Provide the in-transaction append used by the entry store.
//!
//! # Invariants
//! - Appends happen only inside an entry mutation's transaction; there is
//!   no public mutation API.
//! - Stored records are never updated or deleted.
//! - Snapshots survive deletion of their owning entry.

use crate::db::migrations::latest_version;
use crate::model::entry::{Entry, EntryId};
use crate::model::history::HistoryRecord;
use crate::repo::entry_repo::{
    bool_to_int, datetime_to_db, parse_entry_row, RowDecodeError, StoreError, StoreResult,
};
use crate::repo::{table_exists, table_has_column};
use rusqlite::{params, Connection, Row};

const HISTORY_SELECT_SQL: &str = "SELECT
    history_id,
    entry_id,
    category,
    sub_category,
    title,
    fronted_title,
    content,
    dynamic_content,
    created_by,
    edited_by,
    created,
    edited,
    published,
    is_draft,
    is_hidden
FROM entry_history";

/// Repository interface for reading entry history.
pub trait HistoryRepository {
    /// Lists every snapshot for one entry, oldest first.
    fn history_for_entry(&self, entry_id: EntryId) -> StoreResult<Vec<HistoryRecord>>;
    /// Counts stored snapshots for one entry.
    fn history_count(&self, entry_id: EntryId) -> StoreResult<u64>;
}

/// SQLite-backed history repository.
pub struct SqliteHistoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHistoryRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_history_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl HistoryRepository for SqliteHistoryRepository<'_> {
    fn history_for_entry(&self, entry_id: EntryId) -> StoreResult<Vec<HistoryRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{HISTORY_SELECT_SQL} WHERE entry_id = ?1 ORDER BY history_id ASC;"
        ))?;
        let mut rows = stmt.query([entry_id])?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_history_row(row)?);
        }
        Ok(records)
    }

    fn history_count(&self, entry_id: EntryId) -> StoreResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM entry_history WHERE entry_id = ?1;",
            [entry_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

/// Inserts the pre-mutation snapshot of `entry` inside the caller's
/// transaction. The entry store calls this from its edit/delete transactions
/// so the snapshot and the mutation commit together.
pub(crate) fn append_history_in_tx(conn: &Connection, entry: &Entry) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO entry_history (
            entry_id,
            category,
            sub_category,
            title,
            fronted_title,
            content,
            dynamic_content,
            created_by,
            edited_by,
            created,
            edited,
            published,
            is_draft,
            is_hidden
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14);",
        params![
            entry.entry_id,
            entry.category,
            entry.sub_category,
            entry.title,
            entry.fronted_title,
            entry.content,
            entry.dynamic_content,
            entry.created_by,
            entry.edited_by,
            datetime_to_db(entry.created),
            datetime_to_db(entry.edited),
            entry.published.map(datetime_to_db),
            bool_to_int(entry.is_draft),
            bool_to_int(entry.is_hidden),
        ],
    )?;
    Ok(())
}

fn parse_history_row(row: &Row<'_>) -> Result<HistoryRecord, RowDecodeError> {
    Ok(HistoryRecord {
        history_id: row.get("history_id")?,
        entry: parse_entry_row(row)?,
    })
}

fn ensure_history_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "entry_history")? {
        return Err(StoreError::MissingRequiredTable("entry_history"));
    }

    for column in ["history_id", "entry_id", "content", "edited"] {
        if !table_has_column(conn, "entry_history", column)? {
            return Err(StoreError::MissingRequiredColumn {
                table: "entry_history",
                column,
            });
        }
    }

    Ok(())
}
