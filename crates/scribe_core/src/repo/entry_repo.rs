//! Entry repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over canonical `entries` storage.
//! - Derive `fronted_title` and `dynamic_content` before persisting.
//! - Capture the pre-mutation snapshot in the same transaction as every
//!   edit and delete.
//!
//! # Invariants
//! - Write paths validate input before SQL mutations.
//! - `edited` never moves earlier than `created`.
//! - No edit or delete commits without its paired history row.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::config::{ConfigError, StoreConfig};
use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::entry::{
    front_title, Entry, EntryDraft, EntryId, EntryPatch, EntryValidationError,
};
use crate::repo::history_repo::append_history_in_tx;
use crate::repo::{table_exists, table_has_column};
use crate::rules::pipeline::apply_rules;
use chrono::{NaiveDateTime, Timelike, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub(crate) const ENTRY_SELECT_SQL: &str = "SELECT
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
FROM entries";

pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DEFAULT_LIST_LIMIT: u32 = 50;
const MAX_LIST_LIMIT: u32 = 500;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from entry persistence and query operations.
#[derive(Debug)]
pub enum StoreError {
    /// Caller input failed validation before any SQL ran.
    Validation(EntryValidationError),
    /// Store configuration has an unusable bound.
    Config(ConfigError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target entry does not exist.
    EntryNotFound(EntryId),
    /// A mutation affected an unexpected number of rows.
    Constraint(String),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
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

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::EntryNotFound(id) => write!(f, "entry not found: {id}"),
            Self::Constraint(message) => write!(f, "storage constraint violated: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted entry data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "entry repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "entry repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "entry repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::EntryNotFound(_) => None,
            Self::Constraint(_) => None,
            Self::InvalidData(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<EntryValidationError> for StoreError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ConfigError> for StoreError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RowDecodeError> for StoreError {
    fn from(value: RowDecodeError) -> Self {
        match value {
            RowDecodeError::Sqlite(err) => Self::Db(DbError::Sqlite(err)),
            RowDecodeError::Invalid(message) => Self::InvalidData(message),
        }
    }
}

/// Decode failure for one persisted entry row.
///
/// Shared by every module that reads entry-shaped rows; converted into the
/// caller's own error enum at the boundary.
#[derive(Debug)]
pub(crate) enum RowDecodeError {
    Sqlite(rusqlite::Error),
    Invalid(String),
}

impl From<rusqlite::Error> for RowDecodeError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Sort key for entry listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryOrder {
    #[default]
    Created,
    Edited,
    Published,
    Title,
    Category,
}

/// Sort direction for entry listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Query options for listing entries.
///
/// A `limit` of `None` or 0 falls back to 50 and values above 500 are capped;
/// ties on the sort key break by `entry_id` ascending so pagination stays
/// stable.
#[derive(Debug, Clone, Default)]
pub struct EntryListQuery {
    pub category: Option<String>,
    pub sub_category: Option<String>,
    /// Restrict to entries that are published, non-draft, and not hidden.
    pub published_only: bool,
    pub order_by: EntryOrder,
    pub direction: SortDirection,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for entry CRUD operations.
pub trait EntryRepository {
    /// Inserts one entry, deriving `fronted_title` and `dynamic_content`.
    fn create_entry(&self, draft: &EntryDraft) -> StoreResult<EntryId>;
    /// Applies a partial update; returns the number of rows changed (1).
    fn edit_entry(
        &self,
        entry_id: EntryId,
        editor: &str,
        patch: &EntryPatch,
    ) -> StoreResult<usize>;
    /// Removes one entry; `false` when no row matched.
    fn delete_entry(&self, entry_id: EntryId) -> StoreResult<bool>;
    /// Loads one entry by id.
    fn get_entry(&self, entry_id: EntryId) -> StoreResult<Option<Entry>>;
    /// Lists entries with optional filters, ordering, and pagination.
    fn list_entries(&self, query: &EntryListQuery) -> StoreResult<Vec<Entry>>;
    /// Finds entries in one category whose title matches a LIKE pattern.
    /// Callers may embed `%`/`_` wildcards in `title`.
    fn find_by_category_and_title(
        &self,
        category: &str,
        title: &str,
        sub_category: Option<&str>,
    ) -> StoreResult<Vec<Entry>>;
}

/// SQLite-backed entry repository.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
    config: StoreConfig,
}

impl<'conn> SqliteEntryRepository<'conn> {
    /// Creates a repository from a migrated connection and validated limits.
    pub fn try_new(conn: &'conn Connection, config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        ensure_entry_connection_ready(conn)?;
        Ok(Self { conn, config })
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn create_entry(&self, draft: &EntryDraft) -> StoreResult<EntryId> {
        draft.validate(&self.config)?;

        let title = draft.title.trim();
        let fronted_title = front_title(title);
        let created = datetime_to_db(draft.created.unwrap_or_else(now_utc));

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let content = draft.content.trim();
        let derived = apply_rules(&tx, content)?;

        let changed = tx.execute(
            "INSERT INTO entries (
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
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, ?8, ?8, ?9, ?10, ?11);",
            params![
                draft.category.trim(),
                draft.sub_category.trim(),
                title,
                fronted_title,
                content,
                derived.output,
                draft.author.trim(),
                created,
                draft.published.map(datetime_to_db),
                bool_to_int(draft.is_draft),
                bool_to_int(draft.is_hidden),
            ],
        )?;
        if changed != 1 {
            return Err(StoreError::Constraint(format!(
                "entry insert affected {changed} rows"
            )));
        }

        let entry_id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(entry_id)
    }

    fn edit_entry(
        &self,
        entry_id: EntryId,
        editor: &str,
        patch: &EntryPatch,
    ) -> StoreResult<usize> {
        if entry_id <= 0 {
            return Err(EntryValidationError::NonPositiveId(entry_id).into());
        }
        let editor = editor.trim();
        if editor.is_empty() {
            return Err(EntryValidationError::EmptyFields(vec!["editor"]).into());
        }
        let editor_chars = editor.chars().count();
        if editor_chars > self.config.max_author_chars {
            return Err(EntryValidationError::FieldTooLong {
                field: "editor",
                max_chars: self.config.max_author_chars,
                actual_chars: editor_chars,
            }
            .into());
        }
        patch.validate(&self.config)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let old = match load_entry(&tx, entry_id)? {
            Some(entry) => entry,
            None => return Err(StoreError::EntryNotFound(entry_id)),
        };

        // Entries created with a future timestamp keep `edited >= created`.
        let edited = now_utc().max(old.created);

        let mut assignments: Vec<&'static str> = vec!["edited_by = ?", "edited = ?"];
        let mut bind_values: Vec<Value> = vec![
            Value::Text(editor.to_string()),
            Value::Text(datetime_to_db(edited)),
        ];

        if let Some(category) = patch.category_change() {
            assignments.push("category = ?");
            bind_values.push(Value::Text(category.to_string()));
        }
        if let Some(sub_category) = patch.sub_category_change() {
            assignments.push("sub_category = ?");
            bind_values.push(Value::Text(sub_category.to_string()));
        }
        if let Some(title) = patch.title_change() {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.to_string()));
            assignments.push("fronted_title = ?");
            bind_values.push(Value::Text(front_title(title)));
        }
        if let Some(content) = patch.content_change() {
            let derived = apply_rules(&tx, content)?;
            assignments.push("content = ?");
            bind_values.push(Value::Text(content.to_string()));
            assignments.push("dynamic_content = ?");
            bind_values.push(Value::Text(derived.output));
        }
        if let Some(published) = patch.published {
            assignments.push("published = ?");
            bind_values.push(Value::Text(datetime_to_db(published)));
        }
        if let Some(is_draft) = patch.is_draft {
            assignments.push("is_draft = ?");
            bind_values.push(Value::Integer(bool_to_int(is_draft)));
        }
        if let Some(is_hidden) = patch.is_hidden {
            assignments.push("is_hidden = ?");
            bind_values.push(Value::Integer(bool_to_int(is_hidden)));
        }
        bind_values.push(Value::Integer(entry_id));

        let sql = format!(
            "UPDATE entries SET {} WHERE entry_id = ?;",
            assignments.join(", ")
        );
        let changed = tx.execute(&sql, params_from_iter(bind_values))?;
        if changed != 1 {
            return Err(StoreError::Constraint(format!(
                "entry update affected {changed} rows for entry {entry_id}"
            )));
        }

        append_history_in_tx(&tx, &old)?;
        tx.commit()?;
        Ok(changed)
    }

    fn delete_entry(&self, entry_id: EntryId) -> StoreResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let old = match load_entry(&tx, entry_id)? {
            Some(entry) => entry,
            None => return Ok(false),
        };

        append_history_in_tx(&tx, &old)?;
        let changed = tx.execute("DELETE FROM entries WHERE entry_id = ?1;", [entry_id])?;
        tx.commit()?;
        Ok(changed == 1)
    }

    fn get_entry(&self, entry_id: EntryId) -> StoreResult<Option<Entry>> {
        load_entry(self.conn, entry_id)
    }

    fn list_entries(&self, query: &EntryListQuery) -> StoreResult<Vec<Entry>> {
        let mut sql = format!("{ENTRY_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(category) = query.category.as_deref() {
            sql.push_str(" AND category = ?");
            bind_values.push(Value::Text(category.to_string()));
        }
        if let Some(sub_category) = query.sub_category.as_deref() {
            sql.push_str(" AND sub_category = ?");
            bind_values.push(Value::Text(sub_category.to_string()));
        }
        if query.published_only {
            sql.push_str(" AND published IS NOT NULL AND is_draft = 0 AND is_hidden = 0");
        }

        sql.push_str(&format!(
            " ORDER BY {} {}, entry_id ASC",
            order_column(query.order_by),
            direction_sql(query.direction)
        ));

        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(normalize_entry_limit(
            query.limit,
        ))));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }

    fn find_by_category_and_title(
        &self,
        category: &str,
        title: &str,
        sub_category: Option<&str>,
    ) -> StoreResult<Vec<Entry>> {
        let mut sql = format!("{ENTRY_SELECT_SQL} WHERE category = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(category.to_string())];

        if let Some(sub_category) = sub_category {
            if !sub_category.trim().is_empty() {
                sql.push_str(" AND sub_category = ?");
                bind_values.push(Value::Text(sub_category.to_string()));
            }
        }

        sql.push_str(" AND title LIKE ? ORDER BY entry_id ASC;");
        bind_values.push(Value::Text(title.to_string()));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }
}

pub(crate) fn load_entry(conn: &Connection, entry_id: EntryId) -> StoreResult<Option<Entry>> {
    let mut stmt = conn.prepare(&format!("{ENTRY_SELECT_SQL} WHERE entry_id = ?1;"))?;
    let mut rows = stmt.query([entry_id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_entry_row(row)?));
    }
    Ok(None)
}

pub(crate) fn parse_entry_row(row: &Row<'_>) -> Result<Entry, RowDecodeError> {
    let created_text: String = row.get("created")?;
    let edited_text: String = row.get("edited")?;
    let published = row
        .get::<_, Option<String>>("published")?
        .map(|value| parse_datetime_col(&value, "published"))
        .transpose()?;

    Ok(Entry {
        entry_id: row.get("entry_id")?,
        category: row.get("category")?,
        sub_category: row.get("sub_category")?,
        title: row.get("title")?,
        fronted_title: row.get("fronted_title")?,
        content: row.get("content")?,
        dynamic_content: row.get("dynamic_content")?,
        created_by: row.get("created_by")?,
        edited_by: row.get("edited_by")?,
        created: parse_datetime_col(&created_text, "created")?,
        edited: parse_datetime_col(&edited_text, "edited")?,
        published,
        is_draft: parse_bool_col(row.get::<_, i64>("is_draft")?, "is_draft")?,
        is_hidden: parse_bool_col(row.get::<_, i64>("is_hidden")?, "is_hidden")?,
    })
}

fn parse_datetime_col(value: &str, column: &'static str) -> Result<NaiveDateTime, RowDecodeError> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT).map_err(|_| {
        RowDecodeError::Invalid(format!("invalid datetime `{value}` in column `{column}`"))
    })
}

fn parse_bool_col(value: i64, column: &'static str) -> Result<bool, RowDecodeError> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RowDecodeError::Invalid(format!(
            "invalid boolean value `{other}` in column `{column}`"
        ))),
    }
}

/// Current UTC wall clock truncated to whole seconds, the persisted precision.
pub(crate) fn now_utc() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

pub(crate) fn datetime_to_db(value: NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn normalize_entry_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) => DEFAULT_LIST_LIMIT,
        Some(value) if value > MAX_LIST_LIMIT => MAX_LIST_LIMIT,
        Some(value) => value,
        None => DEFAULT_LIST_LIMIT,
    }
}

fn order_column(order: EntryOrder) -> &'static str {
    match order {
        EntryOrder::Created => "created",
        EntryOrder::Edited => "edited",
        EntryOrder::Published => "published",
        EntryOrder::Title => "fronted_title",
        EntryOrder::Category => "category",
    }
}

fn direction_sql(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    }
}

fn ensure_entry_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["entries", "entry_history", "content_rules"] {
        if !table_exists(conn, table)? {
            return Err(StoreError::MissingRequiredTable(table));
        }
    }

    for column in [
        "entry_id",
        "category",
        "sub_category",
        "title",
        "fronted_title",
        "content",
        "dynamic_content",
        "created_by",
        "edited_by",
        "created",
        "edited",
        "published",
        "is_draft",
        "is_hidden",
    ] {
        if !table_has_column(conn, "entries", column)? {
            return Err(StoreError::MissingRequiredColumn {
                table: "entries",
                column,
            });
        }
    }

    Ok(())
}
