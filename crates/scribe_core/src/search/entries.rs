//! Entry search strategies and category navigation counts.
//!
//! # Responsibility
//! - Execute the content query strategies (exact, fuzzy, threshold, regex)
//!   plus title search.
//! - Aggregate category and sub-category entry counts for navigation.
//!
//! # Invariants
//! - Blank query text degrades exact/fuzzy/title to a `%%` needle that
//!   matches every entry; threshold stays empty because zero scores are
//!   excluded.
//! - Exact/fuzzy/regex/title results are ordered `entry_id ASC`.
//! - Threshold results are ordered score descending, ties by `entry_id ASC`;
//!   zero scores are excluded.
//! - An invalid regex pattern is an error, never an empty result.

use crate::db::DbError;
use crate::model::entry::Entry;
use crate::repo::entry_repo::{parse_entry_row, RowDecodeError, ENTRY_SELECT_SQL};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

static SANITIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]+").expect("valid sanitize regex"));
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid word regex"));

/// Result type for search APIs.
pub type QueryResult<T> = Result<T, QueryError>;

/// Search-layer error for pattern validation, DB interaction, and result
/// decoding.
#[derive(Debug)]
pub enum QueryError {
    /// User-supplied regex pattern cannot be compiled.
    InvalidPattern { pattern: String, message: String },
    Db(DbError),
    InvalidData(String),
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPattern { pattern, message } => {
                write!(f, "invalid search pattern `{pattern}`: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for QueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPattern { .. } => None,
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for QueryError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for QueryError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RowDecodeError> for QueryError {
    fn from(value: RowDecodeError) -> Self {
        match value {
            RowDecodeError::Sqlite(err) => Self::Db(DbError::Sqlite(err)),
            RowDecodeError::Invalid(message) => Self::InvalidData(message),
        }
    }
}

/// Single threshold-search hit with its word-overlap score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdHit {
    pub entry: Entry,
    /// Count of distinct query words present in the entry content.
    pub threshold: u32,
}

/// Finds entries whose raw content contains `text` as a literal substring.
///
/// `category` filters exactly; `None` or `"*"` means no filter. A blank
/// query degrades to a match-all needle.
pub fn search_exact(
    conn: &Connection,
    text: &str,
    category: Option<&str>,
) -> QueryResult<Vec<Entry>> {
    let trimmed = text.trim();

    let mut sql = format!("{ENTRY_SELECT_SQL} WHERE content LIKE ? ESCAPE '\\'");
    let mut bind_values: Vec<Value> = vec![Value::Text(format!("%{}%", escape_like(trimmed)))];
    push_category_filter(&mut sql, &mut bind_values, category);
    sql.push_str(" ORDER BY entry_id ASC;");

    query_entries(conn, &sql, bind_values)
}

/// Finds entries whose content contains the query tokens in order, separated
/// by any characters.
///
/// The query is sanitized to word characters and whitespace before
/// tokenizing; this is an ordered-wildcard match, not edit-distance fuzzing.
/// A query with no usable tokens matches every entry.
pub fn search_fuzzy(
    conn: &Connection,
    text: &str,
    category: Option<&str>,
) -> QueryResult<Vec<Entry>> {
    let tokens = sanitize_tokens(text);
    let needle = tokens
        .iter()
        .map(|token| escape_like(token))
        .collect::<Vec<_>>()
        .join("%");

    let mut sql = format!("{ENTRY_SELECT_SQL} WHERE content LIKE ? ESCAPE '\\'");
    let mut bind_values: Vec<Value> = vec![Value::Text(format!("%{needle}%"))];
    push_category_filter(&mut sql, &mut bind_values, category);
    sql.push_str(" ORDER BY entry_id ASC;");

    query_entries(conn, &sql, bind_values)
}

/// Ranks entries by how many distinct query words their content contains.
///
/// Matching is case-sensitive on whole `\w+` word tokens; an entry matching
/// no query word is excluded. Repeated occurrences of one word count once.
pub fn search_threshold(
    conn: &Connection,
    words: &str,
    category: Option<&str>,
) -> QueryResult<Vec<ThresholdHit>> {
    let query_words: BTreeSet<String> = sanitize_tokens(words).into_iter().collect();
    if query_words.is_empty() {
        return Ok(Vec::new());
    }

    let mut sql = format!("{ENTRY_SELECT_SQL} WHERE 1 = 1");
    let mut bind_values: Vec<Value> = Vec::new();
    push_category_filter(&mut sql, &mut bind_values, category);
    sql.push_str(" ORDER BY entry_id ASC;");

    let mut hits = Vec::new();
    for entry in query_entries(conn, &sql, bind_values)? {
        let threshold = threshold_score(&query_words, &entry.content);
        if threshold > 0 {
            hits.push(ThresholdHit { entry, threshold });
        }
    }

    hits.sort_by(|a, b| {
        b.threshold
            .cmp(&a.threshold)
            .then(a.entry.entry_id.cmp(&b.entry.entry_id))
    });
    Ok(hits)
}

/// Finds entries whose content matches a caller-supplied regex pattern.
///
/// The pattern is validated before the query runs; an invalid pattern is
/// surfaced as [`QueryError::InvalidPattern`] instead of an empty result.
pub fn search_regex(conn: &Connection, pattern: &str) -> QueryResult<Vec<Entry>> {
    if let Err(err) = Regex::new(pattern) {
        return Err(QueryError::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        });
    }

    let sql = format!("{ENTRY_SELECT_SQL} WHERE content REGEXP ?1 ORDER BY entry_id ASC;");
    query_entries(conn, &sql, vec![Value::Text(pattern.to_string())])
}

/// Finds entries whose title or fronted title contains the sanitized query.
///
/// Input that sanitizes away entirely matches every entry.
pub fn search_title(conn: &Connection, text: &str) -> QueryResult<Vec<Entry>> {
    let sanitized = SANITIZE_RE.replace_all(text, "");
    let needle = sanitized.trim();

    let sql = format!(
        "{ENTRY_SELECT_SQL}
         WHERE (title LIKE ?1 ESCAPE '\\' OR fronted_title LIKE ?1 ESCAPE '\\')
         ORDER BY entry_id ASC;"
    );
    query_entries(
        conn,
        &sql,
        vec![Value::Text(format!("%{}%", escape_like(needle)))],
    )
}

/// Maps every category name to its entry count, ascending by name.
pub fn category_counts(conn: &Connection) -> QueryResult<BTreeMap<String, u64>> {
    let mut stmt = conn.prepare(
        "SELECT category, COUNT(*) AS entry_count
         FROM entries
         GROUP BY category
         ORDER BY category ASC;",
    )?;
    let mut rows = stmt.query([])?;

    let mut counts = BTreeMap::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        let count: i64 = row.get(1)?;
        counts.insert(name, count as u64);
    }
    Ok(counts)
}

/// Maps every sub-category name to its entry count, ascending by name.
///
/// `category` restricts the counts to one category; `None` or a blank string
/// counts sub-categories across all categories.
pub fn sub_category_counts(
    conn: &Connection,
    category: Option<&str>,
) -> QueryResult<BTreeMap<String, u64>> {
    let mut sql = String::from("SELECT sub_category, COUNT(*) AS entry_count FROM entries");
    let mut bind_values: Vec<Value> = Vec::new();

    match category.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => {
            sql.push_str(" WHERE category = ?");
            bind_values.push(Value::Text(trimmed.to_string()));
        }
        _ => {}
    }
    sql.push_str(" GROUP BY sub_category ORDER BY sub_category ASC;");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;

    let mut counts = BTreeMap::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        let count: i64 = row.get(1)?;
        counts.insert(name, count as u64);
    }
    Ok(counts)
}

fn query_entries(
    conn: &Connection,
    sql: &str,
    bind_values: Vec<Value>,
) -> QueryResult<Vec<Entry>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;

    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        entries.push(parse_entry_row(row)?);
    }
    Ok(entries)
}

fn push_category_filter(sql: &mut String, bind_values: &mut Vec<Value>, category: Option<&str>) {
    if let Some(category) = category_filter(category) {
        sql.push_str(" AND category = ?");
        bind_values.push(Value::Text(category.to_string()));
    }
}

/// `None` and `"*"` mean "all categories"; anything else filters literally.
fn category_filter(category: Option<&str>) -> Option<&str> {
    match category.map(str::trim) {
        None | Some("*") => None,
        Some(trimmed) => Some(trimmed),
    }
}

fn sanitize_tokens(text: &str) -> Vec<String> {
    let sanitized = SANITIZE_RE.replace_all(text, "");
    sanitized.split_whitespace().map(str::to_string).collect()
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn threshold_score(query_words: &BTreeSet<String>, content: &str) -> u32 {
    let content_words: HashSet<&str> = WORD_RE
        .find_iter(content)
        .map(|found| found.as_str())
        .collect();
    query_words
        .iter()
        .filter(|word| content_words.contains(word.as_str()))
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::{category_filter, escape_like, sanitize_tokens, threshold_score};
    use std::collections::BTreeSet;

    fn word_set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|word| word.to_string()).collect()
    }

    #[test]
    fn escape_like_protects_wildcards() {
        assert_eq!(escape_like("50%_done\\x"), "50\\%\\_done\\\\x");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn sanitize_strips_everything_but_words_and_whitespace() {
        assert_eq!(sanitize_tokens("c.a!t?s  lo-ve"), vec!["cats", "love"]);
        assert!(sanitize_tokens("?!...").is_empty());
    }

    #[test]
    fn category_filter_treats_star_as_all() {
        assert_eq!(category_filter(None), None);
        assert_eq!(category_filter(Some("*")), None);
        assert_eq!(category_filter(Some(" * ")), None);
        assert_eq!(category_filter(Some("books")), Some("books"));
    }

    #[test]
    fn threshold_counts_distinct_query_words_once() {
        let query = word_set(&["cats", "birds"]);
        assert_eq!(threshold_score(&query, "cats love dogs"), 1);
        assert_eq!(threshold_score(&query, "cats cats cats"), 1);
        assert_eq!(threshold_score(&query, "birds chase cats"), 2);
        assert_eq!(threshold_score(&query, "dogs only"), 0);
    }

    #[test]
    fn threshold_matches_whole_words_case_sensitively() {
        let query = word_set(&["cat"]);
        assert_eq!(threshold_score(&query, "catalog of things"), 0);
        assert_eq!(threshold_score(&query, "Cat naps"), 0);
        assert_eq!(threshold_score(&query, "the cat naps"), 1);
    }
}
