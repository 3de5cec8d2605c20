//! Entry use-case service.
//!
//! # Responsibility
//! - Turn caller-facing requests with string-typed dates into typed drafts
//!   and patches for the entry repository.
//! - Enforce the publish timestamp shape on edits.
//!
//! # Invariants
//! - An unparseable caller-provided date is a validation error, never a
//!   silent fallback value.
//! - On edit, a publish value that does not match the accepted shape leaves
//!   the stored publish timestamp unchanged.

use std::error::Error;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::entry::{Entry, EntryDraft, EntryId, EntryPatch, EntryValidationError};
use crate::repo::entry_repo::{EntryListQuery, EntryRepository, StoreError};

/// Publish timestamps must carry at least a calendar date and an hour.
/// Minutes and seconds are optional.
static PUBLISH_SHAPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})[T ](\d{2})(?::(\d{2})(?::(\d{2}))?)?$")
        .expect("valid publish shape regex")
});

const FREE_FORM_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Caller-facing request to create an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateEntryRequest {
    pub category: String,
    pub sub_category: String,
    pub title: String,
    pub content: String,
    pub author: String,
    /// Creation timestamp override; blank or `None` means "now".
    pub created: Option<String>,
    /// Publication timestamp; blank or `None` keeps the entry unpublished.
    pub published: Option<String>,
    pub is_draft: bool,
    pub is_hidden: bool,
}

/// Caller-facing request to edit an entry. Blank fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditEntryRequest {
    pub category: String,
    pub sub_category: String,
    pub title: String,
    pub content: String,
    /// Publication timestamp; applied only when it matches the publish shape.
    pub published: Option<String>,
    pub is_draft: Option<bool>,
    pub is_hidden: Option<bool>,
}

/// Error surfaced by entry use-case operations.
#[derive(Debug)]
pub enum EntryServiceError {
    /// A request field failed validation before or inside the store.
    Validation(EntryValidationError),
    /// The entry store rejected or failed the operation.
    Store(StoreError),
}

impl fmt::Display for EntryServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid entry request: {err}"),
            Self::Store(err) => write!(f, "entry store failure: {err}"),
        }
    }
}

impl Error for EntryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for EntryServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(inner) => Self::Validation(inner),
            other => Self::Store(other),
        }
    }
}

impl From<EntryValidationError> for EntryServiceError {
    fn from(err: EntryValidationError) -> Self {
        Self::Validation(err)
    }
}

/// Convenience alias for entry service results.
pub type EntryServiceResult<T> = Result<T, EntryServiceError>;

/// Use-case service wrapper over an entry repository.
pub struct EntryService<R: EntryRepository> {
    repo: R,
}

impl<R: EntryRepository> EntryService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an entry from a caller request and returns its id.
    pub fn create_entry(&self, request: &CreateEntryRequest) -> EntryServiceResult<EntryId> {
        let draft = EntryDraft {
            category: request.category.clone(),
            sub_category: request.sub_category.clone(),
            title: request.title.clone(),
            content: request.content.clone(),
            author: request.author.clone(),
            created: parse_request_datetime("created", request.created.as_deref())?,
            published: parse_request_datetime("published", request.published.as_deref())?,
            is_draft: request.is_draft,
            is_hidden: request.is_hidden,
        };
        Ok(self.repo.create_entry(&draft)?)
    }

    /// Applies an edit request and returns the number of updated rows.
    pub fn edit_entry(
        &self,
        entry_id: EntryId,
        editor: &str,
        request: &EditEntryRequest,
    ) -> EntryServiceResult<usize> {
        let patch = EntryPatch {
            category: Some(request.category.clone()),
            sub_category: Some(request.sub_category.clone()),
            title: Some(request.title.clone()),
            content: Some(request.content.clone()),
            published: request
                .published
                .as_deref()
                .and_then(parse_publish_timestamp),
            is_draft: request.is_draft,
            is_hidden: request.is_hidden,
        };
        Ok(self.repo.edit_entry(entry_id, editor, &patch)?)
    }

    /// Deletes one entry; `false` when no such entry exists.
    pub fn delete_entry(&self, entry_id: EntryId) -> EntryServiceResult<bool> {
        Ok(self.repo.delete_entry(entry_id)?)
    }

    /// Fetches one entry by id.
    pub fn get_entry(&self, entry_id: EntryId) -> EntryServiceResult<Option<Entry>> {
        Ok(self.repo.get_entry(entry_id)?)
    }

    /// Lists entries with filtering, ordering and pagination.
    pub fn list_entries(&self, query: &EntryListQuery) -> EntryServiceResult<Vec<Entry>> {
        Ok(self.repo.list_entries(query)?)
    }

    /// Finds entries in a category whose title matches a LIKE pattern.
    pub fn find_by_category_and_title(
        &self,
        category: &str,
        title: &str,
        sub_category: Option<&str>,
    ) -> EntryServiceResult<Vec<Entry>> {
        Ok(self
            .repo
            .find_by_category_and_title(category, title, sub_category)?)
    }
}

fn parse_request_datetime(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<NaiveDateTime>, EntryValidationError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    match parse_free_form_datetime(raw) {
        Some(parsed) => Ok(Some(parsed)),
        None => Err(EntryValidationError::UnparseableDate {
            field,
            value: raw.to_string(),
        }),
    }
}

/// Parses a caller-provided timestamp in any of the accepted shapes.
///
/// Accepts RFC 3339 (converted to UTC), `YYYY-MM-DD HH:MM[:SS]` with a space
/// or `T` separator, and a bare `YYYY-MM-DD` date which maps to midnight.
pub fn parse_free_form_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.naive_utc());
    }
    for format in FREE_FORM_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Parses a publish timestamp, requiring at least a date and an hour.
///
/// Returns `None` for any value outside the accepted shape or off the
/// calendar, which leaves the stored publish timestamp unchanged on edit.
pub fn parse_publish_timestamp(value: &str) -> Option<NaiveDateTime> {
    let caps = PUBLISH_SHAPE_RE.captures(value.trim())?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let hour: u32 = caps[4].parse().ok()?;
    let minute: u32 = caps.get(5).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
    let second: u32 = caps.get(6).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}
