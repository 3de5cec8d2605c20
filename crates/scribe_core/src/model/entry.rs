//! Entry domain model.
//!
//! # Responsibility
//! - Define the canonical versioned entry record and its write shapes.
//! - Derive the sort-friendly fronted title variant.
//! - Validate caller input against configured field bounds.
//!
//! # Invariants
//! - `entry_id` is positive once assigned and never reused.
//! - `edited` is never earlier than `created`.
//! - `fronted_title` is always derived from `title`, never caller-supplied.

use crate::config::StoreConfig;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned identifier for one entry.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type EntryId = i64;

/// Canonical versioned content record.
///
/// `fronted_title` and `dynamic_content` are derived columns: they are
/// recomputed by the entry store whenever `title` or `content` changes and
/// cannot be written directly by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Positive storage-assigned identity, immutable once assigned.
    pub entry_id: EntryId,
    /// Top-level grouping name.
    pub category: String,
    /// Second-level grouping name.
    pub sub_category: String,
    /// Display title as written by the author.
    pub title: String,
    /// Sort-friendly alias: a leading `"The "` moved to a trailing `", The"`.
    pub fronted_title: String,
    /// Raw body text.
    pub content: String,
    /// Rule-pipeline output for the current `content`. `None` only describes
    /// rows written before derivation existed.
    pub dynamic_content: Option<String>,
    /// Author recorded at creation.
    pub created_by: String,
    /// Author of the most recent mutation.
    pub edited_by: String,
    /// Creation timestamp (UTC, second precision).
    pub created: NaiveDateTime,
    /// Last-mutation timestamp. Never earlier than `created`.
    pub edited: NaiveDateTime,
    /// Publication timestamp. `None` means unpublished regardless of flags.
    pub published: Option<NaiveDateTime>,
    /// Draft marker, independent of `published`.
    pub is_draft: bool,
    /// Visibility marker, independent of `published`.
    pub is_hidden: bool,
}

impl Entry {
    /// Returns whether a publication timestamp has been assigned.
    pub fn is_published(&self) -> bool {
        self.published.is_some()
    }

    /// Returns whether the entry is publicly listable: published and neither
    /// draft nor hidden.
    pub fn is_live(&self) -> bool {
        self.published.is_some() && !self.is_draft && !self.is_hidden
    }
}

/// Derives the sort-friendly title alias.
///
/// A title starting with `"The "` is rewritten as `"<rest>, The"`; every
/// other title is returned unchanged. A title whose remainder would be blank
/// (for example `"The "` followed only by spaces) is kept as-is.
pub fn front_title(title: &str) -> String {
    match title.strip_prefix("The ") {
        Some(rest) if !rest.trim().is_empty() => format!("{}, The", rest.trim()),
        _ => title.to_string(),
    }
}

/// Input shape for creating one entry.
///
/// String fields are trimmed by the entry store before persistence; `created`
/// defaults to the current time when omitted, and `edited` always starts equal
/// to `created`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub category: String,
    pub sub_category: String,
    pub title: String,
    pub content: String,
    /// Recorded as both `created_by` and the initial `edited_by`.
    pub author: String,
    /// Explicit creation timestamp. `None` means "now".
    pub created: Option<NaiveDateTime>,
    /// Optional publication timestamp.
    pub published: Option<NaiveDateTime>,
    pub is_draft: bool,
    pub is_hidden: bool,
}

impl EntryDraft {
    /// Checks required fields and configured bounds.
    ///
    /// Reports every blank required field in one error, in schema column
    /// order, before any bound is checked.
    pub fn validate(&self, config: &StoreConfig) -> Result<(), EntryValidationError> {
        let mut blank = Vec::new();
        if self.category.trim().is_empty() {
            blank.push("category");
        }
        if self.sub_category.trim().is_empty() {
            blank.push("sub_category");
        }
        if self.title.trim().is_empty() {
            blank.push("title");
        }
        if self.content.trim().is_empty() {
            blank.push("content");
        }
        if self.author.trim().is_empty() {
            blank.push("author");
        }
        if !blank.is_empty() {
            return Err(EntryValidationError::EmptyFields(blank));
        }

        check_bound("author", self.author.trim(), config.max_author_chars)?;
        check_bound("category", self.category.trim(), config.max_category_chars)?;
        check_bound(
            "sub_category",
            self.sub_category.trim(),
            config.max_sub_category_chars,
        )?;
        check_bound("title", self.title.trim(), config.max_title_chars)?;
        Ok(())
    }
}

/// Partial-update shape for editing one entry.
///
/// A string field is applied only when supplied non-blank; `is_draft` and
/// `is_hidden` are tri-state (`None` leaves the flag unchanged). `published`
/// carries an already-parsed timestamp or `None` for "leave untouched";
/// there is no unpublish path through an edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPatch {
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<NaiveDateTime>,
    pub is_draft: Option<bool>,
    pub is_hidden: Option<bool>,
}

impl EntryPatch {
    /// Returns the trimmed category when supplied non-blank.
    pub fn category_change(&self) -> Option<&str> {
        applied_field(&self.category)
    }

    /// Returns the trimmed sub-category when supplied non-blank.
    pub fn sub_category_change(&self) -> Option<&str> {
        applied_field(&self.sub_category)
    }

    /// Returns the trimmed title when supplied non-blank.
    pub fn title_change(&self) -> Option<&str> {
        applied_field(&self.title)
    }

    /// Returns the trimmed content when supplied non-blank.
    pub fn content_change(&self) -> Option<&str> {
        applied_field(&self.content)
    }

    /// Checks configured bounds for every field this patch would apply.
    pub fn validate(&self, config: &StoreConfig) -> Result<(), EntryValidationError> {
        if let Some(category) = self.category_change() {
            check_bound("category", category, config.max_category_chars)?;
        }
        if let Some(sub_category) = self.sub_category_change() {
            check_bound("sub_category", sub_category, config.max_sub_category_chars)?;
        }
        if let Some(title) = self.title_change() {
            check_bound("title", title, config.max_title_chars)?;
        }
        Ok(())
    }
}

fn applied_field(value: &Option<String>) -> Option<&str> {
    match value.as_deref().map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Some(trimmed),
        _ => None,
    }
}

fn check_bound(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), EntryValidationError> {
    let actual_chars = value.chars().count();
    if actual_chars > max_chars {
        return Err(EntryValidationError::FieldTooLong {
            field,
            max_chars,
            actual_chars,
        });
    }
    Ok(())
}

/// Validation error for entry write input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    /// Required fields were blank after trimming, listed in column order.
    EmptyFields(Vec<&'static str>),
    /// A bounded field exceeded its configured limit.
    FieldTooLong {
        field: &'static str,
        max_chars: usize,
        actual_chars: usize,
    },
    /// An entry identifier was zero or negative.
    NonPositiveId(i64),
    /// A free-form date string did not match any accepted shape.
    UnparseableDate { field: &'static str, value: String },
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyFields(fields) => {
                write!(f, "empty values provided for: {}", fields.join(", "))
            }
            Self::FieldTooLong {
                field,
                max_chars,
                actual_chars,
            } => write!(
                f,
                "field `{field}` is {actual_chars} characters long; limit is {max_chars}"
            ),
            Self::NonPositiveId(id) => write!(f, "entry id must be positive, got {id}"),
            Self::UnparseableDate { field, value } => {
                write!(f, "unparseable {field} date: `{value}`")
            }
        }
    }
}

impl Error for EntryValidationError {}
