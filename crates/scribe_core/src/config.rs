//! Entry store sizing configuration.
//!
//! # Responsibility
//! - Hold the bounded-string limits enforced at the entry store boundary.
//! - Validate the bounds once, instead of trusting schema column widths.
//!
//! # Invariants
//! - Every limit is at least one character.
//! - Limits are measured in characters, not bytes.

use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_AUTHOR_CHARS: usize = 32;
const DEFAULT_CATEGORY_CHARS: usize = 64;
const DEFAULT_SUB_CATEGORY_CHARS: usize = 64;
const DEFAULT_TITLE_CHARS: usize = 255;

/// Field-size limits applied to entry writes.
///
/// Passed to the SQLite entry repository at construction; every create/edit
/// validates bounded fields against these limits before touching storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Maximum characters accepted for `created_by`/`edited_by`.
    pub max_author_chars: usize,
    /// Maximum characters accepted for `category`.
    pub max_category_chars: usize,
    /// Maximum characters accepted for `sub_category`.
    pub max_sub_category_chars: usize,
    /// Maximum characters accepted for `title`.
    pub max_title_chars: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_author_chars: DEFAULT_AUTHOR_CHARS,
            max_category_chars: DEFAULT_CATEGORY_CHARS,
            max_sub_category_chars: DEFAULT_SUB_CATEGORY_CHARS,
            max_title_chars: DEFAULT_TITLE_CHARS,
        }
    }
}

impl StoreConfig {
    /// Checks that every limit can hold at least one character.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("max_author_chars", self.max_author_chars),
            ("max_category_chars", self.max_category_chars),
            ("max_sub_category_chars", self.max_sub_category_chars),
            ("max_title_chars", self.max_title_chars),
        ] {
            if value == 0 {
                return Err(ConfigError::NonPositiveBound { field });
            }
        }
        Ok(())
    }
}

/// Configuration error for invalid field-size bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A limit was configured as zero.
    NonPositiveBound { field: &'static str },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveBound { field } => {
                write!(f, "store config bound `{field}` must be at least 1")
            }
        }
    }
}

impl Error for ConfigError {}
