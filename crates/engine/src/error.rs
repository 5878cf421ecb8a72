//! Engine error taxonomy.
//!
//! Four families with very different handling:
//! - `Persistence` — preference load/save failure. Recovered locally
//!   (defaults or in-memory state kept) and logged; never blocking.
//! - `Fetch` — server data fetch failure. Dismissible, blocks data
//!   display until retried or dismissed, leaves in-memory data intact.
//! - `UpdateRejected` — inline-edit commit callback failure. The
//!   optimistic change has already been rolled back by the time this
//!   surfaces; the edit session is closed.
//! - `Validation` — field-scoped add/edit-row failures. Blocks commit,
//!   cleared incrementally, never logged as a system error.

use std::collections::BTreeMap;
use std::fmt;

use crate::row::RowId;

/// Field key -> human-readable message.
pub type ValidationErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// Preference store failure (already recovered, already logged).
    Persistence(String),
    /// Data fetch failure; existing rows stay untouched.
    Fetch(String),
    /// External update callback rejected an optimistic edit.
    UpdateRejected {
        row: RowId,
        column: Option<String>,
        message: String,
    },
    /// Commit blocked by field validation.
    Validation(ValidationErrors),
}

impl GridError {
    /// Errors the UI shows as a dismissible banner (as opposed to
    /// field-level decoration).
    pub fn is_notification(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::UpdateRejected { .. })
    }

    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persistence(msg) => write!(f, "preference persistence failed: {msg}"),
            Self::Fetch(msg) => write!(f, "data fetch failed: {msg}"),
            Self::UpdateRejected { row, column, message } => match column {
                Some(column) => {
                    write!(f, "update rejected for row '{row}', column '{column}': {message}")
                }
                None => write!(f, "update rejected for row '{row}': {message}"),
            },
            Self::Validation(errors) => {
                write!(f, "validation failed for {} field(s)", errors.len())
            }
        }
    }
}

impl std::error::Error for GridError {}
