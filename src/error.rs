//! Typed errors for the input contracts the tool cannot recover from.
//!
//! Everything else (file writing, delivery) propagates `anyhow::Error` with context.

use thiserror::Error;

/// The score sheet does not have the shape the reports are built from.
///
/// Raised before any record is built, so no partial output exists when it is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("missing required column in score sheet: {0}")]
    MissingColumn(String),

    #[error("score sheet has {found} columns; at least {required} are needed to read the instructor name")]
    TooFewColumns { found: usize, required: usize },

    #[error("instructor name column '{0}' not found in score sheet")]
    UnknownNameColumn(String),
}

/// The coordinator directory file could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("coordinator directory is missing columns {missing:?} (read: {found:?})")]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },
}
