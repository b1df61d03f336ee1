use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by character flows and store operations.
///
/// Each variant ends only the current flow or command; none is fatal to the
/// process. The command layer decides how to word them for the user.
#[derive(Debug, Error)]
pub enum CharacterError {
    #[error("timed out after {0:?} waiting for a reply")]
    Timeout(Duration),

    #[error("cancelled by user")]
    Cancelled,

    #[error("invalid formatting: {0}")]
    Format(#[from] MetaFormatError),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("a character named '{0}' already exists")]
    DuplicateName(String),

    #[error("character '{0}' does not exist")]
    NotFound(String),

    #[error("character '{0}' is owned by someone else")]
    NotOwner(String),

    #[error("'{0}' is not a valid attribute")]
    UnknownAttribute(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// A `key: value` segment that the meta mini-language rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("segment '{segment}' {reason}")]
pub struct MetaFormatError {
    /// The offending segment, untrimmed.
    pub segment: String,
    pub reason: MetaFormatReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MetaFormatReason {
    #[error("has no ': ' separator")]
    MissingSeparator,

    #[error("contains more than one ': ' separator")]
    ExtraSeparator,
}

/// Errors from repository operations (used by trait definitions in rolecall-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<RepositoryError> for CharacterError {
    fn from(err: RepositoryError) -> Self {
        CharacterError::Storage(err.to_string())
    }
}
