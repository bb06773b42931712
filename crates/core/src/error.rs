//! Core Error Types
//!
//! Errors raised by the domain types themselves: parsing scope and usage
//! names, and checking a fragment before it is stored. Read failures of a
//! document store are [`StoreError`](crate::document_store::StoreError).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown owner scope: {0}")]
    UnknownScope(String),

    #[error("unknown knowledge usage: {0}")]
    UnknownUsage(String),

    /// A fragment id is empty or whitespace.
    #[error("fragment id must not be empty")]
    EmptyFragmentId,

    /// A private fragment without an owner would be readable by nobody.
    #[error("private fragment {fragment_id} requires an owner")]
    MissingOwner { fragment_id: String },
}

impl CoreError {
    /// Whether the error rejects a fragment (as opposed to a name that failed
    /// to parse).
    pub fn is_invalid_fragment(&self) -> bool {
        matches!(self, Self::EmptyFragmentId | Self::MissingOwner { .. })
    }
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;
