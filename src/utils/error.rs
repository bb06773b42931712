//! Error Handling
//!
//! [`AppError`] wraps store, generator and core failures for the command layer;
//! [`AppError::kind`] gives the category reported to callers.

use ghostwriter_core::{CoreError, StoreError};
use ghostwriter_llm::LlmError;
use thiserror::Error;

/// Everything a command can fail with
#[derive(Error, Debug)]
pub enum AppError {
    /// Pool setup or schema problems in the knowledge database
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A document store read failed outright (not a degraded chunk fetch)
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Text generator failures; these fail the whole turn
    #[error("Generation failed: {0}")]
    Generation(#[from] LlmError),

    /// Invalid fragment data rejected by the core crate
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Model output that neither parsed nor repaired into the required shape
    #[error("Unrecoverable model output: {0}")]
    Recovery(String),

    /// Rejected command arguments or settings
    #[error("Validation error: {0}")]
    Validation(String),

    /// Lifecycle operation on a fragment that does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn recovery(msg: impl Into<String>) -> Self {
        Self::Recovery(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Whether this error is a text generator failure
    pub fn is_generation_failure(&self) -> bool {
        matches!(self, Self::Generation(_))
    }

    /// Stable category name reported in command responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Database(_) | Self::Sqlite(_) => "database",
            Self::Store(_) => "store",
            Self::Generation(_) => "generation",
            Self::Core(_) | Self::Validation(_) => "validation",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Recovery(_) => "recovery",
            Self::NotFound(_) => "not_found",
        }
    }
}
