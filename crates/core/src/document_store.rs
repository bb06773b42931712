//! Document Store Seam
//!
//! The assembler reads fragments and their chunks through this trait so
//! the storage backend (SQLite, in-memory, a remote document database) can be
//! swapped without touching assembly logic.

use async_trait::async_trait;
use thiserror::Error;

use crate::knowledge::{FragmentFilter, KnowledgeFragment, OwnerScope};

/// Errors a document store backend can report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A read did not finish within its deadline.
    #[error("Store read timed out after {0}ms")]
    Timeout(u64),

    /// The backend reported a failure.
    #[error("Store backend error: {0}")]
    Backend(String),

    /// A stored record could not be decoded.
    #[error("Stored record could not be decoded: {0}")]
    Decode(String),
}

/// Result type alias for store reads
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

/// Read access to knowledge fragments.
///
/// Implementations return fragments regardless of ownership. Authorization
/// is applied by the caller through
/// [`KnowledgeFragment::is_readable_by`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one fragment by id. Soft-deleted fragments are returned with
    /// `deleted = true`; an id that was never stored (or was hard-deleted)
    /// yields `None`.
    async fn get_fragment(&self, id: &str) -> StoreResult<Option<KnowledgeFragment>>;

    /// List fragments of one scope, in stable storage order.
    async fn list_fragments(
        &self,
        scope: OwnerScope,
        filter: &FragmentFilter,
    ) -> StoreResult<Vec<KnowledgeFragment>>;

    /// Fetch up to `limit` chunk texts of a fragment, in chunk order.
    async fn get_chunks(&self, fragment_id: &str, limit: usize) -> StoreResult<Vec<String>>;
}
