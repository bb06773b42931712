//! In-Memory Document Store
//!
//! A `DocumentStore` over in-process collections, preserving insertion order.
//! Built once with the `with_*` methods and read-only afterwards. Reads can be
//! made to fail or stall per fragment, which is how partial knowledge
//! failures and fetch timeouts are exercised.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use ghostwriter_core::{
    DocumentStore, FragmentFilter, KnowledgeFragment, OwnerScope, StoreError, StoreResult,
};

#[derive(Debug, Default, Clone)]
pub struct InMemoryDocumentStore {
    fragments: Vec<KnowledgeFragment>,
    chunks: HashMap<String, Vec<String>>,
    failing_chunk_reads: HashSet<String>,
    failing_fragment_reads: HashSet<String>,
    failing_scopes: HashSet<OwnerScope>,
    chunk_delays: HashMap<String, Duration>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a fragment together with its chunk texts
    pub fn with_fragment(mut self, fragment: KnowledgeFragment, chunks: Vec<String>) -> Self {
        self.chunks.insert(fragment.id.clone(), chunks);
        match self.fragments.iter_mut().find(|f| f.id == fragment.id) {
            Some(existing) => *existing = fragment,
            None => self.fragments.push(fragment),
        }
        self
    }

    /// Make every chunk read of `fragment_id` fail
    pub fn with_failing_chunks(mut self, fragment_id: impl Into<String>) -> Self {
        self.failing_chunk_reads.insert(fragment_id.into());
        self
    }

    /// Make every metadata read of `fragment_id` fail
    pub fn with_failing_fragment(mut self, fragment_id: impl Into<String>) -> Self {
        self.failing_fragment_reads.insert(fragment_id.into());
        self
    }

    /// Make listing a whole scope fail
    pub fn with_failing_scope(mut self, scope: OwnerScope) -> Self {
        self.failing_scopes.insert(scope);
        self
    }

    /// Delay chunk reads of `fragment_id` by `delay`
    pub fn with_chunk_delay(mut self, fragment_id: impl Into<String>, delay: Duration) -> Self {
        self.chunk_delays.insert(fragment_id.into(), delay);
        self
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_fragment(&self, id: &str) -> StoreResult<Option<KnowledgeFragment>> {
        if self.failing_fragment_reads.contains(id) {
            return Err(StoreError::unavailable(format!("fragment read failed: {}", id)));
        }
        Ok(self.fragments.iter().find(|f| f.id == id).cloned())
    }

    async fn list_fragments(
        &self,
        scope: OwnerScope,
        filter: &FragmentFilter,
    ) -> StoreResult<Vec<KnowledgeFragment>> {
        if self.failing_scopes.contains(&scope) {
            return Err(StoreError::unavailable(format!(
                "listing {} fragments failed",
                scope
            )));
        }
        let matching = self
            .fragments
            .iter()
            .filter(|f| f.owner_scope == scope)
            .filter(|f| filter.include_deleted || !f.deleted)
            .filter(|f| match &filter.owner_id {
                Some(owner) => f.owner_id.as_ref() == Some(owner),
                None => true,
            })
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(matching)
    }

    async fn get_chunks(&self, fragment_id: &str, limit: usize) -> StoreResult<Vec<String>> {
        if let Some(delay) = self.chunk_delays.get(fragment_id) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_chunk_reads.contains(fragment_id) {
            return Err(StoreError::backend(format!(
                "chunk read failed: {}",
                fragment_id
            )));
        }
        Ok(self
            .chunks
            .get(fragment_id)
            .map(|chunks| chunks.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
