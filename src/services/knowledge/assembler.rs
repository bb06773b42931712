//! Knowledge Context Assembler
//!
//! Selects, authorizes and budgets knowledge fragments for one prompt.
//!
//! ## Selection
//!
//! - Explicitly requested fragments first, in request order (duplicates
//!   collapsed). A private fragment owned by someone else is dropped silently
//!   and counted in `dropped_for_authorization`; deleted or absent fragments
//!   are skipped as not found.
//! - Then up to `skill_fragment_cap` shared skill fragments whose flags allow
//!   the requested usage. A skill already requested explicitly appears once.
//!
//! ## Fetching
//!
//! Metadata reads and chunk reads are independent and run concurrently. Each
//! read has its own deadline. A failed or late chunk read degrades only its
//! fragment to summary + usage guide.
//!
//! ## Budgets
//!
//! Chunk text is truncated per fragment first, then sections are composed
//! tail-first under the aggregate budget (see [`super::render::compose`]).

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use ghostwriter_core::{
    DocumentStore, FragmentFilter, KnowledgeFragment, KnowledgeUsage, OwnerScope, StoreError,
    StoreResult,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::render::{
    char_len, compose, render_fragment_section, section_heading, truncate_chars,
};
use crate::models::settings::KnowledgeSettings;

/// Character budgets for one assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextBudgets {
    pub per_fragment_char_budget: usize,
    pub aggregate_char_budget: usize,
}

impl From<&KnowledgeSettings> for ContextBudgets {
    fn from(settings: &KnowledgeSettings) -> Self {
        Self {
            per_fragment_char_budget: settings.per_fragment_char_budget,
            aggregate_char_budget: settings.aggregate_char_budget,
        }
    }
}

/// Input of [`KnowledgeContextAssembler::assemble`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyRequest {
    pub caller_id: String,
    pub usage: KnowledgeUsage,
    #[serde(default)]
    pub explicit_fragment_ids: Vec<String>,
    pub budgets: ContextBudgets,
}

impl AssemblyRequest {
    pub fn new(caller_id: impl Into<String>, usage: KnowledgeUsage, budgets: ContextBudgets) -> Self {
        Self {
            caller_id: caller_id.into(),
            usage,
            explicit_fragment_ids: Vec::new(),
            budgets,
        }
    }

    pub fn with_fragments<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.explicit_fragment_ids = ids.into_iter().map(Into::into).collect();
        self
    }
}

/// Output of [`KnowledgeContextAssembler::assemble`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledContext {
    /// Composed text block; empty when nothing was selected.
    pub rendered_context: String,
    /// Fragments whose section appears in `rendered_context`, in order.
    pub included_fragment_ids: Vec<String>,
    /// Explicit requests withheld because the caller does not own them.
    pub dropped_for_authorization: usize,
    /// Fragments rendered from metadata only because their chunks could not
    /// be read.
    pub degraded_fragment_ids: Vec<String>,
    /// Fragments selected but left out entirely by the aggregate budget.
    pub omitted_for_budget: Vec<String>,
}

impl AssembledContext {
    pub fn is_empty(&self) -> bool {
        self.rendered_context.is_empty()
    }
}

/// Assembles knowledge context blocks from an injected document store.
pub struct KnowledgeContextAssembler {
    store: Arc<dyn DocumentStore>,
    skill_fragment_cap: usize,
    chunk_fetch_limit: usize,
    fetch_timeout: Duration,
}

impl KnowledgeContextAssembler {
    /// Create an assembler with default settings.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_settings(store, &KnowledgeSettings::default())
    }

    pub fn with_settings(store: Arc<dyn DocumentStore>, settings: &KnowledgeSettings) -> Self {
        Self {
            store,
            skill_fragment_cap: settings.skill_fragment_cap,
            chunk_fetch_limit: settings.chunk_fetch_limit,
            fetch_timeout: Duration::from_millis(settings.fetch_timeout_ms),
        }
    }

    /// Assemble the knowledge context for one request.
    ///
    /// Never fails: store errors are isolated to the fragment they concern.
    pub async fn assemble(&self, request: &AssemblyRequest) -> AssembledContext {
        let caller = request.caller_id.as_str();

        // Explicit and skill metadata reads are independent
        let (explicit, skills) = futures_util::join!(
            self.resolve_explicit(caller, &request.explicit_fragment_ids),
            self.select_skills(caller, request.usage),
        );
        let (mut selected, dropped_for_authorization) = explicit;

        let mut seen: HashSet<String> = selected.iter().map(|f| f.id.clone()).collect();
        for skill in skills {
            if seen.insert(skill.id.clone()) {
                selected.push(skill);
            }
        }

        if selected.is_empty() {
            debug!(
                caller_id = caller,
                usage = %request.usage,
                dropped_for_authorization,
                "no knowledge fragments selected"
            );
            return AssembledContext {
                dropped_for_authorization,
                ..Default::default()
            };
        }

        // Chunk reads
        let chunk_reads = selected.iter().map(|fragment| {
            let id = fragment.id.clone();
            async move {
                let result = self
                    .timed(self.store.get_chunks(&id, self.chunk_fetch_limit))
                    .await;
                (id, result)
            }
        });
        let chunk_results = join_all(chunk_reads).await;

        let mut degraded_fragment_ids = Vec::new();
        let mut seen_chunks: HashSet<[u8; 32]> = HashSet::new();
        let mut sections: Vec<(String, usize)> = Vec::with_capacity(selected.len());

        for (fragment, (id, result)) in selected.iter().zip(chunk_results) {
            let chunks = match result {
                Ok(chunks) => chunks,
                Err(e) => {
                    warn!(fragment_id = %id, error = %e, "chunk fetch failed, using metadata only");
                    degraded_fragment_ids.push(id);
                    Vec::new()
                }
            };

            let unique: Vec<&str> = chunks
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .filter(|c| {
                    let hash: [u8; 32] = Sha256::digest(c.as_bytes()).into();
                    seen_chunks.insert(hash)
                })
                .collect();

            let (chunk_text, truncated) =
                truncate_chars(&unique.join("\n\n"), request.budgets.per_fragment_char_budget);
            if truncated {
                debug!(fragment_id = %fragment.id, "chunk text truncated to per-fragment budget");
            }

            let section = render_fragment_section(fragment, &chunk_text);
            sections.push((section, char_len(&section_heading(fragment))));
        }

        let composition = compose(&sections, request.budgets.aggregate_char_budget);

        let included_fragment_ids: Vec<String> = selected
            .iter()
            .take(composition.included)
            .map(|f| f.id.clone())
            .collect();
        let omitted_for_budget: Vec<String> = selected
            .iter()
            .skip(composition.included)
            .map(|f| f.id.clone())
            .collect();
        if !omitted_for_budget.is_empty() {
            debug!(
                omitted = omitted_for_budget.len(),
                "fragments omitted by aggregate budget"
            );
        }

        AssembledContext {
            rendered_context: composition.rendered,
            included_fragment_ids,
            dropped_for_authorization,
            degraded_fragment_ids,
            omitted_for_budget,
        }
    }

    /// Resolve explicit ids, applying the authorization predicate.
    ///
    /// Returns the readable fragments in request order and the number of
    /// ownership denials.
    async fn resolve_explicit(
        &self,
        caller: &str,
        ids: &[String],
    ) -> (Vec<KnowledgeFragment>, usize) {
        let mut unique_ids: Vec<&str> = Vec::with_capacity(ids.len());
        let mut seen = HashSet::new();
        for id in ids {
            let id = id.trim();
            if !id.is_empty() && seen.insert(id) {
                unique_ids.push(id);
            }
        }

        let reads = unique_ids.iter().map(|id| async move {
            let result = self.timed(self.store.get_fragment(id)).await;
            (*id, result)
        });
        let results = join_all(reads).await;

        let mut readable = Vec::new();
        let mut dropped = 0;
        for (id, result) in results {
            match result {
                Ok(Some(fragment)) if fragment.is_readable_by(caller) => readable.push(fragment),
                Ok(Some(fragment)) if fragment.is_ownership_denied(caller) => {
                    dropped += 1;
                    debug!(caller_id = caller, "explicit fragment withheld");
                }
                Ok(_) => {
                    debug!(fragment_id = id, "explicit fragment not found");
                }
                Err(e) => {
                    warn!(fragment_id = id, error = %e, "explicit fragment fetch failed");
                }
            }
        }
        (readable, dropped)
    }

    /// Shared skill fragments relevant to `usage`, capped.
    async fn select_skills(&self, caller: &str, usage: KnowledgeUsage) -> Vec<KnowledgeFragment> {
        if self.skill_fragment_cap == 0 {
            return Vec::new();
        }

        let filter = FragmentFilter::default();
        match self
            .timed(self.store.list_fragments(OwnerScope::SharedSkill, &filter))
            .await
        {
            Ok(fragments) => fragments
                .into_iter()
                .filter(|f| f.owner_scope == OwnerScope::SharedSkill)
                .filter(|f| f.is_readable_by(caller) && f.is_relevant_for(usage))
                .take(self.skill_fragment_cap)
                .collect(),
            Err(e) => {
                warn!(error = %e, "skill fragment listing failed, continuing without skills");
                Vec::new()
            }
        }
    }

    /// Apply the per-read deadline.
    async fn timed<T>(&self, read: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        match tokio::time::timeout(self.fetch_timeout, read).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.fetch_timeout.as_millis() as u64)),
        }
    }
}
