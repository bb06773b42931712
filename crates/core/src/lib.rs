//! Ghostwriter Core
//!
//! Foundational domain types and collaborator traits for the Ghostwriter
//! interview workspace. This crate has zero dependencies on storage, network,
//! or text-generation code.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `knowledge` - Knowledge fragments, scopes, usage flags, and the authorization predicate
//! - `conversation` - Interview transcript messages and transcript helpers
//! - `evaluation` - Per-turn evaluation results and their invariants
//! - `document_store` - The `DocumentStore` collaborator trait (`StoreError`, `StoreResult`)
//!
//! ## Design Principles
//!
//! 1. **Zero external dependencies beyond serde/async-trait/thiserror**
//! 2. **Collaborators are traits** - document store and text generator are injected, never global
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod conversation;
pub mod document_store;
pub mod error;
pub mod evaluation;
pub mod knowledge;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Knowledge ──────────────────────────────────────────────────────────
pub use knowledge::{FragmentFilter, FragmentFlags, KnowledgeFragment, KnowledgeUsage, OwnerScope};

// ── Conversation ───────────────────────────────────────────────────────
pub use conversation::{ConversationMessage, MessageRole};

// ── Evaluation ─────────────────────────────────────────────────────────
pub use evaluation::{EvaluationResult, EvaluationSource, ObjectiveEvaluation, ObjectiveStatus};

// ── Document Store ─────────────────────────────────────────────────────
pub use document_store::{DocumentStore, StoreError, StoreResult};
