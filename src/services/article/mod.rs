//! Article
//!
//! Structured article drafts built from interview transcripts.

pub mod drafter;

pub use drafter::{ArticleDraft, ArticleDrafter, ArticleSection, DraftRequest, RevisionRequest};
