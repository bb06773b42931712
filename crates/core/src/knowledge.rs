//! Knowledge Fragments
//!
//! A fragment is one uploaded document's extracted content plus its derived
//! summary and usage guide. Fragment text (the chunks) lives in a
//! sub-collection that is fetched separately through
//! [`DocumentStore::get_chunks`](crate::document_store::DocumentStore::get_chunks).
//!
//! Visibility is decided by exactly one predicate,
//! [`KnowledgeFragment::is_readable_by`]. Every consumer goes through it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

// ============================================================================
// Scope
// ============================================================================

/// Visibility class of a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerScope {
    /// Shared writing-skill knowledge, auto-included into prompts.
    SharedSkill,
    /// Shared reference information, included only on explicit request.
    SharedInfo,
    /// Knowledge owned by one user and visible only to that user.
    PrivateUser,
}

impl OwnerScope {
    /// Get the string form for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SharedSkill => "shared_skill",
            Self::SharedInfo => "shared_info",
            Self::PrivateUser => "private_user",
        }
    }

    /// Short label used in rendered context headers
    pub fn label(&self) -> &'static str {
        match self {
            Self::SharedSkill => "skill",
            Self::SharedInfo => "info",
            Self::PrivateUser => "private",
        }
    }
}

impl FromStr for OwnerScope {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shared_skill" => Ok(Self::SharedSkill),
            "shared_info" => Ok(Self::SharedInfo),
            "private_user" => Ok(Self::PrivateUser),
            other => Err(CoreError::UnknownScope(other.to_string())),
        }
    }
}

impl fmt::Display for OwnerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Usage
// ============================================================================

/// What a knowledge context is being assembled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeUsage {
    /// Drafting an article from a transcript.
    Article,
    /// Revising an existing article draft.
    ArticleEditing,
    /// Asking the interviewee the next question.
    Dialogue,
    /// Judging whether the answers so far are sufficient.
    Evaluation,
}

impl KnowledgeUsage {
    /// Get the string form used in logs and the CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::ArticleEditing => "article_editing",
            Self::Dialogue => "dialogue",
            Self::Evaluation => "evaluation",
        }
    }

    /// Whether this usage produces article text (as opposed to conversation).
    pub fn is_article(&self) -> bool {
        matches!(self, Self::Article | Self::ArticleEditing)
    }
}

impl FromStr for KnowledgeUsage {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "article" => Ok(Self::Article),
            "article_editing" => Ok(Self::ArticleEditing),
            "dialogue" => Ok(Self::Dialogue),
            "evaluation" => Ok(Self::Evaluation),
            other => Err(CoreError::UnknownUsage(other.to_string())),
        }
    }
}

impl fmt::Display for KnowledgeUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Fragment
// ============================================================================

/// Per-fragment usage flags.
///
/// `None` means "not set", which counts as allowed. Only an explicit
/// `Some(false)` excludes a fragment from the matching usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentFlags {
    #[serde(default)]
    pub use_for_article: Option<bool>,
    #[serde(default)]
    pub use_for_dialogue: Option<bool>,
    /// Only relevant while editing an existing article.
    #[serde(default)]
    pub is_edit_only: bool,
}

/// A unit of ingested reference knowledge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeFragment {
    pub id: String,
    pub owner_scope: OwnerScope,
    /// Required when `owner_scope` is `PrivateUser`.
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub usage_guide: String,
    #[serde(default)]
    pub flags: FragmentFlags,
    /// Soft-delete marker; recoverable until the fragment is hard-deleted.
    #[serde(default)]
    pub deleted: bool,
}

impl KnowledgeFragment {
    /// Create a shared skill fragment with default flags.
    pub fn shared_skill(id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self::new(id, OwnerScope::SharedSkill, None, summary)
    }

    /// Create a shared info fragment with default flags.
    pub fn shared_info(id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self::new(id, OwnerScope::SharedInfo, None, summary)
    }

    /// Create a private fragment owned by `owner_id`.
    pub fn private(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self::new(id, OwnerScope::PrivateUser, Some(owner_id.into()), summary)
    }

    fn new(
        id: impl Into<String>,
        owner_scope: OwnerScope,
        owner_id: Option<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            owner_scope,
            owner_id,
            summary: summary.into(),
            usage_guide: String::new(),
            flags: FragmentFlags::default(),
            deleted: false,
        }
    }

    /// Set the usage guide.
    pub fn with_usage_guide(mut self, guide: impl Into<String>) -> Self {
        self.usage_guide = guide.into();
        self
    }

    /// Replace the usage flags.
    pub fn with_flags(mut self, flags: FragmentFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Check the fields a store must never persist in an invalid state.
    pub fn validate(&self) -> CoreResult<()> {
        if self.id.trim().is_empty() {
            return Err(CoreError::EmptyFragmentId);
        }
        if self.owner_scope == OwnerScope::PrivateUser && self.owner_id.is_none() {
            return Err(CoreError::MissingOwner {
                fragment_id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// The authorization predicate.
    ///
    /// A deleted fragment is readable by nobody. A private fragment is
    /// readable only by the caller whose identity equals `owner_id`; a private
    /// fragment without an owner is readable by nobody. Shared fragments are
    /// readable by any authenticated caller.
    pub fn is_readable_by(&self, caller_id: &str) -> bool {
        if self.deleted {
            return false;
        }
        match self.owner_scope {
            OwnerScope::SharedSkill | OwnerScope::SharedInfo => true,
            OwnerScope::PrivateUser => self.owner_id.as_deref() == Some(caller_id),
        }
    }

    /// Whether this fragment was withheld because of ownership rather than
    /// because it is deleted.
    pub fn is_ownership_denied(&self, caller_id: &str) -> bool {
        !self.deleted
            && self.owner_scope == OwnerScope::PrivateUser
            && self.owner_id.as_deref() != Some(caller_id)
    }

    /// Whether the usage flags allow this fragment for `usage`.
    ///
    /// Article usages consult `useForArticle`; dialogue and evaluation consult
    /// `useForDialogue`. Edit-only fragments are limited to article editing.
    pub fn is_relevant_for(&self, usage: KnowledgeUsage) -> bool {
        if self.flags.is_edit_only && usage != KnowledgeUsage::ArticleEditing {
            return false;
        }
        let flag = if usage.is_article() {
            self.flags.use_for_article
        } else {
            self.flags.use_for_dialogue
        };
        flag != Some(false)
    }
}

// ============================================================================
// Query filter
// ============================================================================

/// Parameters for [`DocumentStore::list_fragments`](crate::document_store::DocumentStore::list_fragments).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentFilter {
    /// Also return soft-deleted fragments.
    pub include_deleted: bool,
    /// Restrict to fragments owned by this identity.
    pub owner_id: Option<String>,
    pub limit: Option<usize>,
}

impl FragmentFilter {
    /// Non-deleted fragments, at most `limit` of them.
    pub fn active(limit: usize) -> Self {
        Self {
            include_deleted: false,
            owner_id: None,
            limit: Some(limit),
        }
    }
}
