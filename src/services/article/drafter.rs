//! Article Drafter
//!
//! Turns a finished interview transcript into a structured article draft,
//! and revises drafts from editor feedback. Both calls go through
//! structured output recovery; an unusable response comes back as the typed
//! failure rather than an error.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use ghostwriter_core::{conversation, ConversationMessage, KnowledgeUsage};
use ghostwriter_llm::{generate_with_timeout, GenerationOptions, TextGenerator};

use crate::models::AppConfig;
use crate::services::interview::parse_objectives;
use crate::services::knowledge::{AssemblyRequest, ContextBudgets, KnowledgeContextAssembler};
use crate::services::prompt_builder::{
    build_system_prompt, json_output_instruction, knowledge_segment, numbered_list,
};
use crate::services::structured_output::{recover, RecoveredStructure, RequiredShape};
use crate::utils::error::{AppError, AppResult};

const WRITER_ROLE: &str = "You are a ghostwriter. You turn interview transcripts into \
publishable articles in the interviewee's voice, using only facts stated in the material.";

const DRAFT_SCHEMA: &str = r#"{
  "title": "<headline>",
  "lead": "<opening paragraph>",
  "sections": [
    {"heading": "<section heading>", "body": "<section text>"}
  ],
  "closing": "<closing paragraph, or null>"
}"#;

/// One titled section of a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSection {
    #[serde(default)]
    pub heading: String,
    pub body: String,
}

/// Structured article draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDraft {
    pub title: String,
    pub lead: String,
    pub sections: Vec<ArticleSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing: Option<String>,
}

impl ArticleDraft {
    /// Shape every recovered draft must have.
    pub fn required_shape() -> RequiredShape {
        RequiredShape::object()
            .require("title")
            .require("lead")
            .non_empty_array("sections")
    }

    /// Render as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = vec![format!("# {}", self.title.trim()), String::new()];
        md.push(self.lead.trim().to_string());
        for section in &self.sections {
            md.push(String::new());
            if !section.heading.trim().is_empty() {
                md.push(format!("## {}", section.heading.trim()));
                md.push(String::new());
            }
            md.push(section.body.trim().to_string());
        }
        if let Some(closing) = self.closing.as_deref().filter(|c| !c.trim().is_empty()) {
            md.push(String::new());
            md.push(closing.trim().to_string());
        }
        md.join("\n")
    }
}

/// Input of [`ArticleDrafter::draft`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
    pub caller_id: String,
    pub history: Vec<ConversationMessage>,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplementary_facts: Option<String>,
    #[serde(default)]
    pub explicit_fragment_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budgets: Option<ContextBudgets>,
}

/// Input of [`ArticleDrafter::revise`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionRequest {
    pub caller_id: String,
    pub draft: ArticleDraft,
    pub feedback: String,
    #[serde(default)]
    pub explicit_fragment_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budgets: Option<ContextBudgets>,
}

pub struct ArticleDrafter {
    generator: Arc<dyn TextGenerator>,
    assembler: Arc<KnowledgeContextAssembler>,
    options: GenerationOptions,
    timeout: Duration,
    locale: String,
    budgets: ContextBudgets,
}

impl ArticleDrafter {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        assembler: Arc<KnowledgeContextAssembler>,
        config: &AppConfig,
    ) -> Self {
        Self {
            generator,
            assembler,
            options: GenerationOptions::new(
                config.generation.article_temperature,
                config.generation.max_output_tokens,
            ),
            timeout: Duration::from_secs(config.generation.request_timeout_secs),
            locale: config.interview.locale.clone(),
            budgets: ContextBudgets::from(&config.knowledge),
        }
    }

    /// Draft an article from an interview transcript.
    pub async fn draft(&self, request: &DraftRequest) -> AppResult<RecoveredStructure<ArticleDraft>> {
        if conversation::interviewee_turns(&request.history) == 0 {
            return Err(AppError::validation(
                "cannot draft an article from a transcript without answers",
            ));
        }

        let context = self
            .knowledge(
                &request.caller_id,
                KnowledgeUsage::Article,
                &request.explicit_fragment_ids,
                request.budgets,
            )
            .await;

        let mut segments = vec![build_system_prompt(
            WRITER_ROLE,
            "Write a complete article draft from the interview below.",
            &self.locale,
        )];
        let objectives: Vec<String> = request
            .objectives
            .iter()
            .flat_map(|entry| parse_objectives(entry))
            .collect();
        if !objectives.is_empty() {
            segments.push(format!(
                "## Interview Objectives\n{}",
                numbered_list(&objectives)
            ));
        }
        if let Some(facts) = request
            .supplementary_facts
            .as_deref()
            .filter(|f| !f.trim().is_empty())
        {
            segments.push(format!("## Additional Facts\n{}", facts.trim()));
        }
        segments.extend(knowledge_segment(&context));
        segments.push(format!(
            "## Transcript\n{}",
            conversation::render_transcript(&request.history)
        ));
        segments.push(json_output_instruction(DRAFT_SCHEMA));

        self.generate_draft(segments, "draft").await
    }

    /// Revise an existing draft according to editor feedback.
    pub async fn revise(
        &self,
        request: &RevisionRequest,
    ) -> AppResult<RecoveredStructure<ArticleDraft>> {
        if request.feedback.trim().is_empty() {
            return Err(AppError::validation("revision feedback is empty"));
        }

        let context = self
            .knowledge(
                &request.caller_id,
                KnowledgeUsage::ArticleEditing,
                &request.explicit_fragment_ids,
                request.budgets,
            )
            .await;
        let current = serde_json::to_string_pretty(&request.draft)?;

        let mut segments = vec![build_system_prompt(
            WRITER_ROLE,
            "Revise the draft below according to the editor's feedback. \
             Keep everything the feedback does not ask to change.",
            &self.locale,
        )];
        segments.extend(knowledge_segment(&context));
        segments.push(format!("## Current Draft\n{}", current));
        segments.push(format!("## Editor Feedback\n{}", request.feedback.trim()));
        segments.push(json_output_instruction(DRAFT_SCHEMA));

        self.generate_draft(segments, "revision").await
    }

    async fn knowledge(
        &self,
        caller_id: &str,
        usage: KnowledgeUsage,
        fragment_ids: &[String],
        budgets: Option<ContextBudgets>,
    ) -> String {
        let request = AssemblyRequest::new(caller_id, usage, budgets.unwrap_or(self.budgets))
            .with_fragments(fragment_ids.iter().cloned());
        self.assembler.assemble(&request).await.rendered_context
    }

    async fn generate_draft(
        &self,
        segments: Vec<String>,
        kind: &str,
    ) -> AppResult<RecoveredStructure<ArticleDraft>> {
        let raw_text =
            generate_with_timeout(self.generator.as_ref(), segments, self.options, self.timeout)
                .await?;

        let recovered = recover::<ArticleDraft>(&raw_text, &ArticleDraft::required_shape());
        match &recovered {
            RecoveredStructure::Ok {
                value,
                recovered_by,
            } => {
                info!(
                    kind,
                    stage = ?recovered_by,
                    sections = value.sections.len(),
                    "article output recovered"
                );
            }
            RecoveredStructure::Failed { failure, .. } => {
                warn!(kind, stage = failure.stage_label(), error = %failure, "article output unusable");
            }
        }
        debug!(kind, chars = raw_text.len(), "article generation finished");
        Ok(recovered)
    }
}
