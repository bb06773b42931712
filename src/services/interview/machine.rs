//! Interview Progress Machine
//!
//! Drives one turn: evaluate the latest answer, then either conclude or
//! produce the next question.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ghostwriter_core::{EvaluationResult, KnowledgeUsage};
use ghostwriter_llm::TextGenerator;

use crate::models::AppConfig;
use crate::services::knowledge::{AssemblyRequest, ContextBudgets, KnowledgeContextAssembler};
use crate::utils::error::AppResult;

use super::evaluator::TurnEvaluator;
use super::follow_up::FollowUpGenerator;
use super::turn::{ConclusionReason, InterviewState, TurnAction, TurnInput, TurnResult};

/// A turn whose knowledge contexts are assembled on the caller's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTurnRequest {
    pub caller_id: String,
    #[serde(flatten)]
    pub turn: TurnInput,
    #[serde(default)]
    pub explicit_fragment_ids: Vec<String>,
    /// Overrides the configured budgets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budgets: Option<ContextBudgets>,
}

impl RunTurnRequest {
    pub fn new(caller_id: impl Into<String>, turn: TurnInput) -> Self {
        Self {
            caller_id: caller_id.into(),
            turn,
            explicit_fragment_ids: Vec::new(),
            budgets: None,
        }
    }
}

pub struct InterviewMachine {
    evaluator: TurnEvaluator,
    follow_up: FollowUpGenerator,
    assembler: Arc<KnowledgeContextAssembler>,
    budgets: ContextBudgets,
}

impl InterviewMachine {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        assembler: Arc<KnowledgeContextAssembler>,
        config: &AppConfig,
    ) -> Self {
        Self {
            evaluator: TurnEvaluator::new(generator.clone(), config),
            follow_up: FollowUpGenerator::new(generator, config),
            assembler,
            budgets: ContextBudgets::from(&config.knowledge),
        }
    }

    /// Evaluate a turn. When the answers are insufficient the result carries
    /// the next question in `follow_up_question`.
    pub async fn evaluate_turn(&self, input: &TurnInput) -> AppResult<EvaluationResult> {
        Ok(self.advance(input).await?.evaluation)
    }

    /// Run one turn with caller-supplied knowledge contexts.
    pub async fn advance(&self, input: &TurnInput) -> AppResult<TurnResult> {
        let mut states = vec![InterviewState::AwaitingAnswer, InterviewState::Evaluating];
        let mut evaluation = self.evaluator.evaluate(input).await?;

        if evaluation.is_sufficient {
            states.push(InterviewState::Conclude);
            let reason = if evaluation.user_stop_intent {
                ConclusionReason::UserStopIntent
            } else {
                ConclusionReason::ObjectivesCovered
            };
            info!(
                reason = ?reason,
                completion = evaluation.overall_completion_rate,
                "interview concluded"
            );
            return Ok(TurnResult {
                action: TurnAction::EndInterview,
                question: None,
                conclusion: Some(reason),
                evaluation,
                states,
            });
        }

        // The heuristic evaluation already carries a generic question
        let question = match evaluation.follow_up_question.take() {
            Some(question) => question,
            None => self.follow_up.generate(input, &evaluation).await?,
        };
        debug!(
            completion = evaluation.overall_completion_rate,
            missing = evaluation.missing_elements.len(),
            "asking follow-up"
        );
        evaluation.follow_up_question = Some(question.clone());
        states.push(InterviewState::AskFollowUp);

        Ok(TurnResult {
            action: TurnAction::AskFollowUp,
            question: Some(question),
            conclusion: None,
            evaluation,
            states,
        })
    }

    /// Assemble the evaluation and dialogue contexts, then run the turn.
    pub async fn run_turn(&self, request: &RunTurnRequest) -> AppResult<TurnResult> {
        let budgets = request.budgets.unwrap_or(self.budgets);
        let evaluation_request =
            AssemblyRequest::new(&request.caller_id, KnowledgeUsage::Evaluation, budgets)
                .with_fragments(request.explicit_fragment_ids.iter().cloned());
        let dialogue_request =
            AssemblyRequest::new(&request.caller_id, KnowledgeUsage::Dialogue, budgets)
                .with_fragments(request.explicit_fragment_ids.iter().cloned());

        let (evaluation_context, dialogue_context) = tokio::join!(
            self.assembler.assemble(&evaluation_request),
            self.assembler.assemble(&dialogue_request)
        );
        debug!(
            evaluation_fragments = evaluation_context.included_fragment_ids.len(),
            dialogue_fragments = dialogue_context.included_fragment_ids.len(),
            "knowledge contexts assembled for turn"
        );

        let mut input = request.turn.clone();
        input.knowledge_context = evaluation_context.rendered_context;
        input.dialogue_context = Some(dialogue_context.rendered_context);
        self.advance(&input).await
    }
}
