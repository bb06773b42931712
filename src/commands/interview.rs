//! Interview Commands
//!
//! Turn evaluation and full turns of the interview progress machine.

use ghostwriter_core::EvaluationResult;

use crate::models::response::CommandResponse;
use crate::services::interview::{RunTurnRequest, TurnInput, TurnResult};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

/// Evaluate the latest answer with caller-supplied knowledge contexts
pub async fn evaluate_turn(state: &AppState, input: TurnInput) -> CommandResponse<EvaluationResult> {
    evaluate(state, input).await.into()
}

/// Run one turn, assembling the knowledge contexts for the caller
pub async fn run_turn(state: &AppState, request: RunTurnRequest) -> CommandResponse<TurnResult> {
    run(state, request).await.into()
}

async fn evaluate(state: &AppState, input: TurnInput) -> AppResult<EvaluationResult> {
    validate_turn(&input)?;
    state.interview_machine().await.evaluate_turn(&input).await
}

async fn run(state: &AppState, request: RunTurnRequest) -> AppResult<TurnResult> {
    if request.caller_id.trim().is_empty() {
        return Err(AppError::validation("caller_id is required"));
    }
    validate_turn(&request.turn)?;
    state.interview_machine().await.run_turn(&request).await
}

fn validate_turn(input: &TurnInput) -> AppResult<()> {
    if input.last_question.trim().is_empty() {
        return Err(AppError::validation("last_question is required"));
    }
    Ok(())
}
