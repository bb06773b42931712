//! Article Commands
//!
//! Drafting and revising articles from interview transcripts.

use crate::models::response::CommandResponse;
use crate::services::article::{ArticleDraft, DraftRequest, RevisionRequest};
use crate::services::structured_output::RecoveredStructure;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

/// Draft an article from a finished interview
pub async fn draft_article(state: &AppState, request: DraftRequest) -> CommandResponse<ArticleDraft> {
    let result = state.article_drafter().await.draft(&request).await;
    into_draft(result).into()
}

/// Revise a draft according to editor feedback
pub async fn revise_article(
    state: &AppState,
    request: RevisionRequest,
) -> CommandResponse<ArticleDraft> {
    let result = state.article_drafter().await.revise(&request).await;
    into_draft(result).into()
}

fn into_draft(result: AppResult<RecoveredStructure<ArticleDraft>>) -> AppResult<ArticleDraft> {
    result?.into_result().map_err(|failure| {
        AppError::recovery(format!("{}: {}", failure.stage_label(), failure))
    })
}
