//! Knowledge Commands
//!
//! Knowledge context assembly for a caller and usage.

use serde::{Deserialize, Serialize};
use tracing::debug;

use ghostwriter_core::KnowledgeUsage;

use crate::models::response::CommandResponse;
use crate::services::knowledge::{AssembledContext, AssemblyRequest, ContextBudgets};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

/// Arguments of [`assemble_knowledge_context`]. Budgets default to the
/// configured ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembleContextArgs {
    pub caller_id: String,
    pub usage: KnowledgeUsage,
    #[serde(default)]
    pub explicit_fragment_ids: Vec<String>,
    #[serde(default)]
    pub budgets: Option<ContextBudgets>,
}

/// Assemble the knowledge context block for one prompt
pub async fn assemble_knowledge_context(
    state: &AppState,
    args: AssembleContextArgs,
) -> CommandResponse<AssembledContext> {
    assemble(state, args).await.into()
}

async fn assemble(state: &AppState, args: AssembleContextArgs) -> AppResult<AssembledContext> {
    if args.caller_id.trim().is_empty() {
        return Err(AppError::validation("caller_id is required"));
    }
    let budgets = match args.budgets {
        Some(budgets) => budgets,
        None => ContextBudgets::from(&state.get_config().await.knowledge),
    };

    let request = AssemblyRequest::new(args.caller_id, args.usage, budgets)
        .with_fragments(args.explicit_fragment_ids);
    let context = state.assembler().await.assemble(&request).await;
    debug!(
        usage = request.usage.as_str(),
        included = context.included_fragment_ids.len(),
        "knowledge context command finished"
    );
    Ok(context)
}
