//! Settings Commands
//!
//! Read and partially update the knowledge budgets, generation knobs and
//! interview behavior held by [`AppState`].

use crate::models::response::CommandResponse;
use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::state::AppState;

pub async fn get_settings(state: &AppState) -> CommandResponse<AppConfig> {
    CommandResponse::ok(state.get_config().await)
}

/// Apply a partial update. Out-of-range values reject the whole update.
pub async fn update_settings(
    state: &AppState,
    update: SettingsUpdate,
) -> CommandResponse<AppConfig> {
    state.update_config(update).await.into()
}
