//! Ghostwriter - Interview Backend Library
//!
//! Backend for AI-mediated interviews that become ghost-written articles.
//! It includes:
//! - Knowledge context assembly (shared skill/info and private fragments)
//! - The interview progress state machine
//! - Structured output recovery for free-form model text
//! - Article drafting from finished transcripts
//! - Storage layer (SQLite and in-memory document stores, config file)
//! - Call-style command functions over an injected application state

pub mod commands;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

// Re-export commonly used items from commands
pub use commands::{
    // Knowledge
    assemble_knowledge_context, AssembleContextArgs,
    // Interview
    evaluate_turn, run_turn,
    // Structured output
    recover_structured_output,
    // Article
    draft_article, revise_article,
    // Settings
    get_settings, update_settings,
};
pub use models::response::*;
pub use models::settings::{AppConfig, SettingsUpdate};
pub use state::AppState;
pub use utils::error::{AppError, AppResult};
