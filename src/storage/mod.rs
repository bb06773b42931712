//! Storage Layer
//!
//! Handles all data persistence: the knowledge document stores (SQLite and
//! in-memory) and the JSON config.

pub mod config;
pub mod database;
pub mod memory;

pub use config::*;
pub use database::*;
pub use memory::*;
