//! Ghostwriter LLM
//!
//! The text generator seam used by the interview and drafting components:
//! - `TextGenerator` trait (prompt segments in, free-form text out)
//! - `GenerationOptions` (temperature, output length)
//! - `LlmError` / `LlmResult`
//! - `generate_with_timeout` deadline wrapper
//! - `RetryPolicy`, the bounded retry used by duplicate-question suppression
//!
//! Vendor clients live outside this workspace and implement `TextGenerator`.

pub mod provider;
pub mod retry;
pub mod types;

// Re-export main types
pub use provider::{generate_with_timeout, TextGenerator};
pub use retry::{RetryPolicy, MAX_ATTEMPTS_CEILING};
pub use types::*;
