//! Text Generator Trait
//!
//! Defines the one collaborator every prompt-driven component depends on:
//! a stateless function from ordered prompt segments to free-form text.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::types::{GenerationOptions, LlmError, LlmResult};

/// Trait that all text generators must implement.
///
/// Implementations are injected into components at construction time.
/// A generator holds no per-conversation state; concurrent calls are
/// independent.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the generator name for identification in logs.
    fn name(&self) -> &str;

    /// Generate text for the given prompt segments.
    ///
    /// # Arguments
    /// * `segments` - Ordered prompt segments (instructions, context, transcript)
    /// * `options` - Temperature and output length
    ///
    /// # Returns
    /// The raw generated text. No structure is guaranteed.
    async fn generate(&self, segments: Vec<String>, options: GenerationOptions)
        -> LlmResult<String>;
}

/// Call `generator` and fail with [`LlmError::Timeout`] if it does not answer
/// within `timeout`.
pub async fn generate_with_timeout(
    generator: &dyn TextGenerator,
    segments: Vec<String>,
    options: GenerationOptions,
    timeout: Duration,
) -> LlmResult<String> {
    match tokio::time::timeout(timeout, generator.generate(segments, options)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                generator = generator.name(),
                timeout_secs = timeout.as_secs(),
                "text generation timed out"
            );
            Err(LlmError::Timeout {
                seconds: timeout.as_secs(),
            })
        }
    }
}
