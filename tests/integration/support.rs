//! Test Support
//!
//! Scripted text generator and state builders shared by the integration
//! tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use ghostwriter::storage::InMemoryDocumentStore;
use ghostwriter::{AppConfig, AppState};
use ghostwriter_core::DocumentStore;
use ghostwriter_llm::{GenerationOptions, LlmError, LlmResult, TextGenerator};

/// Replays queued responses; the last one repeats once the queue drains.
/// Every prompt is recorded for inspection.
pub struct ScriptedGenerator {
    queue: Mutex<VecDeque<LlmResult<String>>>,
    last: Mutex<Option<LlmResult<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(responses.iter().map(|r| Ok(r.to_string())).collect()),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(error: LlmError) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            last: Mutex::new(Some(Err(error))),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Each call's segments joined with newlines.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, segments: Vec<String>, _options: GenerationOptions) -> LlmResult<String> {
        self.prompts.lock().unwrap().push(segments.join("\n"));

        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.queue.lock().unwrap().pop_front() {
            *last = Some(next);
        }
        last.clone().unwrap_or(Err(LlmError::EmptyResponse))
    }
}

pub fn state(store: Arc<dyn DocumentStore>, generator: Arc<ScriptedGenerator>) -> AppState {
    AppState::new(store, generator, AppConfig::default())
}

pub fn empty_state(generator: Arc<ScriptedGenerator>) -> AppState {
    state(Arc::new(InMemoryDocumentStore::default()), generator)
}
