//! Test doubles shared by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use ghostwriter_llm::{GenerationOptions, LlmError, LlmResult, TextGenerator};

/// Text generator that replays canned responses in order, repeating the
/// last one once the script runs out, and records every prompt it receives.
pub struct ScriptedGenerator {
    responses: Vec<LlmResult<String>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: responses.into_iter().map(|r| Ok(r.into())).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A generator whose every call fails with `error`.
    pub fn failing(error: LlmError) -> Self {
        Self {
            responses: vec![Err(error)],
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        segments: Vec<String>,
        _options: GenerationOptions,
    ) -> LlmResult<String> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(segments);
            calls.len() - 1
        };
        self.responses
            .get(index)
            .or_else(|| self.responses.last())
            .cloned()
            .unwrap_or(Err(LlmError::EmptyResponse))
    }
}
