//! Settings Models
//!
//! Application configuration and settings data structures.

use serde::{Deserialize, Serialize};

/// Budgets and limits for knowledge context assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeSettings {
    /// Maximum number of shared skill fragments auto-included (0..=10)
    pub skill_fragment_cap: usize,
    /// Character budget for one fragment's chunk text
    pub per_fragment_char_budget: usize,
    /// Character budget for the whole rendered context
    pub aggregate_char_budget: usize,
    /// Maximum chunks fetched per fragment
    pub chunk_fetch_limit: usize,
    /// Deadline for each individual store read
    pub fetch_timeout_ms: u64,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            skill_fragment_cap: 8,
            per_fragment_char_budget: 4000,
            aggregate_char_budget: 16000,
            chunk_fetch_limit: 50,
            fetch_timeout_ms: 5000,
        }
    }
}

/// Text generator knobs per call site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub evaluation_temperature: f32,
    pub follow_up_temperature: f32,
    pub article_temperature: f32,
    pub max_output_tokens: u32,
    pub request_timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            evaluation_temperature: 0.2,
            follow_up_temperature: 0.7,
            article_temperature: 0.6,
            max_output_tokens: 2048,
            request_timeout_secs: 60,
        }
    }
}

/// Interview turn behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterviewSettings {
    /// Attempts allowed when the follow-up repeats a prior question (1..=2)
    pub duplicate_question_max_attempts: u32,
    /// Degrade to the heuristic instead of failing the turn when the
    /// generator errors
    pub fallback_on_generation_failure: bool,
    /// Language code of the interview (e.g., "en", "ja")
    pub locale: String,
}

impl Default for InterviewSettings {
    fn default() -> Self {
        Self {
            duplicate_question_max_attempts: 2,
            fallback_on_generation_failure: false,
            locale: "en".to_string(),
        }
    }
}

/// Application configuration stored in config.json
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub knowledge: KnowledgeSettings,
    pub generation: GenerationSettings,
    pub interview: InterviewSettings,
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub skill_fragment_cap: Option<usize>,
    pub per_fragment_char_budget: Option<usize>,
    pub aggregate_char_budget: Option<usize>,
    pub evaluation_temperature: Option<f32>,
    pub follow_up_temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub fallback_on_generation_failure: Option<bool>,
    pub locale: Option<String>,
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(cap) = update.skill_fragment_cap {
            self.knowledge.skill_fragment_cap = cap;
        }
        if let Some(budget) = update.per_fragment_char_budget {
            self.knowledge.per_fragment_char_budget = budget;
        }
        if let Some(budget) = update.aggregate_char_budget {
            self.knowledge.aggregate_char_budget = budget;
        }
        if let Some(t) = update.evaluation_temperature {
            self.generation.evaluation_temperature = t;
        }
        if let Some(t) = update.follow_up_temperature {
            self.generation.follow_up_temperature = t;
        }
        if let Some(max) = update.max_output_tokens {
            self.generation.max_output_tokens = max;
        }
        if let Some(enabled) = update.fallback_on_generation_failure {
            self.interview.fallback_on_generation_failure = enabled;
        }
        if let Some(locale) = update.locale {
            self.interview.locale = locale;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let k = &self.knowledge;
        if k.skill_fragment_cap > 10 {
            return Err(format!(
                "skill_fragment_cap must be between 0 and 10, got {}",
                k.skill_fragment_cap
            ));
        }
        if k.per_fragment_char_budget == 0 || k.aggregate_char_budget == 0 {
            return Err("character budgets must be greater than zero".to_string());
        }
        if k.chunk_fetch_limit == 0 {
            return Err("chunk_fetch_limit must be at least 1".to_string());
        }
        if k.fetch_timeout_ms == 0 {
            return Err("fetch_timeout_ms must be at least 1".to_string());
        }

        let g = &self.generation;
        for (name, t) in [
            ("evaluation_temperature", g.evaluation_temperature),
            ("follow_up_temperature", g.follow_up_temperature),
            ("article_temperature", g.article_temperature),
        ] {
            if !(0.0..=2.0).contains(&t) {
                return Err(format!("{} must be between 0.0 and 2.0, got {}", name, t));
            }
        }
        if g.max_output_tokens == 0 {
            return Err("max_output_tokens must be at least 1".to_string());
        }
        if g.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be at least 1".to_string());
        }

        let i = &self.interview;
        if !(1..=2).contains(&i.duplicate_question_max_attempts) {
            return Err(format!(
                "duplicate_question_max_attempts must be 1 or 2, got {}",
                i.duplicate_question_max_attempts
            ));
        }
        if i.locale.len() < 2 || i.locale.len() > 5 {
            return Err(format!("Invalid locale code: {}", i.locale));
        }

        Ok(())
    }
}
