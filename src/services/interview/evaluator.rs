//! Turn Evaluator
//!
//! One text-generator call judges the latest answer against the objectives.
//! The response goes through structured output recovery; an unusable
//! response degrades to a deterministic heuristic instead of failing the
//! turn.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use ghostwriter_core::{
    EvaluationResult, EvaluationSource, ObjectiveEvaluation, ObjectiveStatus,
};
use ghostwriter_llm::{generate_with_timeout, GenerationOptions, TextGenerator};

use crate::models::AppConfig;
use crate::services::structured_output::{recover, RecoveredStructure, RequiredShape};
use crate::utils::error::{AppError, AppResult};

use super::follow_up::generic_question;
use super::intent::{best_matching_objective, detect_skip_intent, detect_stop_intent};
use super::prompts::evaluation_prompt;
use super::turn::TurnInput;

/// Evaluation object as the model writes it. Scalars are read leniently.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvaluation {
    objectives: Vec<RawObjective>,
    #[serde(default)]
    overall_completion_rate: Value,
    #[serde(default)]
    user_stop_intent: Value,
    is_sufficient: Value,
    #[serde(default)]
    missing_elements: Vec<Value>,
    #[serde(default)]
    suggested_angle: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawObjective {
    objective: String,
    status: String,
    completion_rate: Value,
}

/// Deterministic signals read from the answer before the model is consulted.
#[derive(Debug, Clone, Copy, Default)]
struct IntentSignals {
    stop: bool,
    /// Objective deferred by a skip/later answer.
    skipped_objective: Option<usize>,
}

impl IntentSignals {
    fn detect(input: &TurnInput) -> Self {
        let stop = detect_stop_intent(&input.last_answer);
        let skipped_objective = if !stop && detect_skip_intent(&input.last_answer) {
            // A generic question ("Where is it?") names no objective; the
            // deferring answer usually does.
            best_matching_objective(&input.last_question, &input.objectives)
                .or_else(|| best_matching_objective(&input.last_answer, &input.objectives))
        } else {
            None
        };
        Self {
            stop,
            skipped_objective,
        }
    }
}

/// Judges interview answers against their objectives.
pub struct TurnEvaluator {
    generator: Arc<dyn TextGenerator>,
    options: GenerationOptions,
    timeout: Duration,
    locale: String,
    fallback_on_generation_failure: bool,
}

impl TurnEvaluator {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &AppConfig) -> Self {
        Self {
            generator,
            options: GenerationOptions::new(
                config.generation.evaluation_temperature,
                config.generation.max_output_tokens,
            ),
            timeout: Duration::from_secs(config.generation.request_timeout_secs),
            locale: config.interview.locale.clone(),
            fallback_on_generation_failure: config.interview.fallback_on_generation_failure,
        }
    }

    /// Evaluate the latest answer.
    ///
    /// A model-sourced result never carries a follow-up question; the
    /// heuristic result always carries a generic one unless it concludes.
    pub async fn evaluate(&self, input: &TurnInput) -> AppResult<EvaluationResult> {
        let input = &input.clone().with_normalized_objectives();
        let signals = IntentSignals::detect(input);
        let segments = evaluation_prompt(input, &self.locale);

        let raw_text = match generate_with_timeout(
            self.generator.as_ref(),
            segments,
            self.options,
            self.timeout,
        )
        .await
        {
            Ok(text) => text,
            Err(e) if self.fallback_on_generation_failure => {
                warn!(
                    generator = self.generator.name(),
                    error = %e,
                    "evaluation generation failed, using heuristic"
                );
                return Ok(heuristic_evaluation(input, signals));
            }
            Err(e) => return Err(AppError::Generation(e)),
        };

        let shape = RequiredShape::object()
            .require("objectives")
            .require("isSufficient");
        match recover::<RawEvaluation>(&raw_text, &shape) {
            RecoveredStructure::Ok {
                value,
                recovered_by,
            } => {
                debug!(stage = ?recovered_by, "evaluation recovered");
                Ok(reconcile(value, input, signals))
            }
            RecoveredStructure::Failed { failure, .. } => {
                warn!(
                    stage = failure.stage_label(),
                    error = %failure,
                    "evaluation response unusable, using heuristic"
                );
                Ok(heuristic_evaluation(input, signals))
            }
        }
    }
}

/// Fallback evaluation used when the model response cannot be used.
///
/// Completion is estimated from answered turns per objective. Objectives
/// stay missing apart from one deferred by a skip answer.
fn heuristic_evaluation(input: &TurnInput, signals: IntentSignals) -> EvaluationResult {
    let mut per_objective: Vec<ObjectiveEvaluation> = input
        .objectives
        .iter()
        .map(ObjectiveEvaluation::missing)
        .collect();
    if let Some(item) = signals.skipped_objective.and_then(|i| per_objective.get_mut(i)) {
        mark_complete(item);
    }

    let overall = if input.is_open_ended() {
        0
    } else {
        let ratio = input.answered_turns() * 100 / input.objectives.len();
        ratio.min(100) as u8
    };

    let mut result = EvaluationResult {
        per_objective,
        overall_completion_rate: overall,
        user_stop_intent: signals.stop,
        is_sufficient: false,
        missing_elements: Vec::new(),
        suggested_angle: None,
        follow_up_question: None,
        source: EvaluationSource::Heuristic,
    };
    result.missing_elements = owned(result.open_objectives());
    result.follow_up_question = Some(generic_question(input, &result.missing_elements));
    result.normalized()
}

fn owned(items: Vec<&str>) -> Vec<String> {
    items.into_iter().map(str::to_string).collect()
}

fn reconcile(raw: RawEvaluation, input: &TurnInput, signals: IntentSignals) -> EvaluationResult {
    let mut per_objective: Vec<ObjectiveEvaluation> = input
        .objectives
        .iter()
        .enumerate()
        .map(|(i, objective)| match find_raw(&raw.objectives, objective, i, input.objectives.len()) {
            Some(found) => objective_from_raw(objective, found),
            None => ObjectiveEvaluation::missing(objective),
        })
        .collect();
    if let Some(item) = signals.skipped_objective.and_then(|i| per_objective.get_mut(i)) {
        mark_complete(item);
    }

    let overall = if per_objective.is_empty() {
        loose_rate(&raw.overall_completion_rate).unwrap_or(0)
    } else {
        let sum: usize = per_objective.iter().map(|o| o.completion_rate as usize).sum();
        let n = per_objective.len();
        ((sum + n / 2) / n).min(100) as u8
    };

    let user_stop_intent = signals.stop || loose_bool(&raw.user_stop_intent);
    let mut result = EvaluationResult {
        per_objective,
        overall_completion_rate: overall,
        user_stop_intent,
        is_sufficient: false,
        missing_elements: Vec::new(),
        suggested_angle: raw
            .suggested_angle
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty()),
        follow_up_question: None,
        source: EvaluationSource::Model,
    };

    let none_missing = result
        .per_objective
        .iter()
        .all(|o| o.status != ObjectiveStatus::Missing);
    result.is_sufficient = if input.is_open_ended() {
        user_stop_intent
    } else {
        user_stop_intent
            || result.all_objectives_complete()
            || (loose_bool(&raw.is_sufficient) && none_missing)
    };

    let completed: Vec<String> = result
        .per_objective
        .iter()
        .filter(|o| o.status == ObjectiveStatus::Complete)
        .map(|o| normalize_text(&o.objective))
        .collect();
    result.missing_elements = raw
        .missing_elements
        .iter()
        .filter_map(loose_string)
        .filter(|m| !completed.contains(&normalize_text(m)))
        .collect();
    if result.missing_elements.is_empty() {
        result.missing_elements = owned(result.open_objectives());
    }

    result.normalized()
}

/// Match a model entry to one of our objectives: exact text first, then
/// containment, then position when the model listed the same count.
fn find_raw<'a>(
    raw: &'a [RawObjective],
    objective: &str,
    index: usize,
    expected_len: usize,
) -> Option<&'a RawObjective> {
    let wanted = normalize_text(objective);
    raw.iter()
        .find(|r| normalize_text(&r.objective) == wanted)
        .or_else(|| {
            raw.iter().find(|r| {
                let text = normalize_text(&r.objective);
                !text.is_empty() && (text.contains(&wanted) || wanted.contains(&text))
            })
        })
        .or_else(|| {
            if raw.len() == expected_len {
                raw.get(index)
            } else {
                None
            }
        })
}

fn objective_from_raw(objective: &str, raw: &RawObjective) -> ObjectiveEvaluation {
    let status = ObjectiveStatus::from_loose(&raw.status);
    let completion_rate = match status {
        ObjectiveStatus::Complete => 100,
        ObjectiveStatus::Partial => loose_rate(&raw.completion_rate).unwrap_or(50),
        ObjectiveStatus::Missing => loose_rate(&raw.completion_rate).unwrap_or(0),
    };
    ObjectiveEvaluation {
        objective: objective.to_string(),
        status,
        completion_rate,
    }
}

fn mark_complete(item: &mut ObjectiveEvaluation) {
    item.status = ObjectiveStatus::Complete;
    item.completion_rate = 100;
}

fn normalize_text(s: &str) -> String {
    s.trim().to_lowercase()
}

/// A 0..=100 rate from a number or a string like "80" / "80%".
fn loose_rate(value: &Value) -> Option<u8> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    Some(n.round().clamp(0.0, 100.0) as u8)
}

fn loose_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes"),
        _ => false,
    }
}

fn loose_string(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => return None,
        other => other.to_string(),
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
