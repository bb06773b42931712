//! Evaluation Results
//!
//! The outcome of judging an interview transcript against its objectives.
//! Constructed either from a recovered model response or from the heuristic
//! fallback; both paths go through [`EvaluationResult::normalized`] so the
//! invariants below always hold on a value handed to callers:
//!
//! - `user_stop_intent` implies `is_sufficient`
//! - `is_sufficient` implies no follow-up question
//! - completion rates are in `0..=100`

use serde::{Deserialize, Serialize};

/// Completion status of one objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveStatus {
    Complete,
    Partial,
    Missing,
}

impl ObjectiveStatus {
    /// Lenient parse of a status word from model output.
    ///
    /// Unknown words map to `Missing`.
    pub fn from_loose(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "complete" | "completed" | "done" | "covered" => Self::Complete,
            "partial" | "partially" | "in_progress" | "in progress" => Self::Partial,
            _ => Self::Missing,
        }
    }
}

/// Per-objective verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveEvaluation {
    pub objective: String,
    pub status: ObjectiveStatus,
    pub completion_rate: u8,
}

impl ObjectiveEvaluation {
    pub fn missing(objective: impl Into<String>) -> Self {
        Self {
            objective: objective.into(),
            status: ObjectiveStatus::Missing,
            completion_rate: 0,
        }
    }
}

/// Where an evaluation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationSource {
    /// Parsed from the model's structured response.
    Model,
    /// Produced by the local fallback because the response was unusable.
    Heuristic,
}

/// Result of evaluating one interview turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub per_objective: Vec<ObjectiveEvaluation>,
    pub overall_completion_rate: u8,
    pub user_stop_intent: bool,
    pub is_sufficient: bool,
    pub missing_elements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_angle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_question: Option<String>,
    pub source: EvaluationSource,
}

impl EvaluationResult {
    /// Enforce the cross-field invariants.
    pub fn normalized(mut self) -> Self {
        self.overall_completion_rate = self.overall_completion_rate.min(100);
        for item in &mut self.per_objective {
            item.completion_rate = item.completion_rate.min(100);
        }
        if self.user_stop_intent {
            self.is_sufficient = true;
        }
        if self.is_sufficient {
            self.follow_up_question = None;
        }
        self
    }

    /// Whether every listed objective is complete. An empty list is never
    /// considered complete.
    pub fn all_objectives_complete(&self) -> bool {
        !self.per_objective.is_empty()
            && self
                .per_objective
                .iter()
                .all(|o| o.status == ObjectiveStatus::Complete)
    }

    /// Objectives not yet marked complete, in order.
    pub fn open_objectives(&self) -> Vec<&str> {
        self.per_objective
            .iter()
            .filter(|o| o.status != ObjectiveStatus::Complete)
            .map(|o| o.objective.as_str())
            .collect()
    }
}
