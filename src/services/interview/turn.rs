//! Interview Turn Types
//!
//! Inputs and outputs of one pass through the interview progress machine.

use serde::{Deserialize, Serialize};

use ghostwriter_core::{
    conversation::{self, ConversationMessage, MessageRole},
    EvaluationResult,
};

use super::intent::parse_objectives;

/// States a turn passes through.
///
/// `AwaitingAnswer -> Evaluating -> AskFollowUp | Conclude`. `Conclude` is
/// terminal; `AskFollowUp` hands control back to the interviewee, so the
/// next turn starts in `AwaitingAnswer` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewState {
    AwaitingAnswer,
    Evaluating,
    AskFollowUp,
    Conclude,
}

/// What the caller should do after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnAction {
    /// Put `question` to the interviewee.
    AskFollowUp,
    /// End the interview; the transcript is ready for drafting.
    EndInterview,
}

/// Why an interview concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConclusionReason {
    /// The interviewee asked to end.
    UserStopIntent,
    /// The objectives are covered.
    ObjectivesCovered,
}

/// Everything needed to evaluate one answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnInput {
    /// Transcript so far. May or may not already contain the last exchange.
    #[serde(default)]
    pub history: Vec<ConversationMessage>,
    pub last_question: String,
    pub last_answer: String,
    /// Ordered sub-objectives. Empty means an open-ended interview.
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplementary_facts: Option<String>,
    /// Rendered knowledge for evaluation (may be empty).
    #[serde(default)]
    pub knowledge_context: String,
    /// Rendered knowledge for question generation (may be empty).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue_context: Option<String>,
}

impl TurnInput {
    pub fn new(
        history: Vec<ConversationMessage>,
        last_question: impl Into<String>,
        last_answer: impl Into<String>,
        objectives: Vec<String>,
    ) -> Self {
        Self {
            history,
            last_question: last_question.into(),
            last_answer: last_answer.into(),
            objectives,
            ..Default::default()
        }
    }

    /// Split multi-line entries into one objective per line, strip bullets
    /// and numbering, and drop blank entries.
    pub fn with_normalized_objectives(mut self) -> Self {
        self.objectives = self
            .objectives
            .iter()
            .flat_map(|entry| parse_objectives(entry))
            .collect();
        self
    }

    /// No usable objective: conclusion rests on stop intent alone.
    pub fn is_open_ended(&self) -> bool {
        self.objectives.iter().all(|o| o.trim().is_empty())
    }

    /// Every question asked so far, including the last one, in order.
    pub fn prior_questions(&self) -> Vec<&str> {
        let mut asked = conversation::questions(&self.history);
        let last = self.last_question.trim();
        if !last.is_empty() && asked.last().map(|q| q.trim()) != Some(last) {
            asked.push(last);
        }
        asked
    }

    /// Answers given so far, counting the last answer once.
    pub fn answered_turns(&self) -> usize {
        let in_history = conversation::interviewee_turns(&self.history);
        let last = self.last_answer.trim();
        if last.is_empty() {
            return in_history;
        }
        let already_recorded = self
            .history
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Interviewee)
            .is_some_and(|m| m.content.trim() == last);
        if already_recorded {
            in_history
        } else {
            in_history + 1
        }
    }

    /// History rendered as a transcript.
    pub fn transcript(&self) -> String {
        conversation::render_transcript(&self.history)
    }
}

/// Outcome of one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResult {
    pub action: TurnAction,
    /// Next question when `action` is `AskFollowUp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<ConclusionReason>,
    pub evaluation: EvaluationResult,
    /// States visited during the turn, in order.
    pub states: Vec<InterviewState>,
}

impl TurnResult {
    pub fn final_state(&self) -> Option<InterviewState> {
        self.states.last().copied()
    }
}
