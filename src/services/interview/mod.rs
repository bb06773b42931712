//! Interview
//!
//! The interview progress state machine: answer evaluation against the
//! objectives, deterministic intent detection, and non-repeating follow-up
//! question generation.

pub mod evaluator;
pub mod follow_up;
pub mod intent;
pub mod machine;
pub mod prompts;
pub mod turn;

pub use evaluator::TurnEvaluator;
pub use follow_up::{extract_question, generic_question, is_duplicate, FollowUpGenerator};
pub use intent::{detect_skip_intent, detect_stop_intent, parse_objectives};
pub use machine::{InterviewMachine, RunTurnRequest};
pub use turn::{ConclusionReason, InterviewState, TurnAction, TurnInput, TurnResult};
