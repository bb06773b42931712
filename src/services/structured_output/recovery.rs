//! Structured Output Recovery
//!
//! Turns free-form model text that is expected to contain a JSON object into
//! a validated value. Attempts run in order and the first successful parse
//! wins:
//!
//! 1. direct parse of the trimmed text
//! 2. interior of the first fenced block
//! 3. first `{` through last `}`
//! 4. string-literal escaping repair (closing an unterminated string)
//! 5. bracket-balance closure of the repaired text
//!
//! A successful parse is then checked against the caller's [`RequiredShape`].
//! The result is always a [`RecoveredStructure`]; nothing here returns an
//! error or panics, whatever the input.

use serde::de::DeserializeOwned;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use super::repair::{
    brace_span, close_brackets, escape_string_literals, fenced_block, repair_candidate,
};
use super::shape::{RequiredShape, ShapeViolation};

/// Recovery attempt, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStage {
    DirectParse,
    FencedBlock,
    BraceSpan,
    StringRepair,
    BracketClosure,
}

impl RecoveryStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectParse => "direct_parse",
            Self::FencedBlock => "fenced_block",
            Self::BraceSpan => "brace_span",
            Self::StringRepair => "string_repair",
            Self::BracketClosure => "bracket_closure",
        }
    }

    /// Whether the text had to be rewritten (not just located) to parse.
    pub fn is_repair(&self) -> bool {
        matches!(self, Self::StringRepair | Self::BracketClosure)
    }
}

/// Why recovery failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecoveryFailure {
    /// No attempt produced valid JSON. `last_stage` is the furthest stage
    /// that had text to work on.
    Syntax {
        last_stage: RecoveryStage,
        message: String,
    },
    /// Valid JSON that does not meet the required shape.
    Shape { violations: Vec<ShapeViolation> },
}

impl RecoveryFailure {
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }

    pub fn is_shape(&self) -> bool {
        matches!(self, Self::Shape { .. })
    }

    /// Stage label reported to callers (`shape_validation` for shape failures).
    pub fn stage_label(&self) -> &'static str {
        match self {
            Self::Syntax { last_stage, .. } => last_stage.as_str(),
            Self::Shape { .. } => "shape_validation",
        }
    }
}

impl std::fmt::Display for RecoveryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoveryFailure::Syntax {
                last_stage,
                message,
            } => write!(f, "malformed JSON after {}: {}", last_stage.as_str(), message),
            RecoveryFailure::Shape { violations } => {
                let joined = violations
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "well-formed but incomplete: {}", joined)
            }
        }
    }
}

/// Tagged result of recovery. Never partially populated.
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveredStructure<T> {
    Ok {
        value: T,
        recovered_by: RecoveryStage,
    },
    Failed {
        raw_text: String,
        failure: RecoveryFailure,
    },
}

impl<T> RecoveredStructure<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// The recovered value, if any.
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok { value, .. } => Some(value),
            Self::Failed { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&RecoveryFailure> {
        match self {
            Self::Ok { .. } => None,
            Self::Failed { failure, .. } => Some(failure),
        }
    }

    pub fn into_result(self) -> Result<T, RecoveryFailure> {
        match self {
            Self::Ok { value, .. } => Ok(value),
            Self::Failed { failure, .. } => Err(failure),
        }
    }

    fn failed(raw_text: &str, failure: RecoveryFailure) -> Self {
        Self::Failed {
            raw_text: raw_text.to_string(),
            failure,
        }
    }
}

/// Serialized as `{ ok: true, value, recoveredBy }` or
/// `{ ok: false, rawText, failureStage, failure }`.
impl<T: Serialize> Serialize for RecoveredStructure<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Ok {
                value,
                recovered_by,
            } => {
                let mut s = serializer.serialize_struct("RecoveredStructure", 3)?;
                s.serialize_field("ok", &true)?;
                s.serialize_field("value", value)?;
                s.serialize_field("recoveredBy", recovered_by)?;
                s.end()
            }
            Self::Failed { raw_text, failure } => {
                let mut s = serializer.serialize_struct("RecoveredStructure", 4)?;
                s.serialize_field("ok", &false)?;
                s.serialize_field("rawText", raw_text)?;
                s.serialize_field("failureStage", failure.stage_label())?;
                s.serialize_field("failure", failure)?;
                s.end()
            }
        }
    }
}

/// Recover a JSON value from `raw_text` and check it against `shape`.
pub fn recover_value(raw_text: &str, shape: &RequiredShape) -> RecoveredStructure<Value> {
    let (value, stage) = match parse_with_repairs(raw_text) {
        Ok(found) => found,
        Err(failure) => {
            debug!(stage = failure.stage_label(), "structured output unrecoverable");
            return RecoveredStructure::failed(raw_text, failure);
        }
    };

    let violations = shape.check(&value);
    if !violations.is_empty() {
        debug!(
            violations = violations.len(),
            "structured output failed shape check"
        );
        return RecoveredStructure::failed(raw_text, RecoveryFailure::Shape { violations });
    }

    if stage.is_repair() {
        debug!(stage = ?stage, "structured output recovered after repair");
    }
    RecoveredStructure::Ok {
        value,
        recovered_by: stage,
    }
}

/// Recover and deserialize into `T`. A value that passes the shape check but
/// does not fit `T` is a shape failure.
pub fn recover<T: DeserializeOwned>(raw_text: &str, shape: &RequiredShape) -> RecoveredStructure<T> {
    match recover_value(raw_text, shape) {
        RecoveredStructure::Ok {
            value,
            recovered_by,
        } => match serde_json::from_value::<T>(value) {
            Ok(typed) => RecoveredStructure::Ok {
                value: typed,
                recovered_by,
            },
            Err(e) => RecoveredStructure::failed(
                raw_text,
                RecoveryFailure::Shape {
                    violations: vec![ShapeViolation::TypeMismatch {
                        message: e.to_string(),
                    }],
                },
            ),
        },
        RecoveredStructure::Failed { raw_text, failure } => {
            RecoveredStructure::Failed { raw_text, failure }
        }
    }
}

/// Run the syntax stages in order.
fn parse_with_repairs(raw_text: &str) -> Result<(Value, RecoveryStage), RecoveryFailure> {
    let trimmed = raw_text.trim();
    if trimmed.is_empty() {
        return Err(RecoveryFailure::Syntax {
            last_stage: RecoveryStage::DirectParse,
            message: "empty input".to_string(),
        });
    }

    let mut last_stage = RecoveryStage::DirectParse;
    let mut last_error = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => return Ok((value, RecoveryStage::DirectParse)),
        Err(e) => e.to_string(),
    };

    if let Some(block) = fenced_block(trimmed) {
        last_stage = RecoveryStage::FencedBlock;
        match serde_json::from_str::<Value>(block) {
            Ok(value) => return Ok((value, last_stage)),
            Err(e) => last_error = e.to_string(),
        }
    }

    if let Some(span) = brace_span(trimmed) {
        last_stage = RecoveryStage::BraceSpan;
        match serde_json::from_str::<Value>(span) {
            Ok(value) => return Ok((value, last_stage)),
            Err(e) => last_error = e.to_string(),
        }
    }

    // Repairs work on the fenced interior when present; a truncated fence
    // can hide the closing brace from the whole-text span.
    let source = fenced_block(trimmed).unwrap_or(trimmed);
    if let Some(candidate) = repair_candidate(source).or_else(|| repair_candidate(trimmed)) {
        let repaired = escape_string_literals(candidate);
        last_stage = RecoveryStage::StringRepair;
        debug!(
            closed_unterminated = repaired.closed_unterminated,
            "escaped string literals"
        );
        match serde_json::from_str::<Value>(&repaired.text) {
            Ok(value) => return Ok((value, last_stage)),
            Err(e) => last_error = e.to_string(),
        }

        let closed = close_brackets(&repaired.text);
        if closed != repaired.text.trim_end() {
            last_stage = RecoveryStage::BracketClosure;
            match serde_json::from_str::<Value>(&closed) {
                Ok(value) => return Ok((value, last_stage)),
                Err(e) => last_error = e.to_string(),
            }
        }
    }

    Err(RecoveryFailure::Syntax {
        last_stage,
        message: last_error,
    })
}
