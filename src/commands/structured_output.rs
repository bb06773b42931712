//! Structured Output Commands
//!
//! Recovery of JSON objects from free-form model text.

use serde_json::Value;

use crate::models::response::CommandResponse;
use crate::services::structured_output::{recover_value, RecoveredStructure, RequiredShape};

/// Recover a JSON object from raw model output.
///
/// Always succeeds at the command level; an unrecoverable input is reported
/// inside the returned structure.
pub fn recover_structured_output(
    raw_text: &str,
    shape: &RequiredShape,
) -> CommandResponse<RecoveredStructure<Value>> {
    CommandResponse::ok(recover_value(raw_text, shape))
}
