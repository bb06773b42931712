//! Structured Output Integration Tests
//!
//! Recovery through the command function and the serialized result contract.

use ghostwriter::recover_structured_output;
use ghostwriter::services::structured_output::{
    recover_value, RecoveredStructure, RecoveryStage, RequiredShape,
};
use serde_json::json;

// ============================================================================
// Helpers
// ============================================================================

fn evaluation_shape() -> RequiredShape {
    RequiredShape::object()
        .require("isSufficient")
        .non_empty_array("objectives")
}

const FULL_RESPONSE: &str = r#"{"objectives": [{"objective": "venue", "status": "partial", "completionRate": 40}], "isSufficient": false, "missingElements": ["date", "ticket price"], "suggestedAngle": "Ask about the \"opening night\""}"#;

// ============================================================================
// Recovery scenarios
// ============================================================================

#[test]
fn test_fenced_json_after_prose() {
    let response = recover_structured_output("Sure! ```json\n{\"a\":1}\n```", &RequiredShape::object());
    assert!(response.success);
    let json = serde_json::to_value(response.data.unwrap()).unwrap();
    assert_eq!(json["ok"], true);
    assert_eq!(json["value"], json!({"a": 1}));
    assert_eq!(json["recoveredBy"], "fenced_block");
}

#[test]
fn test_truncated_object_with_raw_newline() {
    let raw = "{\"title\":\"x\",\"body\":\"line1\nline2}";
    let out = recover_value(raw, &RequiredShape::object().require("title").require("body"));
    match out {
        RecoveredStructure::Ok {
            value,
            recovered_by,
        } => {
            assert_eq!(value, json!({"title": "x", "body": "line1\nline2"}));
            assert!(recovered_by.is_repair());
        }
        other => panic!("expected recovery, got {:?}", other),
    }
}

#[test]
fn test_model_chatter_around_object() {
    let raw = format!("Here's my evaluation:\n\n{}\n\nHope this helps!", FULL_RESPONSE);
    let out = recover_value(&raw, &evaluation_shape());
    match out {
        RecoveredStructure::Ok {
            value,
            recovered_by,
        } => {
            assert_eq!(recovered_by, RecoveryStage::BraceSpan);
            assert_eq!(value["suggestedAngle"], "Ask about the \"opening night\"");
        }
        other => panic!("expected recovery, got {:?}", other),
    }
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_shape_failure_reports_stage_and_keeps_raw_text() {
    let raw = r#"{"objectives": [], "isSufficient": true}"#;
    let response = recover_structured_output(raw, &evaluation_shape());
    assert!(response.success);

    let json = serde_json::to_value(response.data.unwrap()).unwrap();
    assert_eq!(json["ok"], false);
    assert_eq!(json["rawText"], raw);
    assert_eq!(json["failureStage"], "shape_validation");
    assert!(json.get("value").is_none());
}

#[test]
fn test_every_truncation_of_a_response_is_handled() {
    let shape = RequiredShape::object();
    for (cut, _) in FULL_RESPONSE.char_indices().skip(1) {
        let prefix = &FULL_RESPONSE[..cut];
        match recover_value(prefix, &shape) {
            RecoveredStructure::Ok { value, .. } => assert!(value.is_object()),
            RecoveredStructure::Failed { raw_text, failure } => {
                assert_eq!(raw_text, prefix);
                assert!(failure.is_syntax());
            }
        }
    }

    // Cut inside the suggested angle: everything before it survives
    let cut = FULL_RESPONSE.find("opening").unwrap();
    let value = recover_value(&FULL_RESPONSE[..cut], &evaluation_shape())
        .ok()
        .unwrap();
    assert_eq!(value["missingElements"], json!(["date", "ticket price"]));
    assert_eq!(value["objectives"][0]["completionRate"], 40);
}

#[test]
fn test_garbage_never_panics() {
    let inputs = [
        "null",
        "42",
        "[1, 2, 3]",
        "```json\n```",
        "{{{{}}}}",
        "{\"a\": [1, {\"b\": \"\u{1F600}",
        "\u{FEFF}{\"a\": 1}",
        "{\"a\": \"unterminated \\u12",
        "}}}} {{{{",
        "```\n{\"a\": 1",
    ];
    for input in inputs {
        let out = recover_value(input, &RequiredShape::object().require("a"));
        if let RecoveredStructure::Failed { raw_text, .. } = out {
            assert_eq!(raw_text, input);
        }
    }
}
