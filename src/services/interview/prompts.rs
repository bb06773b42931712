//! Interview Prompts
//!
//! Segment lists for the evaluation call and the follow-up question call.

use crate::services::prompt_builder::{
    build_system_prompt, bullet_list, json_output_instruction, knowledge_segment, numbered_list,
};

use super::turn::TurnInput;

const INTERVIEWER_ROLE: &str = "You are an experienced journalist interviewing someone for an \
article. You listen carefully and keep the conversation on the facts the article needs.";

const EVALUATION_SCHEMA: &str = r#"{
  "objectives": [
    {"objective": "<objective text exactly as listed>", "status": "complete | partial | missing", "completionRate": 0}
  ],
  "overallCompletionRate": 0,
  "userStopIntent": false,
  "isSufficient": false,
  "missingElements": ["<concrete detail still missing>"],
  "suggestedAngle": "<angle for the next question, or null>"
}"#;

const EVALUATION_RULES: &str = "\
1. Judge each objective only from what the interviewee actually said.
2. An objective the interviewee answered, even briefly, counts as complete. Do not re-litigate it or ask for more detail on it.
3. An answer meaning \"skip\", \"later\", \"next question\" or \"I'll send it\" marks the current objective complete. It does not end the interview, and the item is never asked about again.
4. Set userStopIntent to true whenever the interviewee explicitly says the interview should end (for example \"that's all\"), even if objectives remain open.
5. isSufficient is true when every objective is complete, or when userStopIntent is true.
6. Without objectives the interview is open-ended: isSufficient follows userStopIntent.
7. completionRate and overallCompletionRate are integers from 0 to 100.
8. suggestedAngle must not repeat a question that was already asked.";

/// Segments for judging the last answer against the objectives.
pub fn evaluation_prompt(input: &TurnInput, locale: &str) -> Vec<String> {
    let mut segments = Vec::with_capacity(7);

    segments.push(build_system_prompt(
        INTERVIEWER_ROLE,
        "Evaluate how far the interview has covered its objectives after the latest answer.",
        locale,
    ));

    let objectives = if input.is_open_ended() {
        "(none: this is an open-ended interview)".to_string()
    } else {
        numbered_list(&input.objectives)
    };
    segments.push(format!("## Objectives\n{}", objectives));
    segments.push(format!("## Rules\n{}", EVALUATION_RULES));

    if let Some(facts) = input
        .supplementary_facts
        .as_deref()
        .filter(|f| !f.trim().is_empty())
    {
        segments.push(format!("## Facts Already Provided\n{}", facts.trim()));
    }
    if let Some(knowledge) = knowledge_segment(&input.knowledge_context) {
        segments.push(knowledge);
    }

    segments.push(exchange_segment(input));
    segments.push(json_output_instruction(EVALUATION_SCHEMA));
    segments
}

/// What the next question should pursue.
#[derive(Debug, Clone, Default)]
pub struct FollowUpFocus<'a> {
    pub missing_elements: &'a [String],
    pub suggested_angle: Option<&'a str>,
}

/// Segments for generating one follow-up question.
///
/// `avoid` is a candidate that repeated an earlier question; it is named
/// explicitly on the retry.
pub fn follow_up_prompt(
    input: &TurnInput,
    focus: &FollowUpFocus<'_>,
    locale: &str,
    avoid: Option<&str>,
) -> Vec<String> {
    let mut segments = Vec::with_capacity(7);

    segments.push(build_system_prompt(
        INTERVIEWER_ROLE,
        "Ask exactly ONE follow-up question about a single topic. \
         Output only the question itself: no preamble, no numbering, no explanation.",
        locale,
    ));

    let mut focus_parts = Vec::new();
    if !focus.missing_elements.is_empty() {
        focus_parts.push(format!(
            "Still missing:\n{}",
            bullet_list(focus.missing_elements)
        ));
    }
    if let Some(angle) = focus.suggested_angle.filter(|a| !a.trim().is_empty()) {
        focus_parts.push(format!("Suggested angle: {}", angle.trim()));
    }
    if !focus_parts.is_empty() {
        segments.push(format!("## Focus\n{}", focus_parts.join("\n\n")));
    }

    let asked = input.prior_questions();
    if !asked.is_empty() {
        segments.push(format!(
            "## Questions Already Asked\nNever repeat or rephrase any of these:\n{}",
            bullet_list(&asked)
        ));
    }

    if let Some(knowledge) = input.dialogue_context.as_deref().and_then(knowledge_segment) {
        segments.push(knowledge);
    }

    segments.push(exchange_segment(input));

    if let Some(repeated) = avoid {
        segments.push(format!(
            "Your previous suggestion repeated an earlier question. Do not repeat: \"{}\"\n\
             Ask about something different.",
            repeated.trim()
        ));
    }
    segments
}

fn exchange_segment(input: &TurnInput) -> String {
    let transcript = input.transcript();
    let mut parts = Vec::with_capacity(3);
    if !transcript.is_empty() {
        parts.push(format!("## Transcript\n{}", transcript));
    }
    parts.push(format!("## Last Question\n{}", input.last_question.trim()));
    parts.push(format!("## Latest Answer\n{}", input.last_answer.trim()));
    parts.join("\n\n")
}
