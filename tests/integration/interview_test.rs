//! Interview Integration Tests
//!
//! Full turns through `AppState` and the command functions with a scripted
//! generator: deferred objectives, stop intent, duplicate-question
//! suppression, the heuristic fallback and knowledge injection.

use std::sync::Arc;

use ghostwriter::services::interview::follow_up::normalize_question;
use ghostwriter::services::interview::{
    ConclusionReason, InterviewState, RunTurnRequest, TurnAction, TurnInput,
};
use ghostwriter::storage::InMemoryDocumentStore;
use ghostwriter::{evaluate_turn, run_turn, SettingsUpdate};
use ghostwriter_core::{
    ConversationMessage, EvaluationSource, FragmentFlags, KnowledgeFragment, ObjectiveStatus,
};
use ghostwriter_llm::LlmError;

use crate::support::{empty_state, state, ScriptedGenerator};

// ============================================================================
// Helpers
// ============================================================================

fn objectives() -> Vec<String> {
    vec!["venue".into(), "date".into()]
}

fn opening_history() -> Vec<ConversationMessage> {
    vec![
        ConversationMessage::interviewer(0, "Tell me about the event."),
        ConversationMessage::interviewee(1, "It's a small book fair for local authors."),
    ]
}

fn evaluation_json(venue: &str, date: &str, sufficient: bool) -> String {
    format!(
        r#"```json
{{
  "objectives": [
    {{"objective": "venue", "status": "{venue}"}},
    {{"objective": "date", "status": "{date}"}}
  ],
  "overallCompletionRate": 10,
  "userStopIntent": false,
  "isSufficient": {sufficient},
  "missingElements": ["venue", "date"]
}}
```"#
    )
}

// ============================================================================
// Deferred objective
// ============================================================================

#[tokio::test]
async fn test_deferred_objective_counts_as_complete() {
    let generator = ScriptedGenerator::new(&[
        evaluation_json("missing", "missing", false).as_str(),
        "When is the fair taking place?",
    ]);
    let state = empty_state(generator.clone());

    let input = TurnInput::new(
        opening_history(),
        "Which venue have you booked?",
        "I'll send the venue details later.",
        objectives(),
    );
    let response = evaluate_turn(&state, input).await;
    assert!(response.success, "{:?}", response.error);
    let evaluation = response.data.unwrap();

    assert_eq!(evaluation.per_objective[0].status, ObjectiveStatus::Complete);
    assert_eq!(evaluation.per_objective[0].completion_rate, 100);
    assert_eq!(evaluation.per_objective[1].status, ObjectiveStatus::Missing);
    assert!(!evaluation.user_stop_intent);
    assert!(!evaluation.is_sufficient);
    assert_eq!(evaluation.missing_elements, vec!["date"]);
    assert_eq!(evaluation.overall_completion_rate, 50);
    assert_eq!(
        evaluation.follow_up_question.as_deref(),
        Some("When is the fair taking place?")
    );
}

#[tokio::test]
async fn test_deferred_objective_with_remaining_covered_concludes() {
    let generator = ScriptedGenerator::new(&[evaluation_json("missing", "complete", false).as_str()]);
    let state = empty_state(generator.clone());

    let input = TurnInput::new(
        opening_history(),
        "Which venue have you booked?",
        "Can we skip the venue for now?",
        objectives(),
    );
    let response = run_turn(&state, RunTurnRequest::new("alice", input)).await;
    assert!(response.success, "{:?}", response.error);
    let result = response.data.unwrap();

    assert_eq!(result.action, TurnAction::EndInterview);
    assert_eq!(result.conclusion, Some(ConclusionReason::ObjectivesCovered));
    assert!(!result.evaluation.user_stop_intent);
    assert_eq!(result.evaluation.overall_completion_rate, 100);
    assert_eq!(result.question, None);
    assert_eq!(generator.prompts().len(), 1);
}

// ============================================================================
// Stop intent
// ============================================================================

#[tokio::test]
async fn test_stop_intent_ends_interview_with_open_objectives() {
    let generator = ScriptedGenerator::new(&[evaluation_json("partial", "missing", false).as_str()]);
    let state = empty_state(generator.clone());

    let input = TurnInput::new(
        opening_history(),
        "Which venue have you booked?",
        "That's all, thank you.",
        objectives(),
    );
    let response = run_turn(&state, RunTurnRequest::new("alice", input)).await;
    let result = response.data.unwrap();

    assert_eq!(result.action, TurnAction::EndInterview);
    assert_eq!(result.conclusion, Some(ConclusionReason::UserStopIntent));
    assert!(result.evaluation.user_stop_intent);
    assert!(result.evaluation.is_sufficient);
    assert!(result.evaluation.follow_up_question.is_none());
    assert_eq!(result.evaluation.per_objective[1].status, ObjectiveStatus::Missing);
    assert_eq!(result.states.last(), Some(&InterviewState::Conclude));
    // No follow-up generation after a conclusion
    assert_eq!(generator.prompts().len(), 1);
}

#[tokio::test]
async fn test_open_ended_interview_needs_stop_intent_to_conclude() {
    let generator = ScriptedGenerator::new(&[
        r#"{"objectives": [], "overallCompletionRate": 80, "isSufficient": true}"#,
        "What surprised you most?",
    ]);
    let state = empty_state(generator);

    let input = TurnInput::new(opening_history(), "How did it start?", "A friend asked me.", vec![]);
    let result = run_turn(&state, RunTurnRequest::new("alice", input))
        .await
        .data
        .unwrap();

    assert_eq!(result.action, TurnAction::AskFollowUp);
    assert_eq!(result.evaluation.overall_completion_rate, 80);
    assert_eq!(result.question.as_deref(), Some("What surprised you most?"));
}

// ============================================================================
// Duplicate suppression
// ============================================================================

#[tokio::test]
async fn test_consecutive_follow_ups_never_repeat() {
    let first_question = "How did the idea for the fair start?";
    let generator = ScriptedGenerator::new(&[
        evaluation_json("partial", "missing", false).as_str(),
        first_question,
    ]);
    let state = empty_state(generator.clone());
    let first = run_turn(
        &state,
        RunTurnRequest::new(
            "alice",
            TurnInput::new(opening_history(), "Why books?", "I love them.", objectives()),
        ),
    )
    .await
    .data
    .unwrap();
    assert_eq!(first.question.as_deref(), Some(first_question));

    // Same history; the model keeps proposing the question it just asked
    let generator = ScriptedGenerator::new(&[
        evaluation_json("partial", "missing", false).as_str(),
        "  how did the IDEA for the fair start? ",
    ]);
    let state = empty_state(generator.clone());
    let second = run_turn(
        &state,
        RunTurnRequest::new(
            "alice",
            TurnInput::new(opening_history(), first_question, "I love them.", objectives()),
        ),
    )
    .await
    .data
    .unwrap();

    let question = second.question.unwrap();
    assert_ne!(normalize_question(&question), normalize_question(first_question));
    // Evaluation, first attempt, one retry
    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[2].contains("Do not repeat"));
    assert_eq!(question, "Could you tell me more about venue?");
}

#[tokio::test]
async fn test_retry_recovers_a_fresh_question() {
    let generator = ScriptedGenerator::new(&[
        evaluation_json("partial", "missing", false).as_str(),
        "Why books?",
        "Which month suits the authors best?",
    ]);
    let state = empty_state(generator.clone());

    let result = run_turn(
        &state,
        RunTurnRequest::new(
            "alice",
            TurnInput::new(opening_history(), "Why books?", "I love them.", objectives()),
        ),
    )
    .await
    .data
    .unwrap();
    assert_eq!(result.question.as_deref(), Some("Which month suits the authors best?"));
}

// ============================================================================
// Fallback
// ============================================================================

#[tokio::test]
async fn test_unparseable_evaluation_falls_back_to_heuristic() {
    let generator = ScriptedGenerator::new(&["I think the interview is going well!"]);
    let state = empty_state(generator.clone());

    let input = TurnInput::new(vec![], "Tell me about the event.", "It's a book fair.", objectives());
    let result = run_turn(&state, RunTurnRequest::new("alice", input))
        .await
        .data
        .unwrap();

    assert_eq!(result.evaluation.source, EvaluationSource::Heuristic);
    assert_eq!(result.evaluation.overall_completion_rate, 50);
    assert!(!result.evaluation.is_sufficient);
    assert_eq!(result.action, TurnAction::AskFollowUp);
    assert_eq!(result.question.as_deref(), Some("Could you tell me more about venue?"));
    assert_eq!(generator.prompts().len(), 1);
}

#[tokio::test]
async fn test_generation_failure_respects_fallback_setting() {
    let generator = ScriptedGenerator::failing(LlmError::NetworkError {
        message: "connection reset".into(),
    });
    let state = empty_state(generator);
    let input = TurnInput::new(vec![], "Tell me about the event.", "It's a book fair.", objectives());

    let response = evaluate_turn(&state, input.clone()).await;
    assert!(!response.success);
    assert!(response.error.unwrap().contains("connection reset"));

    state
        .update_config(SettingsUpdate {
            fallback_on_generation_failure: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();
    let response = evaluate_turn(&state, input).await;
    assert!(response.success);
    let evaluation = response.data.unwrap();
    assert_eq!(evaluation.source, EvaluationSource::Heuristic);
    assert!(evaluation.follow_up_question.is_some());
}

// ============================================================================
// Knowledge and validation
// ============================================================================

#[tokio::test]
async fn test_run_turn_injects_only_authorized_dialogue_knowledge() {
    let store = InMemoryDocumentStore::new()
        .with_fragment(
            KnowledgeFragment::shared_skill("technique", "Interview technique"),
            vec!["Ask about sensory details.".into()],
        )
        .with_fragment(
            KnowledgeFragment::shared_skill("layout", "Article layout").with_flags(FragmentFlags {
                use_for_article: Some(true),
                use_for_dialogue: Some(false),
                is_edit_only: false,
            }),
            vec!["Use three sections.".into()],
        )
        .with_fragment(
            KnowledgeFragment::private("diary", "alice", "Alice's diary"),
            vec!["Secret diary entry.".into()],
        );
    let generator = ScriptedGenerator::new(&[
        evaluation_json("partial", "missing", false).as_str(),
        "What did the hall smell like?",
    ]);
    let state = state(Arc::new(store), generator.clone());

    let mut request = RunTurnRequest::new(
        "bob",
        TurnInput::new(opening_history(), "Why books?", "I love them.", objectives()),
    );
    request.explicit_fragment_ids = vec!["diary".into()];
    let result = run_turn(&state, request).await.data.unwrap();
    assert_eq!(result.question.as_deref(), Some("What did the hall smell like?"));

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 2);
    for prompt in &prompts {
        assert!(prompt.contains("Ask about sensory details."));
        assert!(!prompt.contains("Use three sections."));
        assert!(!prompt.contains("Secret diary entry."));
    }
}

#[tokio::test]
async fn test_commands_validate_turn_input() {
    let state = empty_state(ScriptedGenerator::new(&["{}"]));

    let response = evaluate_turn(&state, TurnInput::new(vec![], " ", "answer", objectives())).await;
    assert!(!response.success);

    let request = RunTurnRequest::new(
        "",
        TurnInput::new(vec![], "Question?", "answer", objectives()),
    );
    let response = run_turn(&state, request).await;
    assert!(!response.success);
    assert!(response.error.unwrap().contains("caller_id"));
}
