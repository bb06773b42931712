//! Article Integration Tests
//!
//! Drafting and revision through the command functions over a SQLite store.

use std::sync::Arc;

use ghostwriter::services::article::{ArticleDraft, ArticleSection, DraftRequest, RevisionRequest};
use ghostwriter::storage::SqliteDocumentStore;
use ghostwriter::{draft_article, revise_article};
use ghostwriter_core::{ConversationMessage, FragmentFlags, KnowledgeFragment};

use crate::support::{state, ScriptedGenerator};

// ============================================================================
// Helpers
// ============================================================================

fn knowledge_store() -> Arc<SqliteDocumentStore> {
    let db = SqliteDocumentStore::new_in_memory().expect("in-memory database");
    db.upsert_fragment(&KnowledgeFragment::shared_skill("voice", "First-person voice"))
        .unwrap();
    db.replace_chunks("voice", &["Write in the interviewee's own words.".to_string()])
        .unwrap();
    db.upsert_fragment(
        &KnowledgeFragment::shared_skill("proofing", "Proofing rules").with_flags(FragmentFlags {
            use_for_article: Some(true),
            use_for_dialogue: None,
            is_edit_only: true,
        }),
    )
    .unwrap();
    db.replace_chunks("proofing", &["Keep quotes verbatim.".to_string()])
        .unwrap();
    db.upsert_fragment(&KnowledgeFragment::private(
        "press-kit",
        "mika",
        "Press kit",
    ))
    .unwrap();
    db.replace_chunks("press-kit", &["Founded in 2019 by two librarians.".to_string()])
        .unwrap();
    Arc::new(db)
}

fn draft_request(caller: &str) -> DraftRequest {
    DraftRequest {
        caller_id: caller.into(),
        history: vec![
            ConversationMessage::interviewer(0, "How did the fair begin?"),
            ConversationMessage::interviewee(1, "Two of us wanted a place for small presses."),
            ConversationMessage::interviewer(2, "Where is it held?"),
            ConversationMessage::interviewee(3, "In the old railway station."),
        ],
        objectives: vec!["origin".into(), "venue".into()],
        supplementary_facts: None,
        explicit_fragment_ids: vec!["press-kit".into()],
        budgets: None,
    }
}

fn current_draft() -> ArticleDraft {
    ArticleDraft {
        title: "Small Presses, Big Station".into(),
        lead: "A fair for small presses found a home in an old station.".into(),
        sections: vec![ArticleSection {
            heading: "Origins".into(),
            body: "Two of us wanted a place for small presses.".into(),
        }],
        closing: None,
    }
}

// ============================================================================
// Drafting
// ============================================================================

#[tokio::test]
async fn test_draft_article_with_owner_knowledge() {
    let generator = ScriptedGenerator::new(&[r#"{"title": "Small Presses, Big Station",
"lead": "A fair for small presses found a home in an old station.",
"sections": [{"heading": "Origins", "body": "Two of us wanted a place for small presses."}]}"#]);
    let state = state(knowledge_store(), generator.clone());

    let response = draft_article(&state, draft_request("mika")).await;
    assert!(response.success, "{:?}", response.error);
    let draft = response.data.unwrap();
    assert_eq!(draft, current_draft());
    assert!(draft.to_markdown().starts_with("# Small Presses, Big Station\n"));

    let prompt = &generator.prompts()[0];
    assert!(prompt.contains("Founded in 2019 by two librarians."));
    assert!(prompt.contains("Write in the interviewee's own words."));
    assert!(!prompt.contains("Keep quotes verbatim."));
}

#[tokio::test]
async fn test_draft_article_hides_foreign_private_knowledge() {
    let generator = ScriptedGenerator::new(&[r#"{"title": "T", "lead": "L",
"sections": [{"body": "B"}]}"#]);
    let state = state(knowledge_store(), generator.clone());

    let response = draft_article(&state, draft_request("someone-else")).await;
    let draft = response.data.unwrap();
    assert_eq!(draft.sections[0].heading, "");
    assert!(!generator.prompts()[0].contains("Founded in 2019"));
}

#[tokio::test]
async fn test_truncated_draft_is_repaired() {
    let generator = ScriptedGenerator::new(&["```json\n{\"title\": \"Station Days\", \"lead\": \"It began with two librarians.\",\n\"sections\": [{\"heading\": \"Origins\", \"body\": \"They wanted a home\nfor small presses"]);
    let state = state(knowledge_store(), generator);

    let draft = draft_article(&state, draft_request("mika")).await.data.unwrap();
    assert_eq!(draft.title, "Station Days");
    assert_eq!(draft.sections[0].body, "They wanted a home\nfor small presses");
}

#[tokio::test]
async fn test_unrecoverable_draft_is_an_error_response() {
    let generator =
        ScriptedGenerator::new(&[r#"{"title": "T", "lead": "L", "sections": []}"#]);
    let state = state(knowledge_store(), generator);

    let response = draft_article(&state, draft_request("mika")).await;
    assert!(!response.success);
    assert!(response.data.is_none());
    assert!(response.error.unwrap().contains("shape_validation"));
}

#[tokio::test]
async fn test_draft_without_answers_is_rejected() {
    let generator = ScriptedGenerator::new(&["{}"]);
    let state = state(knowledge_store(), generator.clone());
    let mut request = draft_request("mika");
    request.history.retain(|m| m.sequence % 2 == 0);

    let response = draft_article(&state, request).await;
    assert!(!response.success);
    assert!(generator.prompts().is_empty());
}

// ============================================================================
// Revision
// ============================================================================

#[tokio::test]
async fn test_revise_article_uses_editing_knowledge() {
    let generator = ScriptedGenerator::new(&[r#"Revised:
{"title": "Small Presses, Big Station", "lead": "Small presses found a station.",
 "sections": [{"heading": "Origins", "body": "Two of us wanted a place for small presses."}],
 "closing": "The doors open in May."}"#]);
    let state = state(knowledge_store(), generator.clone());

    let response = revise_article(
        &state,
        RevisionRequest {
            caller_id: "mika".into(),
            draft: current_draft(),
            feedback: "Tighten the lead and add a closing line.".into(),
            explicit_fragment_ids: vec![],
            budgets: None,
        },
    )
    .await;
    let revised = response.data.unwrap();
    assert_eq!(revised.lead, "Small presses found a station.");
    assert_eq!(revised.closing.as_deref(), Some("The doors open in May."));

    let prompt = &generator.prompts()[0];
    assert!(prompt.contains("Keep quotes verbatim."));
    assert!(prompt.contains("Tighten the lead and add a closing line."));
}

#[tokio::test]
async fn test_revise_article_requires_feedback() {
    let generator = ScriptedGenerator::new(&["{}"]);
    let state = state(knowledge_store(), generator);

    let response = revise_article(
        &state,
        RevisionRequest {
            caller_id: "mika".into(),
            draft: current_draft(),
            feedback: String::new(),
            explicit_fragment_ids: vec![],
            budgets: None,
        },
    )
    .await;
    assert!(!response.success);
}
