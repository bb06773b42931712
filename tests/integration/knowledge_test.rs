//! Knowledge Context Integration Tests
//!
//! Assembly against the SQLite and in-memory document stores: authorization,
//! soft delete, usage flags, budgets and partial fetch failures.

use std::sync::Arc;

use ghostwriter::services::knowledge::{
    AssemblyRequest, ContextBudgets, KnowledgeContextAssembler,
};
use ghostwriter::storage::{InMemoryDocumentStore, SqliteDocumentStore};
use ghostwriter::{assemble_knowledge_context, AppConfig, AppState, AssembleContextArgs, SettingsUpdate};
use ghostwriter_core::{FragmentFlags, KnowledgeFragment, KnowledgeUsage};
use tempfile::tempdir;

use crate::support::ScriptedGenerator;

// ============================================================================
// Helpers
// ============================================================================

const BUDGETS: ContextBudgets = ContextBudgets {
    per_fragment_char_budget: 4000,
    aggregate_char_budget: 16000,
};

fn create_test_db() -> SqliteDocumentStore {
    SqliteDocumentStore::new_in_memory().expect("in-memory database")
}

fn insert(db: &SqliteDocumentStore, fragment: KnowledgeFragment, chunks: &[&str]) {
    db.upsert_fragment(&fragment).expect("upsert fragment");
    let chunks: Vec<String> = chunks.iter().map(|c| c.to_string()).collect();
    db.replace_chunks(&fragment.id, &chunks).expect("replace chunks");
}

fn assembler(db: SqliteDocumentStore) -> KnowledgeContextAssembler {
    KnowledgeContextAssembler::new(Arc::new(db))
}

// ============================================================================
// Authorization
// ============================================================================

#[tokio::test]
async fn test_private_fragment_only_reaches_its_owner() {
    let db = create_test_db();
    insert(
        &db,
        KnowledgeFragment::private("alice-notes", "alice", "Alice's interview prep"),
        &["Alice grew up in Osaka."],
    );
    let assembler = assembler(db);

    let for_bob = assembler
        .assemble(
            &AssemblyRequest::new("bob", KnowledgeUsage::Dialogue, BUDGETS)
                .with_fragments(["alice-notes"]),
        )
        .await;
    assert!(for_bob.rendered_context.is_empty());
    assert!(for_bob.included_fragment_ids.is_empty());
    assert_eq!(for_bob.dropped_for_authorization, 1);

    let for_alice = assembler
        .assemble(
            &AssemblyRequest::new("alice", KnowledgeUsage::Dialogue, BUDGETS)
                .with_fragments(["alice-notes"]),
        )
        .await;
    assert_eq!(for_alice.included_fragment_ids, vec!["alice-notes"]);
    assert_eq!(for_alice.dropped_for_authorization, 0);
    assert!(for_alice.rendered_context.contains("Alice grew up in Osaka."));
}

#[tokio::test]
async fn test_soft_deleted_fragment_is_hidden_until_restored() {
    let db = create_test_db();
    insert(
        &db,
        KnowledgeFragment::shared_skill("style", "House style"),
        &["Prefer short paragraphs."],
    );
    assert!(db.soft_delete("style").unwrap());
    let store = Arc::new(db);
    let assembler = KnowledgeContextAssembler::new(store.clone());
    let request =
        AssemblyRequest::new("alice", KnowledgeUsage::Article, BUDGETS).with_fragments(["style"]);

    let hidden = assembler.assemble(&request).await;
    assert!(hidden.included_fragment_ids.is_empty());
    // Deleted is not an ownership denial
    assert_eq!(hidden.dropped_for_authorization, 0);

    assert!(store.restore("style").unwrap());
    let restored = assembler.assemble(&request).await;
    assert_eq!(restored.included_fragment_ids, vec!["style"]);
    assert!(restored.rendered_context.contains("Prefer short paragraphs."));
}

#[tokio::test]
async fn test_hard_delete_is_terminal() {
    let db = create_test_db();
    insert(&db, KnowledgeFragment::shared_info("faq", "FAQ"), &["Q and A"]);
    assert!(db.hard_delete("faq").unwrap());
    assert!(!db.restore("faq").unwrap());
    assert_eq!(db.chunk_count("faq").unwrap(), 0);
}

// ============================================================================
// Selection
// ============================================================================

#[tokio::test]
async fn test_skills_respect_usage_flags() {
    let db = create_test_db();
    insert(
        &db,
        KnowledgeFragment::shared_skill("article-only", "Article structure").with_flags(
            FragmentFlags {
                use_for_article: Some(true),
                use_for_dialogue: Some(false),
                is_edit_only: false,
            },
        ),
        &["Open with a scene."],
    );
    insert(
        &db,
        KnowledgeFragment::shared_skill("questioning", "Interview technique"),
        &["Ask one thing at a time."],
    );
    let assembler = assembler(db);

    let dialogue = assembler
        .assemble(&AssemblyRequest::new("u", KnowledgeUsage::Dialogue, BUDGETS))
        .await;
    assert_eq!(dialogue.included_fragment_ids, vec!["questioning"]);

    let article = assembler
        .assemble(&AssemblyRequest::new("u", KnowledgeUsage::Article, BUDGETS))
        .await;
    assert_eq!(article.included_fragment_ids, vec!["article-only", "questioning"]);
}

#[tokio::test]
async fn test_explicit_fragments_precede_skills_without_duplicates() {
    let db = create_test_db();
    insert(&db, KnowledgeFragment::shared_skill("skill", "Skill"), &["skill text"]);
    insert(&db, KnowledgeFragment::shared_info("info", "Info"), &["info text"]);
    let assembler = assembler(db);

    let context = assembler
        .assemble(
            &AssemblyRequest::new("u", KnowledgeUsage::Evaluation, BUDGETS)
                .with_fragments(["info", "skill", "info", "missing"]),
        )
        .await;
    assert_eq!(context.included_fragment_ids, vec!["info", "skill"]);
    assert_eq!(context.dropped_for_authorization, 0);
}

#[tokio::test]
async fn test_identical_chunks_render_once() {
    let db = create_test_db();
    let shared = "The launch is on 12 March.";
    insert(&db, KnowledgeFragment::shared_info("a", "A"), &[shared]);
    insert(&db, KnowledgeFragment::shared_info("b", "B"), &[shared, "Tickets are free."]);
    let assembler = assembler(db);

    let context = assembler
        .assemble(
            &AssemblyRequest::new("u", KnowledgeUsage::Dialogue, BUDGETS).with_fragments(["a", "b"]),
        )
        .await;
    assert_eq!(context.rendered_context.matches(shared).count(), 1);
    assert!(context.rendered_context.contains("Tickets are free."));
}

// ============================================================================
// Budgets
// ============================================================================

#[tokio::test]
async fn test_aggregate_budget_cuts_the_tail() {
    let db = create_test_db();
    let short = "s".repeat(100);
    let long = "l".repeat(1000);
    insert(&db, KnowledgeFragment::shared_info("first", "First"), &[&short]);
    insert(&db, KnowledgeFragment::shared_info("second", "Second"), &[&long]);
    insert(&db, KnowledgeFragment::shared_info("third", "Third"), &["tail"]);
    let assembler = assembler(db);

    let budgets = ContextBudgets {
        per_fragment_char_budget: 4000,
        aggregate_char_budget: 400,
    };
    let context = assembler
        .assemble(
            &AssemblyRequest::new("u", KnowledgeUsage::Dialogue, budgets)
                .with_fragments(["first", "second", "third"]),
        )
        .await;

    assert_eq!(context.rendered_context.chars().count(), 400);
    assert!(context.rendered_context.contains(&short));
    assert_eq!(context.included_fragment_ids, vec!["first", "second"]);
    assert_eq!(context.omitted_for_budget, vec!["third"]);
    assert!(!context.rendered_context.contains("tail"));
}

#[tokio::test]
async fn test_per_fragment_budget_truncates_chunks() {
    let db = create_test_db();
    let body = "x".repeat(500);
    insert(&db, KnowledgeFragment::shared_info("big", "Big"), &[&body]);
    let assembler = assembler(db);

    let budgets = ContextBudgets {
        per_fragment_char_budget: 50,
        aggregate_char_budget: 16000,
    };
    let context = assembler
        .assemble(
            &AssemblyRequest::new("u", KnowledgeUsage::Dialogue, budgets).with_fragments(["big"]),
        )
        .await;
    assert!(context.rendered_context.contains(&"x".repeat(50)));
    assert!(!context.rendered_context.contains(&"x".repeat(51)));
}

// ============================================================================
// Partial failure
// ============================================================================

#[tokio::test]
async fn test_failed_chunk_read_degrades_only_that_fragment() {
    let store = InMemoryDocumentStore::new()
        .with_fragment(
            KnowledgeFragment::shared_info("ok", "Healthy").with_usage_guide("Quote freely"),
            vec!["healthy chunk".into()],
        )
        .with_fragment(
            KnowledgeFragment::shared_info("broken", "Broken summary"),
            vec!["unreachable chunk".into()],
        )
        .with_failing_chunks("broken");
    let assembler = KnowledgeContextAssembler::new(Arc::new(store));

    let context = assembler
        .assemble(
            &AssemblyRequest::new("u", KnowledgeUsage::Dialogue, BUDGETS)
                .with_fragments(["ok", "broken"]),
        )
        .await;
    assert_eq!(context.included_fragment_ids, vec!["ok", "broken"]);
    assert_eq!(context.degraded_fragment_ids, vec!["broken"]);
    assert!(context.rendered_context.contains("healthy chunk"));
    assert!(context.rendered_context.contains("Broken summary"));
    assert!(!context.rendered_context.contains("unreachable chunk"));
}

// ============================================================================
// Persistence and commands
// ============================================================================

#[tokio::test]
async fn test_file_database_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("knowledge.db");
    {
        let db = SqliteDocumentStore::open(&path).unwrap();
        insert(&db, KnowledgeFragment::shared_info("kept", "Kept"), &["persisted chunk"]);
    }

    let reopened = SqliteDocumentStore::open(&path).unwrap();
    assert!(reopened.is_healthy());
    let context = assembler(reopened)
        .assemble(
            &AssemblyRequest::new("u", KnowledgeUsage::Article, BUDGETS).with_fragments(["kept"]),
        )
        .await;
    assert!(context.rendered_context.contains("persisted chunk"));
}

#[tokio::test]
async fn test_command_uses_configured_skill_cap() {
    let mut store = InMemoryDocumentStore::new();
    for i in 0..5 {
        store = store.with_fragment(
            KnowledgeFragment::shared_skill(format!("skill-{}", i), "Skill"),
            vec![format!("skill body {}", i)],
        );
    }
    let state = AppState::new(
        Arc::new(store),
        ScriptedGenerator::new(&["{}"]),
        AppConfig::default(),
    );
    state
        .update_config(SettingsUpdate {
            skill_fragment_cap: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();

    let response = assemble_knowledge_context(
        &state,
        AssembleContextArgs {
            caller_id: "u".into(),
            usage: KnowledgeUsage::Dialogue,
            explicit_fragment_ids: vec![],
            budgets: None,
        },
    )
    .await;
    assert!(response.success);
    let context = response.data.unwrap();
    assert_eq!(context.included_fragment_ids, vec!["skill-0", "skill-1"]);
}

#[tokio::test]
async fn test_command_rejects_missing_caller() {
    let state = crate::support::empty_state(ScriptedGenerator::new(&["{}"]));
    let response = assemble_knowledge_context(
        &state,
        AssembleContextArgs {
            caller_id: "  ".into(),
            usage: KnowledgeUsage::Article,
            explicit_fragment_ids: vec![],
            budgets: None,
        },
    )
    .await;
    assert!(!response.success);
    assert!(response.error.unwrap().contains("caller_id"));
}
