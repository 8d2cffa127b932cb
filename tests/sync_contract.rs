//! Integration tests for the collection synchronizer write contract.
//!
//! Covers ownership isolation, array coalescing on task updates, full
//! snapshot replacement, and the folder-reset side effect of deleting the
//! last task in a folder, all against the in-memory store backend.

use mypins_lib::plugins::todos::types::{
    ChecklistItem, Priority, StatusFilter, TodoDraft, TodoUpdate, TodoView,
};
use mypins_lib::shared::errors::{DropReason, WriteError};
use mypins_lib::store::memory::{MemoryStore, WriteKind};
use mypins_lib::store::DocumentStore;
use mypins_lib::workspace::Workspace;
use std::sync::Arc;

fn draft(title: &str) -> TodoDraft {
    TodoDraft {
        title: title.to_string(),
        completed: false,
        priority: Priority::Medium,
        due_date: "2026-09-01".to_string(),
        labels: vec![],
        folder: None,
        checklist: vec![],
        comments: vec![],
        attachments: vec![],
    }
}

fn workspace(store: &Arc<MemoryStore>) -> Workspace {
    Workspace::new(Arc::clone(store) as Arc<dyn DocumentStore>)
}

// =============================================================================
// Ownership isolation
// =============================================================================

#[tokio::test]
async fn test_update_by_other_principal_sends_no_store_writes() {
    let store = Arc::new(MemoryStore::new());

    let alice = workspace(&store);
    alice.session.sign_in("alice");
    alice.apply_session();
    let ack = alice.todos.add_todo(draft("alice's task")).await.unwrap();

    let bob = workspace(&store);
    bob.session.sign_in("bob");
    bob.apply_session();

    let writes_before = store.write_count();
    let err = bob
        .todos
        .update_todo(
            &ack.id,
            TodoUpdate {
                title: Some("hijacked".to_string()),
                ..TodoUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, WriteError::Dropped(DropReason::NotOwned));

    let err = bob.todos.delete_todo(&ack.id).await.unwrap_err();
    assert_eq!(err, WriteError::Dropped(DropReason::NotOwned));

    assert_eq!(store.write_count(), writes_before);
    // Alice's task is untouched.
    let rows = store.rows("todos");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].fields["title"], "alice's task");
}

#[tokio::test]
async fn test_signed_out_writes_are_dropped() {
    let store = Arc::new(MemoryStore::new());
    let ws = workspace(&store);

    let err = ws.todos.add_todo(draft("nobody home")).await.unwrap_err();
    assert_eq!(err, WriteError::Dropped(DropReason::NoPrincipal));
    assert_eq!(store.write_count(), 0);
}

// =============================================================================
// Array coalescing on task updates
// =============================================================================

#[tokio::test]
async fn test_update_without_checklist_resends_cached_checklist() {
    let store = Arc::new(MemoryStore::new());
    let ws = workspace(&store);
    ws.session.sign_in("u1");
    ws.apply_session();

    let mut with_checklist = draft("with checklist");
    with_checklist.checklist = vec![ChecklistItem {
        id: "c1".to_string(),
        text: "step one".to_string(),
        completed: false,
    }];
    let ack = ws.todos.add_todo(with_checklist).await.unwrap();

    ws.todos
        .update_todo(
            &ack.id,
            TodoUpdate {
                title: Some("renamed".to_string()),
                ..TodoUpdate::default()
            },
        )
        .await
        .unwrap();

    let patch = store
        .recorded_writes()
        .into_iter()
        .rev()
        .find(|w| w.kind == WriteKind::Patch)
        .expect("update reached the store");
    let fields = patch.fields.unwrap();
    // The omitted arrays are re-sent in full, never absent.
    assert_eq!(fields["checklist"][0]["id"], "c1");
    assert_eq!(fields["comments"], serde_json::json!([]));
    assert_eq!(fields["attachments"], serde_json::json!([]));
    assert_eq!(fields["title"], "renamed");
}

#[tokio::test]
async fn test_toggle_patches_only_completed() {
    let store = Arc::new(MemoryStore::new());
    let ws = workspace(&store);
    ws.session.sign_in("u1");
    ws.apply_session();

    let ack = ws.todos.add_todo(draft("toggle me")).await.unwrap();
    ws.todos.toggle_todo(&ack.id).await.unwrap();

    let patch = store
        .recorded_writes()
        .into_iter()
        .rev()
        .find(|w| w.kind == WriteKind::Patch)
        .unwrap();
    let fields = patch.fields.unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields["completed"], true);

    assert!(ws.todos.todos()[0].completed);
}

// =============================================================================
// Snapshot replacement and subscription lifecycle
// =============================================================================

#[tokio::test]
async fn test_cache_equals_latest_snapshot_exactly() {
    let store = Arc::new(MemoryStore::new());
    let ws = workspace(&store);
    ws.session.sign_in("u1");
    ws.apply_session();

    let first = ws.todos.add_todo(draft("first")).await.unwrap();
    let _second = ws.todos.add_todo(draft("second")).await.unwrap();
    assert_eq!(ws.todos.todos().len(), 2);

    ws.todos.delete_todo(&first.id).await.unwrap();

    let cache = ws.todos.todos();
    assert_eq!(cache.len(), 1);
    assert!(cache.iter().all(|t| t.id != first.id));
}

#[tokio::test]
async fn test_repeated_apply_session_keeps_single_subscription() {
    let store = Arc::new(MemoryStore::new());
    let ws = workspace(&store);
    ws.session.sign_in("u1");
    ws.apply_session();
    ws.apply_session();
    ws.apply_session();

    ws.todos.add_todo(draft("once")).await.unwrap();
    // A duplicate subscription would not duplicate rows (snapshots replace),
    // but it would race teardown; the observable here is a coherent cache.
    assert_eq!(ws.todos.todos().len(), 1);
}

#[tokio::test]
async fn test_detach_freezes_cache() {
    let store = Arc::new(MemoryStore::new());
    let ws = workspace(&store);
    ws.session.sign_in("u1");
    ws.apply_session();
    ws.todos.add_todo(draft("kept")).await.unwrap();

    ws.detach_all();

    // Writes from elsewhere no longer reach the detached cache.
    let other = workspace(&store);
    other.session.sign_in("u1");
    other.apply_session();
    other.todos.add_todo(draft("unseen")).await.unwrap();

    assert_eq!(ws.todos.todos().len(), 1);
    assert_eq!(other.todos.todos().len(), 2);
}

// =============================================================================
// Silent failure contract
// =============================================================================

#[tokio::test]
async fn test_store_failure_returns_error_and_changes_nothing() {
    let store = Arc::new(MemoryStore::new());
    let ws = workspace(&store);
    ws.session.sign_in("u1");
    ws.apply_session();
    let ack = ws.todos.add_todo(draft("stable")).await.unwrap();

    store.set_fail_writes(true);
    let err = ws.todos.toggle_todo(&ack.id).await.unwrap_err();
    assert!(matches!(err, WriteError::Store(_)));

    // The cache still shows the pre-write state.
    assert!(!ws.todos.todos()[0].completed);
}

// =============================================================================
// Folder reset on delete
// =============================================================================

#[tokio::test]
async fn test_deleting_last_task_in_folder_resets_view() {
    let store = Arc::new(MemoryStore::new());
    let ws = workspace(&store);
    ws.session.sign_in("u1");
    ws.apply_session();

    let mut in_folder = draft("only one in X");
    in_folder.folder = Some("X".to_string());
    let ack = ws.todos.add_todo(in_folder).await.unwrap();

    ws.todos.set_selected_folder(Some("X".to_string()));
    ws.todos.set_selected_view(TodoView::All);

    ws.todos.delete_todo(&ack.id).await.unwrap();

    let state = ws.todos.filter_state();
    assert_eq!(state.selected_folder, None);
    assert_eq!(state.selected_view, TodoView::Tasks);
}

#[tokio::test]
async fn test_delete_keeps_view_when_folder_still_populated() {
    let store = Arc::new(MemoryStore::new());
    let ws = workspace(&store);
    ws.session.sign_in("u1");
    ws.apply_session();

    let mut a = draft("a");
    a.folder = Some("X".to_string());
    let mut b = draft("b");
    b.folder = Some("X".to_string());
    let ack = ws.todos.add_todo(a).await.unwrap();
    ws.todos.add_todo(b).await.unwrap();

    ws.todos.set_selected_folder(Some("X".to_string()));
    ws.todos.delete_todo(&ack.id).await.unwrap();

    let state = ws.todos.filter_state();
    assert_eq!(state.selected_folder.as_deref(), Some("X"));
}

#[tokio::test]
async fn test_failed_delete_does_not_reset_view() {
    let store = Arc::new(MemoryStore::new());
    let ws = workspace(&store);
    ws.session.sign_in("u1");
    ws.apply_session();

    let mut in_folder = draft("only one in X");
    in_folder.folder = Some("X".to_string());
    let ack = ws.todos.add_todo(in_folder).await.unwrap();
    ws.todos.set_selected_folder(Some("X".to_string()));

    store.set_fail_writes(true);
    ws.todos.delete_todo(&ack.id).await.unwrap_err();

    assert_eq!(ws.todos.filter_state().selected_folder.as_deref(), Some("X"));
}

// =============================================================================
// Derived views through the service
// =============================================================================

#[tokio::test]
async fn test_filtered_todos_respects_view_through_service() {
    let store = Arc::new(MemoryStore::new());
    let ws = workspace(&store);
    ws.session.sign_in("u1");
    ws.apply_session();

    let mut done = draft("done");
    done.completed = true;
    ws.todos.add_todo(done).await.unwrap();
    ws.todos.add_todo(draft("open")).await.unwrap();

    // Default view hides completed tasks.
    let visible = ws.todos.filtered_todos(StatusFilter::All);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].title, "open");

    ws.todos.set_selected_view(TodoView::All);
    assert_eq!(ws.todos.filtered_todos(StatusFilter::All).len(), 2);
}
