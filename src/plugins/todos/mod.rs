//! Task plugin: owner-scoped task sync plus the sidebar filter state.

pub mod filters;
pub mod types;

use crate::shared::errors::{DropReason, WriteError};
use crate::store::{to_fields, DocumentStore, WriteAck};
use crate::sync::CollectionSync;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use types::{LabelCount, StatusFilter, Todo, TodoDraft, TodoFilterState, TodoUpdate, TodoView};

/// Task service: one synchronizer over the `todos` collection plus the filter
/// state that drives the derived views.
pub struct TodoStore {
    sync: CollectionSync<Todo>,
    filter: RwLock<TodoFilterState>,
}

impl TodoStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            sync: CollectionSync::new(store),
            filter: RwLock::new(TodoFilterState::default()),
        }
    }

    pub fn attach(&self, principal: Option<&str>) {
        self.sync.attach(principal);
    }

    pub fn detach(&self) {
        self.sync.detach();
    }

    /// Cached tasks, newest first.
    pub fn todos(&self) -> Vec<Todo> {
        self.sync.snapshot()
    }

    pub fn filter_state(&self) -> TodoFilterState {
        self.filter.read().unwrap().clone()
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        self.filter.write().unwrap().search_query = query.into();
    }

    pub fn set_selected_label(&self, label: Option<String>) {
        self.filter.write().unwrap().selected_label = label;
    }

    pub fn set_selected_folder(&self, folder: Option<String>) {
        self.filter.write().unwrap().selected_folder = folder;
    }

    pub fn set_selected_view(&self, view: TodoView) {
        self.filter.write().unwrap().selected_view = view;
    }

    /// Tasks matching the current filter state plus a completion-status
    /// filter, evaluated against today's UTC date.
    pub fn filtered_todos(&self, status: StatusFilter) -> Vec<Todo> {
        let todos = self.sync.snapshot();
        let state = self.filter_state();
        filters::filtered_todos(&todos, &state, status, &filters::today_utc())
    }

    /// Label counts restricted by the current view and folder.
    pub fn labels_with_count(&self) -> Vec<LabelCount> {
        let todos = self.sync.snapshot();
        let state = self.filter_state();
        filters::labels_with_count(
            &todos,
            state.selected_view,
            state.selected_folder.as_deref(),
            &filters::today_utc(),
        )
    }

    /// Folder counts over the entire cache.
    pub fn folders_with_count(&self) -> Vec<LabelCount> {
        filters::folders_with_count(&self.sync.snapshot())
    }

    /// Creates a task owned by the active principal. Array fields default to
    /// empty so the remote document never stores them as absent.
    pub async fn add_todo(&self, draft: TodoDraft) -> Result<WriteAck, WriteError> {
        tracing::debug!(target: "todos", title = %draft.title, "Adding task");
        self.sync.create(to_fields(&draft)).await
    }

    /// Flips the completed flag. Patches only `completed`; the array fields
    /// are not re-sent on this path.
    pub async fn toggle_todo(&self, id: &str) -> Result<WriteAck, WriteError> {
        let todo = self.owned_cached(id)?;
        let mut fields = crate::store::Fields::new();
        fields.insert("completed".to_string(), Value::Bool(!todo.completed));
        self.sync.update(id, fields).await
    }

    /// Merges a partial update into a task. The checklist, comment and
    /// attachment arrays are always re-sent in full, coalesced from the
    /// update or the cached task, so a partial update can never shrink them
    /// to absent on the remote document.
    pub async fn update_todo(&self, id: &str, update: TodoUpdate) -> Result<WriteAck, WriteError> {
        let todo = self.owned_cached(id)?;

        let mut fields = to_fields(&update);
        let checklist = update.checklist.unwrap_or(todo.checklist);
        let comments = update.comments.unwrap_or(todo.comments);
        let attachments = update.attachments.unwrap_or(todo.attachments);
        fields.insert(
            "checklist".to_string(),
            serde_json::to_value(checklist).unwrap_or_default(),
        );
        fields.insert(
            "comments".to_string(),
            serde_json::to_value(comments).unwrap_or_default(),
        );
        fields.insert(
            "attachments".to_string(),
            serde_json::to_value(attachments).unwrap_or_default(),
        );

        self.sync.update(id, fields).await
    }

    /// Deletes a task. When the deleted task was the last one in its folder,
    /// the selected folder is cleared and the view reset to the default so
    /// the user is not stranded on an empty folder view.
    pub async fn delete_todo(&self, id: &str) -> Result<WriteAck, WriteError> {
        let todo = self.owned_cached(id)?;
        let ack = self.sync.remove(id).await?;

        if let Some(folder) = todo.folder {
            let remaining = self
                .sync
                .snapshot()
                .iter()
                .any(|t| t.folder.as_deref() == Some(folder.as_str()) && t.id != id);
            if !remaining {
                tracing::debug!(target: "todos", folder = %folder, "Folder emptied, resetting view");
                let mut filter = self.filter.write().unwrap();
                filter.selected_folder = None;
                filter.selected_view = TodoView::default();
            }
        }
        Ok(ack)
    }

    /// Principal check then cache lookup, in the same order the write paths
    /// report their drop reasons.
    fn owned_cached(&self, id: &str) -> Result<Todo, WriteError> {
        let principal = self
            .sync
            .active_principal()
            .ok_or(DropReason::NoPrincipal)?;
        match self.sync.get(id) {
            Some(todo) if todo.owner_id == principal => Ok(todo),
            _ => {
                tracing::warn!(target: "todos", id, "Write dropped: task not in cache or not owned");
                Err(DropReason::NotOwned.into())
            }
        }
    }
}
