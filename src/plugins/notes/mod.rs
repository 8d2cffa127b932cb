//! Note plugin: owner-scoped note sync, templates, favorites.

pub mod filters;
pub mod types;

use crate::shared::errors::{DropReason, WriteError};
use crate::store::{to_fields, DocumentStore, WriteAck};
use crate::sync::CollectionSync;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use types::{Note, NoteDraft, NoteFilterState, NoteUpdate, NoteView, TagCount};

/// Note service: one synchronizer over the `notes` collection plus the
/// filter state driving the derived views.
pub struct NoteStore {
    sync: CollectionSync<Note>,
    filter: RwLock<NoteFilterState>,
}

impl NoteStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            sync: CollectionSync::new(store),
            filter: RwLock::new(NoteFilterState::default()),
        }
    }

    pub fn attach(&self, principal: Option<&str>) {
        self.sync.attach(principal);
    }

    pub fn detach(&self) {
        self.sync.detach();
    }

    /// Cached notes, newest first.
    pub fn notes(&self) -> Vec<Note> {
        self.sync.snapshot()
    }

    pub fn filter_state(&self) -> NoteFilterState {
        self.filter.read().unwrap().clone()
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        self.filter.write().unwrap().search_query = query.into();
    }

    pub fn set_selected_tag(&self, tag: Option<String>) {
        self.filter.write().unwrap().selected_tag = tag;
    }

    pub fn set_selected_folder(&self, folder: Option<String>) {
        self.filter.write().unwrap().selected_folder = folder;
    }

    pub fn set_selected_view(&self, view: NoteView) {
        self.filter.write().unwrap().selected_view = view;
    }

    pub fn filtered_notes(&self) -> Vec<Note> {
        filters::filtered_notes(&self.sync.snapshot(), &self.filter_state())
    }

    pub fn tags_with_count(&self) -> Vec<TagCount> {
        let state = self.filter_state();
        filters::tags_with_count(
            &self.sync.snapshot(),
            state.selected_view,
            state.selected_folder.as_deref(),
        )
    }

    pub fn folders_with_count(&self) -> Vec<TagCount> {
        filters::folders_with_count(&self.sync.snapshot())
    }

    /// Creates a note owned by the active principal, never favorited.
    pub async fn add_note(&self, draft: NoteDraft) -> Result<WriteAck, WriteError> {
        tracing::debug!(target: "notes", title = %draft.title, "Adding note");
        let mut fields = to_fields(&draft);
        fields.insert("favorite".to_string(), Value::Bool(false));
        self.sync.create(fields).await
    }

    /// Merges a partial update into an owned note. Metadata travels as-is,
    /// without the task-style array coalescing.
    pub async fn update_note(&self, id: &str, update: NoteUpdate) -> Result<WriteAck, WriteError> {
        self.sync.update(id, to_fields(&update)).await
    }

    /// Flips the favorite flag, delegating the ownership checks to the
    /// update path.
    pub async fn toggle_favorite(&self, id: &str) -> Result<WriteAck, WriteError> {
        let note = self.sync.get(id).ok_or(DropReason::NotOwned)?;
        self.update_note(
            id,
            NoteUpdate {
                favorite: Some(!note.favorite),
                ..NoteUpdate::default()
            },
        )
        .await
    }

    /// Deletes an owned note.
    pub async fn delete_note(&self, id: &str) -> Result<WriteAck, WriteError> {
        self.sync.remove(id).await
    }
}
