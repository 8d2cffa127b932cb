//! Bookmark plugin: owner-scoped bookmark sync, favorites, CSV import.

pub mod filters;
pub mod import;
pub mod types;

use crate::shared::errors::{DropReason, WriteError};
use crate::store::{to_fields, DocumentStore, WriteAck};
use crate::sync::CollectionSync;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use types::{
    Bookmark, BookmarkDraft, BookmarkFilterState, BookmarkUpdate, BookmarkView, TagCount,
};

/// Bookmark service: one synchronizer over the `bookmarks` collection plus
/// the filter state driving the derived views.
pub struct BookmarkStore {
    sync: CollectionSync<Bookmark>,
    filter: RwLock<BookmarkFilterState>,
}

impl BookmarkStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            sync: CollectionSync::new(store),
            filter: RwLock::new(BookmarkFilterState::default()),
        }
    }

    pub fn attach(&self, principal: Option<&str>) {
        self.sync.attach(principal);
    }

    pub fn detach(&self) {
        self.sync.detach();
    }

    /// Cached bookmarks, newest first.
    pub fn bookmarks(&self) -> Vec<Bookmark> {
        self.sync.snapshot()
    }

    pub fn filter_state(&self) -> BookmarkFilterState {
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

    pub fn set_selected_view(&self, view: BookmarkView) {
        self.filter.write().unwrap().selected_view = view;
    }

    pub fn filtered_bookmarks(&self) -> Vec<Bookmark> {
        filters::filtered_bookmarks(&self.sync.snapshot(), &self.filter_state())
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

    /// Creates a bookmark owned by the active principal, never favorited.
    pub async fn add_bookmark(&self, draft: BookmarkDraft) -> Result<WriteAck, WriteError> {
        tracing::debug!(target: "bookmarks", url = %draft.url, "Adding bookmark");
        let mut fields = to_fields(&draft);
        fields.insert("favorite".to_string(), Value::Bool(false));
        self.sync.create(fields).await
    }

    /// Merges a partial update into an owned bookmark.
    pub async fn update_bookmark(
        &self,
        id: &str,
        update: BookmarkUpdate,
    ) -> Result<WriteAck, WriteError> {
        self.sync.update(id, to_fields(&update)).await
    }

    /// Flips the favorite flag, delegating the ownership checks to the
    /// update path.
    pub async fn toggle_favorite(&self, id: &str) -> Result<WriteAck, WriteError> {
        let bookmark = self.sync.get(id).ok_or(DropReason::NotOwned)?;
        self.update_bookmark(
            id,
            BookmarkUpdate {
                favorite: Some(!bookmark.favorite),
                ..BookmarkUpdate::default()
            },
        )
        .await
    }

    /// Deletes an owned bookmark.
    pub async fn delete_bookmark(&self, id: &str) -> Result<WriteAck, WriteError> {
        self.sync.remove(id).await
    }

    /// Imports bookmarks from CSV content, submitting every parsed row
    /// through the regular create path. Individual row failures follow the
    /// usual fire-and-forget write contract; the number of submitted rows is
    /// returned.
    pub async fn import_csv(&self, content: &str) -> Result<usize, import::ImportError> {
        let rows = import::parse_csv_limited(content)?;
        let count = rows.len();

        for row in rows {
            let draft = BookmarkDraft {
                title: row.title,
                url: row.url,
                description: row.description,
                tags: row.tags,
                favicon: None,
                folder: row.folder,
            };
            if let Err(e) = self.add_bookmark(draft).await {
                tracing::warn!(target: "bookmarks", error = %e, "Imported bookmark was not stored");
            }
        }

        tracing::info!(target: "bookmarks", count, "CSV import submitted");
        Ok(count)
    }
}
