//! Pure derived views over the cached note list.

use super::types::{Note, NoteFilterState, NoteView, TagCount};
use crate::shared::counts::sorted_counts;

fn matches_view(note: &Note, view: NoteView) -> bool {
    match view {
        NoteView::All => true,
        NoteView::Favorites => note.favorite,
    }
}

/// Notes matching the search query (title or content), selected tag, folder
/// and view. An empty query matches everything.
pub fn filtered_notes(notes: &[Note], state: &NoteFilterState) -> Vec<Note> {
    let query = state.search_query.to_lowercase();
    notes
        .iter()
        .filter(|note| {
            let matches_search = note.title.to_lowercase().contains(&query)
                || note.content.to_lowercase().contains(&query);
            let matches_tag = state
                .selected_tag
                .as_ref()
                .map_or(true, |tag| note.tags.contains(tag));
            let matches_folder = state
                .selected_folder
                .as_ref()
                .map_or(true, |folder| note.folder.as_ref() == Some(folder));
            matches_search && matches_tag && matches_folder && matches_view(note, state.selected_view)
        })
        .cloned()
        .collect()
}

/// Tag frequencies across the notes matching the current view and folder.
pub fn tags_with_count(
    notes: &[Note],
    view: NoteView,
    selected_folder: Option<&str>,
) -> Vec<TagCount> {
    let tags = notes
        .iter()
        .filter(|note| {
            let matches_folder =
                selected_folder.map_or(true, |folder| note.folder.as_deref() == Some(folder));
            matches_view(note, view) && matches_folder
        })
        .flat_map(|note| note.tags.iter().cloned());
    sorted_counts(tags)
}

/// Folder frequencies across the entire cache, independent of any filter.
pub fn folders_with_count(notes: &[Note]) -> Vec<TagCount> {
    sorted_counts(notes.iter().filter_map(|n| n.folder.clone()))
}
