//! Pure derived views over the cached bookmark list.

use super::types::{Bookmark, BookmarkFilterState, BookmarkView, TagCount};
use crate::shared::counts::sorted_counts;

fn matches_view(bookmark: &Bookmark, view: BookmarkView) -> bool {
    match view {
        BookmarkView::All => true,
        BookmarkView::Favorites => bookmark.favorite,
    }
}

/// Bookmarks matching the search query (title or description), selected tag,
/// folder and view. An empty query matches everything.
pub fn filtered_bookmarks(bookmarks: &[Bookmark], state: &BookmarkFilterState) -> Vec<Bookmark> {
    let query = state.search_query.to_lowercase();
    bookmarks
        .iter()
        .filter(|bookmark| {
            let matches_search = bookmark.title.to_lowercase().contains(&query)
                || bookmark.description.to_lowercase().contains(&query);
            let matches_tag = state
                .selected_tag
                .as_ref()
                .map_or(true, |tag| bookmark.tags.contains(tag));
            let matches_folder = state
                .selected_folder
                .as_ref()
                .map_or(true, |folder| bookmark.folder.as_ref() == Some(folder));
            matches_search
                && matches_tag
                && matches_folder
                && matches_view(bookmark, state.selected_view)
        })
        .cloned()
        .collect()
}

/// Tag frequencies across the bookmarks matching the current view and folder
/// (never restricted by the selected tag or the search query).
pub fn tags_with_count(
    bookmarks: &[Bookmark],
    view: BookmarkView,
    selected_folder: Option<&str>,
) -> Vec<TagCount> {
    let tags = bookmarks
        .iter()
        .filter(|bookmark| {
            let matches_folder =
                selected_folder.map_or(true, |folder| bookmark.folder.as_deref() == Some(folder));
            matches_view(bookmark, view) && matches_folder
        })
        .flat_map(|bookmark| bookmark.tags.iter().cloned());
    sorted_counts(tags)
}

/// Folder frequencies across the entire cache, independent of any filter.
pub fn folders_with_count(bookmarks: &[Bookmark]) -> Vec<TagCount> {
    sorted_counts(bookmarks.iter().filter_map(|b| b.folder.clone()))
}
