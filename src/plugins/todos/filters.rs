//! Pure derived views over the cached task list.
//!
//! Everything here is a function of the cache plus filter state, recomputed
//! on demand and never stored. Label counts are restricted by the current
//! view and folder (but not by the selected label or the search query);
//! folder counts always run over the entire cache.

use super::types::{LabelCount, StatusFilter, Todo, TodoFilterState, TodoView};
use crate::shared::counts::sorted_counts;
use chrono::Utc;

/// Current UTC calendar date as `YYYY-MM-DD`, the encoding used by `dueDate`.
pub fn today_utc() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

fn matches_view(todo: &Todo, view: TodoView, today: &str) -> bool {
    match view {
        TodoView::All => true,
        TodoView::Important => todo.priority == super::types::Priority::High,
        TodoView::Today => todo.due_date == today,
        TodoView::Tasks => !todo.completed,
    }
}

/// Tasks matching the search query, selected label/folder/view and the given
/// completion-status filter. An empty query matches everything.
pub fn filtered_todos(
    todos: &[Todo],
    state: &TodoFilterState,
    status: StatusFilter,
    today: &str,
) -> Vec<Todo> {
    let query = state.search_query.to_lowercase();
    todos
        .iter()
        .filter(|todo| {
            let matches_search = todo.title.to_lowercase().contains(&query);
            let matches_label = state
                .selected_label
                .as_ref()
                .map_or(true, |label| todo.labels.contains(label));
            let matches_folder = state
                .selected_folder
                .as_ref()
                .map_or(true, |folder| todo.folder.as_ref() == Some(folder));
            let matches_status = match status {
                StatusFilter::All => true,
                StatusFilter::Active => !todo.completed,
                StatusFilter::Completed => todo.completed,
            };

            matches_search
                && matches_label
                && matches_folder
                && matches_status
                && matches_view(todo, state.selected_view, today)
        })
        .cloned()
        .collect()
}

/// Label frequencies across the tasks matching the current view and folder.
pub fn labels_with_count(
    todos: &[Todo],
    view: TodoView,
    selected_folder: Option<&str>,
    today: &str,
) -> Vec<LabelCount> {
    let labels = todos
        .iter()
        .filter(|todo| {
            let matches_folder =
                selected_folder.map_or(true, |folder| todo.folder.as_deref() == Some(folder));
            matches_view(todo, view, today) && matches_folder
        })
        .flat_map(|todo| todo.labels.iter().cloned());
    sorted_counts(labels)
}

/// Folder frequencies across the entire cache, independent of any filter.
pub fn folders_with_count(todos: &[Todo]) -> Vec<LabelCount> {
    sorted_counts(todos.iter().filter_map(|todo| todo.folder.clone()))
}
