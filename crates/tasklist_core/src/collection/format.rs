//! List and detail formatting contract.
//!
//! # Invariants
//! - List text is cut at `LIST_TEXT_MAX_CHARS` characters; this is the only
//!   place that truncates.
//! - The detail view shows full text, or `NotFound` for unknown ids.

use crate::collection::canonical::TaskCollection;
use crate::model::task::{Task, TaskId, TaskState};

/// Character count at which list text gets truncated.
pub const LIST_TEXT_MAX_CHARS: usize = 40;
/// Marker appended to truncated list text.
pub const ELLIPSIS: &str = "...";
/// Message rendered when the detail view has nothing to show.
pub const NOT_FOUND_MESSAGE: &str = "Error 404: Задача не найдена";

/// Returns list-view text: the first 40 characters plus `...` for texts of
/// 40 or more characters, the text itself otherwise.
pub fn list_text(text: &str) -> String {
    if text.chars().count() < LIST_TEXT_MAX_CHARS {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(LIST_TEXT_MAX_CHARS).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// One row of the task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub id: TaskId,
    pub text: String,
    pub state: TaskState,
}

impl ListRow {
    pub fn from_task(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            text: list_text(&task.text),
            state: task.state(),
        }
    }
}

/// Full task data for the detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDetail {
    pub id: TaskId,
    pub user_name: String,
    pub text: String,
    pub state: TaskState,
}

/// Detail view resolution for one id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailView {
    Found(TaskDetail),
    NotFound,
}

impl DetailView {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

pub fn list_rows(tasks: &[Task]) -> Vec<ListRow> {
    tasks.iter().map(ListRow::from_task).collect()
}

/// Resolves the detail view for `id` from the cached collection.
pub fn detail(collection: &TaskCollection, id: &TaskId) -> DetailView {
    match collection.get(id) {
        Some(task) => DetailView::Found(TaskDetail {
            id: task.id.clone(),
            user_name: task.user_name.clone(),
            text: task.text.clone(),
            state: task.state(),
        }),
        None => DetailView::NotFound,
    }
}
