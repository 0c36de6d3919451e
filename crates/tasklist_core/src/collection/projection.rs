//! Sorted and filtered views over the canonical collection.

use crate::collection::canonical::TaskCollection;
use crate::model::task::Task;

/// Read-side view switches chosen by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewOptions {
    /// Order by task text, ignoring case.
    pub sort_alphabetically: bool,
    /// Substring filter; empty disables filtering.
    pub query: String,
}

/// Returns tasks ordered by case-insensitive text, ties in canonical order.
pub fn project_sorted(collection: &TaskCollection) -> Vec<Task> {
    sort_by_text(collection.tasks().to_vec())
}

/// Returns tasks whose text contains `query` verbatim.
///
/// Matching is case-sensitive. An empty query returns the whole collection.
pub fn project_filtered(collection: &TaskCollection, query: &str) -> Vec<Task> {
    filter_by_text(collection.tasks(), query)
}

/// Applies `view` to the collection: filter first, then sort.
pub fn project(collection: &TaskCollection, view: &ViewOptions) -> Vec<Task> {
    let filtered = filter_by_text(collection.tasks(), &view.query);
    if view.sort_alphabetically {
        sort_by_text(filtered)
    } else {
        filtered
    }
}

fn filter_by_text(tasks: &[Task], query: &str) -> Vec<Task> {
    if query.is_empty() {
        return tasks.to_vec();
    }
    tasks
        .iter()
        .filter(|task| task.text.contains(query))
        .cloned()
        .collect()
}

fn sort_by_text(mut tasks: Vec<Task>) -> Vec<Task> {
    // Stable: equal keys keep their incoming relative order.
    tasks.sort_by_cached_key(|task| task.text.to_lowercase());
    tasks
}

#[cfg(test)]
mod tests {
    use super::{project, ViewOptions};
    use crate::collection::canonical::TaskCollection;
    use crate::model::task::{Task, TaskId};

    fn task(id: &str, text: &str) -> Task {
        Task {
            id: TaskId::new(id),
            user_name: "Ann".to_string(),
            text: text.to_string(),
            completed: false,
        }
    }

    #[test]
    fn combined_view_filters_then_sorts() {
        let collection = TaskCollection::from_tasks(vec![
            task("1", "walk the dog"),
            task("2", "buy milk"),
            task("3", "Buy bread"),
        ]);
        let view = ViewOptions {
            sort_alphabetically: true,
            query: "uy".to_string(),
        };

        let ids: Vec<String> = project(&collection, &view)
            .into_iter()
            .map(|t| t.id.to_string())
            .collect();
        assert_eq!(ids, vec!["3", "2"]);
    }
}
