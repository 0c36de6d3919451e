//! Canonical task collection and its shared handle.
//!
//! # Responsibility
//! - Replace the cached collection from a full store read or snapshot.
//! - Give projections and the detail view read access by handle.
//!
//! # Invariants
//! - Every cached task has a non-blank id.
//! - Arrival order of the last load is the canonical order.
//! - Only the sync path writes through `CollectionHandle::replace`.

use crate::model::task::{Task, TaskId};
use log::warn;
use std::sync::{Arc, PoisonError, RwLock};

/// Client-side cache of the remote task collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskCollection {
    tasks: Vec<Task>,
}

impl TaskCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from raw store records.
    pub fn from_tasks(raw: Vec<Task>) -> Self {
        let mut collection = Self::new();
        collection.load(raw);
        collection
    }

    /// Replaces all cached tasks with `raw`, keeping arrival order.
    ///
    /// Records without an id cannot be addressed by any mutation and are
    /// dropped. Returns the number of dropped records.
    pub fn load(&mut self, raw: Vec<Task>) -> usize {
        let received = raw.len();
        self.tasks = raw.into_iter().filter(|task| !task.id.is_blank()).collect();

        let dropped = received - self.tasks.len();
        if dropped > 0 {
            warn!(
                "event=collection_load module=collection status=partial received={} dropped={} reason=blank_id",
                received, dropped
            );
        }
        dropped
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Shared, cloneable handle to one cache instance.
///
/// Snapshot listeners run on the store's thread, so the cache sits behind a
/// lock even though the core itself is single-threaded.
#[derive(Debug, Clone, Default)]
pub struct CollectionHandle {
    inner: Arc<RwLock<TaskCollection>>,
}

impl CollectionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cached collection. Returns the number of dropped records.
    pub fn replace(&self, raw: Vec<Task>) -> usize {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.load(raw)
    }

    /// Runs `read` against the current collection.
    pub fn with<R>(&self, read: impl FnOnce(&TaskCollection) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        read(&guard)
    }

    /// Returns a copy of one cached task.
    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.with(|collection| collection.get(id).cloned())
    }

    pub fn len(&self) -> usize {
        self.with(TaskCollection::len)
    }

    pub fn is_empty(&self) -> bool {
        self.with(TaskCollection::is_empty)
    }
}
