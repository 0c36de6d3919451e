//! Task board: cache, view state and mutations over one store.
//!
//! # Responsibility
//! - Keep the cached collection consistent with the store (reload or snapshot).
//! - Apply user mutations as read-modify-write of whole records.
//! - Hold view switches (sort, debounced search) and render rows/details.
//!
//! # Invariants
//! - A rejected submission never reaches the store.
//! - On pull backends every successful write is followed by a full reload;
//!   a failed reload does not turn the write into an error.
//! - On push backends only the subscription listener writes the cache.
//! - Failed store calls leave the cache untouched (stale view, no retry).
//! - Concurrent writes to one id are not serialized; the last write wins.

use crate::collection::canonical::CollectionHandle;
use crate::collection::format::{self, DetailView, ListRow};
use crate::collection::projection::{self, ViewOptions};
use crate::config::{AppConfig, BackendConfig};
use crate::model::task::{Task, TaskDraft, TaskId};
use crate::model::validation::{validate_submission, ValidationError};
use crate::search::debounce::SearchDebouncer;
use crate::sync::realtime::RealtimeTaskStore;
use crate::sync::rest::RestTaskStore;
use crate::sync::store::{PullSource, PushSource, StoreError, SyncMode, TaskStore};
use crate::sync::subscription::Subscription;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub type SyncResult<T> = Result<T, SyncError>;

/// Board-level error taxonomy.
#[derive(Debug)]
pub enum SyncError {
    /// Submission rejected before any request; show to the user.
    Validation(ValidationError),
    /// Target task is gone; the operation did nothing.
    NotFound(TaskId),
    /// Store or transport failure; logged, view left stale.
    Store(StoreError),
}

impl SyncError {
    /// Only validation errors are meant for the user.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ValidationError> for SyncError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for SyncError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

enum Feed {
    Pull(Arc<dyn PullSource>),
    Push { _subscription: Subscription },
}

/// Use-case facade over one task store.
pub struct TaskBoard {
    store: Arc<dyn TaskStore>,
    feed: Feed,
    cache: CollectionHandle,
    view: ViewOptions,
    debouncer: SearchDebouncer,
}

impl TaskBoard {
    /// Attaches to a pull backend and performs the initial load.
    ///
    /// A failed initial load is logged and leaves the board empty; call
    /// [`TaskBoard::refresh`] to retry.
    pub fn with_pull<P: PullSource + 'static>(source: Arc<P>, debounce_window: Duration) -> Self {
        let board = Self {
            store: source.clone(),
            feed: Feed::Pull(source),
            cache: CollectionHandle::new(),
            view: ViewOptions::default(),
            debouncer: SearchDebouncer::new(debounce_window),
        };
        // Failure is logged by `refresh`; the board starts empty until the next one.
        board.refresh().ok();
        board
    }

    /// Attaches to a push backend; the cache follows its snapshots from now on.
    pub fn with_push<P: PushSource + 'static>(
        source: Arc<P>,
        debounce_window: Duration,
    ) -> SyncResult<Self> {
        let cache = CollectionHandle::new();
        let writer = cache.clone();
        let subscription = source
            .subscribe(Arc::new(move |snapshot: &[Task]| {
                writer.replace(snapshot.to_vec());
            }))
            .inspect_err(|err| {
                error!(
                    "event=board_attach module=board status=error backend={} error={err}",
                    source.backend_id()
                );
            })?;

        info!(
            "event=board_attach module=board status=ok mode={} backend={} tasks={}",
            SyncMode::Push.as_str(),
            source.backend_id(),
            cache.len()
        );
        Ok(Self {
            store: source,
            feed: Feed::Push {
                _subscription: subscription,
            },
            cache,
            view: ViewOptions::default(),
            debouncer: SearchDebouncer::new(debounce_window),
        })
    }

    /// Builds the backend named by `config` and attaches to it.
    pub fn open(config: &AppConfig) -> SyncResult<Self> {
        match &config.backend {
            BackendConfig::Rest {
                base_url,
                collection,
                timeout_ms,
            } => {
                let store = RestTaskStore::with_timeout(
                    base_url,
                    collection,
                    Duration::from_millis(*timeout_ms),
                )?;
                Ok(Self::with_pull(Arc::new(store), config.search.pull_window()))
            }
            BackendConfig::Realtime { db_path, root } => {
                let store = match db_path {
                    Some(path) => RealtimeTaskStore::open(path, root)?,
                    None => RealtimeTaskStore::open_in_memory(root)?,
                };
                Self::with_push(Arc::new(store), config.search.push_window())
            }
        }
    }

    pub fn mode(&self) -> SyncMode {
        match self.feed {
            Feed::Pull(_) => SyncMode::Pull,
            Feed::Push { .. } => SyncMode::Push,
        }
    }

    pub fn backend_id(&self) -> &'static str {
        self.store.backend_id()
    }

    /// Read handle to the cached collection.
    pub fn cache(&self) -> &CollectionHandle {
        &self.cache
    }

    pub fn view(&self) -> &ViewOptions {
        &self.view
    }

    /// Reloads the whole collection from a pull backend.
    ///
    /// Push backends keep themselves current; this returns the cached size.
    pub fn refresh(&self) -> SyncResult<usize> {
        let Feed::Pull(source) = &self.feed else {
            return Ok(self.cache.len());
        };

        let started_at = Instant::now();
        match source.fetch_all() {
            Ok(tasks) => {
                self.cache.replace(tasks);
                let loaded = self.cache.len();
                info!(
                    "event=board_refresh module=board status=ok backend={} tasks={loaded} duration_ms={}",
                    self.backend_id(),
                    started_at.elapsed().as_millis()
                );
                Ok(loaded)
            }
            Err(err) => {
                error!(
                    "event=board_refresh module=board status=error backend={} duration_ms={} error={err}",
                    self.backend_id(),
                    started_at.elapsed().as_millis()
                );
                Err(err.into())
            }
        }
    }

    /// Validates and creates a new active task.
    pub fn create(&self, user_name: &str, text: &str) -> SyncResult<TaskId> {
        if let Err(err) = validate_submission(user_name, text) {
            info!(
                "event=task_create module=board status=rejected field={:?}",
                err.field()
            );
            return Err(err.into());
        }

        let started_at = Instant::now();
        let id = self
            .store
            .insert(&TaskDraft::new(user_name, text))
            .map_err(|err| self.log_failure("create", None, started_at, err))?;
        self.finish_write("create", &id, started_at)?;
        Ok(id)
    }

    /// Replaces the owner name of one task.
    pub fn rename_owner(&self, id: &TaskId, new_user_name: &str) -> SyncResult<()> {
        self.rewrite("rename_owner", id, |task| {
            task.user_name = new_user_name.to_string();
        })
    }

    /// Replaces the text of one task.
    pub fn edit_text(&self, id: &TaskId, new_text: &str) -> SyncResult<()> {
        self.rewrite("edit_text", id, |task| task.text = new_text.to_string())
    }

    /// Flips the completion flag of one task.
    pub fn toggle_completed(&self, id: &TaskId) -> SyncResult<()> {
        self.rewrite("toggle_completed", id, |task| task.completed = !task.completed)
    }

    /// Deletes one task permanently.
    pub fn delete(&self, id: &TaskId) -> SyncResult<()> {
        let started_at = Instant::now();
        self.store
            .remove(id)
            .map_err(|err| self.log_failure("delete", Some(id), started_at, err))?;
        self.finish_write("delete", id, started_at)
    }

    /// Read current record, apply `transform`, write the whole record back.
    fn rewrite(
        &self,
        op: &'static str,
        id: &TaskId,
        transform: impl FnOnce(&mut Task),
    ) -> SyncResult<()> {
        let started_at = Instant::now();
        let current = match &self.feed {
            Feed::Pull(_) => self
                .store
                .fetch(id)
                .map_err(|err| self.log_failure(op, Some(id), started_at, err))?,
            Feed::Push { .. } => self.cache.get(id),
        };
        let Some(mut task) = current else {
            return Err(self.log_failure(op, Some(id), started_at, StoreError::NotFound(id.clone())));
        };

        transform(&mut task);
        task.id = id.clone();
        self.store
            .overwrite(id, &task)
            .map_err(|err| self.log_failure(op, Some(id), started_at, err))?;
        self.finish_write(op, id, started_at)
    }

    /// Logs a completed write and reloads. A failed reload leaves the view
    /// stale but does not fail the write.
    fn finish_write(&self, op: &'static str, id: &TaskId, started_at: Instant) -> SyncResult<()> {
        info!(
            "event=task_mutation module=board status=ok op={op} backend={} id={id} duration_ms={}",
            self.backend_id(),
            started_at.elapsed().as_millis()
        );
        if self.refresh().is_err() {
            warn!(
                "event=task_mutation module=board status=stale op={op} backend={} id={id}",
                self.backend_id()
            );
        }
        Ok(())
    }

    fn log_failure(
        &self,
        op: &'static str,
        id: Option<&TaskId>,
        started_at: Instant,
        err: StoreError,
    ) -> SyncError {
        let id = id.map_or_else(|| "-".to_string(), TaskId::to_string);
        let duration_ms = started_at.elapsed().as_millis();
        match &err {
            StoreError::NotFound(_) => warn!(
                "event=task_mutation module=board status=not_found op={op} backend={} id={id} duration_ms={duration_ms}",
                self.backend_id()
            ),
            other => error!(
                "event=task_mutation module=board status=error op={op} backend={} id={id} duration_ms={duration_ms} error={other}",
                self.backend_id()
            ),
        }
        err.into()
    }

    /// Flips alphabetical ordering; pull backends re-request data first.
    pub fn toggle_sort(&mut self) -> SyncResult<()> {
        self.view.sort_alphabetically = !self.view.sort_alphabetically;
        self.refresh().map(drop)
    }

    /// Records a search keystroke; applied by [`TaskBoard::tick`] once quiet.
    pub fn search_input(&mut self, query: impl Into<String>, now: Instant) {
        self.debouncer.input(query, now);
    }

    /// Applies a due search query. Returns whether the view changed.
    ///
    /// Pull backends reload before the query is applied; if the reload fails
    /// the previous view stays in place.
    pub fn tick(&mut self, now: Instant) -> SyncResult<bool> {
        let Some(query) = self.debouncer.poll(now) else {
            return Ok(false);
        };
        self.refresh()?;
        self.view.query = query;
        Ok(true)
    }

    /// Applies `query` immediately, bypassing the debouncer.
    pub fn set_query(&mut self, query: impl Into<String>) -> SyncResult<()> {
        self.debouncer.cancel();
        self.refresh()?;
        self.view.query = query.into();
        Ok(())
    }

    pub fn pending_query(&self) -> Option<&str> {
        self.debouncer.pending()
    }

    /// Tasks in view order (filter, then optional sort).
    pub fn visible_tasks(&self) -> Vec<Task> {
        self.cache
            .with(|collection| projection::project(collection, &self.view))
    }

    /// List rows in view order with truncated text.
    pub fn rows(&self) -> Vec<ListRow> {
        format::list_rows(&self.visible_tasks())
    }

    /// Detail view for `id`; `NotFound` once the task is gone from the cache.
    pub fn detail(&self, id: &TaskId) -> DetailView {
        self.cache.with(|collection| format::detail(collection, id))
    }
}

#[cfg(test)]
mod tests {
    use super::{SyncError, TaskBoard};
    use crate::model::task::{Task, TaskDraft, TaskId};
    use crate::sync::store::{PullSource, StoreError, StoreResult, TaskStore};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Writes always succeed; list reads fail while `listing_down` is set.
    #[derive(Default)]
    struct ListingOutageStore {
        records: Mutex<Vec<Task>>,
        listing_down: AtomicBool,
    }

    impl TaskStore for ListingOutageStore {
        fn backend_id(&self) -> &'static str {
            "memory"
        }

        fn fetch(&self, id: &TaskId) -> StoreResult<Option<Task>> {
            let records = self.records.lock().unwrap();
            Ok(records.iter().find(|task| &task.id == id).cloned())
        }

        fn insert(&self, draft: &TaskDraft) -> StoreResult<TaskId> {
            let mut records = self.records.lock().unwrap();
            let id = TaskId::new((records.len() + 1).to_string());
            records.push(Task::from_draft(id.clone(), draft.clone()));
            Ok(id)
        }

        fn overwrite(&self, id: &TaskId, task: &Task) -> StoreResult<()> {
            let mut records = self.records.lock().unwrap();
            let slot = records
                .iter_mut()
                .find(|stored| &stored.id == id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            *slot = task.clone();
            Ok(())
        }

        fn remove(&self, id: &TaskId) -> StoreResult<()> {
            self.records.lock().unwrap().retain(|task| &task.id != id);
            Ok(())
        }
    }

    impl PullSource for ListingOutageStore {
        fn fetch_all(&self) -> StoreResult<Vec<Task>> {
            if self.listing_down.load(Ordering::SeqCst) {
                return Err(StoreError::Transport("down".to_string()));
            }
            Ok(self.records.lock().unwrap().clone())
        }
    }

    #[test]
    fn failed_reload_after_write_keeps_the_write_result() {
        let store = Arc::new(ListingOutageStore::default());
        let board = TaskBoard::with_pull(Arc::clone(&store), Duration::from_millis(500));
        store.listing_down.store(true, Ordering::SeqCst);

        let id = board.create("Ann", "buy milk").expect("write succeeded");
        assert_eq!(store.records.lock().unwrap().len(), 1);
        assert!(board.cache().is_empty(), "view stays stale");

        board.toggle_completed(&id).expect("toggle succeeded");
        assert!(store.fetch(&id).unwrap().unwrap().completed);

        store.listing_down.store(false, Ordering::SeqCst);
        assert_eq!(board.refresh().unwrap(), 1);
    }

    #[test]
    fn failed_reload_is_still_reported_by_refresh() {
        let store = Arc::new(ListingOutageStore::default());
        store.listing_down.store(true, Ordering::SeqCst);
        let board = TaskBoard::with_pull(Arc::clone(&store), Duration::from_millis(500));

        assert!(matches!(board.refresh(), Err(SyncError::Store(_))));
    }
}
