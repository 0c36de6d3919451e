//! Core logic for the task list: model, cache, projections and the
//! synchronization adapters that keep the cache in step with a remote store.

pub mod collection;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod search;
pub mod service;
pub mod sync;

pub use collection::canonical::{CollectionHandle, TaskCollection};
pub use collection::format::{list_text, DetailView, ListRow, TaskDetail, NOT_FOUND_MESSAGE};
pub use collection::projection::{project, project_filtered, project_sorted, ViewOptions};
pub use config::{AppConfig, BackendConfig, ConfigError, LoggingConfig, SearchConfig};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::task::{Task, TaskDraft, TaskId, TaskState};
pub use model::validation::{validate_submission, Field, ValidationError};
pub use search::debounce::SearchDebouncer;
pub use service::task_board::{SyncError, SyncResult, TaskBoard};
pub use sync::realtime::RealtimeTaskStore;
pub use sync::rest::RestTaskStore;
pub use sync::store::{PullSource, PushSource, StoreError, StoreResult, SyncMode, TaskStore};
pub use sync::subscription::{ListenerRegistry, SnapshotListener, Subscription};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
