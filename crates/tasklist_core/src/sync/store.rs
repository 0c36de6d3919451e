//! Store contracts and store-level errors.

use crate::db::DbError;
use crate::model::task::{Task, TaskDraft, TaskId};
use crate::sync::subscription::{SnapshotListener, Subscription};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by a store adapter.
#[derive(Debug)]
pub enum StoreError {
    /// Request could not be delivered or no response arrived.
    Transport(String),
    /// Store answered with an unexpected status.
    Status {
        method: &'static str,
        url: String,
        status: u16,
    },
    /// Response or stored value is not a task record.
    Decode(String),
    /// Target id does not exist in the store.
    NotFound(TaskId),
    /// Store returned data violating the adapter contract.
    InvalidData(String),
    Db(DbError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "store transport failed: {message}"),
            Self::Status {
                method,
                url,
                status,
            } => write!(f, "store rejected {method} {url} with status {status}"),
            Self::Decode(message) => write!(f, "invalid task record: {message}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid store data: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

/// Write side shared by every backend, plus single-record reads.
pub trait TaskStore: Send + Sync {
    /// Short stable name used in log events.
    fn backend_id(&self) -> &'static str;
    /// Reads one record; `Ok(None)` when the id is unknown.
    fn fetch(&self, id: &TaskId) -> StoreResult<Option<Task>>;
    /// Creates a record and returns the id assigned by the store.
    fn insert(&self, draft: &TaskDraft) -> StoreResult<TaskId>;
    /// Replaces the whole record stored under `id`.
    fn overwrite(&self, id: &TaskId, task: &Task) -> StoreResult<()>;
    /// Deletes the record permanently.
    fn remove(&self, id: &TaskId) -> StoreResult<()>;
}

/// Backend read explicitly after every mutation.
pub trait PullSource: TaskStore {
    fn fetch_all(&self) -> StoreResult<Vec<Task>>;
}

/// Backend that streams the full collection on every change.
pub trait PushSource: TaskStore {
    /// Registers `listener`, delivers the current snapshot to it, and keeps
    /// delivering until the returned subscription is dropped.
    fn subscribe(&self, listener: SnapshotListener) -> StoreResult<Subscription>;
}

/// How the cache learns about remote changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Pull,
    Push,
}

impl SyncMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Push => "push",
        }
    }
}
