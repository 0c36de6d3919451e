//! Push adapter over an embedded realtime key-value tree.
//!
//! # Responsibility
//! - Store task records as JSON children of one root path.
//! - Re-broadcast the full child snapshot to subscribers after every write.
//!
//! # Invariants
//! - Child order is arrival order (`seq`); overwriting a child keeps its slot.
//! - `overwrite` has set semantics: it replaces the whole child value and
//!   creates the child when absent.
//! - A child whose value is not a task object is skipped in snapshots.
//! - Listeners run after the connection lock is released, but under the
//!   publish lock: snapshots reach every listener in write order.
//! - Listeners must not write to or subscribe on the same store from inside
//!   the callback.

use crate::db::{open_db, open_db_in_memory};
use crate::model::task::{Task, TaskDraft, TaskId};
use crate::sync::store::{PushSource, StoreError, StoreResult, TaskStore};
use crate::sync::subscription::{ListenerRegistry, SnapshotListener, Subscription};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Default root path holding task children.
pub const DEFAULT_ROOT: &str = "toDos";

/// SQLite-backed realtime tree store.
pub struct RealtimeTaskStore {
    conn: Mutex<Connection>,
    /// Held from mutation through broadcast; orders snapshot delivery.
    publish: Mutex<()>,
    root: String,
    listeners: Arc<ListenerRegistry>,
}

impl RealtimeTaskStore {
    /// Opens (or creates) a tree database file.
    pub fn open(path: impl AsRef<Path>, root: &str) -> StoreResult<Self> {
        Self::from_connection(open_db(path)?, root)
    }

    /// Opens a tree that lives only as long as this store.
    pub fn open_in_memory(root: &str) -> StoreResult<Self> {
        Self::from_connection(open_db_in_memory()?, root)
    }

    /// Wraps a connection that already has migrations applied.
    pub fn from_connection(conn: Connection, root: &str) -> StoreResult<Self> {
        let root = normalize_root(root)?;
        info!("event=realtime_open module=sync status=ok root={root}");
        Ok(Self {
            conn: Mutex::new(conn),
            publish: Mutex::new(()),
            root,
            listeners: ListenerRegistry::new(),
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Writes an arbitrary JSON value under `root/key`.
    ///
    /// Intended for imports of existing trees; values that are not task
    /// objects stay in the tree but are skipped by snapshots.
    pub fn set_raw(&self, key: &str, value: &serde_json::Value) -> StoreResult<()> {
        let value_json = serde_json::to_string(value)?;
        self.write(|conn| upsert_child(conn, &self.root, key, &value_json))
    }

    /// Reads the current snapshot of task children in arrival order.
    pub fn snapshot(&self) -> StoreResult<Vec<Task>> {
        read_children(&self.lock(), &self.root)
    }

    /// Runs `mutate` under the connection lock, then broadcasts the new snapshot.
    fn write<T>(&self, mutate: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let _publish = self.publish_lock();
        let (output, snapshot) = {
            let conn = self.lock();
            let output = mutate(&conn)?;
            (output, read_children(&conn, &self.root)?)
        };
        self.listeners.broadcast(&snapshot);
        Ok(output)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_lock(&self) -> MutexGuard<'_, ()> {
        self.publish.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TaskStore for RealtimeTaskStore {
    fn backend_id(&self) -> &'static str {
        "realtime"
    }

    fn fetch(&self, id: &TaskId) -> StoreResult<Option<Task>> {
        let value: Option<String> = self
            .lock()
            .query_row(
                "SELECT value_json FROM tree_nodes WHERE parent_path = ?1 AND node_key = ?2;",
                params![self.root, id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            Some(value_json) => decode_child(id.as_str(), &value_json).map(Some),
            None => Ok(None),
        }
    }

    fn insert(&self, draft: &TaskDraft) -> StoreResult<TaskId> {
        let key = push_key();
        let value_json = serde_json::to_string(draft)?;
        self.write(|conn| {
            conn.execute(
                "INSERT INTO tree_nodes (parent_path, node_key, value_json) VALUES (?1, ?2, ?3);",
                params![self.root, key, value_json],
            )?;
            Ok(TaskId::new(key.as_str()))
        })
    }

    fn overwrite(&self, id: &TaskId, task: &Task) -> StoreResult<()> {
        let value_json = serde_json::to_string(&task.to_draft())?;
        self.write(|conn| upsert_child(conn, &self.root, id.as_str(), &value_json))
    }

    fn remove(&self, id: &TaskId) -> StoreResult<()> {
        self.write(|conn| {
            let changed = conn.execute(
                "DELETE FROM tree_nodes WHERE parent_path = ?1 AND node_key = ?2;",
                params![self.root, id.as_str()],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(id.clone()));
            }
            Ok(())
        })
    }
}

impl PushSource for RealtimeTaskStore {
    fn subscribe(&self, listener: SnapshotListener) -> StoreResult<Subscription> {
        // The initial snapshot is delivered before any later write can broadcast.
        let _publish = self.publish_lock();
        let snapshot = read_children(&self.lock(), &self.root)?;
        let subscription = self.listeners.add(Arc::clone(&listener));
        listener(&snapshot);
        Ok(subscription)
    }
}

fn upsert_child(conn: &Connection, root: &str, key: &str, value_json: &str) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO tree_nodes (parent_path, node_key, value_json) VALUES (?1, ?2, ?3)
         ON CONFLICT (parent_path, node_key) DO UPDATE SET
            value_json = excluded.value_json,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![root, key, value_json],
    )?;
    Ok(())
}

fn read_children(conn: &Connection, root: &str) -> StoreResult<Vec<Task>> {
    let mut stmt = conn.prepare(
        "SELECT node_key, value_json FROM tree_nodes WHERE parent_path = ?1 ORDER BY seq ASC;",
    )?;
    let mut rows = stmt.query([root])?;
    let mut tasks = Vec::new();
    let mut skipped = 0usize;

    while let Some(row) = rows.next()? {
        let key: String = row.get(0)?;
        let value_json: String = row.get(1)?;
        match decode_child(&key, &value_json) {
            Ok(task) => tasks.push(task),
            Err(_) => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("event=realtime_snapshot module=sync status=partial root={root} skipped={skipped}");
    }
    Ok(tasks)
}

fn decode_child(key: &str, value_json: &str) -> StoreResult<Task> {
    let value: serde_json::Value = serde_json::from_str(value_json)?;
    if !value.is_object() {
        return Err(StoreError::Decode(format!("child `{key}` is not an object")));
    }
    let mut task: Task = serde_json::from_value(value)?;
    // The key is the identity; an `id` inside the value is ignored.
    task.id = TaskId::new(key);
    Ok(task)
}

fn push_key() -> String {
    Uuid::new_v4().simple().to_string()
}

fn normalize_root(root: &str) -> StoreResult<String> {
    let trimmed = root.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(StoreError::InvalidData(
            "realtime root path cannot be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
