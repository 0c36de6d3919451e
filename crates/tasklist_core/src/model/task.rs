//! Task domain model.
//!
//! # Responsibility
//! - Define the record exchanged with REST and realtime backends.
//! - Decode records written by older clients without failing.
//!
//! # Invariants
//! - `id` is assigned by the store and never rewritten by core.
//! - Missing or `null` fields decode to defaults; a legacy record can be
//!   rendered but is never silently "repaired" on the store.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// Opaque store-assigned task identifier.
///
/// json-server hands out numeric ids while the realtime tree uses push keys,
/// so decoding accepts both and keeps the textual form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether the id is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Serialize for TaskId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TaskIdVisitor)
    }
}

struct TaskIdVisitor;

impl Visitor<'_> for TaskIdVisitor {
    type Value = TaskId;

    fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("a string or integer task id")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<TaskId, E> {
        Ok(TaskId::new(value))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<TaskId, E> {
        Ok(TaskId(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<TaskId, E> {
        Ok(TaskId(value.to_string()))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<TaskId, E> {
        Ok(TaskId(value.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<TaskId, E> {
        Ok(TaskId::default())
    }
}

/// Observable task state used by list/detail rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Active,
    Completed,
}

impl TaskState {
    pub fn from_completed(completed: bool) -> Self {
        if completed {
            Self::Completed
        } else {
            Self::Active
        }
    }
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: TaskId,
    /// Owner name, serialized as `userName`.
    #[serde(rename = "userName", default, deserialize_with = "lenient_string")]
    pub user_name: String,
    /// Task description. Older records store it under `toDo`.
    #[serde(alias = "toDo", default, deserialize_with = "lenient_string")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub completed: bool,
}

impl Task {
    /// Builds a task from a draft and the id assigned by the store.
    pub fn from_draft(id: TaskId, draft: TaskDraft) -> Self {
        Self {
            id,
            user_name: draft.user_name,
            text: draft.text,
            completed: draft.completed,
        }
    }

    pub fn state(&self) -> TaskState {
        TaskState::from_completed(self.completed)
    }

    /// Returns the record body without its identity.
    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            user_name: self.user_name.clone(),
            text: self.text.clone(),
            completed: self.completed,
        }
    }
}

/// Task body submitted for creation, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    #[serde(rename = "userName", default, deserialize_with = "lenient_string")]
    pub user_name: String,
    #[serde(alias = "toDo", default, deserialize_with = "lenient_string")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub completed: bool,
}

impl TaskDraft {
    /// Creates an active (not completed) draft.
    pub fn new(user_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            text: text.into(),
            completed: false,
        }
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}
