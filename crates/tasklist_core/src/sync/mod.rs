//! Synchronization adapters between the core and a remote task store.
//!
//! # Responsibility
//! - Define the store contract consumed by `service::task_board`.
//! - Provide the pull (REST) and push (realtime tree) implementations.
//!
//! # Invariants
//! - Writes are whole-record; no adapter performs partial patches.
//! - Adapters never retry; failures are returned to the caller as-is.

pub mod realtime;
pub mod rest;
pub mod store;
pub mod subscription;
