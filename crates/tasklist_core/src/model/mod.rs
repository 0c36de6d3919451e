//! Task domain model and submission rules.
//!
//! # Responsibility
//! - Define the canonical task record shared by every backend.
//! - Own field-level validation for user submissions.
//!
//! # Invariants
//! - Every stored task is identified by a store-assigned `TaskId`.
//! - Deletion is permanent; there are no tombstones on the client side.

pub mod task;
pub mod validation;
