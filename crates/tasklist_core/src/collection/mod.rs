//! In-memory task cache and its read-side projections.
//!
//! # Responsibility
//! - Hold the client copy of the task collection in arrival order.
//! - Derive sorted/filtered views without touching canonical order.
//! - Own the list/detail formatting contract.
//!
//! # Invariants
//! - The cache is replaced wholesale on every load or snapshot.
//! - Projections always return new vectors.

pub mod canonical;
pub mod format;
pub mod projection;
