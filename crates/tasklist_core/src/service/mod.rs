//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation, store calls and cache refresh into user actions.
//! - Keep UI layers decoupled from which backend is attached.

pub mod task_board;
