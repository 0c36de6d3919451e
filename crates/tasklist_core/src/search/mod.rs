//! Search input handling.
//!
//! # Responsibility
//! - Coalesce rapid search keystrokes into one applied query.
//!
//! # See also
//! - `collection::projection::project_filtered` for the matching rule.

pub mod debounce;
