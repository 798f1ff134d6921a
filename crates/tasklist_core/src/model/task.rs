//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record persisted in the `tasks` collection.
//! - Provide constructors that establish identifier and flag defaults.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `order` values are unique across live tasks; ties are a defect that the
//!   repair passes in `service` remove.
//! - `last_reset` marks the moment the `done` flag was last known valid.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for every task.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type TaskId = Uuid;

/// Canonical task record, mirrored 1:1 by the durable `tasks` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable global ID, assigned at creation.
    pub id: TaskId,
    /// User-editable title. May be empty only transiently while editing.
    pub title: String,
    /// Completion flag, valid for the calendar day of `last_reset`.
    pub done: bool,
    /// Serialized as `lastReset` to match the frontend record shape.
    /// Unix epoch milliseconds of the last daily-reset rewrite.
    #[serde(rename = "lastReset")]
    pub last_reset: i64,
    /// Integer position among sibling tasks.
    pub order: i64,
}

impl Task {
    /// Creates a task with a generated stable ID and `done = false`.
    pub fn new(title: impl Into<String>, last_reset: i64, order: i64) -> Self {
        Self::with_id(Uuid::new_v4(), title, last_reset, order)
    }

    /// Creates a task with a caller-provided stable ID.
    ///
    /// Used by tests and import paths where identity already exists.
    ///
    /// # Invariants
    /// - The provided `id` must remain stable for this task's lifetime.
    pub fn with_id(id: TaskId, title: impl Into<String>, last_reset: i64, order: i64) -> Self {
        Self {
            id,
            title: title.into(),
            done: false,
            last_reset,
            order,
        }
    }
}
