//! Domain model for the daily task list.
//!
//! # Responsibility
//! - Define the canonical record shared by the store, the repair passes and
//!   the list controller.
//!
//! # Invariants
//! - Every domain object is identified by a stable `TaskId`.
//! - Deletion is a hard delete; there is no tombstone state.

pub mod task;
