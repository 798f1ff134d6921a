//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the task-list use-cases: daily reset,
//!   order repair and the list controller.
//! - Keep UI/FFI layers decoupled from storage details.
//!
//! # Invariants
//! - Services speak only through the `TaskRepository` contract.

pub mod daily_reset;
pub mod order_repair;
pub mod task_list;
