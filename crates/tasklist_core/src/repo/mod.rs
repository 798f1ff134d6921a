//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the durable-store contract consumed by the service layer.
//! - Isolate SQLite query details from reset/repair/controller orchestration.
//!
//! # Invariants
//! - Every repository operation is atomic per call; multi-record batches are
//!   the caller's concern and are not atomic as a whole.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateId`) in
//!   addition to DB transport errors.

pub mod task_repo;
