//! Order-field repair procedures.
//!
//! # Responsibility
//! - Close order gaps after a delete without touching contiguous rows.
//! - Re-linearize the full sequence to `0..n-1` after a drag reorder.
//!
//! # Invariants
//! - Only tasks whose `order` actually changed are written back.
//! - On return the given arrangement carries orders `0..n-1` exactly,
//!   regardless of which subset was rewritten.
//! - Both procedures are idempotent: re-running them over a partially
//!   persisted state converges on the same result.

use crate::model::task::Task;
use crate::repo::task_repo::{RepoResult, TaskRepository};

/// Closes the gaps a delete left behind.
///
/// `survivors` must be sorted by ascending existing `order`. Walks with
/// `last_order` starting at -1 and rewrites a task only when its order does
/// not follow its predecessor by exactly one.
///
/// Returns the number of rows written.
pub fn close_gaps<R: TaskRepository>(repo: &R, survivors: &mut [Task]) -> RepoResult<usize> {
    let mut last_order: i64 = -1;
    let mut writes = 0usize;

    for task in survivors.iter_mut() {
        if task.order - last_order != 1 {
            task.order = last_order + 1;
            repo.put(task)?;
            writes += 1;
        }
        last_order = task.order;
    }

    Ok(writes)
}

/// Rewrites `sequence` to carry orders `0..n-1` in the given arrangement.
///
/// Used after a drag reorder, where `sequence` is the full task list in its
/// new user-intended order.
///
/// Returns the number of rows written.
pub fn relinearize<R: TaskRepository>(repo: &R, sequence: &mut [Task]) -> RepoResult<usize> {
    let mut writes = 0usize;

    for (index, task) in sequence.iter_mut().enumerate() {
        let target = index as i64;
        if task.order != target {
            task.order = target;
            repo.put(task)?;
            writes += 1;
        }
    }

    Ok(writes)
}
