//! Task list controller.
//!
//! # Responsibility
//! - Mirror the durable task store into an in-memory list sorted by `order`.
//! - Expose the add/delete/update-title/set-done/reorder mutation surface
//!   consumed by UI frontends.
//!
//! # Invariants
//! - The cache matches the store after every successful mutator call; the
//!   optimistic `set_done` path rolls back on write failure.
//! - Mutators take `&mut self`, so logically conflicting writes are
//!   serialized by construction.

use crate::model::task::{Task, TaskId};
use crate::repo::task_repo::{RepoError, RepoResult, TaskRepository};
use crate::service::daily_reset::reset_stale_done;
use crate::service::order_repair::{close_gaps, relinearize};
use chrono::{DateTime, Local};
use log::{info, warn};
use std::collections::HashSet;

/// In-memory reflection of the durable task store.
pub struct TaskList<R: TaskRepository> {
    repo: R,
    tasks: Vec<Task>,
}

impl<R: TaskRepository> TaskList<R> {
    /// Loads the controller: runs the daily reset pass, then snapshots the
    /// store sorted by `order`.
    ///
    /// # Contract
    /// - This is the only constructor, so the controller never observes
    ///   stale `done` state from a prior day.
    pub fn load(repo: R, now: DateTime<Local>) -> RepoResult<Self> {
        reset_stale_done(&repo, now)?;
        let mut tasks = repo.get_all()?;
        tasks.sort_by_key(|task| task.order);
        Ok(Self { repo, tasks })
    }

    /// Current in-memory snapshot, sorted by `order`.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Appends a new task at the logical end of the list.
    ///
    /// The new `order` is the last element's stored order + 1, or 0 when the
    /// list is empty — not the task count. Order values therefore drift
    /// upward when gap repair was skipped: `add` over orders `[0, 2, 5]`
    /// assigns 6, not 3.
    pub fn add(&mut self, title: impl Into<String>) -> RepoResult<TaskId> {
        let order = match self.tasks.last() {
            Some(last) => last.order + 1,
            None => 0,
        };
        let task = Task::new(title, Local::now().timestamp_millis(), order);
        let id = self.repo.add(&task)?;
        self.tasks.push(task);

        info!("event=task_add module=service status=ok order={order}");
        Ok(id)
    }

    /// Deletes a task and closes the order gap it leaves behind.
    ///
    /// A store-level `NotFound` miss is tolerated as a no-op.
    pub fn delete(&mut self, id: TaskId) -> RepoResult<()> {
        match self.repo.delete(id) {
            Ok(()) => {}
            Err(RepoError::NotFound(_)) => {
                warn!("event=task_delete module=service status=missing");
            }
            Err(err) => return Err(err),
        }

        self.tasks.retain(|task| task.id != id);
        // Cache stays sorted by order, which is exactly the walk order the
        // gap-close procedure requires.
        close_gaps(&self.repo, &mut self.tasks)?;

        info!(
            "event=task_delete module=service status=ok remaining={}",
            self.tasks.len()
        );
        Ok(())
    }

    /// Replaces a task's title. `last_reset` passes through unchanged; only
    /// the daily reset pass advances the watermark.
    pub fn update_title(&mut self, id: TaskId, title: impl Into<String>) -> RepoResult<()> {
        let index = self.index_of(id).ok_or(RepoError::NotFound(id))?;
        let mut updated = self.tasks[index].clone();
        updated.title = title.into();

        // Store first; the cache only reflects a write that actually landed.
        self.repo.put(&updated)?;
        self.tasks[index] = updated;
        Ok(())
    }

    /// Flips the completion flag optimistically: the cache changes before
    /// the store write settles, and is rolled back when that write fails.
    pub fn set_done(&mut self, id: TaskId, done: bool) -> RepoResult<()> {
        let index = self.index_of(id).ok_or(RepoError::NotFound(id))?;
        let previous = self.tasks[index].done;
        self.tasks[index].done = done;

        if let Err(err) = self.repo.put(&self.tasks[index]) {
            self.tasks[index].done = previous;
            warn!("event=task_set_done module=service status=rollback");
            return Err(err);
        }

        Ok(())
    }

    /// Applies a drag reorder: `ids` is the full task sequence in its new
    /// user-intended order.
    ///
    /// # Contract
    /// - `ids` must be a permutation of the current task ids; anything else
    ///   is rejected before any write.
    /// - On success the cache and store carry orders `0..n-1` in the given
    ///   arrangement; only rows whose order changed were written.
    /// - On a write failure mid-pass the cache keeps the new arrangement and
    ///   the store holds partially updated orders; the next repair pass
    ///   converges both.
    pub fn reorder(&mut self, ids: &[TaskId]) -> RepoResult<()> {
        if ids.len() != self.tasks.len() {
            return Err(RepoError::InvalidData(format!(
                "reorder sequence has {} ids, list has {} tasks",
                ids.len(),
                self.tasks.len()
            )));
        }
        let unique: HashSet<TaskId> = ids.iter().copied().collect();
        if unique.len() != ids.len() {
            return Err(RepoError::InvalidData(
                "reorder sequence contains duplicate ids".to_string(),
            ));
        }

        let mut arranged = Vec::with_capacity(ids.len());
        for id in ids {
            let index = self.index_of(*id).ok_or(RepoError::NotFound(*id))?;
            arranged.push(self.tasks[index].clone());
        }

        self.tasks = arranged;
        let writes = relinearize(&self.repo, &mut self.tasks)?;

        info!("event=task_reorder module=service status=ok writes={writes}");
        Ok(())
    }

    fn index_of(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }
}
