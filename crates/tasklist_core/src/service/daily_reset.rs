//! Daily reset pass over the task collection.
//!
//! # Responsibility
//! - Clear `done` flags that belong to a previous local calendar day.
//! - Advance the `last_reset` watermark on every record, touched or not.
//!
//! # Invariants
//! - Runs before the controller first observes the task list.
//! - Per-record writes only; a crash mid-pass self-heals on the next run
//!   because each task keeps its last-written `last_reset`.

use crate::repo::task_repo::{RepoResult, TaskRepository};
use chrono::{DateTime, Local, NaiveDate};
use log::info;

/// Clears stale `done` flags and stamps `last_reset = now` on every task.
///
/// Same-day comparison uses the local calendar date, not a rolling 24-hour
/// window: 22:00 yesterday and 02:00 today are different days even though
/// less than 24 hours apart.
///
/// Returns the number of tasks whose `done` flag was cleared.
pub fn reset_stale_done<R: TaskRepository>(repo: &R, now: DateTime<Local>) -> RepoResult<usize> {
    let now_ms = now.timestamp_millis();
    let mut reset_count = 0usize;

    for mut task in repo.get_all()? {
        if task.done && !is_same_local_day(task.last_reset, now_ms) {
            task.done = false;
            reset_count += 1;
        }
        task.last_reset = now_ms;
        repo.put(&task)?;
    }

    info!("event=daily_reset module=service status=ok reset_count={reset_count}");
    Ok(reset_count)
}

/// Returns whether two epoch-millisecond instants fall on the same local
/// calendar date.
pub(crate) fn is_same_local_day(a_ms: i64, b_ms: i64) -> bool {
    match (local_date(a_ms), local_date(b_ms)) {
        (Some(a), Some(b)) => a == b,
        // An out-of-range timestamp cannot be "today"; treat it as stale.
        _ => false,
    }
}

fn local_date(epoch_ms: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(epoch_ms).map(|utc| utc.with_timezone(&Local).date_naive())
}
