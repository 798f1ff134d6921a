//! Connection bootstrap utilities for the task store.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Trigger schema migrations up to the requested target version before
//!   returning a usable connection.
//!
//! # Invariants
//! - A `Some(target)` open returns a connection migrated to `target`.
//! - A `None` target is a non-upgrading open: migration is skipped entirely
//!   and the store stays at whatever version it already has.

use super::migrations::apply_migrations;
use super::{StoreError, StoreResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens a SQLite store file and applies pending migrations up to
/// `target_version`.
///
/// # Errors
/// - `StoreError::Unavailable` when the host denies the open itself.
/// - Migration-layer errors when bootstrap fails after the open.
///
/// # Side effects
/// - Emits `store_open` logging events with duration and status.
pub fn open_store(
    path: impl AsRef<Path>,
    target_version: Option<u32>,
) -> StoreResult<Connection> {
    finish_open("file", Connection::open(path), target_version)
}

/// Opens an in-memory store and applies pending migrations up to
/// `target_version`. Intended for tests and ephemeral sessions.
pub fn open_store_in_memory(target_version: Option<u32>) -> StoreResult<Connection> {
    finish_open("memory", Connection::open_in_memory(), target_version)
}

fn finish_open(
    mode: &'static str,
    opened: rusqlite::Result<Connection>,
    target_version: Option<u32>,
) -> StoreResult<Connection> {
    let started_at = Instant::now();
    info!("event=store_open module=db status=start mode={mode}");

    let mut conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=store_open module=db status=error mode={mode} duration_ms={} error_code=store_unavailable error={err}",
                started_at.elapsed().as_millis()
            );
            return Err(StoreError::Unavailable(err));
        }
    };

    match bootstrap_connection(&mut conn, target_version) {
        Ok(()) => {
            info!(
                "event=store_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=store_open module=db status=error mode={mode} duration_ms={} error_code=store_bootstrap_failed error={err}",
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, target_version: Option<u32>) -> StoreResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    match target_version {
        Some(target) => apply_migrations(conn, target),
        None => Ok(()),
    }
}
