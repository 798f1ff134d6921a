//! Task store migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing version order.
//! - Apply the steps a target version requires, oldest first.
//!
//! # Invariants
//! - Applied migration version is mirrored to `PRAGMA user_version`; the
//!   version gate ensures each step runs at most once per store.
//! - All pending steps run inside one transaction: a failure leaves the store
//!   at the version it had before the open.

use crate::db::{StoreError, StoreResult};
use log::{debug, info};
use rusqlite::{params, Connection, Transaction};

/// Durable collection holding task records.
pub const TASKS_TABLE: &str = "tasks";

/// Version 2 created the collection with the legacy column set; stores
/// written before versioning may already carry a compatible table.
const CREATE_TASKS_V2_SQL: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    done INTEGER NOT NULL DEFAULT 0
);";

/// Full schema as of version 3. No UNIQUE constraint on `order`: the repair
/// passes write rows one at a time, so duplicate orders exist transiently
/// mid-repair; uniqueness is an invariant of the repair passes, not the DDL.
const CREATE_TASKS_V3_SQL: &str = "CREATE TABLE tasks (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    done INTEGER NOT NULL DEFAULT 0,
    last_reset INTEGER NOT NULL,
    \"order\" INTEGER NOT NULL
);";

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    apply: fn(&Transaction) -> rusqlite::Result<()>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "legacy_init",
        apply: migrate_noop,
    },
    Migration {
        version: 2,
        name: "create_tasks",
        apply: migrate_create_tasks,
    },
    Migration {
        version: 3,
        name: "backfill_reset_and_order",
        apply: migrate_backfill_reset_and_order,
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies every pending migration step with
/// `stored_version < step.version <= target_version`, strictly oldest first.
///
/// A store at version 0 opened with target 3 runs steps 1, 2 and 3 in order,
/// never just the newest one. A target beyond `latest_version()` applies all
/// known steps.
pub fn apply_migrations(conn: &mut Connection, target_version: u32) -> StoreResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(StoreError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|migration| {
            migration.version > current_version && migration.version <= target_version
        })
        .collect();

    if pending.is_empty() {
        debug!("event=migrate module=db status=skip version={current_version}");
        return Ok(());
    }

    info!(
        "event=migrate module=db status=start from={current_version} to={target_version} pending={}",
        pending.len()
    );

    let tx = conn.transaction()?;
    for migration in pending {
        (migration.apply)(&tx).map_err(|err| StoreError::MigrationFailed {
            version: migration.version,
            name: migration.name,
            source: err,
        })?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        info!(
            "event=migrate_step module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;

    Ok(())
}

fn current_user_version(conn: &Connection) -> StoreResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Version 1 shipped before the store existed; the step is retained so the
/// version sequence stays dense and the gate arithmetic stays trivial.
fn migrate_noop(_tx: &Transaction) -> rusqlite::Result<()> {
    Ok(())
}

fn migrate_create_tasks(tx: &Transaction) -> rusqlite::Result<()> {
    tx.execute_batch(CREATE_TASKS_V2_SQL)
}

/// Record rewrite introducing `last_reset` and `order`.
///
/// Reads every row the legacy table holds (tolerating the pre-v3 column
/// set), drops and recreates the table with the full schema, and re-inserts
/// each record with `last_reset` stamped to now and `order` assigned densely
/// in the existing relative sequence. Runs inside the migration transaction,
/// so the read-clear-rewrite window is atomic on this engine.
fn migrate_backfill_reset_and_order(tx: &Transaction) -> rusqlite::Result<()> {
    let columns = table_columns(tx, TASKS_TABLE)?;
    let order_by = if columns.iter().any(|column| column == "order") {
        "\"order\" ASC, rowid ASC"
    } else {
        "rowid ASC"
    };

    let mut stmt = tx.prepare(&format!(
        "SELECT id, title, done FROM tasks ORDER BY {order_by};"
    ))?;
    let legacy_rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)? != 0,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    drop(stmt);

    tx.execute_batch("DROP TABLE tasks;")?;
    tx.execute_batch(CREATE_TASKS_V3_SQL)?;

    // The source rewrote every row's watermark during this upgrade, so prior
    // reset state is not carried over.
    let now_ms = chrono::Utc::now().timestamp_millis();
    for (index, (id, title, done)) in legacy_rows.iter().enumerate() {
        tx.execute(
            "INSERT INTO tasks (id, title, done, last_reset, \"order\")
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![id, title, i64::from(*done), now_ms, index as i64],
        )?;
    }

    Ok(())
}

fn table_columns(tx: &Transaction, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = tx.prepare(&format!("PRAGMA table_info({table});"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}
