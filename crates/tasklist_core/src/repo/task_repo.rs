//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the durable-store surface (`get_all`/`get`/`add`/`put`/`delete`)
//!   keyed by task id.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - A repository is only constructed over a fully migrated connection.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{latest_version, TASKS_TABLE};
use crate::db::StoreError;
use crate::model::task::{Task, TaskId};
use rusqlite::{params, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT id, title, done, last_reset, \"order\" FROM tasks";

const TASK_INSERT_SQL: &str = "INSERT INTO tasks (id, title, done, last_reset, \"order\")
 VALUES (?1, ?2, ?3, ?4, ?5);";

const TASK_UPSERT_SQL: &str = "INSERT INTO tasks (id, title, done, last_reset, \"order\")
 VALUES (?1, ?2, ?3, ?4, ?5)
 ON CONFLICT(id) DO UPDATE SET
    title = excluded.title,
    done = excluded.done,
    last_reset = excluded.last_reset,
    \"order\" = excluded.\"order\";";

const REQUIRED_TASK_COLUMNS: &[&str] = &["id", "title", "done", "last_reset", "order"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Store(StoreError),
    /// `add` hit an id that is already present. Ids are generated UUID v4,
    /// so this is an invariant violation, never an expected outcome.
    DuplicateId(TaskId),
    NotFound(TaskId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "task id already present: {id}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection is not migrated: store version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Store(StoreError::Sqlite(value))
    }
}

/// Durable store contract for task records.
pub trait TaskRepository {
    /// Every task, ordered by `order` then insertion order, so consumers see
    /// a stable sequence even while duplicate orders exist mid-repair.
    fn get_all(&self) -> RepoResult<Vec<Task>>;
    fn get(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Inserts a new record; fails with `DuplicateId` when the id exists.
    fn add(&self, task: &Task) -> RepoResult<TaskId>;
    /// Upserts by id.
    fn put(&self, task: &Task) -> RepoResult<()>;
    /// Removes by id; signals `NotFound` when the id is absent. Callers that
    /// tolerate the miss convert it to a no-op.
    fn delete(&self, id: TaskId) -> RepoResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Wraps a connection after validating that migrations have completed:
    /// stored version matches the latest migration and the `tasks` table
    /// carries every required column.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        validate_schema(conn)?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn get_all(&self) -> RepoResult<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} ORDER BY \"order\" ASC, rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    fn get(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;

        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn add(&self, task: &Task) -> RepoResult<TaskId> {
        let result = self.conn.execute(
            TASK_INSERT_SQL,
            params![
                task.id.to_string(),
                task.title.as_str(),
                bool_to_int(task.done),
                task.last_reset,
                task.order,
            ],
        );

        match result {
            Ok(_) => Ok(task.id),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(RepoError::DuplicateId(task.id))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn put(&self, task: &Task) -> RepoResult<()> {
        self.conn.execute(
            TASK_UPSERT_SQL,
            params![
                task.id.to_string(),
                task.title.as_str(),
                bool_to_int(task.done),
                task.last_reset,
                task.order,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn validate_schema(conn: &Connection) -> RepoResult<()> {
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [TASKS_TABLE],
        |row| row.get(0),
    )?;
    if table_exists == 0 {
        return Err(RepoError::MissingRequiredTable(TASKS_TABLE));
    }

    let mut stmt = conn.prepare("PRAGMA table_info(tasks);")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    for column in REQUIRED_TASK_COLUMNS.iter().copied() {
        if !columns.iter().any(|name| name == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: TASKS_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in tasks.id"))
    })?;

    let done = match row.get::<_, i64>("done")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid done value `{other}` in tasks.done"
            )));
        }
    };

    Ok(Task {
        id,
        title: row.get("title")?,
        done,
        last_reset: row.get("last_reset")?,
        order: row.get("order")?,
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
