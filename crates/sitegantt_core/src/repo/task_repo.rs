//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the project task snapshot consumed by the hierarchy builder.
//! - Provide task create/edit/complete/delete write paths.
//! - Keep SQL details and ordering behavior inside repository boundary.
//!
//! # Invariants
//! - Snapshots are ordered `task_order ASC, rowid ASC`.
//! - New tasks are appended after their existing siblings.
//! - Deleting a task deletes its whole subtree.

use crate::db::{ensure_connection_ready, DbError, RequiredTable};
use crate::model::role::Role;
use crate::model::task::{
    normalize_optional_text, NewTask, ProjectId, TaskId, TaskRecord, TaskStatus, TaskUpdate,
    TaskValidationError,
};
use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    t.id AS id,
    t.project_id AS project_id,
    t.parent_task_id AS parent_task_id,
    t.name AS name,
    t.start_date AS start_date,
    t.end_date AS end_date,
    t.status AS status,
    t.is_blocked AS is_blocked,
    t.is_milestone AS is_milestone,
    t.completed_at AS completed_at,
    t.notes AS notes,
    t.task_order AS task_order,
    p.full_name AS responsible
FROM tasks t
LEFT JOIN profiles p ON p.id = t.responsable_id";

const SUBTREE_CTE: &str = "WITH RECURSIVE subtree(id) AS (
    SELECT id FROM tasks WHERE id = ?1
    UNION
    SELECT child.id
    FROM tasks child
    INNER JOIN subtree parent ON child.parent_task_id = parent.id
)";

const TASKS_TABLE: RequiredTable = RequiredTable {
    name: "tasks",
    columns: &[
        "id",
        "project_id",
        "parent_task_id",
        "name",
        "start_date",
        "end_date",
        "status",
        "is_blocked",
        "is_milestone",
        "completed_at",
        "notes",
        "responsable_id",
        "task_order",
    ],
};

const PROFILES_TABLE: RequiredTable = RequiredTable {
    name: "profiles",
    columns: &["id", "full_name", "role"],
};

/// Result type used by task repository operations.
pub type TaskRepoResult<T> = Result<T, TaskRepoError>;

/// Errors from task repository operations.
#[derive(Debug)]
pub enum TaskRepoError {
    /// Write request failed validation.
    Validation(TaskValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target task does not exist.
    NotFound(TaskId),
    /// Target project does not exist.
    ProjectNotFound(ProjectId),
    /// Parent task does not exist in the target project.
    ParentNotFound(TaskId),
    /// Responsible profile is missing or its role cannot own tasks.
    ResponsibleNotAllowed(String),
    /// Persisted data cannot be converted to valid read model.
    InvalidData(String),
}

impl Display for TaskRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent task not found: {id}"),
            Self::ResponsibleNotAllowed(id) => {
                write!(f, "profile cannot be task responsible: {id}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for TaskRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for TaskRepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for TaskRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for TaskRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Data-access capability for project tasks.
pub trait TaskRepository {
    /// Loads the ordered task snapshot of one project.
    fn list_project_tasks(&self, project_id: &str) -> TaskRepoResult<Vec<TaskRecord>>;
    /// Loads one task by id.
    fn get_task(&self, id: &str) -> TaskRepoResult<Option<TaskRecord>>;
    /// Creates one task after its existing siblings.
    fn create_task(&self, request: &NewTask) -> TaskRepoResult<TaskRecord>;
    /// Replaces the editable fields of one task.
    fn update_task(&self, id: &str, update: &TaskUpdate) -> TaskRepoResult<()>;
    /// Stamps `completed_at` and moves status to `done`.
    fn complete_task(&self, id: &str, completed_at: DateTime<Utc>) -> TaskRepoResult<()>;
    /// Deletes one task and its subtree. Returns deleted row count.
    fn delete_task(&self, id: &str) -> TaskRepoResult<usize>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> TaskRepoResult<Self> {
        ensure_connection_ready(conn, &[TASKS_TABLE, PROFILES_TABLE])?;
        Ok(Self { conn })
    }

    /// Inserts one project row and returns its generated id.
    pub fn create_project(&self, name: &str) -> TaskRepoResult<ProjectId> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO projects (id, name) VALUES (?1, ?2);",
            params![id, name.trim()],
        )?;
        Ok(id)
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn list_project_tasks(&self, project_id: &str) -> TaskRepoResult<Vec<TaskRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE t.project_id = ?1
             ORDER BY t.task_order ASC, t.rowid ASC;"
        ))?;
        let mut rows = stmt.query([project_id])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn get_task(&self, id: &str) -> TaskRepoResult<Option<TaskRecord>> {
        load_task(self.conn, id)
    }

    fn create_task(&self, request: &NewTask) -> TaskRepoResult<TaskRecord> {
        request.validate()?;

        if !project_exists(self.conn, &request.project_id)? {
            return Err(TaskRepoError::ProjectNotFound(request.project_id.clone()));
        }
        if let Some(parent_id) = request.parent_id.as_deref() {
            let parent_project: Option<String> = self
                .conn
                .query_row(
                    "SELECT project_id FROM tasks WHERE id = ?1;",
                    [parent_id],
                    |row| row.get(0),
                )
                .optional()?;
            if parent_project.as_deref() != Some(request.project_id.as_str()) {
                return Err(TaskRepoError::ParentNotFound(parent_id.to_string()));
            }
        }

        let responsible_id = normalize_optional_text(request.responsible_id.clone());
        ensure_responsible_allowed(self.conn, responsible_id.as_deref())?;

        let id = Uuid::new_v4().to_string();
        let task_order = next_task_order(
            self.conn,
            &request.project_id,
            request.parent_id.as_deref(),
        )?;
        self.conn.execute(
            "INSERT INTO tasks (
                id,
                project_id,
                parent_task_id,
                name,
                start_date,
                end_date,
                status,
                is_milestone,
                notes,
                responsable_id,
                task_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'pending', ?7, ?8, ?9, ?10);",
            params![
                id,
                request.project_id,
                request.parent_id,
                request.name.trim(),
                request.start_date.to_string(),
                request.end_date.to_string(),
                bool_to_int(request.is_milestone),
                normalize_optional_text(request.notes.clone()),
                responsible_id,
                task_order,
            ],
        )?;

        load_task(self.conn, &id)?.ok_or(TaskRepoError::NotFound(id))
    }

    fn update_task(&self, id: &str, update: &TaskUpdate) -> TaskRepoResult<()> {
        update.validate()?;
        let responsible_id = normalize_optional_text(update.responsible_id.clone());
        ensure_responsible_allowed(self.conn, responsible_id.as_deref())?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET name = ?2,
                 start_date = ?3,
                 end_date = ?4,
                 is_milestone = ?5,
                 notes = ?6,
                 responsable_id = ?7,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                id,
                update.name.trim(),
                update.start_date.to_string(),
                update.end_date.to_string(),
                bool_to_int(update.is_milestone),
                normalize_optional_text(update.notes.clone()),
                responsible_id,
            ],
        )?;
        if changed == 0 {
            return Err(TaskRepoError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn complete_task(&self, id: &str, completed_at: DateTime<Utc>) -> TaskRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET completed_at = ?2,
                 status = 'done',
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, completed_at.to_rfc3339()],
        )?;
        if changed == 0 {
            return Err(TaskRepoError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn delete_task(&self, id: &str) -> TaskRepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(TaskRepoError::NotFound(id.to_string()));
        }

        // UNION (not UNION ALL) stops on cyclic parent links. Rows removed by
        // the FK cascade are not reported by `execute`, so count first.
        let deleted: i64 = tx.query_row(
            &format!("{SUBTREE_CTE} SELECT COUNT(*) FROM subtree;"),
            [id],
            |row| row.get(0),
        )?;
        tx.execute(
            &format!("{SUBTREE_CTE} DELETE FROM tasks WHERE id IN (SELECT id FROM subtree);"),
            [id],
        )?;
        tx.commit()?;

        info!("event=task_delete module=repo status=ok task_id={id} deleted={deleted}");
        Ok(deleted as usize)
    }
}

fn load_task(conn: &Connection, id: &str) -> TaskRepoResult<Option<TaskRecord>> {
    let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE t.id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_task_row(row)?));
    }
    Ok(None)
}

/// Only supervisors and responsables may own tasks.
fn ensure_responsible_allowed(conn: &Connection, profile_id: Option<&str>) -> TaskRepoResult<()> {
    let Some(profile_id) = profile_id else {
        return Ok(());
    };
    let role: Option<String> = conn
        .query_row(
            "SELECT role FROM profiles WHERE id = ?1;",
            [profile_id],
            |row| row.get(0),
        )
        .optional()?;
    let allowed = role
        .as_deref()
        .and_then(|raw| Role::parse(raw).ok())
        .is_some_and(Role::can_own_tasks);
    if !allowed {
        return Err(TaskRepoError::ResponsibleNotAllowed(profile_id.to_string()));
    }
    Ok(())
}

fn project_exists(conn: &Connection, project_id: &str) -> TaskRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM projects WHERE id = ?1);",
        [project_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn next_task_order(
    conn: &Connection,
    project_id: &str,
    parent_id: Option<&str>,
) -> TaskRepoResult<i64> {
    let next = match parent_id {
        Some(parent_id) => conn.query_row(
            "SELECT COALESCE(MAX(task_order), -1) + 1
             FROM tasks
             WHERE project_id = ?1
               AND parent_task_id = ?2;",
            params![project_id, parent_id],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT COALESCE(MAX(task_order), -1) + 1
             FROM tasks
             WHERE project_id = ?1
               AND parent_task_id IS NULL;",
            [project_id],
            |row| row.get(0),
        )?,
    };
    Ok(next)
}

fn parse_task_row(row: &Row<'_>) -> TaskRepoResult<TaskRecord> {
    let status_text: String = row.get("status")?;
    let status = TaskStatus::parse(&status_text).ok_or_else(|| {
        TaskRepoError::InvalidData(format!("invalid task status `{status_text}` in tasks.status"))
    })?;

    let completed_at = row
        .get::<_, Option<String>>("completed_at")?
        .map(|value| parse_timestamp(&value, "tasks.completed_at"))
        .transpose()?;

    Ok(TaskRecord {
        id: row.get("id")?,
        name: row.get("name")?,
        start_date: parse_date(&row.get::<_, String>("start_date")?, "tasks.start_date")?,
        end_date: parse_date(&row.get::<_, String>("end_date")?, "tasks.end_date")?,
        parent_id: row.get("parent_task_id")?,
        is_milestone: parse_flag(row.get("is_milestone")?, "tasks.is_milestone")?,
        completed_at,
        notes: row.get("notes")?,
        order: row.get("task_order")?,
        status,
        is_blocked: parse_flag(row.get("is_blocked")?, "tasks.is_blocked")?,
        responsible: row.get("responsible")?,
    })
}

pub(crate) fn parse_date(value: &str, column: &'static str) -> TaskRepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| TaskRepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}

fn parse_timestamp(value: &str, column: &'static str) -> TaskRepoResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| TaskRepoError::InvalidData(format!("invalid timestamp `{value}` in {column}")))
}

pub(crate) fn parse_flag(value: i64, column: &'static str) -> TaskRepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(TaskRepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
