//! Report row queries.
//!
//! # Invariants
//! - Queries are read-only.
//! - Rows come back in deterministic order so report output is stable.

use crate::db::{ensure_connection_ready, RequiredTable};
use crate::model::task::{ProjectId, TaskId, TaskStatus};
use crate::repo::task_repo::{parse_date, parse_flag, TaskRepoError, TaskRepoResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use std::collections::HashMap;

const REPORT_TABLES: &[RequiredTable] = &[
    RequiredTable {
        name: "projects",
        columns: &["id", "name", "status"],
    },
    RequiredTable {
        name: "subtasks",
        columns: &["task_id", "title", "status", "is_blocking"],
    },
    RequiredTable {
        name: "timesheets",
        columns: &["user_id", "subtask_id", "date", "hours"],
    },
    RequiredTable {
        name: "purchase_orders",
        columns: &[
            "id",
            "order_number",
            "supplier_name",
            "expected_delivery_date",
            "status",
        ],
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRow {
    pub id: ProjectId,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatusRow {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub status: TaskStatus,
    pub is_blocked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtaskRow {
    pub title: String,
    pub status: String,
    pub is_blocking: bool,
}

/// Blocked task with its project, owner and subtasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedTaskRow {
    pub task_id: TaskId,
    pub task_name: String,
    pub project: Option<String>,
    pub responsible: Option<String>,
    pub subtasks: Vec<SubtaskRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseOrderRow {
    pub id: String,
    pub order_number: String,
    pub supplier_name: String,
    pub expected_delivery_date: Option<NaiveDate>,
    pub status: String,
}

/// One timesheet line joined with user and task context.
#[derive(Debug, Clone, PartialEq)]
pub struct TimesheetRow {
    pub date: NaiveDate,
    pub hours: f64,
    pub user_name: Option<String>,
    pub user_role: Option<String>,
    pub task: Option<String>,
    pub project: Option<String>,
}

/// Data-access capability for report rows.
pub trait ReportRepository {
    fn list_projects(&self) -> TaskRepoResult<Vec<ProjectRow>>;
    fn list_task_statuses(&self) -> TaskRepoResult<Vec<TaskStatusRow>>;
    fn list_blocked_tasks(&self) -> TaskRepoResult<Vec<BlockedTaskRow>>;
    fn list_purchase_orders(&self) -> TaskRepoResult<Vec<PurchaseOrderRow>>;
    /// Timesheet lines with `start <= date <= end`.
    fn list_timesheets(&self, start: NaiveDate, end: NaiveDate)
        -> TaskRepoResult<Vec<TimesheetRow>>;
}

/// SQLite-backed report repository.
pub struct SqliteReportRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReportRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> TaskRepoResult<Self> {
        ensure_connection_ready(conn, REPORT_TABLES)?;
        Ok(Self { conn })
    }
}

impl ReportRepository for SqliteReportRepository<'_> {
    fn list_projects(&self) -> TaskRepoResult<Vec<ProjectRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, status
             FROM projects
             ORDER BY created_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(ProjectRow {
                id: row.get("id")?,
                name: row.get("name")?,
                status: row.get("status")?,
            });
        }
        Ok(projects)
    }

    fn list_task_statuses(&self) -> TaskRepoResult<Vec<TaskStatusRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, status, is_blocked
             FROM tasks
             ORDER BY rowid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_status_row(row)?);
        }
        Ok(tasks)
    }

    fn list_blocked_tasks(&self) -> TaskRepoResult<Vec<BlockedTaskRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                t.id AS id,
                t.name AS name,
                pr.name AS project,
                pf.full_name AS responsible
             FROM tasks t
             LEFT JOIN projects pr ON pr.id = t.project_id
             LEFT JOIN profiles pf ON pf.id = t.responsable_id
             WHERE t.is_blocked = 1
             ORDER BY t.rowid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        let mut index_by_id = HashMap::new();
        while let Some(row) = rows.next()? {
            let task_id: String = row.get("id")?;
            index_by_id.insert(task_id.clone(), tasks.len());
            tasks.push(BlockedTaskRow {
                task_id,
                task_name: row.get("name")?,
                project: row.get("project")?,
                responsible: row.get("responsible")?,
                subtasks: Vec::new(),
            });
        }

        let mut stmt = self.conn.prepare(
            "SELECT s.task_id, s.title, s.status, s.is_blocking
             FROM subtasks s
             INNER JOIN tasks t ON t.id = s.task_id
             WHERE t.is_blocked = 1
             ORDER BY s.rowid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let task_id: String = row.get(0)?;
            if let Some(index) = index_by_id.get(&task_id) {
                tasks[*index].subtasks.push(SubtaskRow {
                    title: row.get(1)?,
                    status: row.get(2)?,
                    is_blocking: parse_flag(row.get(3)?, "subtasks.is_blocking")?,
                });
            }
        }
        Ok(tasks)
    }

    fn list_purchase_orders(&self) -> TaskRepoResult<Vec<PurchaseOrderRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, order_number, supplier_name, expected_delivery_date, status
             FROM purchase_orders
             ORDER BY expected_delivery_date ASC, order_number ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut orders = Vec::new();
        while let Some(row) = rows.next()? {
            let expected_delivery_date = row
                .get::<_, Option<String>>("expected_delivery_date")?
                .map(|value| parse_date(&value, "purchase_orders.expected_delivery_date"))
                .transpose()?;
            orders.push(PurchaseOrderRow {
                id: row.get("id")?,
                order_number: row.get("order_number")?,
                supplier_name: row.get("supplier_name")?,
                expected_delivery_date,
                status: row.get("status")?,
            });
        }
        Ok(orders)
    }

    fn list_timesheets(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> TaskRepoResult<Vec<TimesheetRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                ts.date AS date,
                ts.hours AS hours,
                pf.full_name AS user_name,
                pf.role AS user_role,
                s.title AS task,
                pr.name AS project
             FROM timesheets ts
             LEFT JOIN profiles pf ON pf.id = ts.user_id
             LEFT JOIN subtasks s ON s.id = ts.subtask_id
             LEFT JOIN tasks t ON t.id = s.task_id
             LEFT JOIN projects pr ON pr.id = t.project_id
             WHERE ts.date >= ?1
               AND ts.date <= ?2
             ORDER BY ts.date ASC, ts.rowid ASC;",
        )?;
        let mut rows = stmt.query(params![start.to_string(), end.to_string()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(TimesheetRow {
                date: parse_date(&row.get::<_, String>("date")?, "timesheets.date")?,
                hours: row.get("hours")?,
                user_name: row.get("user_name")?,
                user_role: row.get("user_role")?,
                task: row.get("task")?,
                project: row.get("project")?,
            });
        }
        Ok(entries)
    }
}

fn parse_task_status_row(row: &Row<'_>) -> TaskRepoResult<TaskStatusRow> {
    let status_text: String = row.get("status")?;
    let status = TaskStatus::parse(&status_text).ok_or_else(|| {
        TaskRepoError::InvalidData(format!("invalid task status `{status_text}` in tasks.status"))
    })?;
    Ok(TaskStatusRow {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        status,
        is_blocked: parse_flag(row.get("is_blocked")?, "tasks.is_blocked")?,
    })
}
