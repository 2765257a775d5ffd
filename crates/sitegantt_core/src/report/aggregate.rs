//! Pure report aggregation.
//!
//! Output field names match the JSON consumed by the automation side
//! (`reports`, `kpis`, `blocking_factors`, `delayed_orders`, `period`, `data`).

use crate::model::task::{ProjectId, TaskStatus};
use crate::report::repo::{
    BlockedTaskRow, ProjectRow, PurchaseOrderRow, TaskStatusRow, TimesheetRow,
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

const RECEIVED_STATUS: &str = "received";
const DONE_STATUS: &str = "done";
const UNKNOWN_USER: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectKpis {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub blocked_tasks: usize,
    pub progress_percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectStatusEntry {
    pub project_id: ProjectId,
    pub name: String,
    pub status: String,
    pub kpis: ProjectKpis,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectStatusReport {
    pub timestamp: DateTime<Utc>,
    pub reports: Vec<ProjectStatusEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedTaskEntry {
    pub task_name: String,
    pub project: Option<String>,
    pub responsable: Option<String>,
    pub blocking_factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedTasksReport {
    pub count: usize,
    pub tasks: Vec<BlockedTaskEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseRiskReport {
    pub delayed_orders: Vec<PurchaseOrderRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimesheetEntry {
    pub date: NaiveDate,
    pub hours: f64,
    pub task: Option<String>,
    pub project: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserWeek {
    pub role: Option<String>,
    pub total_hours: f64,
    pub entries: Vec<TimesheetEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimesheetWeekReport {
    pub period: ReportPeriod,
    /// Keyed by user display name.
    pub data: BTreeMap<String, UserWeek>,
}

/// Per-project task counts and rounded completion percentage.
pub fn project_status(
    projects: &[ProjectRow],
    tasks: &[TaskStatusRow],
    timestamp: DateTime<Utc>,
) -> ProjectStatusReport {
    let reports = projects
        .iter()
        .map(|project| {
            let project_tasks: Vec<&TaskStatusRow> = tasks
                .iter()
                .filter(|task| task.project_id == project.id)
                .collect();
            let total_tasks = project_tasks.len();
            let completed_tasks = project_tasks
                .iter()
                .filter(|task| task.status == TaskStatus::Done)
                .count();
            let blocked_tasks = project_tasks.iter().filter(|task| task.is_blocked).count();

            ProjectStatusEntry {
                project_id: project.id.clone(),
                name: project.name.clone(),
                status: project.status.clone(),
                kpis: ProjectKpis {
                    total_tasks,
                    completed_tasks,
                    blocked_tasks,
                    progress_percentage: progress_percentage(completed_tasks, total_tasks),
                },
            }
        })
        .collect();

    ProjectStatusReport { timestamp, reports }
}

/// Blocked tasks with the titles of their open blocking subtasks.
pub fn blocked_tasks(rows: &[BlockedTaskRow]) -> BlockedTasksReport {
    let tasks: Vec<BlockedTaskEntry> = rows
        .iter()
        .map(|row| BlockedTaskEntry {
            task_name: row.task_name.clone(),
            project: row.project.clone(),
            responsable: row.responsible.clone(),
            blocking_factors: row
                .subtasks
                .iter()
                .filter(|subtask| subtask.is_blocking && subtask.status != DONE_STATUS)
                .map(|subtask| subtask.title.clone())
                .collect(),
        })
        .collect();

    BlockedTasksReport {
        count: tasks.len(),
        tasks,
    }
}

/// Orders past their expected delivery date and not yet received.
///
/// Orders without an expected date are never delayed.
pub fn purchase_risk(orders: &[PurchaseOrderRow], today: NaiveDate) -> PurchaseRiskReport {
    PurchaseRiskReport {
        delayed_orders: orders
            .iter()
            .filter(|order| {
                order.status != RECEIVED_STATUS
                    && order
                        .expected_delivery_date
                        .is_some_and(|expected| expected < today)
            })
            .cloned()
            .collect(),
    }
}

/// Sunday..Saturday week containing `today`.
pub fn week_bounds(today: NaiveDate) -> ReportPeriod {
    let start = today - Duration::days(i64::from(today.weekday().num_days_from_sunday()));
    ReportPeriod {
        start,
        end: start + Duration::days(6),
    }
}

/// Groups the week's timesheet lines by user.
///
/// Rows outside `period` are ignored; users without a name are grouped under
/// `Unknown`. The first row seen for a user decides its role.
pub fn timesheet_week(rows: &[TimesheetRow], period: ReportPeriod) -> TimesheetWeekReport {
    let mut data: BTreeMap<String, UserWeek> = BTreeMap::new();
    for row in rows
        .iter()
        .filter(|row| row.date >= period.start && row.date <= period.end)
    {
        let user = row
            .user_name
            .clone()
            .unwrap_or_else(|| UNKNOWN_USER.to_string());
        let week = data.entry(user).or_insert_with(|| UserWeek {
            role: row.user_role.clone(),
            total_hours: 0.0,
            entries: Vec::new(),
        });
        week.total_hours += row.hours;
        week.entries.push(TimesheetEntry {
            date: row.date,
            hours: row.hours,
            task: row.task.clone(),
            project: row.project.clone(),
        });
    }

    TimesheetWeekReport { period, data }
}

fn progress_percentage(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::{progress_percentage, week_bounds};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn progress_rounds_half_up_and_handles_empty() {
        assert_eq!(progress_percentage(0, 0), 0);
        assert_eq!(progress_percentage(1, 3), 33);
        assert_eq!(progress_percentage(2, 3), 67);
        assert_eq!(progress_percentage(1, 8), 13);
        assert_eq!(progress_percentage(4, 4), 100);
    }

    #[test]
    fn week_runs_sunday_to_saturday() {
        // 2024-06-05 is a Wednesday.
        let period = week_bounds(date(2024, 6, 5));
        assert_eq!(period.start, date(2024, 6, 2));
        assert_eq!(period.end, date(2024, 6, 8));

        let sunday = week_bounds(date(2024, 6, 2));
        assert_eq!(sunday.start, date(2024, 6, 2));

        let saturday = week_bounds(date(2024, 6, 8));
        assert_eq!(saturday.start, date(2024, 6, 2));
    }
}
