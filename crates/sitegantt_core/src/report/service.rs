//! Report use-case service.
//!
//! # Responsibility
//! - Check the API key before touching storage.
//! - Fetch rows through the injected repository and aggregate them.
//!
//! # Invariants
//! - Unauthorized requests never reach the repository.
//! - The reference time is passed in by the caller.

use crate::report::aggregate::{
    blocked_tasks, project_status, purchase_risk, timesheet_week, week_bounds,
    BlockedTasksReport, ProjectStatusReport, PurchaseRiskReport, TimesheetWeekReport,
};
use crate::report::guard::{ApiKeyGuard, API_KEY_HEADER};
use crate::report::repo::ReportRepository;
use crate::repo::task_repo::TaskRepoError;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Errors from report use-cases.
#[derive(Debug)]
pub enum ReportError {
    /// Missing or mismatched API key.
    Unauthorized,
    /// Report name is not one of the known reports.
    UnknownReport(String),
    /// Persistence-layer failure.
    Repo(TaskRepoError),
    /// Report could not be encoded as JSON.
    Encode(serde_json::Error),
}

impl Display for ReportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "unauthorized: missing or invalid `{API_KEY_HEADER}`"),
            Self::UnknownReport(name) => write!(
                f,
                "unknown report `{name}`; expected project-status|blocked-tasks|purchase-risk|timesheet-week"
            ),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode report: {err}"),
        }
    }
}

impl Error for ReportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Encode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskRepoError> for ReportError {
    fn from(value: TaskRepoError) -> Self {
        Self::Repo(value)
    }
}

/// Known report endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    ProjectStatus,
    BlockedTasks,
    PurchaseRisk,
    TimesheetWeek,
}

impl ReportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProjectStatus => "project-status",
            Self::BlockedTasks => "blocked-tasks",
            Self::PurchaseRisk => "purchase-risk",
            Self::TimesheetWeek => "timesheet-week",
        }
    }
}

impl FromStr for ReportKind {
    type Err = ReportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "project-status" => Ok(Self::ProjectStatus),
            "blocked-tasks" => Ok(Self::BlockedTasks),
            "purchase-risk" => Ok(Self::PurchaseRisk),
            "timesheet-week" => Ok(Self::TimesheetWeek),
            other => Err(ReportError::UnknownReport(other.to_string())),
        }
    }
}

/// Report service facade over repository implementations.
pub struct ReportService<R: ReportRepository> {
    repo: R,
    guard: ApiKeyGuard,
}

impl<R: ReportRepository> ReportService<R> {
    pub fn new(repo: R, guard: ApiKeyGuard) -> Self {
        Self { repo, guard }
    }

    pub fn project_status(
        &self,
        api_key: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ProjectStatusReport, ReportError> {
        self.authorize(ReportKind::ProjectStatus, api_key)?;
        let projects = self.repo.list_projects()?;
        let tasks = self.repo.list_task_statuses()?;
        let report = project_status(&projects, &tasks, now);
        log_built(ReportKind::ProjectStatus, report.reports.len());
        Ok(report)
    }

    pub fn blocked_tasks(&self, api_key: Option<&str>) -> Result<BlockedTasksReport, ReportError> {
        self.authorize(ReportKind::BlockedTasks, api_key)?;
        let report = blocked_tasks(&self.repo.list_blocked_tasks()?);
        log_built(ReportKind::BlockedTasks, report.count);
        Ok(report)
    }

    pub fn purchase_risk(
        &self,
        api_key: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<PurchaseRiskReport, ReportError> {
        self.authorize(ReportKind::PurchaseRisk, api_key)?;
        let report = purchase_risk(&self.repo.list_purchase_orders()?, now.date_naive());
        log_built(ReportKind::PurchaseRisk, report.delayed_orders.len());
        Ok(report)
    }

    pub fn timesheet_week(
        &self,
        api_key: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<TimesheetWeekReport, ReportError> {
        self.authorize(ReportKind::TimesheetWeek, api_key)?;
        let period = week_bounds(now.date_naive());
        let rows = self.repo.list_timesheets(period.start, period.end)?;
        let report = timesheet_week(&rows, period);
        log_built(ReportKind::TimesheetWeek, report.data.len());
        Ok(report)
    }

    /// Builds any report as a JSON value.
    pub fn run(
        &self,
        kind: ReportKind,
        api_key: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<serde_json::Value, ReportError> {
        match kind {
            ReportKind::ProjectStatus => to_json(self.project_status(api_key, now)?),
            ReportKind::BlockedTasks => to_json(self.blocked_tasks(api_key)?),
            ReportKind::PurchaseRisk => to_json(self.purchase_risk(api_key, now)?),
            ReportKind::TimesheetWeek => to_json(self.timesheet_week(api_key, now)?),
        }
    }

    fn authorize(&self, kind: ReportKind, api_key: Option<&str>) -> Result<(), ReportError> {
        self.guard.check(api_key).inspect_err(|_| {
            warn!(
                "event=report_build module=report status=rejected report={} key_present={}",
                kind.as_str(),
                api_key.is_some()
            );
        })
    }
}

fn to_json(report: impl Serialize) -> Result<serde_json::Value, ReportError> {
    serde_json::to_value(report).map_err(ReportError::Encode)
}

fn log_built(kind: ReportKind, items: usize) {
    info!(
        "event=report_build module=report status=ok report={} items={items}",
        kind.as_str()
    );
}
