//! Read-only reporting aggregations.
//!
//! # Responsibility
//! - Fetch report rows through `ReportRepository`.
//! - Aggregate them into project-status, blocked-tasks, purchase-risk and
//!   timesheet-week summaries.
//! - Gate every report behind the shared `x-api-key` secret.
//!
//! # Invariants
//! - Aggregation functions are pure; the reference time is injected.
//! - A guard without a configured key rejects every request.

pub mod aggregate;
pub mod guard;
pub mod repo;
pub mod service;

pub use aggregate::{
    blocked_tasks, project_status, purchase_risk, timesheet_week, week_bounds, BlockedTaskEntry,
    BlockedTasksReport, ProjectKpis, ProjectStatusEntry, ProjectStatusReport, PurchaseRiskReport,
    ReportPeriod, TimesheetEntry, TimesheetWeekReport, UserWeek,
};
pub use guard::ApiKeyGuard;
pub use repo::{
    BlockedTaskRow, ProjectRow, PurchaseOrderRow, ReportRepository, SqliteReportRepository,
    SubtaskRow, TaskStatusRow, TimesheetRow,
};
pub use service::{ReportError, ReportKind, ReportService};
