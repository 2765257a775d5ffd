//! Core domain logic for SiteGantt.
//!
//! Task hierarchy reconstruction, timeline projection and reporting for a
//! construction-project Gantt dashboard. Storage is SQLite; every engine step
//! above the repositories is a pure function of its inputs.

pub mod db;
pub mod hierarchy;
pub mod logging;
pub mod model;
pub mod repo;
pub mod report;
pub mod service;
pub mod timeline;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use hierarchy::{build, flatten, ExpansionState, TaskForest, TaskNode};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::role::{BadgeTone, Role, RoleBadge};
pub use model::task::{
    NewTask, ProjectId, TaskId, TaskRecord, TaskStatus, TaskUpdate, TaskValidationError,
};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepoError, TaskRepoResult, TaskRepository};
pub use report::{ApiKeyGuard, ReportError, ReportKind, ReportService, SqliteReportRepository};
pub use service::gantt_service::{
    GanttBoard, GanttRow, GanttService, GanttServiceError, GanttView,
};
pub use service::kanban::{KanbanBoard, KanbanColumn};
pub use timeline::{is_overdue, project, BarGeometry, Granularity, TimelinePosition};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
