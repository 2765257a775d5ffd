//! Task domain model.
//!
//! # Responsibility
//! - Define the flat task record shared by hierarchy, timeline and storage.
//! - Provide write-side request types with input validation.
//!
//! # Invariants
//! - `id` is opaque and never reused for another task.
//! - `completed_at` is the source of truth for completion state.
//! - `parent_id` may dangle; consumers must treat dangling parents as roots.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque task identifier.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type TaskId = String;

/// Opaque project identifier.
pub type ProjectId = String;

/// Workflow state used by the kanban board and status reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created but not started.
    Pending,
    /// Work is in progress.
    InProgress,
    /// Waiting on a blocking factor.
    Blocked,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// Every status in workflow order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::InProgress, Self::Blocked, Self::Done];

    /// Stable storage/wire string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Done => "done",
        }
    }

    /// Parses a storage/wire string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "blocked" => Some(Self::Blocked),
            "done" => Some(Self::Done),
            _ => None,
        }
    }

    /// Column title shown on the kanban board.
    pub fn title(self) -> &'static str {
        match self {
            Self::Pending => "Pendiente",
            Self::InProgress => "En Curso",
            Self::Blocked => "Bloqueado",
            Self::Done => "Completado",
        }
    }
}

/// Flat persisted representation of one schedulable work item.
///
/// Records arrive from the data-access layer already sorted by `order`; the
/// hierarchy builder relies on that input order for sibling order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub name: String,
    pub start_date: NaiveDate,
    /// Inclusive last day of the task.
    pub end_date: NaiveDate,
    /// `None` marks a root task.
    pub parent_id: Option<TaskId>,
    pub is_milestone: bool,
    /// Presence marks the task completed.
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    /// Sibling sort key. Ties are broken by original position.
    pub order: i64,
    pub status: TaskStatus,
    pub is_blocked: bool,
    /// Display name of the assigned person, if any.
    pub responsible: Option<String>,
}

impl TaskRecord {
    /// Creates a pending root task with the given date range.
    ///
    /// Optional fields start empty; callers adjust them directly.
    pub fn new(
        id: impl Into<TaskId>,
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start_date,
            end_date,
            parent_id: None,
            is_milestone: false,
            completed_at: None,
            notes: None,
            order: 0,
            status: TaskStatus::Pending,
            is_blocked: false,
            responsible: None,
        }
    }

    /// Builder-style helper to attach a parent reference.
    pub fn with_parent(mut self, parent_id: impl Into<TaskId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

/// Validation errors for task write requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Name is blank after trim.
    BlankName,
    /// `end_date` is earlier than `start_date`.
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "task name must not be blank"),
            Self::EndBeforeStart { start, end } => {
                write!(f, "task end date {end} is before start date {start}")
            }
        }
    }
}

impl Error for TaskValidationError {}

/// Request model for creating one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub project_id: ProjectId,
    pub parent_id: Option<TaskId>,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_milestone: bool,
    pub notes: Option<String>,
    pub responsible_id: Option<String>,
}

impl NewTask {
    /// Validates name and date range.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_fields(&self.name, self.start_date, self.end_date)
    }
}

/// Full-replacement edit of the user-editable task fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_milestone: bool,
    pub notes: Option<String>,
    pub responsible_id: Option<String>,
}

impl TaskUpdate {
    /// Validates name and date range.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_fields(&self.name, self.start_date, self.end_date)
    }
}

fn validate_fields(
    name: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<(), TaskValidationError> {
    if name.trim().is_empty() {
        return Err(TaskValidationError::BlankName);
    }
    if end_date < start_date {
        return Err(TaskValidationError::EndBeforeStart {
            start: start_date,
            end: end_date,
        });
    }
    Ok(())
}

/// Normalizes optional free text: trims and maps blank to `None`.
pub fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
