//! Gantt chart use-case service.
//!
//! # Responsibility
//! - Load one project's task snapshot through the injected repository.
//! - Compose hierarchy build, expansion-filtered flatten and timeline
//!   projection into render rows.
//! - Validate task write requests above the repository layer.
//!
//! # Invariants
//! - A board is rebuilt from a fresh snapshot after every write; rows never
//!   reflect partially applied edits.
//! - A freshly loaded board has every task expanded.
//! - Completed tasks cannot be completed again.

use crate::hierarchy::{build, ExpansionState, TaskForest};
use crate::model::task::{NewTask, TaskId, TaskRecord, TaskUpdate, TaskValidationError};
use crate::repo::task_repo::{TaskRepoError, TaskRepository};
use crate::service::kanban::KanbanBoard;
use crate::timeline::{
    headers, is_completed, is_overdue, project, unit_count, BarGeometry, Granularity,
    TimelinePosition,
};
use chrono::{DateTime, NaiveDate, Utc};
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Number of bar colors cycled by row index.
pub const PALETTE_SIZE: usize = 10;
const NOTES_PREVIEW_CHARS: usize = 80;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Errors from Gantt service operations.
#[derive(Debug)]
pub enum GanttServiceError {
    /// Write request failed validation.
    Validation(TaskValidationError),
    /// Target task does not exist.
    TaskNotFound(TaskId),
    /// Target project does not exist.
    ProjectNotFound(String),
    /// Parent task does not exist in the project.
    ParentNotFound(TaskId),
    /// Task already carries a completion timestamp.
    AlreadyCompleted(TaskId),
    /// Responsible profile is missing or not allowed to own tasks.
    ResponsibleNotAllowed(String),
    /// Repository-level failure.
    Repo(TaskRepoError),
}

impl Display for GanttServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent task not found: {id}"),
            Self::AlreadyCompleted(id) => write!(f, "task already completed: {id}"),
            Self::ResponsibleNotAllowed(id) => {
                write!(f, "profile cannot be task responsible: {id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GanttServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskRepoError> for GanttServiceError {
    fn from(value: TaskRepoError) -> Self {
        match value {
            TaskRepoError::Validation(err) => Self::Validation(err),
            TaskRepoError::NotFound(id) => Self::TaskNotFound(id),
            TaskRepoError::ProjectNotFound(id) => Self::ProjectNotFound(id),
            TaskRepoError::ParentNotFound(id) => Self::ParentNotFound(id),
            TaskRepoError::ResponsibleNotAllowed(id) => Self::ResponsibleNotAllowed(id),
            other => Self::Repo(other),
        }
    }
}

impl From<TaskValidationError> for GanttServiceError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

/// One visible Gantt row: list indentation plus positioned bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GanttRow<'a> {
    pub task: &'a TaskRecord,
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
    pub position: TimelinePosition,
    pub geometry: BarGeometry,
    pub overdue: bool,
    pub completed: bool,
    /// Bar color slot, `row index % PALETTE_SIZE`.
    pub palette_index: usize,
    /// Single-line, truncated notes for tooltips.
    pub notes_preview: Option<String>,
}

/// Full chart: column headers plus visible rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GanttView<'a> {
    pub granularity: Granularity,
    pub headers: Vec<String>,
    pub rows: Vec<GanttRow<'a>>,
    pub overdue_count: usize,
}

/// Loaded task snapshot with its forest and expansion state.
#[derive(Debug, Clone, Default)]
pub struct GanttBoard {
    forest: TaskForest,
    expansion: ExpansionState,
}

impl GanttBoard {
    /// Builds a board from a snapshot with every task expanded.
    pub fn from_records(records: impl IntoIterator<Item = TaskRecord>) -> Self {
        let forest = build(records);
        let expansion = ExpansionState::all(forest.all_ids());
        Self { forest, expansion }
    }

    pub fn forest(&self) -> &TaskForest {
        &self.forest
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    /// Flips one task's expansion and returns whether it is now expanded.
    pub fn toggle(&mut self, id: &str) -> bool {
        self.expansion.toggle(id)
    }

    /// Collapses one task; a no-op when it is already collapsed.
    pub fn collapse(&mut self, id: &str) {
        self.expansion.collapse(id);
    }

    pub fn collapse_all(&mut self) {
        self.expansion = ExpansionState::default();
    }

    pub fn expand_all(&mut self) {
        self.expansion = ExpansionState::all(self.forest.all_ids());
    }

    /// Visible rows projected onto the timeline.
    pub fn rows(&self, granularity: Granularity, today: NaiveDate) -> Vec<GanttRow<'_>> {
        let units = unit_count(granularity, today);
        self.forest
            .flatten(&self.expansion)
            .into_iter()
            .enumerate()
            .map(|(index, node)| {
                let task = &node.record;
                let position = project(task.start_date, task.end_date, granularity, today);
                GanttRow {
                    task,
                    depth: self.forest.depth(node.id()),
                    has_children: node.has_children(),
                    expanded: self.expansion.is_expanded(node.id()),
                    position,
                    geometry: BarGeometry::from_position(position, units),
                    overdue: is_overdue(task, today),
                    completed: is_completed(task),
                    palette_index: index % PALETTE_SIZE,
                    notes_preview: task.notes.as_deref().and_then(notes_preview),
                }
            })
            .collect()
    }

    /// Overdue tasks among visible rows.
    pub fn overdue_count(&self, today: NaiveDate) -> usize {
        self.forest
            .flatten(&self.expansion)
            .into_iter()
            .filter(|node| is_overdue(&node.record, today))
            .count()
    }

    pub fn view(&self, granularity: Granularity, today: NaiveDate) -> GanttView<'_> {
        let rows = self.rows(granularity, today);
        let overdue_count = rows.iter().filter(|row| row.overdue).count();
        GanttView {
            granularity,
            headers: headers(granularity, today),
            rows,
            overdue_count,
        }
    }
}

/// Gantt service facade over one task repository.
pub struct GanttService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> GanttService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Loads a fresh board for one project.
    pub fn load(&self, project_id: &str) -> Result<GanttBoard, GanttServiceError> {
        let started_at = Instant::now();
        match self.repo.list_project_tasks(project_id) {
            Ok(records) => {
                let board = GanttBoard::from_records(records);
                info!(
                    "event=gantt_load module=service status=ok tasks={} roots={} duration_ms={}",
                    board.forest().len(),
                    board.forest().roots().len(),
                    started_at.elapsed().as_millis()
                );
                Ok(board)
            }
            Err(err) => {
                error!(
                    "event=gantt_load module=service status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Loads the same snapshot grouped into status columns.
    pub fn load_kanban(&self, project_id: &str) -> Result<KanbanBoard, GanttServiceError> {
        let records = self.repo.list_project_tasks(project_id)?;
        info!(
            "event=kanban_load module=service status=ok tasks={}",
            records.len()
        );
        Ok(KanbanBoard::from_records(records))
    }

    /// Creates one task, appended after its siblings.
    pub fn add_task(&self, request: &NewTask) -> Result<TaskRecord, GanttServiceError> {
        request.validate()?;
        self.repo.create_task(request).map_err(Into::into)
    }

    /// Replaces the editable fields of one task.
    pub fn edit_task(&self, id: &str, update: &TaskUpdate) -> Result<(), GanttServiceError> {
        update.validate()?;
        self.repo.update_task(id, update).map_err(Into::into)
    }

    /// Marks one task completed at `now`.
    pub fn complete_task(&self, id: &str, now: DateTime<Utc>) -> Result<(), GanttServiceError> {
        let task = self
            .repo
            .get_task(id)?
            .ok_or_else(|| GanttServiceError::TaskNotFound(id.to_string()))?;
        if is_completed(&task) {
            return Err(GanttServiceError::AlreadyCompleted(task.id));
        }
        self.repo.complete_task(id, now)?;
        info!("event=task_complete module=service status=ok task_id={id}");
        Ok(())
    }

    /// Deletes one task with its subtree. Returns deleted task count.
    pub fn delete_task(&self, id: &str) -> Result<usize, GanttServiceError> {
        self.repo.delete_task(id).map_err(Into::into)
    }
}

/// Collapses whitespace and truncates notes to a single tooltip line.
pub fn notes_preview(notes: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(notes.trim(), " ");
    if collapsed.is_empty() {
        return None;
    }
    let mut preview: String = collapsed.chars().take(NOTES_PREVIEW_CHARS).collect();
    if collapsed.chars().count() > NOTES_PREVIEW_CHARS {
        preview.push_str("...");
    }
    Some(preview)
}
