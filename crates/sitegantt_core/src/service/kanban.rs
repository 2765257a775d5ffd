//! Kanban grouping of a project's task snapshot.
//!
//! # Invariants
//! - One column per `TaskStatus`, in workflow order, even when empty.
//! - Cards inside a column are ordered by `start_date`; ties keep snapshot
//!   order.
//! - Grouping uses `status` only; `completed_at` does not move a card.

use crate::model::task::{TaskRecord, TaskStatus};
use serde::Serialize;

/// One status column with its cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KanbanColumn<'a> {
    pub status: TaskStatus,
    pub title: &'static str,
    pub count: usize,
    pub tasks: Vec<&'a TaskRecord>,
}

/// Task snapshot shown as status columns.
#[derive(Debug, Clone, Default)]
pub struct KanbanBoard {
    tasks: Vec<TaskRecord>,
}

impl KanbanBoard {
    pub fn from_records(records: impl IntoIterator<Item = TaskRecord>) -> Self {
        Self {
            tasks: records.into_iter().collect(),
        }
    }

    pub fn columns(&self) -> Vec<KanbanColumn<'_>> {
        TaskStatus::ALL
            .into_iter()
            .map(|status| {
                let mut tasks: Vec<&TaskRecord> = self
                    .tasks
                    .iter()
                    .filter(|task| task.status == status)
                    .collect();
                tasks.sort_by_key(|task| task.start_date);
                KanbanColumn {
                    status,
                    title: status.title(),
                    count: tasks.len(),
                    tasks,
                }
            })
            .collect()
    }
}
