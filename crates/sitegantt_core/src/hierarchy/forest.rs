//! Forest construction, flattening and depth lookup.
//!
//! # Invariants
//! - `build` is order-independent for parent resolution: a child may appear
//!   before its parent in the input.
//! - Duplicate ids: the last record with a given id wins; earlier duplicates
//!   are not part of the forest.
//! - Records whose parent chain loops back on itself would be unreachable from
//!   any root. The builder promotes the earliest cycle member (by input
//!   position) to a root so the whole snapshot stays visible.

use crate::hierarchy::expansion::ExpansionState;
use crate::model::task::{TaskId, TaskRecord};
use log::warn;
use std::collections::{HashMap, HashSet};

/// Task record with its resolved children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskNode {
    pub record: TaskRecord,
    /// Children in input order.
    pub children: Vec<TaskNode>,
}

impl TaskNode {
    pub fn id(&self) -> &str {
        self.record.id.as_str()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Ordered collection of root nodes plus the resolved parent map.
///
/// Built fresh from one snapshot; holds no state across rebuilds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForest {
    roots: Vec<TaskNode>,
    /// Resolved parent per task id. `None` for roots, including dangling and
    /// cycle-promoted records.
    parents: HashMap<TaskId, Option<TaskId>>,
}

impl TaskForest {
    /// Root nodes in input order.
    pub fn roots(&self) -> &[TaskNode] {
        &self.roots
    }

    /// Number of tasks in the forest.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.parents.contains_key(id)
    }

    /// Resolved parent id, or `None` for roots and unknown ids.
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.parents.get(id).and_then(|parent| parent.as_deref())
    }

    /// Ids of every task in the forest, for "expand all" defaults.
    pub fn all_ids(&self) -> impl Iterator<Item = &str> {
        self.parents.keys().map(String::as_str)
    }

    /// Depth-first pre-order rows, descending only into expanded nodes.
    pub fn flatten(&self, expanded: &ExpansionState) -> Vec<&TaskNode> {
        flatten(&self.roots, expanded)
    }

    /// Number of resolved ancestors of `id`. Roots and unknown ids are 0.
    ///
    /// Walks the full parent map, not only visible rows. The walk is capped at
    /// the forest size.
    pub fn depth(&self, id: &str) -> usize {
        let mut level = 0;
        let mut cursor = self.parent_of(id);
        while let Some(parent) = cursor {
            if level >= self.parents.len() {
                break;
            }
            level += 1;
            cursor = self.parent_of(parent);
        }
        level
    }
}

/// Builds a forest from a flat record snapshot.
///
/// Root order and each node's child order follow the input order.
pub fn build(records: impl IntoIterator<Item = TaskRecord>) -> TaskForest {
    let records: Vec<TaskRecord> = records.into_iter().collect();

    // Pass 1: id -> index, last record wins.
    let mut index_by_id: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        index_by_id.insert(record.id.as_str(), index);
    }
    let winners: Vec<bool> = records
        .iter()
        .enumerate()
        .map(|(index, record)| index_by_id.get(record.id.as_str()) == Some(&index))
        .collect();

    let mut parent_index: Vec<Option<usize>> = records
        .iter()
        .map(|record| {
            record
                .parent_id
                .as_deref()
                .and_then(|parent_id| index_by_id.get(parent_id).copied())
        })
        .collect();
    promote_cycle_members(&mut parent_index, &winners, &records);

    // Pass 2: attach in input order.
    let mut root_indices = Vec::new();
    let mut child_indices: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    for index in 0..records.len() {
        if !winners[index] {
            continue;
        }
        match parent_index[index] {
            Some(parent) => child_indices[parent].push(index),
            None => root_indices.push(index),
        }
    }

    let parents: HashMap<TaskId, Option<TaskId>> = (0..records.len())
        .filter(|index| winners[*index])
        .map(|index| {
            (
                records[index].id.clone(),
                parent_index[index].map(|parent| records[parent].id.clone()),
            )
        })
        .collect();

    // Children are assembled before their parents by walking pre-order
    // backwards.
    let mut preorder = Vec::with_capacity(records.len());
    let mut stack: Vec<usize> = root_indices.iter().rev().copied().collect();
    while let Some(index) = stack.pop() {
        preorder.push(index);
        stack.extend(child_indices[index].iter().rev().copied());
    }

    let mut slots: Vec<Option<TaskRecord>> = records.into_iter().map(Some).collect();
    let mut built: Vec<Option<TaskNode>> = vec![None; slots.len()];
    for &index in preorder.iter().rev() {
        let children = child_indices[index]
            .iter()
            .filter_map(|child| built[*child].take())
            .collect();
        if let Some(record) = slots[index].take() {
            built[index] = Some(TaskNode { record, children });
        }
    }

    let roots = root_indices
        .iter()
        .filter_map(|index| built[*index].take())
        .collect();

    TaskForest { roots, parents }
}

/// Depth-first pre-order traversal over `roots`.
///
/// A node's children follow it only when its id is expanded; collapsed
/// subtrees are excluded from the result.
pub fn flatten<'a>(roots: &'a [TaskNode], expanded: &ExpansionState) -> Vec<&'a TaskNode> {
    let mut rows = Vec::new();
    let mut stack: Vec<&TaskNode> = roots.iter().rev().collect();
    while let Some(node) = stack.pop() {
        rows.push(node);
        if expanded.is_expanded(node.id()) {
            stack.extend(node.children.iter().rev());
        }
    }
    rows
}

fn promote_cycle_members(
    parent_index: &mut [Option<usize>],
    winners: &[bool],
    records: &[TaskRecord],
) {
    let limit = parent_index.len();
    let mut reaches_root = vec![false; limit];

    for start in 0..limit {
        if !winners[start] || reaches_root[start] {
            continue;
        }

        let mut path = Vec::new();
        let mut on_path = HashSet::new();
        let mut cursor = Some(start);
        let mut cycle_entry = None;
        while let Some(current) = cursor {
            if reaches_root[current] {
                break;
            }
            if !on_path.insert(current) {
                cycle_entry = Some(current);
                break;
            }
            path.push(current);
            cursor = parent_index[current];
        }

        if let Some(entry) = cycle_entry {
            let cycle_start = path
                .iter()
                .position(|index| *index == entry)
                .unwrap_or(0);
            let promoted = path[cycle_start..]
                .iter()
                .copied()
                .min()
                .unwrap_or(entry);
            warn!(
                "event=hierarchy_cycle module=hierarchy status=promoted task_id={} cycle_len={}",
                records[promoted].id,
                path.len() - cycle_start
            );
            parent_index[promoted] = None;
        }

        for index in path {
            reaches_root[index] = true;
        }
    }
}
