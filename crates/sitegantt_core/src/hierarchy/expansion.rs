//! Set of task ids whose children are visible.

use crate::model::task::TaskId;
use std::collections::HashSet;

/// Expansion state owned by the presentation layer.
///
/// The hierarchy only reads it as a predicate while flattening.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: HashSet<TaskId>,
}

impl ExpansionState {
    /// Expands every id in `ids`.
    pub fn all<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            expanded: ids.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn expand(&mut self, id: impl Into<TaskId>) {
        self.expanded.insert(id.into());
    }

    pub fn collapse(&mut self, id: &str) {
        self.expanded.remove(id);
    }

    /// Flips one id and returns whether it is now expanded.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_string());
            true
        }
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}
