//! Task hierarchy reconstruction.
//!
//! # Responsibility
//! - Turn a flat, ordered task snapshot into a forest of parent/child nodes.
//! - Produce the expansion-filtered, depth-first row order used for rendering.
//!
//! # Invariants
//! - Sibling order equals input order; nothing is re-sorted.
//! - Dangling parent references are roots.
//! - Every walk is bounded by the snapshot size, so cyclic data terminates.

pub mod expansion;
pub mod forest;

pub use expansion::ExpansionState;
pub use forest::{build, flatten, TaskForest, TaskNode};
