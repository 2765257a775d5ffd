//! Domain model for construction-project scheduling.
//!
//! # Responsibility
//! - Define the flat task record consumed by hierarchy and timeline logic.
//! - Define staff roles with a total badge mapping.
//!
//! # Invariants
//! - Every task is identified by an opaque, stable `TaskId`.
//! - Completion is represented by `completed_at`, not by `status` alone.

pub mod role;
pub mod task;
