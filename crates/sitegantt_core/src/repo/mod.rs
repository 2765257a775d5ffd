//! Repository layer for task persistence.
//!
//! # Responsibility
//! - Define the task data-access contract injected into services.
//! - Isolate SQLite query details from Gantt orchestration.
//!
//! # Invariants
//! - Writes validate their request before touching storage.
//! - Missing targets surface as semantic errors (`NotFound`,
//!   `ProjectNotFound`, `ParentNotFound`) rather than silent no-ops.

pub mod task_repo;
