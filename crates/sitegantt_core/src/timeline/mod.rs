//! Timeline projection for Gantt bars.
//!
//! # Responsibility
//! - Map task date ranges onto month-of-year or day-of-month columns.
//! - Derive overdue/completed flags from an injected reference date.
//!
//! # Invariants
//! - Projection is a pure function of its inputs; nothing reads the clock.
//! - `span >= 1` for every projected range, including reversed ranges.

pub mod projection;

pub use projection::{
    headers, is_completed, is_overdue, project, unit_count, BarGeometry, Granularity,
    TimelinePosition,
};
