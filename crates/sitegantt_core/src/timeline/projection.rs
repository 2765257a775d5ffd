//! Column projection and status predicates.
//!
//! # Invariants
//! - `MonthOfYear` uses raw month numbers; years are not distinguished, so a
//!   Dec -> Jan range collapses to a span of 1.
//! - `DayOfMonth` uses raw day numbers against the reference month; a task in
//!   another month projects onto the same day columns.

use crate::model::task::TaskRecord;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const MONTH_LABELS: [&str; 12] = [
    "ENE", "FEB", "MAR", "ABR", "MAY", "JUN", "JUL", "AGO", "SEP", "OCT", "NOV", "DIC",
];

/// Timeline unit of division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// Twelve fixed columns, Jan..Dec.
    MonthOfYear,
    /// One column per day of the reference month.
    DayOfMonth,
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "month" | "month_of_year" => Ok(Self::MonthOfYear),
            "day" | "day_of_month" => Ok(Self::DayOfMonth),
            other => Err(format!(
                "unsupported granularity `{other}`; expected month|day"
            )),
        }
    }
}

/// Column offset and width of one bar, in timeline units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelinePosition {
    /// 0-based column index.
    pub start_offset: u32,
    /// Number of columns covered, at least 1.
    pub span: u32,
}

/// Bar placement as fractions of the full timeline width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BarGeometry {
    pub left: f64,
    pub width: f64,
}

impl BarGeometry {
    /// Converts a position into fractions of `units` columns.
    ///
    /// Returns zero geometry when `units` is 0.
    pub fn from_position(position: TimelinePosition, units: u32) -> Self {
        if units == 0 {
            return Self {
                left: 0.0,
                width: 0.0,
            };
        }
        let units = f64::from(units);
        Self {
            left: f64::from(position.start_offset) / units,
            width: f64::from(position.span) / units,
        }
    }
}

/// Projects an inclusive date range onto the timeline.
///
/// Day columns belong to the month of `_reference`; the task's own month and
/// year are not consulted, so the reference does not change the result.
pub fn project(
    start: NaiveDate,
    end: NaiveDate,
    granularity: Granularity,
    _reference: NaiveDate,
) -> TimelinePosition {
    let (start_unit, end_unit) = match granularity {
        Granularity::MonthOfYear => (i64::from(start.month0()), i64::from(end.month0())),
        Granularity::DayOfMonth => (i64::from(start.day0()), i64::from(end.day0())),
    };
    let span = (end_unit - start_unit + 1).max(1);

    TimelinePosition {
        start_offset: start_unit as u32,
        span: span as u32,
    }
}

/// Number of columns on the timeline.
pub fn unit_count(granularity: Granularity, reference: NaiveDate) -> u32 {
    match granularity {
        Granularity::MonthOfYear => 12,
        Granularity::DayOfMonth => days_in_month(reference),
    }
}

/// Column labels: Spanish month abbreviations or `1..=days_in_month`.
pub fn headers(granularity: Granularity, reference: NaiveDate) -> Vec<String> {
    match granularity {
        Granularity::MonthOfYear => MONTH_LABELS.iter().map(|label| label.to_string()).collect(),
        Granularity::DayOfMonth => (1..=days_in_month(reference))
            .map(|day| day.to_string())
            .collect(),
    }
}

/// Incomplete task whose last day is before `today`.
pub fn is_overdue(task: &TaskRecord, today: NaiveDate) -> bool {
    task.completed_at.is_none() && task.end_date < today
}

pub fn is_completed(task: &TaskRecord) -> bool {
    task.completed_at.is_some()
}

fn days_in_month(reference: NaiveDate) -> u32 {
    let (year, month) = (reference.year(), reference.month());
    let next_month_start = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let this_month_start = reference.with_day(1);
    match (this_month_start, next_month_start) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 31,
    }
}
