use chrono::{NaiveDate, TimeZone, Utc};
use sitegantt_core::hierarchy::{build, ExpansionState};
use sitegantt_core::timeline::{is_overdue, project, Granularity, TimelinePosition};
use sitegantt_core::{GanttBoard, TaskRecord};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn task(id: &str, parent: Option<&str>) -> TaskRecord {
    let record = TaskRecord::new(
        id,
        format!("Partida {id}"),
        date(2024, 1, 1),
        date(2024, 1, 31),
    );
    match parent {
        Some(parent) => record.with_parent(parent),
        None => record,
    }
}

fn root_ids(records: Vec<TaskRecord>) -> Vec<String> {
    build(records)
        .roots()
        .iter()
        .map(|node| node.id().to_string())
        .collect()
}

#[test]
fn roots_keep_input_order() {
    let ids = root_ids(vec![task("c", None), task("a", None), task("b", None)]);
    assert_eq!(ids, vec!["c", "a", "b"]);
}

#[test]
fn child_listed_before_parent_is_still_attached() {
    let forest = build(vec![task("b", Some("a")), task("a", None)]);

    assert_eq!(forest.roots().len(), 1);
    let root = &forest.roots()[0];
    assert_eq!(root.id(), "a");
    assert_eq!(root.children.len(), 1);
    assert_eq!(root.children[0].id(), "b");
}

#[test]
fn parent_resolution_ignores_input_order() {
    let parent = task("p", None);
    let child = task("c", Some("p"));

    assert_eq!(
        build(vec![child.clone(), parent.clone()]),
        build(vec![parent, child])
    );
}

#[test]
fn flatten_hides_or_shows_both_children() {
    let forest = build(vec![
        task("p", None),
        task("c1", Some("p")),
        task("c2", Some("p")),
    ]);

    assert_eq!(forest.flatten(&ExpansionState::default()).len(), 1);
    let rows: Vec<&str> = forest
        .flatten(&ExpansionState::all(["p"]))
        .into_iter()
        .map(|node| node.id())
        .collect();
    assert_eq!(rows, vec!["p", "c1", "c2"]);
}

#[test]
fn children_keep_input_order() {
    let forest = build(vec![
        task("root", None),
        task("z", Some("root")),
        task("m", Some("root")),
        task("a", Some("root")),
    ]);

    let children: Vec<&str> = forest.roots()[0]
        .children
        .iter()
        .map(|node| node.id())
        .collect();
    assert_eq!(children, vec!["z", "m", "a"]);
}

#[test]
fn dangling_parent_becomes_root() {
    let records = vec![task("x", Some("ghost")), task("y", None)];
    let forest = build(records.clone());

    assert_eq!(root_ids(records), vec!["x", "y"]);
    assert_eq!(forest.depth("x"), 0);
    assert_eq!(forest.parent_of("x"), None);
}

#[test]
fn flatten_respects_expansion() {
    let forest = build(vec![
        task("a", None),
        task("b", Some("a")),
        task("c", Some("b")),
    ]);

    let collapsed = forest.flatten(&ExpansionState::default());
    assert_eq!(collapsed.len(), 1);
    assert_eq!(collapsed[0].id(), "a");

    let expanded = ExpansionState::all(["a", "b"]);
    let rows: Vec<&str> = forest
        .flatten(&expanded)
        .into_iter()
        .map(|node| node.id())
        .collect();
    assert_eq!(rows, vec!["a", "b", "c"]);
}

#[test]
fn flatten_visits_subtree_before_next_sibling() {
    let forest = build(vec![
        task("a", None),
        task("d", None),
        task("b", Some("a")),
        task("c", Some("b")),
    ]);

    let rows: Vec<&str> = forest
        .flatten(&ExpansionState::all(forest.all_ids()))
        .into_iter()
        .map(|node| node.id())
        .collect();
    assert_eq!(rows, vec!["a", "b", "c", "d"]);
}

#[test]
fn reversed_range_has_span_of_one() {
    let by_month = project(
        date(2024, 5, 20),
        date(2024, 2, 1),
        Granularity::MonthOfYear,
        date(2024, 5, 1),
    );
    assert_eq!(by_month.span, 1);
    assert_eq!(by_month.start_offset, 4);

    let by_day = project(
        date(2024, 5, 20),
        date(2024, 5, 3),
        Granularity::DayOfMonth,
        date(2024, 5, 1),
    );
    assert_eq!(by_day.span, 1);
}

#[test]
fn month_projection_covers_inclusive_months() {
    let position = project(
        date(2024, 1, 15),
        date(2024, 3, 20),
        Granularity::MonthOfYear,
        date(2024, 7, 1),
    );
    assert_eq!(
        position,
        TimelinePosition {
            start_offset: 0,
            span: 3
        }
    );
}

#[test]
fn overdue_depends_on_completion_and_end_date() {
    let today = date(2024, 6, 10);
    let mut record = TaskRecord::new("t", "Losa", date(2024, 5, 1), date(2024, 6, 9));
    assert!(is_overdue(&record, today));

    record.completed_at = Some(Utc.with_ymd_and_hms(2024, 6, 9, 18, 0, 0).single().unwrap());
    assert!(!is_overdue(&record, today));

    let ends_today = TaskRecord::new("u", "Muros", date(2024, 5, 1), today);
    assert!(!is_overdue(&ends_today, today));
}

#[test]
fn depth_counts_ancestors() {
    let forest = build(vec![
        task("a", None),
        task("b", Some("a")),
        task("c", Some("b")),
    ]);

    assert_eq!(forest.depth("a"), 0);
    assert_eq!(forest.depth("b"), 1);
    assert_eq!(forest.depth("c"), 2);
}

#[test]
fn empty_input_yields_empty_forest_and_rows() {
    let forest = build(Vec::new());

    assert!(forest.is_empty());
    assert!(forest.roots().is_empty());
    assert!(forest.flatten(&ExpansionState::default()).is_empty());

    let board = GanttBoard::from_records(Vec::new());
    assert!(board.rows(Granularity::MonthOfYear, date(2024, 1, 1)).is_empty());
}

#[test]
fn cyclic_parents_terminate_and_keep_every_record() {
    let records = vec![
        task("a", Some("c")),
        task("b", Some("a")),
        task("c", Some("b")),
        task("d", Some("c")),
    ];
    let forest = build(records.clone());

    assert_eq!(forest.len(), 4);
    assert_eq!(root_ids(records), vec!["a"]);
    assert_eq!(forest.depth("a"), 0);
    assert_eq!(forest.depth("d"), 3);

    let rows = forest.flatten(&ExpansionState::all(forest.all_ids()));
    assert_eq!(rows.len(), 4);
}

#[test]
fn board_rows_carry_depth_and_projection() {
    let mut child = task("b", Some("a"));
    child.start_date = date(2024, 3, 4);
    child.end_date = date(2024, 4, 30);
    let board = GanttBoard::from_records(vec![task("a", None), child]);

    let rows = board.rows(Granularity::MonthOfYear, date(2024, 2, 1));
    assert_eq!(rows.len(), 2);
    assert!(rows[0].has_children);
    assert!(rows[0].expanded);
    assert_eq!(rows[1].depth, 1);
    assert_eq!(
        rows[1].position,
        TimelinePosition {
            start_offset: 2,
            span: 2
        }
    );
    assert!(rows[0].overdue);
    assert!(!rows[1].overdue);
}
