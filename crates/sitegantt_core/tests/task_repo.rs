use chrono::{NaiveDate, TimeZone, Utc};
use rusqlite::Connection;
use sitegantt_core::db::open_db_in_memory;
use sitegantt_core::{
    GanttService, GanttServiceError, Granularity, NewTask, SqliteTaskRepository, TaskRepoError,
    TaskRepository, TaskStatus, TaskUpdate, TaskValidationError,
};

fn insert_profile(conn: &Connection, id: &str, full_name: &str, role: &str) {
    let email = format!("{id}@example.com");
    conn.execute(
        "INSERT INTO profiles (id, email, full_name, role) VALUES (?1, ?2, ?3, ?4);",
        [id, email.as_str(), full_name, role],
    )
    .unwrap();
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_task(project_id: &str, parent_id: Option<&str>, name: &str) -> NewTask {
    NewTask {
        project_id: project_id.to_string(),
        parent_id: parent_id.map(str::to_string),
        name: name.to_string(),
        start_date: date(2024, 2, 1),
        end_date: date(2024, 3, 15),
        is_milestone: false,
        notes: None,
        responsible_id: None,
    }
}

fn setup() -> (Connection, String) {
    let conn = open_db_in_memory().unwrap();
    let project_id = SqliteTaskRepository::try_new(&conn)
        .unwrap()
        .create_project("Edificio Central")
        .unwrap();
    (conn, project_id)
}

#[test]
fn snapshot_is_ordered_by_task_order_then_insertion() {
    let (conn, project_id) = setup();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let first = repo.create_task(&new_task(&project_id, None, "Excavación")).unwrap();
    let second = repo.create_task(&new_task(&project_id, None, "Estructura")).unwrap();
    let child = repo
        .create_task(&new_task(&project_id, Some(&first.id), "Replanteo"))
        .unwrap();
    assert_eq!(first.order, 0);
    assert_eq!(second.order, 1);
    assert_eq!(child.order, 0);

    // Move the second root ahead of the first.
    conn.execute(
        "UPDATE tasks SET task_order = -1 WHERE id = ?1;",
        [&second.id],
    )
    .unwrap();

    let names: Vec<String> = repo
        .list_project_tasks(&project_id)
        .unwrap()
        .into_iter()
        .map(|task| task.name)
        .collect();
    assert_eq!(names, vec!["Estructura", "Excavación", "Replanteo"]);
}

#[test]
fn create_rejects_invalid_requests() {
    let (conn, project_id) = setup();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let blank = repo.create_task(&new_task(&project_id, None, "   "));
    assert!(matches!(
        blank,
        Err(TaskRepoError::Validation(TaskValidationError::BlankName))
    ));

    let mut reversed = new_task(&project_id, None, "Acabados");
    reversed.end_date = date(2024, 1, 1);
    assert!(matches!(
        repo.create_task(&reversed),
        Err(TaskRepoError::Validation(TaskValidationError::EndBeforeStart { .. }))
    ));

    assert!(matches!(
        repo.create_task(&new_task("nope", None, "Acabados")),
        Err(TaskRepoError::ProjectNotFound(_))
    ));
    assert!(matches!(
        repo.create_task(&new_task(&project_id, Some("ghost"), "Acabados")),
        Err(TaskRepoError::ParentNotFound(_))
    ));
}

#[test]
fn parent_from_another_project_is_rejected() {
    let (conn, project_id) = setup();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let other_project = repo.create_project("Nave Industrial").unwrap();
    let foreign = repo.create_task(&new_task(&other_project, None, "Cubierta")).unwrap();

    let result = repo.create_task(&new_task(&project_id, Some(&foreign.id), "Pintura"));
    assert!(matches!(result, Err(TaskRepoError::ParentNotFound(id)) if id == foreign.id));
}

#[test]
fn responsible_name_and_notes_are_loaded() {
    let (conn, project_id) = setup();
    insert_profile(&conn, "p1", "Ana Ruiz", "responsable");
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut request = new_task(&project_id, None, "  Instalaciones  ");
    request.responsible_id = Some("p1".to_string());
    request.notes = Some("  revisar planos  ".to_string());
    let created = repo.create_task(&request).unwrap();

    assert_eq!(created.name, "Instalaciones");
    assert_eq!(created.responsible.as_deref(), Some("Ana Ruiz"));
    assert_eq!(created.notes.as_deref(), Some("revisar planos"));
    assert_eq!(created.status, TaskStatus::Pending);
    assert!(created.completed_at.is_none());
}

#[test]
fn update_replaces_editable_fields() {
    let (conn, project_id) = setup();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let created = repo.create_task(&new_task(&project_id, None, "Fachada")).unwrap();

    let update = TaskUpdate {
        name: "Fachada ventilada".to_string(),
        start_date: date(2024, 4, 1),
        end_date: date(2024, 4, 1),
        is_milestone: true,
        notes: Some("   ".to_string()),
        responsible_id: None,
    };
    repo.update_task(&created.id, &update).unwrap();

    let loaded = repo.get_task(&created.id).unwrap().unwrap();
    assert_eq!(loaded.name, "Fachada ventilada");
    assert_eq!(loaded.start_date, date(2024, 4, 1));
    assert!(loaded.is_milestone);
    assert!(loaded.notes.is_none());

    assert!(matches!(
        repo.update_task("missing", &update),
        Err(TaskRepoError::NotFound(_))
    ));
}

#[test]
fn delete_removes_whole_subtree() {
    let (conn, project_id) = setup();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let root = repo.create_task(&new_task(&project_id, None, "Obra gris")).unwrap();
    let child = repo
        .create_task(&new_task(&project_id, Some(&root.id), "Muros"))
        .unwrap();
    repo.create_task(&new_task(&project_id, Some(&child.id), "Block"))
        .unwrap();
    let keep = repo.create_task(&new_task(&project_id, None, "Entrega")).unwrap();

    assert_eq!(repo.delete_task(&root.id).unwrap(), 3);

    let remaining: Vec<String> = repo
        .list_project_tasks(&project_id)
        .unwrap()
        .into_iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(remaining, vec![keep.id]);
    assert!(matches!(
        repo.delete_task(&root.id),
        Err(TaskRepoError::NotFound(_))
    ));
}

#[test]
fn service_completes_once_and_rebuilds_board() {
    let (conn, project_id) = setup();
    let service = GanttService::new(SqliteTaskRepository::try_new(&conn).unwrap());
    let root = service.add_task(&new_task(&project_id, None, "Losa")).unwrap();
    service
        .add_task(&new_task(&project_id, Some(&root.id), "Cimbra"))
        .unwrap();

    let today = date(2024, 6, 1);
    let board = service.load(&project_id).unwrap();
    assert_eq!(board.overdue_count(today), 2);

    let now = Utc.with_ymd_and_hms(2024, 5, 31, 12, 0, 0).single().unwrap();
    service.complete_task(&root.id, now).unwrap();
    assert!(matches!(
        service.complete_task(&root.id, now),
        Err(GanttServiceError::AlreadyCompleted(_))
    ));
    assert!(matches!(
        service.complete_task("missing", now),
        Err(GanttServiceError::TaskNotFound(_))
    ));

    let board = service.load(&project_id).unwrap();
    let rows = board.rows(Granularity::MonthOfYear, today);
    assert!(rows[0].completed);
    assert_eq!(rows[0].task.status, TaskStatus::Done);
    assert_eq!(rows[0].task.completed_at, Some(now));
    assert_eq!(board.overdue_count(today), 1);
}

#[test]
fn service_maps_repository_errors() {
    let (conn, project_id) = setup();
    let service = GanttService::new(SqliteTaskRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.add_task(&new_task(&project_id, Some("ghost"), "Rampa")),
        Err(GanttServiceError::ParentNotFound(_))
    ));
    assert!(matches!(
        service.delete_task("ghost"),
        Err(GanttServiceError::TaskNotFound(_))
    ));
    assert!(matches!(
        service.add_task(&new_task(&project_id, None, "")),
        Err(GanttServiceError::Validation(TaskValidationError::BlankName))
    ));
}

#[test]
fn board_view_serializes_rows_for_the_client() {
    let (conn, project_id) = setup();
    let service = GanttService::new(SqliteTaskRepository::try_new(&conn).unwrap());
    service.add_task(&new_task(&project_id, None, "Pilotes")).unwrap();

    let board = service.load(&project_id).unwrap();
    let view = board.view(Granularity::DayOfMonth, date(2024, 2, 10));
    let json = serde_json::to_value(&view).unwrap();

    assert_eq!(json["granularity"], "day_of_month");
    assert_eq!(json["headers"].as_array().unwrap().len(), 29);
    let row = &json["rows"][0];
    assert_eq!(row["task"]["name"], "Pilotes");
    assert_eq!(row["position"]["start_offset"], 0);
    assert_eq!(row["position"]["span"], 15);
    assert_eq!(row["palette_index"], 0);
    assert_eq!(row["overdue"], false);
}

#[test]
fn only_supervisors_and_responsables_can_own_tasks() {
    let (conn, project_id) = setup();
    insert_profile(&conn, "sup", "Sara Vega", "supervisor");
    insert_profile(&conn, "op", "Omar Pech", "operario");
    insert_profile(&conn, "ext", "Eva Cruz", "contratista");
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut request = new_task(&project_id, None, "Tablaroca");
    for rejected in ["op", "ext", "nobody"] {
        request.responsible_id = Some(rejected.to_string());
        assert!(matches!(
            repo.create_task(&request),
            Err(TaskRepoError::ResponsibleNotAllowed(id)) if id == rejected
        ));
    }
    assert!(repo.list_project_tasks(&project_id).unwrap().is_empty());

    request.responsible_id = Some("sup".to_string());
    let created = repo.create_task(&request).unwrap();
    assert_eq!(created.responsible.as_deref(), Some("Sara Vega"));

    let update = TaskUpdate {
        name: created.name.clone(),
        start_date: created.start_date,
        end_date: created.end_date,
        is_milestone: false,
        notes: None,
        responsible_id: Some("op".to_string()),
    };
    assert!(matches!(
        repo.update_task(&created.id, &update),
        Err(TaskRepoError::ResponsibleNotAllowed(_))
    ));
    let reloaded = repo.get_task(&created.id).unwrap().unwrap();
    assert_eq!(reloaded.responsible.as_deref(), Some("Sara Vega"));

    let service = GanttService::new(repo);
    assert!(matches!(
        service.edit_task(&created.id, &update),
        Err(GanttServiceError::ResponsibleNotAllowed(id)) if id == "op"
    ));
}

#[test]
fn kanban_groups_by_status_and_orders_by_start_date() {
    let (conn, project_id) = setup();
    let service = GanttService::new(SqliteTaskRepository::try_new(&conn).unwrap());

    let mut late = new_task(&project_id, None, "Pintura");
    late.start_date = date(2024, 5, 1);
    late.end_date = date(2024, 5, 30);
    let late = service.add_task(&late).unwrap();
    let mut early = new_task(&project_id, None, "Trazo");
    early.start_date = date(2024, 1, 8);
    early.end_date = date(2024, 1, 20);
    let early = service.add_task(&early).unwrap();
    let blocked = service.add_task(&new_task(&project_id, None, "Acometida")).unwrap();
    let done = service
        .add_task(&new_task(&project_id, Some(&blocked.id), "Zanja"))
        .unwrap();

    conn.execute(
        "UPDATE tasks SET status = 'blocked', is_blocked = 1 WHERE id = ?1;",
        [&blocked.id],
    )
    .unwrap();
    let now = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).single().unwrap();
    service.complete_task(&done.id, now).unwrap();

    let kanban = service.load_kanban(&project_id).unwrap();
    let columns = kanban.columns();

    let statuses: Vec<TaskStatus> = columns.iter().map(|column| column.status).collect();
    assert_eq!(statuses, TaskStatus::ALL.to_vec());
    let counts: Vec<usize> = columns.iter().map(|column| column.count).collect();
    assert_eq!(counts, vec![2, 0, 1, 1]);

    let pending: Vec<&str> = columns[0]
        .tasks
        .iter()
        .map(|task| task.id.as_str())
        .collect();
    assert_eq!(pending, vec![early.id.as_str(), late.id.as_str()]);
    assert_eq!(columns[2].tasks[0].id, blocked.id);
    assert_eq!(columns[3].tasks[0].id, done.id);

    let json = serde_json::to_value(&columns).unwrap();
    assert_eq!(json[1]["title"], "En Curso");
    assert_eq!(json[1]["status"], "in_progress");
    assert_eq!(json[3]["count"], 1);
}
