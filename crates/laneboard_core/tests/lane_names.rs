use laneboard_core::db::open_db_in_memory;
use laneboard_core::{
    LaneService, LaneServiceError, Project, ProjectService, SqliteLaneRepository,
    SqliteProjectRepository,
};
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn create_project(conn: &Connection, name: &str) -> Project {
    let repo = SqliteProjectRepository::try_new(conn).unwrap();
    ProjectService::new(repo).create_project(name).unwrap()
}

fn lane_service(conn: &Connection) -> LaneService<SqliteLaneRepository<'_>> {
    LaneService::new(SqliteLaneRepository::try_new(conn).unwrap())
}

#[test]
fn blank_lane_names_are_rejected() {
    let conn = setup();
    let project = create_project(&conn, "Board");
    let service = lane_service(&conn);

    assert!(matches!(
        service.create_lane(project.project_uuid, "").unwrap_err(),
        LaneServiceError::InvalidLaneName
    ));
    assert!(matches!(
        service.create_lane(project.project_uuid, "   ").unwrap_err(),
        LaneServiceError::InvalidLaneName
    ));

    let lane = service.create_lane(project.project_uuid, "Todo").unwrap();
    assert!(matches!(
        service.rename_lane(lane.lane_uuid, " \t ").unwrap_err(),
        LaneServiceError::InvalidLaneName
    ));
}

#[test]
fn lane_names_are_trimmed_on_create_and_rename() {
    let conn = setup();
    let project = create_project(&conn, "Board");
    let service = lane_service(&conn);

    let lane = service
        .create_lane(project.project_uuid, "  Todo  ")
        .unwrap();
    assert_eq!(lane.name, "Todo");

    let renamed = service.rename_lane(lane.lane_uuid, "  Doing  ").unwrap();
    assert_eq!(renamed.name, "Doing");
}

#[test]
fn duplicate_lane_name_is_rejected_case_insensitively() {
    let conn = setup();
    let project = create_project(&conn, "Board");
    let service = lane_service(&conn);

    service.create_lane(project.project_uuid, "Done").unwrap();
    let err = service
        .create_lane(project.project_uuid, "dOnE")
        .unwrap_err();
    assert!(matches!(err, LaneServiceError::DuplicateLaneName(_)));
}

#[test]
fn rename_to_existing_sibling_name_is_rejected() {
    let conn = setup();
    let project = create_project(&conn, "Board");
    let service = lane_service(&conn);

    service.create_lane(project.project_uuid, "Todo").unwrap();
    let doing = service.create_lane(project.project_uuid, "Doing").unwrap();

    let err = service.rename_lane(doing.lane_uuid, "TODO").unwrap_err();
    assert!(matches!(err, LaneServiceError::DuplicateLaneName(_)));
}

#[test]
fn lane_may_keep_its_own_name_on_rename() {
    let conn = setup();
    let project = create_project(&conn, "Board");
    let service = lane_service(&conn);

    let lane = service.create_lane(project.project_uuid, "Todo").unwrap();
    let renamed = service.rename_lane(lane.lane_uuid, "TODO").unwrap();
    assert_eq!(renamed.name, "TODO");
}

#[test]
fn same_lane_name_is_allowed_in_another_project() {
    let conn = setup();
    let board = create_project(&conn, "Board");
    let archive = create_project(&conn, "Archive");
    let service = lane_service(&conn);

    service.create_lane(board.project_uuid, "Done").unwrap();
    let other = service.create_lane(archive.project_uuid, "Done").unwrap();
    assert_eq!(other.name, "Done");
}

#[test]
fn rename_never_touches_neighbor_references() {
    let conn = setup();
    let project = create_project(&conn, "Board");
    let service = lane_service(&conn);

    let a = service.create_lane(project.project_uuid, "A").unwrap();
    let b = service.create_lane(project.project_uuid, "B").unwrap();
    let c = service.create_lane(project.project_uuid, "C").unwrap();

    let renamed = service.rename_lane(b.lane_uuid, "B2").unwrap();
    assert_eq!(renamed.left_uuid, Some(a.lane_uuid));
    assert_eq!(renamed.right_uuid, Some(c.lane_uuid));

    let names: Vec<String> = service
        .list_lanes(project.project_uuid)
        .unwrap()
        .into_iter()
        .map(|lane| lane.name)
        .collect();
    assert_eq!(names, vec!["A", "B2", "C"]);
}
