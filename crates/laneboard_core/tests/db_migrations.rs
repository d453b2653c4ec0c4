use laneboard_core::db::migrations::{apply_migrations, latest_version};
use laneboard_core::db::{open_db, open_db_in_memory, DbError};
use laneboard_core::{SqliteLaneRepository, SqliteProjectRepository};

fn table_columns(conn: &rusqlite::Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table});"))
        .unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut columns = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        let column_name: String = row.get(1).unwrap();
        columns.push(column_name);
    }
    columns
}

#[test]
fn migration_creates_projects_and_lanes_tables() {
    let conn = open_db_in_memory().unwrap();

    let project_columns = table_columns(&conn, "projects");
    for column in ["project_uuid", "name", "created_at", "updated_at"] {
        assert!(
            project_columns.contains(&column.to_string()),
            "projects missing column {column}"
        );
    }

    let lane_columns = table_columns(&conn, "lanes");
    for column in [
        "lane_uuid",
        "project_uuid",
        "name",
        "left_uuid",
        "right_uuid",
        "created_at",
        "updated_at",
    ] {
        assert!(
            lane_columns.contains(&column.to_string()),
            "lanes missing column {column}"
        );
    }
}

#[test]
fn migrated_connection_reports_latest_user_version() {
    let conn = open_db_in_memory().unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn reapplying_migrations_is_a_no_op() {
    let mut conn = open_db_in_memory().unwrap();
    apply_migrations(&mut conn).unwrap();

    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn reopening_migrated_database_file_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("laneboard.sqlite3");

    let first = open_db(&path).unwrap();
    drop(first);
    let second = open_db(&path).unwrap();

    let version: u32 = second
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn newer_schema_version_is_rejected() {
    let mut conn = rusqlite::Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA user_version = 99;").unwrap();

    let err = apply_migrations(&mut conn).unwrap_err();
    assert!(matches!(
        err,
        DbError::UnsupportedSchemaVersion {
            db_version: 99,
            ..
        }
    ));
}

#[test]
fn repositories_reject_unmigrated_connections() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();

    assert!(SqliteProjectRepository::try_new(&conn).is_err());
    assert!(SqliteLaneRepository::try_new(&conn).is_err());
}
