//! Project repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for project CRUD and name lookup.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Name lookup and prefix listing compare case-insensitively.
//! - Deleting a project cascades to its lane rows via FK.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::project::{Project, ProjectId};
use crate::repo::{connection_schema_version, table_exists, table_has_column};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Result type used by project repository operations.
pub type ProjectRepoResult<T> = Result<T, ProjectRepoError>;

/// Errors from project repository operations.
#[derive(Debug)]
pub enum ProjectRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target project does not exist.
    ProjectNotFound(ProjectId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for ProjectRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "project repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "project repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "project repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid project data: {message}"),
        }
    }
}

impl Error for ProjectRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for ProjectRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ProjectRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

const PROJECT_SELECT_SQL: &str = "SELECT
    project_uuid,
    name,
    created_at,
    updated_at
FROM projects";

/// Repository interface for project CRUD operations.
pub trait ProjectRepository {
    /// Creates one project row and returns the stored read model.
    fn insert(&self, name: &str) -> ProjectRepoResult<Project>;
    /// Loads one project by id.
    fn get(&self, project_uuid: ProjectId) -> ProjectRepoResult<Option<Project>>;
    /// Finds one project by exact name, compared case-insensitively.
    fn find_by_name(&self, name: &str) -> ProjectRepoResult<Option<Project>>;
    /// Lists projects, optionally filtered by case-insensitive name prefix.
    fn list(&self, prefix: Option<&str>) -> ProjectRepoResult<Vec<Project>>;
    /// Renames one project.
    fn rename(&self, project_uuid: ProjectId, name: &str) -> ProjectRepoResult<()>;
    /// Deletes one project and, via FK cascade, its lanes.
    fn delete(&self, project_uuid: ProjectId) -> ProjectRepoResult<()>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> ProjectRepoResult<Self> {
        ensure_project_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn insert(&self, name: &str) -> ProjectRepoResult<Project> {
        let project_uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO projects (project_uuid, name) VALUES (?1, ?2);",
            params![project_uuid.to_string(), name],
        )?;
        self.get(project_uuid)?
            .ok_or(ProjectRepoError::ProjectNotFound(project_uuid))
    }

    fn get(&self, project_uuid: ProjectId) -> ProjectRepoResult<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} WHERE project_uuid = ?1;"))?;
        let mut rows = stmt.query([project_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }
        Ok(None)
    }

    fn find_by_name(&self, name: &str) -> ProjectRepoResult<Option<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL} WHERE name = ?1 COLLATE NOCASE;"
        ))?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }
        Ok(None)
    }

    fn list(&self, prefix: Option<&str>) -> ProjectRepoResult<Vec<Project>> {
        let mut projects = Vec::new();
        if let Some(prefix) = prefix {
            let mut stmt = self.conn.prepare(&format!(
                "{PROJECT_SELECT_SQL}
                 WHERE name LIKE ?1 ESCAPE '\\'
                 ORDER BY name COLLATE NOCASE ASC, project_uuid ASC;"
            ))?;
            let pattern = format!("{}%", escape_like(prefix));
            let mut rows = stmt.query([pattern])?;
            while let Some(row) = rows.next()? {
                projects.push(parse_project_row(row)?);
            }
        } else {
            let mut stmt = self.conn.prepare(&format!(
                "{PROJECT_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC, project_uuid ASC;"
            ))?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                projects.push(parse_project_row(row)?);
            }
        }
        Ok(projects)
    }

    fn rename(&self, project_uuid: ProjectId, name: &str) -> ProjectRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET name = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE project_uuid = ?1;",
            params![project_uuid.to_string(), name],
        )?;
        if changed == 0 {
            return Err(ProjectRepoError::ProjectNotFound(project_uuid));
        }
        Ok(())
    }

    fn delete(&self, project_uuid: ProjectId) -> ProjectRepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM projects WHERE project_uuid = ?1;",
            [project_uuid.to_string()],
        )?;
        if changed == 0 {
            return Err(ProjectRepoError::ProjectNotFound(project_uuid));
        }
        Ok(())
    }
}

fn parse_project_row(row: &Row<'_>) -> ProjectRepoResult<Project> {
    let uuid_text: String = row.get("project_uuid")?;
    let project_uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        ProjectRepoError::InvalidData(format!(
            "invalid uuid `{uuid_text}` in projects.project_uuid"
        ))
    })?;
    Ok(Project {
        project_uuid,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

// SQLite LIKE treats % and _ as wildcards; prefix text must match literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn ensure_project_connection_ready(conn: &Connection) -> ProjectRepoResult<()> {
    let expected_version = latest_version();
    let actual_version = connection_schema_version(conn)?;
    if actual_version != expected_version {
        return Err(ProjectRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "projects")? {
        return Err(ProjectRepoError::MissingRequiredTable("projects"));
    }

    for column in ["project_uuid", "name", "created_at", "updated_at"] {
        if !table_has_column(conn, "projects", column)? {
            return Err(ProjectRepoError::MissingRequiredColumn {
                table: "projects",
                column,
            });
        }
    }

    Ok(())
}
