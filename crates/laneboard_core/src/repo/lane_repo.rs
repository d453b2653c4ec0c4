//! Lane repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the storage primitives the ordering engine needs: load by id,
//!   load the unordered per-project set, upsert, delete.
//! - Supply the transaction boundary that makes one engine operation atomic.
//!
//! # Invariants
//! - `save` persists name and both neighbor references together.
//! - Repository methods never interpret chain order; traversal belongs to
//!   the service layer.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::lane::{Lane, LaneId};
use crate::model::project::ProjectId;
use crate::repo::{connection_schema_version, table_exists, table_has_column};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Result type used by lane repository operations.
pub type LaneRepoResult<T> = Result<T, LaneRepoError>;

/// Errors from lane repository operations.
#[derive(Debug)]
pub enum LaneRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target lane does not exist.
    LaneNotFound(LaneId),
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

impl Display for LaneRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::LaneNotFound(id) => write!(f, "lane not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "lane repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "lane repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "lane repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid lane data: {message}"),
        }
    }
}

impl Error for LaneRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for LaneRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for LaneRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

const LANE_SELECT_SQL: &str = "SELECT
    lane_uuid,
    project_uuid,
    name,
    left_uuid,
    right_uuid,
    created_at,
    updated_at
FROM lanes";

/// Storage primitives consumed by the lane ordering engine.
pub trait LaneRepository {
    /// Returns whether the project row exists.
    fn project_exists(&self, project_uuid: ProjectId) -> LaneRepoResult<bool>;
    /// Creates one unlinked lane row (`left_uuid`/`right_uuid` NULL).
    fn insert(&self, project_uuid: ProjectId, name: &str) -> LaneRepoResult<Lane>;
    /// Loads one lane by id.
    fn get(&self, lane_uuid: LaneId) -> LaneRepoResult<Option<Lane>>;
    /// Loads the unordered lane set of one project.
    fn list_by_project(&self, project_uuid: ProjectId) -> LaneRepoResult<Vec<Lane>>;
    /// Persists name and both neighbor references of one lane.
    fn save(&self, lane: &Lane) -> LaneRepoResult<()>;
    /// Deletes one lane row. Neighbor splicing is the engine's job.
    fn delete(&self, lane_uuid: LaneId) -> LaneRepoResult<()>;
    /// Runs `op` inside one IMMEDIATE transaction.
    ///
    /// All writes issued through the repository within `op` commit together;
    /// any error rolls the whole operation back.
    fn in_transaction<T, E>(&self, op: impl FnOnce(&Self) -> Result<T, E>) -> Result<T, E>
    where
        E: From<LaneRepoError>;
}

/// SQLite-backed lane repository.
pub struct SqliteLaneRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLaneRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> LaneRepoResult<Self> {
        ensure_lane_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl LaneRepository for SqliteLaneRepository<'_> {
    fn project_exists(&self, project_uuid: ProjectId) -> LaneRepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM projects WHERE project_uuid = ?1
            );",
            [project_uuid.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn insert(&self, project_uuid: ProjectId, name: &str) -> LaneRepoResult<Lane> {
        let lane_uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO lanes (lane_uuid, project_uuid, name, left_uuid, right_uuid)
             VALUES (?1, ?2, ?3, NULL, NULL);",
            params![lane_uuid.to_string(), project_uuid.to_string(), name],
        )?;
        self.get(lane_uuid)?
            .ok_or(LaneRepoError::LaneNotFound(lane_uuid))
    }

    fn get(&self, lane_uuid: LaneId) -> LaneRepoResult<Option<Lane>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LANE_SELECT_SQL} WHERE lane_uuid = ?1;"))?;
        let mut rows = stmt.query([lane_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_lane_row(row)?));
        }
        Ok(None)
    }

    fn list_by_project(&self, project_uuid: ProjectId) -> LaneRepoResult<Vec<Lane>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LANE_SELECT_SQL}
             WHERE project_uuid = ?1
             ORDER BY lane_uuid ASC;"
        ))?;
        let mut rows = stmt.query([project_uuid.to_string()])?;
        let mut lanes = Vec::new();
        while let Some(row) = rows.next()? {
            lanes.push(parse_lane_row(row)?);
        }
        Ok(lanes)
    }

    fn save(&self, lane: &Lane) -> LaneRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE lanes
             SET name = ?2,
                 left_uuid = ?3,
                 right_uuid = ?4,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE lane_uuid = ?1;",
            params![
                lane.lane_uuid.to_string(),
                lane.name,
                lane.left_uuid.map(|value| value.to_string()),
                lane.right_uuid.map(|value| value.to_string()),
            ],
        )?;
        if changed == 0 {
            return Err(LaneRepoError::LaneNotFound(lane.lane_uuid));
        }
        Ok(())
    }

    fn delete(&self, lane_uuid: LaneId) -> LaneRepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM lanes WHERE lane_uuid = ?1;",
            [lane_uuid.to_string()],
        )?;
        if changed == 0 {
            return Err(LaneRepoError::LaneNotFound(lane_uuid));
        }
        Ok(())
    }

    fn in_transaction<T, E>(&self, op: impl FnOnce(&Self) -> Result<T, E>) -> Result<T, E>
    where
        E: From<LaneRepoError>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(|err| E::from(LaneRepoError::from(err)))?;
        // Dropping the transaction on the error path rolls back everything
        // written through self.conn inside op.
        let value = op(self)?;
        tx.commit().map_err(|err| E::from(LaneRepoError::from(err)))?;
        Ok(value)
    }
}

fn parse_lane_row(row: &Row<'_>) -> LaneRepoResult<Lane> {
    let lane_uuid_text: String = row.get("lane_uuid")?;
    let lane_uuid = parse_uuid(&lane_uuid_text, "lanes.lane_uuid")?;

    let project_uuid_text: String = row.get("project_uuid")?;
    let project_uuid = parse_uuid(&project_uuid_text, "lanes.project_uuid")?;

    let left_uuid = row
        .get::<_, Option<String>>("left_uuid")?
        .map(|value| parse_uuid(&value, "lanes.left_uuid"))
        .transpose()?;
    let right_uuid = row
        .get::<_, Option<String>>("right_uuid")?
        .map(|value| parse_uuid(&value, "lanes.right_uuid"))
        .transpose()?;

    Ok(Lane {
        lane_uuid,
        project_uuid,
        name: row.get("name")?,
        left_uuid,
        right_uuid,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_uuid(value: &str, column: &'static str) -> LaneRepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| LaneRepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_lane_connection_ready(conn: &Connection) -> LaneRepoResult<()> {
    let expected_version = latest_version();
    let actual_version = connection_schema_version(conn)?;
    if actual_version != expected_version {
        return Err(LaneRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "lanes")? {
        return Err(LaneRepoError::MissingRequiredTable("lanes"));
    }

    for column in [
        "lane_uuid",
        "project_uuid",
        "name",
        "left_uuid",
        "right_uuid",
        "created_at",
        "updated_at",
    ] {
        if !table_has_column(conn, "lanes", column)? {
            return Err(LaneRepoError::MissingRequiredColumn {
                table: "lanes",
                column,
            });
        }
    }

    Ok(())
}
