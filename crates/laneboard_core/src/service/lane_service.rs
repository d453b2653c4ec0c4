//! Lane ordering engine.
//!
//! # Responsibility
//! - Own every write to lane `left_uuid`/`right_uuid` references.
//! - Keep each project's lanes a single well-formed chain across create,
//!   move, rename, and delete operations.
//!
//! # Invariants
//! - Each mutating operation runs inside one repository transaction; a
//!   failure rolls back every neighbor rewrite of that operation.
//! - After any operation each non-empty project has exactly one head lane,
//!   exactly one tail lane, and symmetric neighbor links.
//! - Neighbor references never cross projects and never point at the lane
//!   itself.

use crate::model::lane::{Lane, LaneId};
use crate::model::project::ProjectId;
use crate::repo::lane_repo::{LaneRepoError, LaneRepository};
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from lane ordering operations.
#[derive(Debug)]
pub enum LaneServiceError {
    /// Lane name is blank after trim.
    InvalidLaneName,
    /// Another lane in the project already uses this name (case-insensitive).
    DuplicateLaneName(String),
    /// Target lane does not exist.
    LaneNotFound(LaneId),
    /// Target project does not exist.
    ProjectNotFound(ProjectId),
    /// Requested left neighbor is the lane itself.
    SelfNeighbor(LaneId),
    /// Requested left neighbor belongs to a different project.
    ProjectMismatch {
        lane_uuid: LaneId,
        neighbor_uuid: LaneId,
    },
    /// Persisted neighbor references do not form one valid chain.
    ChainCorrupted(String),
    /// Repository-level failure.
    Repo(LaneRepoError),
}

impl Display for LaneServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLaneName => write!(f, "lane name must not be blank"),
            Self::DuplicateLaneName(name) => {
                write!(f, "lane name already used in this project: {name}")
            }
            Self::LaneNotFound(id) => write!(f, "lane not found: {id}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::SelfNeighbor(id) => write!(f, "lane cannot be its own neighbor: {id}"),
            Self::ProjectMismatch {
                lane_uuid,
                neighbor_uuid,
            } => write!(
                f,
                "lane {lane_uuid} can only be positioned within its own project, neighbor {neighbor_uuid} belongs to another"
            ),
            Self::ChainCorrupted(message) => write!(f, "lane chain corrupted: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LaneServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LaneRepoError> for LaneServiceError {
    fn from(value: LaneRepoError) -> Self {
        match value {
            LaneRepoError::LaneNotFound(lane_uuid) => Self::LaneNotFound(lane_uuid),
            other => Self::Repo(other),
        }
    }
}

/// Lane ordering service facade.
pub struct LaneService<R: LaneRepository> {
    repo: R,
}

impl<R: LaneRepository> LaneService<R> {
    /// Creates the service from a repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one lane at the tail of its project's chain.
    ///
    /// Persists one row for the first lane of a project, two rows otherwise
    /// (the new lane and the former tail).
    pub fn create_lane(
        &self,
        project_uuid: ProjectId,
        name: impl Into<String>,
    ) -> Result<Lane, LaneServiceError> {
        let normalized = normalize_lane_name(name.into())?;
        self.repo.in_transaction(|repo| {
            if !repo.project_exists(project_uuid)? {
                return Err(LaneServiceError::ProjectNotFound(project_uuid));
            }

            let lanes = repo.list_by_project(project_uuid)?;
            ensure_name_free(&lanes, &normalized, None)?;
            let tail = lanes.into_iter().find(Lane::is_tail);

            let mut lane = repo.insert(project_uuid, &normalized)?;
            if let Some(mut tail) = tail {
                tail.right_uuid = Some(lane.lane_uuid);
                lane.left_uuid = Some(tail.lane_uuid);
                repo.save(&tail)?;
                repo.save(&lane)?;
            }
            Ok(lane)
        })
    }

    /// Moves one lane so that its predecessor becomes `new_left_uuid`, or to
    /// the head of its project's chain when `None`.
    ///
    /// A request that matches the lane's current position is a no-op and
    /// performs no writes.
    pub fn move_lane(
        &self,
        lane_uuid: LaneId,
        new_left_uuid: Option<LaneId>,
    ) -> Result<Lane, LaneServiceError> {
        if new_left_uuid == Some(lane_uuid) {
            return Err(LaneServiceError::SelfNeighbor(lane_uuid));
        }

        self.repo.in_transaction(|repo| {
            let lane = repo
                .get(lane_uuid)?
                .ok_or(LaneServiceError::LaneNotFound(lane_uuid))?;

            if let Some(neighbor_uuid) = new_left_uuid {
                let neighbor = repo
                    .get(neighbor_uuid)?
                    .ok_or(LaneServiceError::LaneNotFound(neighbor_uuid))?;
                if neighbor.project_uuid != lane.project_uuid {
                    return Err(LaneServiceError::ProjectMismatch {
                        lane_uuid,
                        neighbor_uuid,
                    });
                }
            }

            // Trivial move: the lane already sits right of the requested
            // neighbor (or already heads the chain). Rewriting here would
            // only churn rows.
            if lane.left_uuid == new_left_uuid {
                return Ok(lane);
            }

            let mut lanes = lanes_by_id(repo.list_by_project(lane.project_uuid)?);

            // Phase 1: the new right neighbor is the current head when moving
            // to the front, otherwise whatever currently follows the new left
            // neighbor. Resolved before any link changes.
            let new_right_uuid = match new_left_uuid {
                Some(neighbor_uuid) => {
                    lane_ref(&lanes, neighbor_uuid)?.right_uuid
                }
                None => lanes
                    .values()
                    .find(|candidate| candidate.is_head())
                    .map(|candidate| candidate.lane_uuid),
            };
            // Under intact symmetry this cannot be the moved lane: that case
            // is the no-op short circuit above. Seeing it means the persisted
            // links disagree; refuse to write a self loop.
            if new_right_uuid == Some(lane_uuid) {
                return Err(LaneServiceError::ChainCorrupted(format!(
                    "neighbor links around lane {lane_uuid} are asymmetric"
                )));
            }

            let mut changed = BTreeSet::new();
            let (old_left_uuid, old_right_uuid) = {
                let current = lane_ref(&lanes, lane_uuid)?;
                (current.left_uuid, current.right_uuid)
            };

            // Phase 2: detach fully before re-linking so local moves (one
            // position over) never see overlapping neighborhoods.
            if let Some(old_left) = old_left_uuid {
                lane_mut(&mut lanes, old_left)?.right_uuid = old_right_uuid;
                changed.insert(old_left);
            }
            if let Some(old_right) = old_right_uuid {
                lane_mut(&mut lanes, old_right)?.left_uuid = old_left_uuid;
                changed.insert(old_right);
            }

            // Phase 3: re-link at the requested position.
            {
                let moved = lane_mut(&mut lanes, lane_uuid)?;
                moved.left_uuid = new_left_uuid;
                moved.right_uuid = new_right_uuid;
                changed.insert(lane_uuid);
            }
            if let Some(new_left) = new_left_uuid {
                lane_mut(&mut lanes, new_left)?.right_uuid = Some(lane_uuid);
                changed.insert(new_left);
            }
            if let Some(new_right) = new_right_uuid {
                lane_mut(&mut lanes, new_right)?.left_uuid = Some(lane_uuid);
                changed.insert(new_right);
            }

            // Phase 4: persist every lane whose references changed.
            for changed_uuid in &changed {
                repo.save(lane_ref(&lanes, *changed_uuid)?)?;
            }

            lanes
                .remove(&lane_uuid)
                .ok_or(LaneServiceError::LaneNotFound(lane_uuid))
        })
    }

    /// Renames one lane. Never touches neighbor references.
    pub fn rename_lane(
        &self,
        lane_uuid: LaneId,
        name: impl Into<String>,
    ) -> Result<Lane, LaneServiceError> {
        let normalized = normalize_lane_name(name.into())?;
        self.repo.in_transaction(|repo| {
            let mut lane = repo
                .get(lane_uuid)?
                .ok_or(LaneServiceError::LaneNotFound(lane_uuid))?;

            let siblings = repo.list_by_project(lane.project_uuid)?;
            ensure_name_free(&siblings, &normalized, Some(lane_uuid))?;

            lane.name = normalized;
            repo.save(&lane)?;
            Ok(lane)
        })
    }

    /// Deletes one lane, splicing its former neighbors together.
    ///
    /// Lane identity is never reused; deletion is permanent.
    pub fn delete_lane(&self, lane_uuid: LaneId) -> Result<(), LaneServiceError> {
        self.repo.in_transaction(|repo| {
            let lane = repo
                .get(lane_uuid)?
                .ok_or(LaneServiceError::LaneNotFound(lane_uuid))?;

            if let Some(left_uuid) = lane.left_uuid {
                let mut left = repo.get(left_uuid)?.ok_or_else(|| {
                    LaneServiceError::ChainCorrupted(format!(
                        "lane {lane_uuid} references missing left neighbor {left_uuid}"
                    ))
                })?;
                left.right_uuid = lane.right_uuid;
                repo.save(&left)?;
            }
            if let Some(right_uuid) = lane.right_uuid {
                let mut right = repo.get(right_uuid)?.ok_or_else(|| {
                    LaneServiceError::ChainCorrupted(format!(
                        "lane {lane_uuid} references missing right neighbor {right_uuid}"
                    ))
                })?;
                right.left_uuid = lane.left_uuid;
                repo.save(&right)?;
            }

            repo.delete(lane_uuid)?;
            Ok(())
        })
    }

    /// Lists one project's lanes head to tail.
    ///
    /// The repository returns an unordered set; traversal and integrity
    /// checking happen here.
    pub fn list_lanes(&self, project_uuid: ProjectId) -> Result<Vec<Lane>, LaneServiceError> {
        if !self.repo.project_exists(project_uuid)? {
            return Err(LaneServiceError::ProjectNotFound(project_uuid));
        }
        order_chain(self.repo.list_by_project(project_uuid)?)
    }
}

fn normalize_lane_name(value: String) -> Result<String, LaneServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LaneServiceError::InvalidLaneName);
    }
    Ok(trimmed.to_string())
}

fn ensure_name_free(
    lanes: &[Lane],
    name: &str,
    exclude: Option<LaneId>,
) -> Result<(), LaneServiceError> {
    let lowered = name.to_lowercase();
    let taken = lanes.iter().any(|lane| {
        Some(lane.lane_uuid) != exclude && lane.name.to_lowercase() == lowered
    });
    if taken {
        return Err(LaneServiceError::DuplicateLaneName(name.to_string()));
    }
    Ok(())
}

fn lanes_by_id(lanes: Vec<Lane>) -> HashMap<LaneId, Lane> {
    lanes
        .into_iter()
        .map(|lane| (lane.lane_uuid, lane))
        .collect()
}

fn lane_ref(lanes: &HashMap<LaneId, Lane>, lane_uuid: LaneId) -> Result<&Lane, LaneServiceError> {
    lanes.get(&lane_uuid).ok_or_else(|| {
        LaneServiceError::ChainCorrupted(format!(
            "lane {lane_uuid} missing from its project's lane set"
        ))
    })
}

fn lane_mut(
    lanes: &mut HashMap<LaneId, Lane>,
    lane_uuid: LaneId,
) -> Result<&mut Lane, LaneServiceError> {
    lanes.get_mut(&lane_uuid).ok_or_else(|| {
        LaneServiceError::ChainCorrupted(format!(
            "lane {lane_uuid} missing from its project's lane set"
        ))
    })
}

/// Orders an unordered lane set head to tail, verifying chain invariants.
fn order_chain(lanes: Vec<Lane>) -> Result<Vec<Lane>, LaneServiceError> {
    if lanes.is_empty() {
        return Ok(lanes);
    }

    let total = lanes.len();
    let mut by_id = lanes_by_id(lanes);

    let mut head_ids: Vec<LaneId> = by_id
        .values()
        .filter(|lane| lane.is_head())
        .map(|lane| lane.lane_uuid)
        .collect();
    if head_ids.len() != 1 {
        return Err(LaneServiceError::ChainCorrupted(format!(
            "expected exactly one head lane, found {}",
            head_ids.len()
        )));
    }

    let mut ordered = Vec::with_capacity(total);
    let mut cursor = head_ids.pop();
    while let Some(current_uuid) = cursor {
        // Removing visited lanes turns a revisit (cycle) into a missing entry.
        let current = by_id.remove(&current_uuid).ok_or_else(|| {
            LaneServiceError::ChainCorrupted(format!(
                "lane {current_uuid} is referenced more than once"
            ))
        })?;
        let next = current.right_uuid;
        if let Some(next_uuid) = next {
            match by_id.get(&next_uuid) {
                Some(neighbor) if neighbor.left_uuid == Some(current_uuid) => {}
                Some(_) => {
                    return Err(LaneServiceError::ChainCorrupted(format!(
                        "asymmetric link between {current_uuid} and {next_uuid}"
                    )));
                }
                None => {
                    return Err(LaneServiceError::ChainCorrupted(format!(
                        "lane {current_uuid} references {next_uuid}, which is missing or already visited"
                    )));
                }
            }
        }
        ordered.push(current);
        cursor = next;
    }

    if ordered.len() != total {
        return Err(LaneServiceError::ChainCorrupted(format!(
            "chain reaches {} of {} lanes",
            ordered.len(),
            total
        )));
    }

    Ok(ordered)
}
