//! Lane domain model.
//!
//! # Responsibility
//! - Define one element of a project's ordered lane chain.
//! - Provide the head/tail primitives the ordering engine builds on.
//!
//! # Invariants
//! - `lane_uuid` is stable and never reused for another lane.
//! - `left_uuid`/`right_uuid` reference lanes in the same project, never the
//!   lane itself.
//! - A lane with `left_uuid = None` is the chain head; `right_uuid = None`
//!   marks the tail. Only the ordering engine writes these fields.

use crate::model::project::ProjectId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a lane.
pub type LaneId = Uuid;

/// One element of a project's persisted lane chain.
///
/// Neighbor fields hold IDs resolved through the repository, so the doubly
/// linked structure carries no ownership cycles in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lane {
    /// Stable global ID used for linking and auditing.
    pub lane_uuid: LaneId,
    /// Owning project. Immutable after creation.
    pub project_uuid: ProjectId,
    /// Display label, unique within the project (case-insensitive).
    pub name: String,
    /// Lane immediately before this one, `None` at the head.
    pub left_uuid: Option<LaneId>,
    /// Lane immediately after this one, `None` at the tail.
    pub right_uuid: Option<LaneId>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl Lane {
    /// Returns whether this lane is the head of its project's chain.
    pub fn is_head(&self) -> bool {
        self.left_uuid.is_none()
    }

    /// Returns whether this lane is the tail of its project's chain.
    pub fn is_tail(&self) -> bool {
        self.right_uuid.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::Lane;
    use uuid::Uuid;

    fn sample_lane() -> Lane {
        Lane {
            lane_uuid: Uuid::new_v4(),
            project_uuid: Uuid::new_v4(),
            name: "Backlog".to_string(),
            left_uuid: None,
            right_uuid: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn single_lane_is_both_head_and_tail() {
        let lane = sample_lane();
        assert!(lane.is_head());
        assert!(lane.is_tail());
    }

    #[test]
    fn linked_lane_is_neither_head_nor_tail() {
        let mut lane = sample_lane();
        lane.left_uuid = Some(Uuid::new_v4());
        lane.right_uuid = Some(Uuid::new_v4());
        assert!(!lane.is_head());
        assert!(!lane.is_tail());
    }

    #[test]
    fn lane_serializes_neighbor_fields_as_nullable() {
        let lane = sample_lane();
        let value = serde_json::to_value(&lane).expect("lane should serialize");
        assert!(value["left_uuid"].is_null());
        assert!(value["right_uuid"].is_null());
        assert_eq!(value["name"], "Backlog");
    }
}
