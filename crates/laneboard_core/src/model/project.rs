//! Project domain model.
//!
//! # Responsibility
//! - Define the grouping entity that scopes one lane chain.
//!
//! # Invariants
//! - `project_uuid` is stable and never reused for another project.
//! - A project owns zero or more lanes; lane order never crosses projects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a project.
pub type ProjectId = Uuid;

/// Grouping entity that scopes one ordered lane chain.
///
/// The ordering engine never mutates a project; it is only a scoping key
/// for lane chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Stable global ID.
    pub project_uuid: ProjectId,
    /// User-facing name, unique across projects (case-insensitive).
    pub name: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}
