//! Core domain logic for laneboard.
//!
//! Projects own an ordered set of lanes (task states); the order is a
//! persisted doubly linked list of lane IDs, maintained exclusively by
//! [`LaneService`]. This crate is the single source of truth for the chain
//! invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging};
pub use model::lane::{Lane, LaneId};
pub use model::project::{Project, ProjectId};
pub use repo::lane_repo::{LaneRepoError, LaneRepoResult, LaneRepository, SqliteLaneRepository};
pub use repo::project_repo::{
    ProjectRepoError, ProjectRepoResult, ProjectRepository, SqliteProjectRepository,
};
pub use service::lane_service::{LaneService, LaneServiceError};
pub use service::project_service::{ProjectService, ProjectServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
