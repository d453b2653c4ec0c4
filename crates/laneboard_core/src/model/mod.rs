//! Domain model for projects and their ordered lanes.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep the persisted chain representation (left/right lane references)
//!   explicit in the type shape.
//!
//! # Invariants
//! - Every domain object is identified by a stable UUID.
//! - Lane neighbor fields are ID references, never owning references.

pub mod lane;
pub mod project;
