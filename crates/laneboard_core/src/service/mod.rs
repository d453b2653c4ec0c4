//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep callers decoupled from storage details.
//!
//! # Invariants
//! - The lane service is the only writer of lane neighbor references.

pub mod lane_service;
pub mod project_service;
