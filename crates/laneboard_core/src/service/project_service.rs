//! Project use-case service.
//!
//! # Responsibility
//! - Validate project naming rules above the repository layer.
//! - Provide project create, rename, list, and delete operations.
//!
//! # Invariants
//! - Project names are non-blank and unique case-insensitively.
//! - Deleting a project removes its lanes with it (FK cascade); the lane
//!   chain of a deleted project never needs splicing.

use crate::model::project::{Project, ProjectId};
use crate::repo::project_repo::{ProjectRepoError, ProjectRepository};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from project service operations.
#[derive(Debug)]
pub enum ProjectServiceError {
    /// Project name is blank after trim.
    InvalidProjectName,
    /// Another project already uses this name (case-insensitive).
    DuplicateProjectName(String),
    /// Target project does not exist.
    ProjectNotFound(ProjectId),
    /// Repository-level failure.
    Repo(ProjectRepoError),
}

impl Display for ProjectServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidProjectName => write!(f, "project name must not be blank"),
            Self::DuplicateProjectName(name) => {
                write!(f, "project name already used: {name}")
            }
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProjectRepoError> for ProjectServiceError {
    fn from(value: ProjectRepoError) -> Self {
        match value {
            ProjectRepoError::ProjectNotFound(project_uuid) => Self::ProjectNotFound(project_uuid),
            other => Self::Repo(other),
        }
    }
}

/// Project service facade.
pub struct ProjectService<R: ProjectRepository> {
    repo: R,
}

impl<R: ProjectRepository> ProjectService<R> {
    /// Creates the service from a repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one project with a unique name.
    pub fn create_project(
        &self,
        name: impl Into<String>,
    ) -> Result<Project, ProjectServiceError> {
        let normalized = normalize_project_name(name.into())?;
        if self.repo.find_by_name(&normalized)?.is_some() {
            return Err(ProjectServiceError::DuplicateProjectName(normalized));
        }
        self.repo.insert(&normalized).map_err(Into::into)
    }

    /// Renames one project, keeping names unique across projects.
    pub fn rename_project(
        &self,
        project_uuid: ProjectId,
        name: impl Into<String>,
    ) -> Result<Project, ProjectServiceError> {
        let normalized = normalize_project_name(name.into())?;
        self.get_project(project_uuid)?;

        if let Some(other) = self.repo.find_by_name(&normalized)? {
            if other.project_uuid != project_uuid {
                return Err(ProjectServiceError::DuplicateProjectName(normalized));
            }
        }

        self.repo.rename(project_uuid, &normalized)?;
        self.get_project(project_uuid)
    }

    /// Loads one project by id.
    pub fn get_project(&self, project_uuid: ProjectId) -> Result<Project, ProjectServiceError> {
        self.repo
            .get(project_uuid)?
            .ok_or(ProjectServiceError::ProjectNotFound(project_uuid))
    }

    /// Lists projects, optionally filtered by name prefix.
    ///
    /// A blank prefix is treated as absent.
    pub fn list_projects(
        &self,
        prefix: Option<&str>,
    ) -> Result<Vec<Project>, ProjectServiceError> {
        let prefix = prefix.map(str::trim).filter(|value| !value.is_empty());
        self.repo.list(prefix).map_err(Into::into)
    }

    /// Deletes one project and all of its lanes.
    pub fn delete_project(&self, project_uuid: ProjectId) -> Result<(), ProjectServiceError> {
        self.get_project(project_uuid)?;
        self.repo.delete(project_uuid).map_err(Into::into)
    }
}

fn normalize_project_name(value: String) -> Result<String, ProjectServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProjectServiceError::InvalidProjectName);
    }
    Ok(trimmed.to_string())
}
