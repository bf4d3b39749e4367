//! Project identity model.

use serde::{Deserialize, Serialize};

/// Stable project identifier assigned by the Runtime at creation.
pub type ProjectId = u64;

/// One entry of the registry listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub id: ProjectId,
    pub name: String,
}

/// Handle used to open a project either by id or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectRef {
    /// Existing project id. Opening an unknown id fails.
    Id(ProjectId),
    /// Project name. Opening an unknown name creates the project.
    Name(String),
}

impl From<ProjectId> for ProjectRef {
    fn from(value: ProjectId) -> Self {
        Self::Id(value)
    }
}

impl From<&str> for ProjectRef {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<String> for ProjectRef {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}
