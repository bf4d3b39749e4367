//! Project registry service.
//!
//! # Responsibility
//! - Map project names to Runtime-assigned ids and back.
//! - Create, rename and remove projects through the Runtime.
//!
//! # Invariants
//! - Explicit creation of an existing name fails with `DuplicateName`.
//! - `open_or_create` never reports `DuplicateName` on its normal path.
//! - An unknown name resolves to `None`; that is not an error.
//!
//! The name check and the Runtime call are two separate suspension points.
//! A concurrent writer on the Runtime's project list can slip in between;
//! the Runtime is assumed to be single-writer per session.

use crate::model::project::{ProjectId, ProjectInfo};
use crate::runtime::{Runtime, RuntimeError};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Errors from registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Another project already uses this name.
    DuplicateName(String),
    /// Failure reported by the Runtime.
    Runtime(RuntimeError),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateName(name) => write!(f, "project already exists: {name}"),
            Self::Runtime(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Runtime(err) => Some(err),
            Self::DuplicateName(_) => None,
        }
    }
}

impl From<RuntimeError> for RegistryError {
    fn from(value: RuntimeError) -> Self {
        Self::Runtime(value)
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Name <-> id registry backed by the Runtime project list.
#[derive(Clone)]
pub struct ProjectRegistry {
    runtime: Arc<dyn Runtime>,
}

impl ProjectRegistry {
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self { runtime }
    }

    /// Returns every project ordered by id.
    pub async fn list(&self) -> RegistryResult<Vec<ProjectInfo>> {
        let projects = self.runtime.list_projects().await?;
        Ok(projects
            .into_iter()
            .map(|(id, name)| ProjectInfo { id, name })
            .collect())
    }

    /// Exact, case-sensitive lookup.
    pub async fn resolve(&self, name: &str) -> RegistryResult<Option<ProjectId>> {
        Ok(self.runtime.project_id(name).await?)
    }

    pub async fn name_of(&self, id: ProjectId) -> RegistryResult<Option<String>> {
        Ok(self.runtime.project_name(id).await?)
    }

    /// Creates a project under a name that must not exist yet.
    pub async fn create(&self, name: &str) -> RegistryResult<ProjectId> {
        if self.resolve(name).await?.is_some() {
            info!("event=project_create module=registry status=rejected reason=duplicate_name");
            return Err(RegistryError::DuplicateName(name.to_string()));
        }

        match self.runtime.create_project(name).await {
            Ok(id) => {
                info!("event=project_create module=registry status=ok project_id={id}");
                Ok(id)
            }
            Err(err) => {
                error!("event=project_create module=registry status=error error={err}");
                Err(err.into())
            }
        }
    }

    /// Resolves `name`, creating the project when it is unknown.
    pub async fn open_or_create(&self, name: &str) -> RegistryResult<ProjectId> {
        match self.resolve(name).await? {
            Some(id) => Ok(id),
            None => self.create(name).await,
        }
    }

    /// Renames a project. Renaming to the current name is a no-op.
    pub async fn rename(&self, id: ProjectId, new_name: &str) -> RegistryResult<()> {
        match self.resolve(new_name).await? {
            Some(existing) if existing == id => return Ok(()),
            Some(_) => return Err(RegistryError::DuplicateName(new_name.to_string())),
            None => {}
        }
        self.runtime.rename_project(id, new_name).await?;
        info!("event=project_rename module=registry status=ok project_id={id}");
        Ok(())
    }

    /// Deletes a project and all of its nodes.
    pub async fn remove(&self, id: ProjectId) -> RegistryResult<()> {
        self.runtime.remove_project(id).await?;
        info!("event=project_remove module=registry status=ok project_id={id}");
        Ok(())
    }
}
