//! Per-project facade.
//!
//! # Responsibility
//! - Bind one project id/name to its filesystem view.
//! - Guarantee the canonical `scripts`, `sources`, `tests` directories.
//! - Relay content, build, run and transaction calls to the Runtime.
//!
//! # Invariants
//! - Runtime failures are returned unchanged; only `DuplicateName`,
//!   `UnknownProject` and `InvalidPath` are detected locally.
//! - Canonical directory ids are cached; a cleared or externally removed
//!   directory is recreated on the next access.
//! - Content reads and writes always round-trip to the Runtime.

use crate::model::node::{Directory, File, NodeId};
use crate::model::project::{ProjectId, ProjectRef};
use crate::runtime::{Runtime, RuntimeError};
use crate::service::registry::{ProjectRegistry, RegistryError};
use crate::service::vfs::{FsError, VirtualFilesystem};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

/// Canonical top-level directory of every project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalDir {
    Scripts,
    /// Module sources.
    Sources,
    Tests,
}

impl CanonicalDir {
    pub const ALL: [Self; 3] = [Self::Scripts, Self::Tests, Self::Sources];

    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Scripts => "scripts",
            Self::Sources => "sources",
            Self::Tests => "tests",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CanonicalLayout {
    scripts: NodeId,
    sources: NodeId,
    tests: NodeId,
}

impl CanonicalLayout {
    fn get(&self, kind: CanonicalDir) -> NodeId {
        match kind {
            CanonicalDir::Scripts => self.scripts,
            CanonicalDir::Sources => self.sources,
            CanonicalDir::Tests => self.tests,
        }
    }
}

/// Errors from project facade operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectError {
    /// Explicit creation targeted an existing name.
    DuplicateName(String),
    /// Opening by id found no such project.
    UnknownProject(ProjectId),
    /// File path or name is malformed.
    InvalidPath(String),
    /// Failure reported by the Runtime, unchanged.
    Runtime(RuntimeError),
}

impl Display for ProjectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateName(name) => write!(f, "project already exists: {name}"),
            Self::UnknownProject(id) => write!(f, "project not found: {id}"),
            Self::InvalidPath(path) => write!(f, "invalid path: `{path}`"),
            Self::Runtime(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Runtime(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RuntimeError> for ProjectError {
    fn from(value: RuntimeError) -> Self {
        Self::Runtime(value)
    }
}

impl From<RegistryError> for ProjectError {
    fn from(value: RegistryError) -> Self {
        match value {
            RegistryError::DuplicateName(name) => Self::DuplicateName(name),
            RegistryError::Runtime(err) => Self::Runtime(err),
        }
    }
}

impl From<FsError> for ProjectError {
    fn from(value: FsError) -> Self {
        match value {
            FsError::InvalidPath(path) => Self::InvalidPath(path),
            FsError::Runtime(err) => Self::Runtime(err),
        }
    }
}

pub type ProjectResult<T> = Result<T, ProjectError>;

/// Entry point for one project.
pub struct ProjectFacade {
    id: ProjectId,
    name: String,
    runtime: Arc<dyn Runtime>,
    registry: ProjectRegistry,
    fs: VirtualFilesystem,
    layout: Option<CanonicalLayout>,
}

impl ProjectFacade {
    /// Opens a project by id or name.
    ///
    /// Names are opened or created; ids must exist.
    pub async fn open(
        runtime: Arc<dyn Runtime>,
        project: impl Into<ProjectRef>,
    ) -> ProjectResult<Self> {
        let registry = ProjectRegistry::new(Arc::clone(&runtime));
        let (id, name) = match project.into() {
            ProjectRef::Name(name) => (registry.open_or_create(name.as_str()).await?, name),
            ProjectRef::Id(id) => {
                let name = registry
                    .name_of(id)
                    .await?
                    .ok_or(ProjectError::UnknownProject(id))?;
                (id, name)
            }
        };
        Self::load(runtime, registry, id, name).await
    }

    /// Creates a new project; fails with `DuplicateName` when it exists.
    pub async fn create(runtime: Arc<dyn Runtime>, name: &str) -> ProjectResult<Self> {
        let registry = ProjectRegistry::new(Arc::clone(&runtime));
        let id = registry.create(name).await?;
        Self::load(runtime, registry, id, name.to_string()).await
    }

    async fn load(
        runtime: Arc<dyn Runtime>,
        registry: ProjectRegistry,
        id: ProjectId,
        name: String,
    ) -> ProjectResult<Self> {
        let mut facade = Self {
            id,
            name,
            fs: VirtualFilesystem::new(Arc::clone(&runtime), id),
            runtime,
            registry,
            layout: None,
        };
        facade.fs.reload().await?;
        facade.ensure_layout().await?;
        info!("event=project_open module=project status=ok project_id={id}");
        Ok(facade)
    }

    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Current tree snapshot, reloaded first when stale.
    pub async fn tree(&mut self) -> ProjectResult<Directory> {
        Ok(self.fs.tree().await?.clone())
    }

    /// Forces a reload of the cached tree.
    pub async fn reload(&mut self) -> ProjectResult<()> {
        self.fs.reload().await?;
        Ok(())
    }

    /// Whether the cached tree is known to be stale.
    pub fn is_stale(&self) -> bool {
        self.fs.is_dirty()
    }

    /// Current descriptor of one canonical directory, created if missing.
    pub async fn canonical_dir(&mut self, kind: CanonicalDir) -> ProjectResult<Directory> {
        let layout = self.ensure_layout().await?;
        let id = layout.get(kind);
        Ok(self
            .fs
            .find_dir(id)
            .await?
            .unwrap_or_else(|| Directory::provisional(id, kind.dir_name())))
    }

    pub async fn open_script(&mut self, path: &str) -> ProjectResult<File> {
        self.open_in(CanonicalDir::Scripts, path).await
    }

    pub async fn open_module(&mut self, path: &str) -> ProjectResult<File> {
        self.open_in(CanonicalDir::Sources, path).await
    }

    pub async fn open_test(&mut self, path: &str) -> ProjectResult<File> {
        self.open_in(CanonicalDir::Tests, path).await
    }

    pub async fn content(&self, file: &File) -> ProjectResult<String> {
        Ok(self.runtime.file_content(self.id, file.id).await?)
    }

    pub async fn set_content(&self, file: &File, content: &str) -> ProjectResult<()> {
        Ok(self
            .runtime
            .set_file_content(self.id, file.id, content)
            .await?)
    }

    pub async fn rename_file(&mut self, file: &File, new_name: &str) -> ProjectResult<File> {
        Ok(self.fs.rename(file, new_name).await?)
    }

    pub async fn remove_file(&mut self, file: &File) -> ProjectResult<()> {
        Ok(self.fs.remove(file.id).await?)
    }

    /// Wipes the whole tree, canonical directories included.
    pub async fn clear(&mut self) -> ProjectResult<()> {
        self.fs.clear(self.name.as_str()).await?;
        self.layout = None;
        info!(
            "event=project_clear module=project status=ok project_id={}",
            self.id
        );
        Ok(())
    }

    /// Renames the project itself.
    pub async fn rename(&mut self, new_name: &str) -> ProjectResult<()> {
        self.registry.rename(self.id, new_name).await?;
        self.name = new_name.to_string();
        Ok(())
    }

    pub async fn build(&self) -> ProjectResult<()> {
        let started_at = Instant::now();
        match self.runtime.build(self.id).await {
            Ok(()) => {
                info!(
                    "event=project_build module=project status=ok project_id={} duration_ms={}",
                    self.id,
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=project_build module=project status=error project_id={} duration_ms={}",
                    self.id,
                    started_at.elapsed().as_millis()
                );
                Err(err.into())
            }
        }
    }

    pub async fn run_script(&self, command: &str) -> ProjectResult<String> {
        self.runtime
            .run_script(self.id, command)
            .await
            .map_err(|err| self.relay_failure("project_run", err))
    }

    pub async fn submit_transaction(&self, command: &str) -> ProjectResult<String> {
        self.runtime
            .submit_transaction(self.id, command)
            .await
            .map_err(|err| self.relay_failure("project_tx", err))
    }

    /// Deletes this project through the registry.
    pub async fn remove(self) -> ProjectResult<()> {
        Ok(self.registry.remove(self.id).await?)
    }

    async fn open_in(&mut self, kind: CanonicalDir, path: &str) -> ProjectResult<File> {
        let dir = self.canonical_dir(kind).await?;
        Ok(self.fs.resolve_path(&dir, path).await?)
    }

    async fn ensure_layout(&mut self) -> ProjectResult<CanonicalLayout> {
        let root = self.fs.tree().await?.clone();
        if let Some(layout) = self.layout {
            let intact = CanonicalDir::ALL.iter().all(|kind| {
                root.list
                    .iter()
                    .filter_map(|node| node.as_dir())
                    .any(|dir| dir.id == layout.get(*kind) && dir.name == kind.dir_name())
            });
            if intact {
                return Ok(layout);
            }
        }

        let scripts = self.create_canonical(&root, CanonicalDir::Scripts).await?;
        let tests = self.create_canonical(&root, CanonicalDir::Tests).await?;
        let sources = self.create_canonical(&root, CanonicalDir::Sources).await?;
        let layout = CanonicalLayout {
            scripts,
            sources,
            tests,
        };
        self.layout = Some(layout);
        Ok(layout)
    }

    async fn create_canonical(
        &mut self,
        root: &Directory,
        kind: CanonicalDir,
    ) -> ProjectResult<NodeId> {
        Ok(self.fs.get_or_create_dir(root, kind.dir_name()).await?.id)
    }

    fn relay_failure(&self, event: &str, err: RuntimeError) -> ProjectError {
        error!(
            "event={event} module=project status=error project_id={}",
            self.id
        );
        ProjectError::Runtime(err)
    }
}
