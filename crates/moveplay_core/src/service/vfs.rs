//! Virtual project filesystem.
//!
//! # Responsibility
//! - Resolve slash-separated paths to files, creating missing directories.
//! - Relay rename, remove and clear to the Runtime.
//! - Track staleness of the cached tree explicitly.
//!
//! # Invariants
//! - The Runtime is the single source of truth; the cache is a view.
//! - Every structural mutation marks the cache dirty.
//! - File creation forces a reload before returning.
//! - Directory lookups that hit a sibling in the given descriptor never call
//!   the Runtime.

use crate::model::node::{Directory, File, NodeId, ROOT_DIR_ID};
use crate::model::project::ProjectId;
use crate::runtime::{Runtime, RuntimeError};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Errors from filesystem operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    /// Path or name has an empty segment or embeds a separator.
    InvalidPath(String),
    /// Failure reported by the Runtime.
    Runtime(RuntimeError),
}

impl Display for FsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPath(path) => write!(f, "invalid path: `{path}`"),
            Self::Runtime(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Runtime(err) => Some(err),
            Self::InvalidPath(_) => None,
        }
    }
}

impl From<RuntimeError> for FsError {
    fn from(value: RuntimeError) -> Self {
        Self::Runtime(value)
    }
}

pub type FsResult<T> = Result<T, FsError>;

/// Per-project tree view over Runtime storage.
///
/// The cache belongs to this instance alone. Concurrent mutating calls
/// against the same project are not serialized here: two resolutions of
/// one path racing to create the same file are settled by the Runtime's
/// own sibling rules, and the loser sees a Runtime error.
pub struct VirtualFilesystem {
    runtime: Arc<dyn Runtime>,
    project: ProjectId,
    cache: Option<Directory>,
    dirty: bool,
}

impl VirtualFilesystem {
    /// Creates an unloaded view. The first `tree()` call fetches.
    pub fn new(runtime: Arc<dyn Runtime>, project: ProjectId) -> Self {
        Self {
            runtime,
            project,
            cache: None,
            dirty: true,
        }
    }

    pub fn project(&self) -> ProjectId {
        self.project
    }

    /// Whether the next `tree()` call will go to the Runtime.
    pub fn is_dirty(&self) -> bool {
        self.dirty || self.cache.is_none()
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Last fetched tree, possibly stale.
    pub fn cached(&self) -> Option<&Directory> {
        self.cache.as_ref()
    }

    /// Fetches the tree unconditionally.
    pub async fn reload(&mut self) -> FsResult<&Directory> {
        let root = self.runtime.fs_tree(self.project).await?;
        debug!(
            "event=fs_reload module=vfs status=ok project_id={} root_id={}",
            self.project, root.id
        );
        self.dirty = false;
        Ok(&*self.cache.insert(root))
    }

    /// Current tree, reloading first when dirty.
    pub async fn tree(&mut self) -> FsResult<&Directory> {
        if self.is_dirty() {
            self.reload().await?;
        }
        self.cache
            .as_ref()
            .ok_or_else(|| FsError::Runtime(RuntimeError::new("project tree is not loaded")))
    }

    pub async fn find_dir(&mut self, id: NodeId) -> FsResult<Option<Directory>> {
        Ok(self.tree().await?.find_dir(id).cloned())
    }

    pub async fn find_file(&mut self, id: NodeId) -> FsResult<Option<File>> {
        Ok(self.tree().await?.find_file(id).cloned())
    }

    /// Returns the child directory `name` of `parent`, creating it if absent.
    ///
    /// Children are looked up in `parent` first, then in the current tree,
    /// so a stale descriptor does not cause a duplicate creation. A created
    /// directory comes back provisional with an empty child list.
    pub async fn get_or_create_dir(
        &mut self,
        parent: &Directory,
        name: &str,
    ) -> FsResult<Directory> {
        validate_segment(name)?;
        if let Some(existing) = parent.child_dir(name) {
            return Ok(existing.clone());
        }
        let current = self.refreshed(parent).await?;
        if let Some(existing) = current.child_dir(name) {
            return Ok(existing.clone());
        }

        let id = self.runtime.add_dir(self.project, parent.id, name).await?;
        self.dirty = true;
        debug!(
            "event=fs_add_dir module=vfs status=ok project_id={} parent_id={} node_id={id}",
            self.project, parent.id
        );
        Ok(Directory::provisional(id, name))
    }

    /// Resolves `path` below `root` to a file, creating what is missing.
    ///
    /// # Errors
    /// - `FsError::InvalidPath` for an empty path or an empty segment.
    /// - `FsError::Runtime` when a creation call fails; the cached view is
    ///   left as it was, not rolled back.
    pub async fn resolve_path(&mut self, root: &Directory, path: &str) -> FsResult<File> {
        let (dirs, file_name) = split_path(path)?;

        let mut parent = root.clone();
        for segment in dirs {
            parent = self.get_or_create_dir(&parent, segment).await?;
        }

        if let Some(file) = parent.child_file(file_name) {
            return Ok(file.clone());
        }
        let parent = self.refreshed(&parent).await?;
        if let Some(file) = parent.child_file(file_name) {
            return Ok(file.clone());
        }

        let id = self.runtime.add_file(self.project, parent.id, file_name).await?;
        self.dirty = true;
        debug!(
            "event=fs_add_file module=vfs status=ok project_id={} parent_id={} node_id={id}",
            self.project, parent.id
        );

        let reloaded = self.reload().await?;
        Ok(match reloaded.find_file(id) {
            Some(file) => file.clone(),
            None => File::provisional(id, file_name),
        })
    }

    /// Current version of `dir` from the tree, or `dir` itself when the tree
    /// does not hold it yet. Provisional descriptors are returned as-is.
    async fn refreshed(&mut self, dir: &Directory) -> FsResult<Directory> {
        if dir.is_provisional() {
            return Ok(dir.clone());
        }
        Ok(self
            .tree()
            .await?
            .find_dir(dir.id)
            .cloned()
            .unwrap_or_else(|| dir.clone()))
    }

    /// Renames a file and returns `{id, confirmed name}` without reloading.
    pub async fn rename(&mut self, file: &File, new_name: &str) -> FsResult<File> {
        validate_segment(new_name)?;
        let confirmed = self
            .runtime
            .rename_node(self.project, file.id, new_name)
            .await?;
        self.dirty = true;
        debug!(
            "event=fs_rename module=vfs status=ok project_id={} node_id={}",
            self.project, file.id
        );
        Ok(File {
            id: file.id,
            name: confirmed,
            state: file.state,
        })
    }

    /// Removes a node. The cache is not pruned locally.
    pub async fn remove(&mut self, node: NodeId) -> FsResult<()> {
        self.runtime.remove_node(self.project, node).await?;
        self.dirty = true;
        debug!(
            "event=fs_remove module=vfs status=ok project_id={} node_id={node}",
            self.project
        );
        Ok(())
    }

    /// Replaces the whole tree with an empty root named `root_name`.
    pub async fn clear(&mut self, root_name: &str) -> FsResult<()> {
        let root_id = self.cache.as_ref().map_or(ROOT_DIR_ID, |root| root.id);
        self.runtime
            .replace_fs_tree(self.project, Directory::new(root_id, root_name))
            .await?;
        self.dirty = true;
        debug!(
            "event=fs_clear module=vfs status=ok project_id={}",
            self.project
        );
        Ok(())
    }
}

fn validate_segment(name: &str) -> FsResult<()> {
    if name.is_empty() || name.contains('/') {
        return Err(FsError::InvalidPath(name.to_string()));
    }
    Ok(())
}

/// Splits `path` into directory segments and the final file name.
fn split_path(path: &str) -> FsResult<(Vec<&str>, &str)> {
    let mut segments = path.split('/').collect::<Vec<_>>();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(FsError::InvalidPath(path.to_string()));
    }
    match segments.pop() {
        Some(file_name) => Ok((segments, file_name)),
        None => Err(FsError::InvalidPath(path.to_string())),
    }
}
