//! Runtime capability contract.
//!
//! # Responsibility
//! - Describe every call the core makes into the external execution engine.
//! - Carry Runtime failures as opaque payloads.
//!
//! # Invariants
//! - The core never interprets a `RuntimeError`; it only relays it.
//! - Implementations own project storage; the core keeps no durable state.
//! - The project id is the isolation boundary between projects.

use crate::model::event::RawNotification;
use crate::model::node::{Directory, NodeId};
use crate::model::project::ProjectId;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod memory;

pub use memory::MemoryRuntime;

/// Result type for Runtime calls.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Callback the Runtime invokes once per raised notification.
pub type NotificationSink = Arc<dyn Fn(RawNotification) + Send + Sync>;

/// Failure reported by the Runtime.
///
/// The message is the Runtime's own diagnostic text and is displayed as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    message: String,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message.as_str())
    }
}

impl Error for RuntimeError {}

/// Capability set exposed by the execution engine.
///
/// Every call is a suspension point; pure tree lookups in the core never
/// go through this trait.
#[async_trait]
pub trait Runtime: Send + Sync {
    /// Engine version text.
    async fn version(&self) -> String;
    /// Drops compiled-code caches held by the engine.
    async fn clear_cache(&self) -> RuntimeResult<()>;

    /// Complete id -> name mapping.
    async fn list_projects(&self) -> RuntimeResult<BTreeMap<ProjectId, String>>;
    /// Exact, case-sensitive name lookup.
    async fn project_id(&self, name: &str) -> RuntimeResult<Option<ProjectId>>;
    /// Reverse lookup of a project name.
    async fn project_name(&self, project: ProjectId) -> RuntimeResult<Option<String>>;
    /// Allocates a new project and returns its id.
    async fn create_project(&self, name: &str) -> RuntimeResult<ProjectId>;
    async fn rename_project(&self, project: ProjectId, new_name: &str) -> RuntimeResult<()>;
    /// Deletes a project together with all of its nodes.
    async fn remove_project(&self, project: ProjectId) -> RuntimeResult<()>;

    /// Full recursive tree snapshot rooted at the project root.
    async fn fs_tree(&self, project: ProjectId) -> RuntimeResult<Directory>;
    /// Replaces the whole project tree in one call.
    async fn replace_fs_tree(&self, project: ProjectId, root: Directory) -> RuntimeResult<()>;
    async fn add_dir(&self, project: ProjectId, parent: NodeId, name: &str)
        -> RuntimeResult<NodeId>;
    async fn add_file(
        &self,
        project: ProjectId,
        parent: NodeId,
        name: &str,
    ) -> RuntimeResult<NodeId>;
    /// Renames a node and returns the name the Runtime stored.
    async fn rename_node(
        &self,
        project: ProjectId,
        node: NodeId,
        new_name: &str,
    ) -> RuntimeResult<String>;
    async fn remove_node(&self, project: ProjectId, node: NodeId) -> RuntimeResult<()>;
    async fn file_content(&self, project: ProjectId, file: NodeId) -> RuntimeResult<String>;
    async fn set_file_content(
        &self,
        project: ProjectId,
        file: NodeId,
        content: &str,
    ) -> RuntimeResult<()>;

    async fn build(&self, project: ProjectId) -> RuntimeResult<()>;
    async fn run_script(&self, project: ProjectId, command: &str) -> RuntimeResult<String>;
    async fn submit_transaction(&self, project: ProjectId, command: &str)
        -> RuntimeResult<String>;

    /// Installs the notification sink, replacing any previous one.
    async fn subscribe(&self, sink: NotificationSink) -> RuntimeResult<()>;
}
