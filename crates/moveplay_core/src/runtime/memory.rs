//! In-process `Runtime` implementation.
//!
//! # Responsibility
//! - Hold project trees and file contents in memory.
//! - Stand in for the execution engine in the CLI probe and in tests.
//!
//! # Invariants
//! - Project ids and node ids are allocated monotonically and never reused.
//! - Every project root has id `ROOT_DIR_ID` and the project name.
//! - Sibling names are unique; colliding creation or rename fails.
//! - Notifications are raised outside the state lock.

use super::{NotificationSink, Runtime, RuntimeError, RuntimeResult};
use crate::model::event::RawNotification;
use crate::model::node::{Directory, File, FsNode, NodeId, NodeState, ROOT_DIR_ID};
use crate::model::project::ProjectId;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// Handler answering `run_script` and `submit_transaction` calls.
pub type ScriptHandler = Arc<dyn Fn(ProjectId, &str) -> RuntimeResult<String> + Send + Sync>;

const DEFAULT_VERSION: &str = "memory-0.1";

struct MemoryProject {
    name: String,
    root: Directory,
    contents: HashMap<NodeId, String>,
    next_node_id: NodeId,
}

impl MemoryProject {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            root: Directory::new(ROOT_DIR_ID, name),
            contents: HashMap::new(),
            next_node_id: ROOT_DIR_ID + 1,
        }
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }
}

struct MemoryState {
    projects: BTreeMap<ProjectId, MemoryProject>,
    next_project_id: ProjectId,
    sink: Option<NotificationSink>,
    build_failure: Option<String>,
    script_handler: Option<ScriptHandler>,
    mutations: u64,
    cache_clears: u64,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            projects: BTreeMap::new(),
            next_project_id: 1,
            sink: None,
            build_failure: None,
            script_handler: None,
            mutations: 0,
            cache_clears: 0,
        }
    }
}

impl MemoryState {
    fn project(&self, project: ProjectId) -> RuntimeResult<&MemoryProject> {
        self.projects
            .get(&project)
            .ok_or_else(|| RuntimeError::new(format!("project {project} not found")))
    }

    fn project_mut(&mut self, project: ProjectId) -> RuntimeResult<&mut MemoryProject> {
        self.projects
            .get_mut(&project)
            .ok_or_else(|| RuntimeError::new(format!("project {project} not found")))
    }

    fn name_taken(&self, name: &str, except: Option<ProjectId>) -> bool {
        self.projects
            .iter()
            .any(|(id, entry)| entry.name == name && Some(*id) != except)
    }
}

/// Memory-backed execution engine stand-in.
pub struct MemoryRuntime {
    version: String,
    state: Mutex<MemoryState>,
}

impl Default for MemoryRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self::with_version(DEFAULT_VERSION)
    }

    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Makes every following `build` fail with `message`.
    pub fn fail_builds_with(&self, message: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.build_failure = Some(message.into());
        }
    }

    pub fn clear_build_failure(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.build_failure = None;
        }
    }

    /// Installs the handler answering script runs and transactions.
    pub fn on_run(
        &self,
        handler: impl Fn(ProjectId, &str) -> RuntimeResult<String> + Send + Sync + 'static,
    ) {
        if let Ok(mut state) = self.state.lock() {
            state.script_handler = Some(Arc::new(handler));
        }
    }

    /// Raises one notification through the installed sink, if any.
    pub fn emit(&self, notification: RawNotification) {
        let sink = match self.state.lock() {
            Ok(state) => state.sink.clone(),
            Err(_) => None,
        };
        if let Some(sink) = sink {
            sink(notification);
        }
    }

    /// Number of structural mutations applied so far.
    pub fn mutation_count(&self) -> u64 {
        self.state.lock().map(|state| state.mutations).unwrap_or(0)
    }

    /// Number of `clear_cache` calls served so far.
    pub fn cache_clears(&self) -> u64 {
        self.state
            .lock()
            .map(|state| state.cache_clears)
            .unwrap_or(0)
    }

    fn lock(&self) -> RuntimeResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| RuntimeError::new("memory runtime state is poisoned"))
    }

    fn add_node(
        &self,
        project: ProjectId,
        parent: NodeId,
        name: &str,
        make: impl FnOnce(NodeId) -> FsNode,
    ) -> RuntimeResult<NodeId> {
        let mut state = self.lock()?;
        let entry = state.project_mut(project)?;
        let id = entry.next_node_id;
        let dir = find_dir_mut(&mut entry.root, parent)
            .ok_or_else(|| RuntimeError::new(format!("directory {parent} not found")))?;
        if dir.child(name).is_some() {
            return Err(RuntimeError::new(format!(
                "`{name}` already exists in directory {parent}"
            )));
        }
        dir.list.push(make(id));
        entry.allocate_id();
        state.mutations += 1;
        Ok(id)
    }

    fn run_handler(&self, project: ProjectId, command: &str) -> RuntimeResult<String> {
        let handler = {
            let state = self.lock()?;
            state.project(project)?;
            state.script_handler.clone()
        };
        match handler {
            Some(handler) => handler(project, command),
            None => Err(RuntimeError::new("no script runner installed")),
        }
    }
}

#[async_trait]
impl Runtime for MemoryRuntime {
    async fn version(&self) -> String {
        self.version.clone()
    }

    async fn clear_cache(&self) -> RuntimeResult<()> {
        self.lock()?.cache_clears += 1;
        Ok(())
    }

    async fn list_projects(&self) -> RuntimeResult<BTreeMap<ProjectId, String>> {
        let state = self.lock()?;
        Ok(state
            .projects
            .iter()
            .map(|(id, entry)| (*id, entry.name.clone()))
            .collect())
    }

    async fn project_id(&self, name: &str) -> RuntimeResult<Option<ProjectId>> {
        let state = self.lock()?;
        Ok(state
            .projects
            .iter()
            .find(|(_, entry)| entry.name == name)
            .map(|(id, _)| *id))
    }

    async fn project_name(&self, project: ProjectId) -> RuntimeResult<Option<String>> {
        let state = self.lock()?;
        Ok(state.projects.get(&project).map(|entry| entry.name.clone()))
    }

    async fn create_project(&self, name: &str) -> RuntimeResult<ProjectId> {
        let mut state = self.lock()?;
        if state.name_taken(name, None) {
            return Err(RuntimeError::new(format!("project `{name}` already exists")));
        }
        let id = state.next_project_id;
        state.next_project_id += 1;
        state.projects.insert(id, MemoryProject::new(name));
        Ok(id)
    }

    async fn rename_project(&self, project: ProjectId, new_name: &str) -> RuntimeResult<()> {
        let mut state = self.lock()?;
        if state.name_taken(new_name, Some(project)) {
            return Err(RuntimeError::new(format!(
                "project `{new_name}` already exists"
            )));
        }
        state.project_mut(project)?.name = new_name.to_string();
        Ok(())
    }

    async fn remove_project(&self, project: ProjectId) -> RuntimeResult<()> {
        let mut state = self.lock()?;
        state
            .projects
            .remove(&project)
            .map(|_| ())
            .ok_or_else(|| RuntimeError::new(format!("project {project} not found")))
    }

    async fn fs_tree(&self, project: ProjectId) -> RuntimeResult<Directory> {
        let state = self.lock()?;
        Ok(state.project(project)?.root.clone())
    }

    async fn replace_fs_tree(&self, project: ProjectId, mut root: Directory) -> RuntimeResult<()> {
        mark_confirmed(&mut root);
        let mut state = self.lock()?;
        let entry = state.project_mut(project)?;
        entry.next_node_id = entry.next_node_id.max(root.max_id() + 1);
        entry.contents.retain(|id, _| root.find_file(*id).is_some());
        entry.root = root;
        state.mutations += 1;
        Ok(())
    }

    async fn add_dir(
        &self,
        project: ProjectId,
        parent: NodeId,
        name: &str,
    ) -> RuntimeResult<NodeId> {
        self.add_node(project, parent, name, |id| {
            FsNode::Dir(Directory::new(id, name))
        })
    }

    async fn add_file(
        &self,
        project: ProjectId,
        parent: NodeId,
        name: &str,
    ) -> RuntimeResult<NodeId> {
        self.add_node(project, parent, name, |id| FsNode::File(File::new(id, name)))
    }

    async fn rename_node(
        &self,
        project: ProjectId,
        node: NodeId,
        new_name: &str,
    ) -> RuntimeResult<String> {
        let mut state = self.lock()?;
        let entry = state.project_mut(project)?;
        if node == entry.root.id {
            entry.root.name = new_name.to_string();
        } else {
            let parent = find_parent_mut(&mut entry.root, node)
                .ok_or_else(|| RuntimeError::new(format!("node {node} not found")))?;
            if parent
                .list
                .iter()
                .any(|child| child.id() != node && child.name() == new_name)
            {
                return Err(RuntimeError::new(format!(
                    "`{new_name}` already exists in directory {}",
                    parent.id
                )));
            }
            for child in parent.list.iter_mut().filter(|child| child.id() == node) {
                match child {
                    FsNode::Dir(dir) => dir.name = new_name.to_string(),
                    FsNode::File(file) => file.name = new_name.to_string(),
                }
            }
        }
        state.mutations += 1;
        Ok(new_name.to_string())
    }

    async fn remove_node(&self, project: ProjectId, node: NodeId) -> RuntimeResult<()> {
        let mut state = self.lock()?;
        let entry = state.project_mut(project)?;
        if node == entry.root.id {
            return Err(RuntimeError::new("cannot remove project root"));
        }
        let parent = find_parent_mut(&mut entry.root, node)
            .ok_or_else(|| RuntimeError::new(format!("node {node} not found")))?;
        parent.list.retain(|child| child.id() != node);
        let root = &entry.root;
        entry.contents.retain(|id, _| root.find_file(*id).is_some());
        state.mutations += 1;
        Ok(())
    }

    async fn file_content(&self, project: ProjectId, file: NodeId) -> RuntimeResult<String> {
        let state = self.lock()?;
        let entry = state.project(project)?;
        if entry.root.find_file(file).is_none() {
            return Err(RuntimeError::new(format!("file {file} not found")));
        }
        Ok(entry.contents.get(&file).cloned().unwrap_or_default())
    }

    async fn set_file_content(
        &self,
        project: ProjectId,
        file: NodeId,
        content: &str,
    ) -> RuntimeResult<()> {
        let mut state = self.lock()?;
        let entry = state.project_mut(project)?;
        if entry.root.find_file(file).is_none() {
            return Err(RuntimeError::new(format!("file {file} not found")));
        }
        entry.contents.insert(file, content.to_string());
        Ok(())
    }

    async fn build(&self, project: ProjectId) -> RuntimeResult<()> {
        let (name, failure) = {
            let state = self.lock()?;
            (state.project(project)?.name.clone(), state.build_failure.clone())
        };
        if let Some(message) = failure {
            return Err(RuntimeError::new(message));
        }
        let mut notification = RawNotification::new();
        notification.insert(
            "build".to_string(),
            Value::String(format!("project `{name}` built")),
        );
        self.emit(notification);
        Ok(())
    }

    async fn run_script(&self, project: ProjectId, command: &str) -> RuntimeResult<String> {
        self.run_handler(project, command)
    }

    async fn submit_transaction(
        &self,
        project: ProjectId,
        command: &str,
    ) -> RuntimeResult<String> {
        self.run_handler(project, command)
    }

    async fn subscribe(&self, sink: NotificationSink) -> RuntimeResult<()> {
        self.lock()?.sink = Some(sink);
        Ok(())
    }
}

fn find_dir_mut(dir: &mut Directory, id: NodeId) -> Option<&mut Directory> {
    if dir.id == id {
        return Some(dir);
    }
    dir.list.iter_mut().find_map(|node| match node {
        FsNode::Dir(child) => find_dir_mut(child, id),
        FsNode::File(_) => None,
    })
}

fn find_parent_mut(dir: &mut Directory, id: NodeId) -> Option<&mut Directory> {
    if dir.list.iter().any(|node| node.id() == id) {
        return Some(dir);
    }
    dir.list.iter_mut().find_map(|node| match node {
        FsNode::Dir(child) => find_parent_mut(child, id),
        FsNode::File(_) => None,
    })
}

fn mark_confirmed(dir: &mut Directory) {
    dir.state = NodeState::Confirmed;
    for node in &mut dir.list {
        match node {
            FsNode::Dir(child) => mark_confirmed(child),
            FsNode::File(file) => file.state = NodeState::Confirmed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryRuntime;
    use crate::model::node::{Directory, ROOT_DIR_ID};
    use crate::runtime::Runtime;

    #[tokio::test]
    async fn node_ids_are_not_reused_after_removal() {
        let runtime = MemoryRuntime::new();
        let project = runtime.create_project("demo").await.unwrap();
        let first = runtime.add_file(project, ROOT_DIR_ID, "a.move").await.unwrap();
        runtime.remove_node(project, first).await.unwrap();
        let second = runtime.add_file(project, ROOT_DIR_ID, "a.move").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn rejects_sibling_name_collision() {
        let runtime = MemoryRuntime::new();
        let project = runtime.create_project("demo").await.unwrap();
        runtime.add_dir(project, ROOT_DIR_ID, "scripts").await.unwrap();
        let err = runtime
            .add_file(project, ROOT_DIR_ID, "scripts")
            .await
            .unwrap_err();
        assert!(err.message().contains("already exists"));
    }

    #[tokio::test]
    async fn replace_tree_drops_orphan_contents() {
        let runtime = MemoryRuntime::new();
        let project = runtime.create_project("demo").await.unwrap();
        let file = runtime.add_file(project, ROOT_DIR_ID, "a.move").await.unwrap();
        runtime.set_file_content(project, file, "x").await.unwrap();

        runtime
            .replace_fs_tree(project, Directory::new(ROOT_DIR_ID, "demo"))
            .await
            .unwrap();
        assert!(runtime.file_content(project, file).await.is_err());
        let next = runtime.add_file(project, ROOT_DIR_ID, "a.move").await.unwrap();
        assert!(next > file);
    }

    #[tokio::test]
    async fn run_without_handler_fails() {
        let runtime = MemoryRuntime::new();
        let project = runtime.create_project("demo").await.unwrap();
        let err = runtime.run_script(project, "main()").await.unwrap_err();
        assert_eq!(err.message(), "no script runner installed");
    }
}
