//! Filesystem node model.
//!
//! # Responsibility
//! - Mirror the Runtime's recursive project tree shape.
//! - Provide pure name/id lookups used by path resolution.
//!
//! # Invariants
//! - A directory never holds two children with the same name.
//! - Nodes decoded from a Runtime snapshot are `Confirmed`; descriptors
//!   minted from a creation call before the next reload are `Provisional`.

use serde::{Deserialize, Serialize};

/// Node identifier, unique within one project.
pub type NodeId = u64;

/// Id of the implicit root directory of a freshly created project.
pub const ROOT_DIR_ID: NodeId = 1;

/// Whether a descriptor has been observed in a Runtime tree snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    /// Built locally from a creation call; not yet seen in a reload.
    Provisional,
    /// Taken from an authoritative tree snapshot.
    #[default]
    Confirmed,
}

/// Leaf node holding one text blob in the Runtime content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub id: NodeId,
    pub name: String,
    #[serde(skip)]
    pub state: NodeState,
}

impl File {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            state: NodeState::Confirmed,
        }
    }

    pub fn provisional(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            state: NodeState::Provisional,
        }
    }

    pub fn is_provisional(&self) -> bool {
        self.state == NodeState::Provisional
    }
}

/// Directory node with children kept in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub list: Vec<FsNode>,
    #[serde(skip)]
    pub state: NodeState,
}

/// Tagged union as reported by the Runtime: `{"Dir": {..}}` or `{"File": {..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FsNode {
    Dir(Directory),
    File(File),
}

impl FsNode {
    pub fn id(&self) -> NodeId {
        match self {
            Self::Dir(dir) => dir.id,
            Self::File(file) => file.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Dir(dir) => dir.name.as_str(),
            Self::File(file) => file.name.as_str(),
        }
    }

    pub fn as_dir(&self) -> Option<&Directory> {
        match self {
            Self::Dir(dir) => Some(dir),
            Self::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&File> {
        match self {
            Self::File(file) => Some(file),
            Self::Dir(_) => None,
        }
    }
}

impl Directory {
    /// Creates an empty confirmed directory.
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            list: Vec::new(),
            state: NodeState::Confirmed,
        }
    }

    /// Creates an empty directory descriptor for a node the Runtime just
    /// allocated. Its child list is not fetched.
    pub fn provisional(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            state: NodeState::Provisional,
            ..Self::new(id, name)
        }
    }

    pub fn is_provisional(&self) -> bool {
        self.state == NodeState::Provisional
    }

    /// Direct child directory by name.
    pub fn child_dir(&self, name: &str) -> Option<&Directory> {
        self.list
            .iter()
            .filter_map(FsNode::as_dir)
            .find(|dir| dir.name == name)
    }

    /// Direct child file by name.
    pub fn child_file(&self, name: &str) -> Option<&File> {
        self.list
            .iter()
            .filter_map(FsNode::as_file)
            .find(|file| file.name == name)
    }

    /// Direct child of any kind by name.
    pub fn child(&self, name: &str) -> Option<&FsNode> {
        self.list.iter().find(|node| node.name() == name)
    }

    /// Depth-first directory lookup by id, including `self`.
    pub fn find_dir(&self, id: NodeId) -> Option<&Directory> {
        if self.id == id {
            return Some(self);
        }
        self.list
            .iter()
            .filter_map(FsNode::as_dir)
            .find_map(|dir| dir.find_dir(id))
    }

    /// Depth-first file lookup by id.
    pub fn find_file(&self, id: NodeId) -> Option<&File> {
        self.list.iter().find_map(|node| match node {
            FsNode::File(file) if file.id == id => Some(file),
            FsNode::File(_) => None,
            FsNode::Dir(dir) => dir.find_file(id),
        })
    }

    /// Slash-joined paths of every file below this directory, depth first.
    pub fn file_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_paths(self, "", &mut out);
        out
    }

    /// Largest node id in this subtree.
    pub fn max_id(&self) -> NodeId {
        self.list
            .iter()
            .map(|node| match node {
                FsNode::Dir(dir) => dir.max_id(),
                FsNode::File(file) => file.id,
            })
            .fold(self.id, NodeId::max)
    }
}

fn collect_paths(dir: &Directory, prefix: &str, out: &mut Vec<String>) {
    for node in &dir.list {
        let path = if prefix.is_empty() {
            node.name().to_string()
        } else {
            format!("{prefix}/{}", node.name())
        };
        match node {
            FsNode::File(_) => out.push(path),
            FsNode::Dir(child) => collect_paths(child, path.as_str(), out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Directory, File, FsNode, NodeState};

    fn sample_tree() -> Directory {
        let mut sources = Directory::new(2, "sources");
        sources.list.push(FsNode::File(File::new(5, "Coin.move")));
        let mut nested = Directory::new(3, "nested");
        nested.list.push(FsNode::File(File::new(6, "deep.move")));
        sources.list.push(FsNode::Dir(nested));

        let mut root = Directory::new(1, "demo");
        root.list.push(FsNode::Dir(sources));
        root.list.push(FsNode::Dir(Directory::new(4, "tests")));
        root
    }

    #[test]
    fn lookups_distinguish_kinds() {
        let root = sample_tree();
        let sources = root.child_dir("sources").expect("sources dir");
        assert!(sources.child_file("Coin.move").is_some());
        assert!(sources.child_dir("Coin.move").is_none());
        assert!(sources.child_file("nested").is_none());
        assert_eq!(sources.child("nested").map(FsNode::id), Some(3));
    }

    #[test]
    fn find_by_id_walks_the_whole_tree() {
        let root = sample_tree();
        assert_eq!(root.find_dir(1).map(|dir| dir.name.as_str()), Some("demo"));
        assert_eq!(root.find_dir(3).map(|dir| dir.name.as_str()), Some("nested"));
        assert_eq!(
            root.find_file(6).map(|file| file.name.as_str()),
            Some("deep.move")
        );
        assert!(root.find_file(3).is_none());
        assert_eq!(root.max_id(), 6);
    }

    #[test]
    fn file_paths_are_slash_joined() {
        let root = sample_tree();
        assert_eq!(
            root.file_paths(),
            vec!["sources/Coin.move".to_string(), "sources/nested/deep.move".to_string()]
        );
    }

    #[test]
    fn decodes_runtime_tree_shape_as_confirmed() {
        let raw = r#"{"Dir":{"id":1,"name":"demo","list":[
            {"File":{"id":2,"name":"a.move"}},
            {"Dir":{"id":3,"name":"scripts","list":[]}}
        ]}}"#;
        let node: FsNode = serde_json::from_str(raw).expect("tree should decode");
        let root = node.as_dir().expect("root is a directory");
        assert_eq!(root.list.len(), 2);
        assert_eq!(root.state, NodeState::Confirmed);
        assert!(!root.child_dir("scripts").expect("scripts").is_provisional());
    }

    #[test]
    fn provisional_descriptors_are_empty() {
        let dir = Directory::provisional(9, "fresh");
        assert!(dir.is_provisional());
        assert!(dir.list.is_empty());
        assert!(File::provisional(10, "x.move").is_provisional());
    }
}
