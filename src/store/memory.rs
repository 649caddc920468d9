//! In-memory fake node store with fault injection.
//!
//! Backs the unit and integration tests: trees are built programmatically,
//! individual nodes can be marked unreadable (length/enumeration fails) or
//! undeletable (locked), and deletions mutate the shared tree so tests can
//! assert exactly which nodes survived.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::store::{FileNode, NodeKind, NodeStore, Root};

/// Identity of a node inside a [`MemoryStore`].
pub type NodeId = u64;

#[derive(Debug)]
enum MemKind {
    File { len: u64 },
    Dir { children: Vec<NodeId> },
}

#[derive(Debug)]
struct MemRecord {
    name: String,
    parent: Option<NodeId>,
    kind: MemKind,
    unreadable: bool,
    undeletable: bool,
}

#[derive(Debug, Default)]
struct Tree {
    next: NodeId,
    nodes: HashMap<NodeId, MemRecord>,
    roots: HashMap<String, NodeId>,
}

/// Shared, mutable in-memory tree implementing [`NodeStore`].
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tree: Arc<RwLock<Tree>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory node and register it as a resolvable root.
    pub fn add_root(&self, location: &str) -> NodeId {
        let mut tree = self.tree.write();
        let id = tree.insert(MemRecord {
            name: location.to_string(),
            parent: None,
            kind: MemKind::Dir {
                children: Vec::new(),
            },
            unreadable: false,
            undeletable: false,
        });
        tree.roots.insert(location.to_string(), id);
        id
    }

    /// Add a subdirectory under `parent`, in encounter order.
    pub fn add_dir(&self, parent: NodeId, name: &str) -> NodeId {
        self.add_child(
            parent,
            MemRecord {
                name: name.to_string(),
                parent: Some(parent),
                kind: MemKind::Dir {
                    children: Vec::new(),
                },
                unreadable: false,
                undeletable: false,
            },
        )
    }

    /// Add a file of `len` bytes under `parent`, in encounter order.
    pub fn add_file(&self, parent: NodeId, name: &str, len: u64) -> NodeId {
        self.add_child(
            parent,
            MemRecord {
                name: name.to_string(),
                parent: Some(parent),
                kind: MemKind::File { len },
                unreadable: false,
                undeletable: false,
            },
        )
    }

    /// Make length reads and child enumeration fail for this node.
    pub fn mark_unreadable(&self, id: NodeId) {
        if let Some(rec) = self.tree.write().nodes.get_mut(&id) {
            rec.unreadable = true;
        }
    }

    /// Make the native delete fail for this node, simulating a lock.
    pub fn mark_undeletable(&self, id: NodeId) {
        if let Some(rec) = self.tree.write().nodes.get_mut(&id) {
            rec.undeletable = true;
        }
    }

    /// Whether the node still exists in the tree.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.tree.read().nodes.contains_key(&id)
    }

    /// Total live node count, roots included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.tree.read().nodes.len()
    }

    /// Drop a root registration without touching its subtree, simulating a
    /// grant that has been revoked since it was persisted.
    pub fn revoke_root(&self, location: &str) {
        self.tree.write().roots.remove(location);
    }

    /// Node handle for direct use in tests.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Arc<dyn FileNode> {
        Arc::new(MemNode {
            tree: Arc::clone(&self.tree),
            id,
        })
    }

    fn add_child(&self, parent: NodeId, record: MemRecord) -> NodeId {
        let mut tree = self.tree.write();
        let id = tree.insert(record);
        if let Some(MemRecord {
            kind: MemKind::Dir { children },
            ..
        }) = tree.nodes.get_mut(&parent)
        {
            children.push(id);
        }
        id
    }
}

impl Tree {
    fn insert(&mut self, record: MemRecord) -> NodeId {
        let id = self.next;
        self.next += 1;
        self.nodes.insert(id, record);
        id
    }
}

impl NodeStore for MemoryStore {
    fn resolve(&self, root: &Root) -> io::Result<Arc<dyn FileNode>> {
        let tree = self.tree.read();
        let id = tree.roots.get(root.location()).copied().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no grant for root {}", root.location()),
            )
        })?;
        drop(tree);
        Ok(Arc::new(MemNode {
            tree: Arc::clone(&self.tree),
            id,
        }))
    }
}

#[derive(Debug)]
struct MemNode {
    tree: Arc<RwLock<Tree>>,
    id: NodeId,
}

impl MemNode {
    fn gone() -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, "node no longer exists")
    }

    fn locked() -> io::Error {
        io::Error::new(io::ErrorKind::PermissionDenied, "node is locked")
    }
}

impl FileNode for MemNode {
    fn name(&self) -> Option<String> {
        self.tree.read().nodes.get(&self.id).map(|r| r.name.clone())
    }

    fn kind(&self) -> NodeKind {
        match self.tree.read().nodes.get(&self.id) {
            Some(MemRecord {
                kind: MemKind::Dir { .. },
                ..
            }) => NodeKind::Directory,
            _ => NodeKind::File,
        }
    }

    fn len(&self) -> io::Result<u64> {
        let tree = self.tree.read();
        let rec = tree.nodes.get(&self.id).ok_or_else(Self::gone)?;
        if rec.unreadable {
            return Err(Self::locked());
        }
        match &rec.kind {
            MemKind::File { len } => Ok(*len),
            MemKind::Dir { .. } => Ok(0),
        }
    }

    fn children(&self) -> io::Result<Vec<Arc<dyn FileNode>>> {
        let tree = self.tree.read();
        let rec = tree.nodes.get(&self.id).ok_or_else(Self::gone)?;
        if rec.unreadable {
            return Err(Self::locked());
        }
        match &rec.kind {
            MemKind::File { .. } => Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                "file has no children",
            )),
            MemKind::Dir { children } => Ok(children
                .iter()
                .map(|id| {
                    Arc::new(MemNode {
                        tree: Arc::clone(&self.tree),
                        id: *id,
                    }) as Arc<dyn FileNode>
                })
                .collect()),
        }
    }

    fn delete(&self) -> io::Result<()> {
        let mut tree = self.tree.write();
        let rec = tree.nodes.get(&self.id).ok_or_else(Self::gone)?;
        if rec.undeletable {
            return Err(Self::locked());
        }
        // Native delete handles single nodes only; a populated directory
        // must be emptied first, exactly like remove_dir on a real fs.
        if let MemKind::Dir { children } = &rec.kind
            && !children.is_empty()
        {
            return Err(io::Error::new(
                io::ErrorKind::DirectoryNotEmpty,
                "directory not empty",
            ));
        }
        let parent = rec.parent;
        tree.nodes.remove(&self.id);
        if let Some(parent_id) = parent
            && let Some(MemRecord {
                kind: MemKind::Dir { children },
                ..
            }) = tree.nodes.get_mut(&parent_id)
        {
            children.retain(|c| *c != self.id);
        }
        tree.roots.retain(|_, id| *id != self.id);
        Ok(())
    }
}
