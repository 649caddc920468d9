//! Capability-based view over an externally-managed hierarchical store.
//!
//! The scan and deletion engines only ever touch the store through
//! [`FileNode`] and [`NodeStore`], which keeps the recursive algorithms
//! independent of the host's access model and unit-testable against the
//! in-memory fake in [`memory`].

use std::io;
use std::sync::Arc;

pub mod fs;
pub mod memory;

/// What a node is. The aggregator and deletion engine pattern-match on
/// this instead of probing the node with runtime checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A regular file with a direct byte length.
    File,
    /// A directory whose children can be enumerated. Its direct length is
    /// meaningless.
    Directory,
}

/// A handle to a single entry (file or directory) reachable from a root.
///
/// Handles are transient: they are re-resolved on every scan and never
/// cached across scans. All operations may fail mid-scan when storage
/// permissions change or another process mutates the tree underneath us;
/// callers are expected to tolerate that per node, not abort.
pub trait FileNode: Send + Sync + std::fmt::Debug {
    /// Display name, if the store knows one.
    fn name(&self) -> Option<String>;

    /// File or directory.
    fn kind(&self) -> NodeKind;

    /// Direct byte length. Meaningful for [`NodeKind::File`] only.
    fn len(&self) -> io::Result<u64>;

    /// Enumerate immediate children, in the store's natural order.
    fn children(&self) -> io::Result<Vec<Arc<dyn FileNode>>>;

    /// The host store's native delete for this single node.
    ///
    /// This is the primary deletion path. It is allowed to fail for nodes
    /// the host cannot remove directly (a non-empty directory, say); the
    /// deletion engine then falls back to a recursive delete.
    fn delete(&self) -> io::Result<()>;
}

/// An opaque handle to a directory the user has granted access to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Root {
    location: String,
}

impl Root {
    /// Wrap a store-specific location string.
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// The store-specific location this root points at.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }
}

impl std::fmt::Display for Root {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.location)
    }
}

/// Resolves [`Root`] handles into live [`FileNode`]s.
pub trait NodeStore: Send + Sync {
    /// Resolve a root to its node. A root that has become inaccessible
    /// resolves to an error; the scanner treats that as skip, not fatal.
    fn resolve(&self, root: &Root) -> io::Result<Arc<dyn FileNode>>;
}
