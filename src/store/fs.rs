//! Real-filesystem adapter for the node store traits.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::store::{FileNode, NodeKind, NodeStore, Root};

/// Node store backed by the local filesystem.
///
/// Symlinks are never followed: kinds and lengths come from `lstat`, so a
/// symlink presents as a zero-contribution file and deleting it removes
/// the link, not the target. That also guarantees traversal sees a tree,
/// never a cycle.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStore;

impl NodeStore for FsStore {
    fn resolve(&self, root: &Root) -> io::Result<Arc<dyn FileNode>> {
        let path = PathBuf::from(root.location());
        let meta = fs::symlink_metadata(&path)?;
        if !meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("root is not a directory: {}", path.display()),
            ));
        }
        Ok(Arc::new(FsNode { path }))
    }
}

/// A single filesystem entry.
#[derive(Debug)]
pub struct FsNode {
    path: PathBuf,
}

impl FsNode {
    /// Wrap an existing path. Kind is probed lazily per operation.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing path for this node.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_dir(&self) -> bool {
        fs::symlink_metadata(&self.path).is_ok_and(|m| m.is_dir())
    }
}

impl FileNode for FsNode {
    fn name(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }

    fn kind(&self) -> NodeKind {
        if self.is_dir() {
            NodeKind::Directory
        } else {
            NodeKind::File
        }
    }

    fn len(&self) -> io::Result<u64> {
        let meta = fs::symlink_metadata(&self.path)?;
        if meta.is_file() {
            Ok(meta.len())
        } else {
            // Symlinks and specials contribute nothing.
            Ok(0)
        }
    }

    fn children(&self) -> io::Result<Vec<Arc<dyn FileNode>>> {
        let mut out: Vec<Arc<dyn FileNode>> = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            out.push(Arc::new(Self { path: entry.path() }));
        }
        // read_dir order is platform-dependent; fix it so encounter order
        // (and with it tie-breaking downstream) is reproducible.
        out.sort_by_key(|n| n.name().unwrap_or_default());
        Ok(out)
    }

    fn delete(&self) -> io::Result<()> {
        // Native single-node delete only. remove_dir refuses a non-empty
        // directory, which is exactly what routes such entries to the
        // deletion engine's recursive fallback.
        if self.is_dir() {
            fs::remove_dir(&self.path)
        } else {
            fs::remove_file(&self.path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(path: &Path, len: usize) {
        fs::write(path, vec![b'x'; len]).unwrap();
    }

    #[test]
    fn resolve_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        write_file(&file, 4);

        let store = FsStore;
        assert!(
            store
                .resolve(&Root::new(dir.path().to_string_lossy()))
                .is_ok()
        );
        assert!(store.resolve(&Root::new(file.to_string_lossy())).is_err());
        assert!(store.resolve(&Root::new("/definitely/not/here")).is_err());
    }

    #[test]
    fn file_node_reports_kind_and_len() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.bin");
        write_file(&file, 42);

        let node = FsNode::new(&file);
        assert_eq!(node.kind(), NodeKind::File);
        assert_eq!(node.len().unwrap(), 42);
        assert_eq!(node.name().as_deref(), Some("data.bin"));
    }

    #[test]
    fn children_are_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("b.txt"), 1);
        write_file(&dir.path().join("a.txt"), 1);
        fs::create_dir(dir.path().join("c")).unwrap();

        let node = FsNode::new(dir.path());
        assert_eq!(node.kind(), NodeKind::Directory);
        let names: Vec<_> = node
            .children()
            .unwrap()
            .iter()
            .map(|c| c.name().unwrap())
            .collect();
        assert_eq!(names, ["a.txt", "b.txt", "c"]);
    }

    #[test]
    fn delete_removes_file_but_not_nonempty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("gone.txt");
        write_file(&file, 3);
        let full = dir.path().join("full");
        fs::create_dir(&full).unwrap();
        write_file(&full.join("inner.txt"), 3);

        FsNode::new(&file).delete().unwrap();
        assert!(!file.exists());

        // Non-empty directory must fail the primary delete.
        assert!(FsNode::new(&full).delete().is_err());
        assert!(full.exists());

        fs::remove_file(full.join("inner.txt")).unwrap();
        FsNode::new(&full).delete().unwrap();
        assert!(!full.exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_is_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target.txt");
        write_file(&target, 100);
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let node = FsNode::new(&link);
        assert_eq!(node.kind(), NodeKind::File);
        assert_eq!(node.len().unwrap(), 0);

        node.delete().unwrap();
        assert!(!link.exists());
        assert!(target.exists(), "delete must remove the link, not the target");
    }
}
