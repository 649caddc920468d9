//! Persisted root registry.
//!
//! Granted roots survive restarts as a single pipe-separated line in a
//! plain UTF-8 file under the data directory. The format is append-mostly
//! and parsed tolerantly: blank or malformed segments are skipped rather
//! than failing the whole list, so one bad entry never hides the rest.
//!
//! The registry owns root mutation; the scan/delete core only ever calls
//! [`RootRegistry::list_roots`]. An internal lock makes sure a scan never
//! observes a torn read while a root is being added or removed.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::core::errors::{Result, RswError};
use crate::core::paths::resolve_absolute_path;
use crate::store::Root;

/// Separator between persisted root locations.
const SEPARATOR: char = '|';

/// File-backed registry of granted roots.
pub struct RootRegistry {
    file: PathBuf,
    roots: RwLock<Vec<Root>>,
}

impl RootRegistry {
    /// Open the registry at `file`, loading any persisted roots.
    ///
    /// A missing file means no roots yet; that is not an error.
    pub fn open(file: impl Into<PathBuf>) -> Result<Self> {
        let file = file.into();
        let roots = if file.exists() {
            let raw = fs::read_to_string(&file).map_err(|e| RswError::io(&file, e))?;
            parse_roots(&raw)
        } else {
            Vec::new()
        };
        Ok(Self {
            file,
            roots: RwLock::new(roots),
        })
    }

    /// Snapshot of the granted roots, in grant order.
    #[must_use]
    pub fn list_roots(&self) -> Vec<Root> {
        self.roots.read().clone()
    }

    /// Grant a new root. The path is normalized to an absolute form;
    /// re-granting an already-known root is a no-op.
    pub fn add_root(&self, path: &Path) -> Result<Root> {
        let location = resolve_absolute_path(path).to_string_lossy().into_owned();
        if location.contains(SEPARATOR) {
            return Err(RswError::RegistryParse {
                details: format!("root location may not contain {SEPARATOR:?}: {location}"),
            });
        }
        let root = Root::new(location);

        let mut roots = self.roots.write();
        if !roots.contains(&root) {
            roots.push(root.clone());
            self.persist(&roots)?;
        }
        Ok(root)
    }

    /// Revoke a previously granted root. Unknown roots are ignored.
    pub fn remove_root(&self, root: &Root) -> Result<()> {
        let mut roots = self.roots.write();
        let before = roots.len();
        roots.retain(|r| r != root);
        if roots.len() != before {
            self.persist(&roots)?;
        }
        Ok(())
    }

    fn persist(&self, roots: &[Root]) -> Result<()> {
        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent).map_err(|e| RswError::io(parent, e))?;
        }
        let line = roots
            .iter()
            .map(Root::location)
            .collect::<Vec<_>>()
            .join(&SEPARATOR.to_string());
        fs::write(&self.file, line).map_err(|e| RswError::io(&self.file, e))
    }
}

fn parse_roots(raw: &str) -> Vec<Root> {
    raw.trim()
        .split(SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Root::new)
        .collect()
}
