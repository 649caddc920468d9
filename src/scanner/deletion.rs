//! Deletion engine: primary/fallback removal with failure counting.
//!
//! Per entry: try the host store's native delete first; when that fails or
//! is unsupported for the node (a non-empty directory, typically), fall
//! back to a depth-first recursive delete, children before parent. A
//! fallback that fails partway leaves the partially-deleted subtree as-is
//! — deletion is not transactional and there is no rollback. Entries are
//! processed independently; one failure never aborts the batch.

use std::io;
use std::sync::Arc;

use crate::logger::audit::AuditLogHandle;
use crate::scanner::size::{aggregate_size, format_size};
use crate::store::{FileNode, NodeKind};

/// Names shown in a pre-delete summary before truncating.
const TOP_NAMES_SHOWN: usize = 6;

/// Counters and failure details for one deletion run. Immutable once
/// returned; `deleted + failed` always equals the number of entries given.
#[derive(Debug, Clone, Default)]
pub struct DeletionOutcome {
    /// Entries fully removed.
    pub deleted: usize,
    /// Entries that survived both the primary and the fallback path.
    pub failed: usize,
    /// One record per failed entry.
    pub failures: Vec<DeletionFailure>,
}

impl DeletionOutcome {
    /// The human-readable audit line for this outcome.
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!("Deleted:{} Failed:{}", self.deleted, self.failed)
    }
}

/// A single entry that could not be deleted.
#[derive(Debug, Clone)]
pub struct DeletionFailure {
    /// Display name of the entry, when the store knows one.
    pub name: Option<String>,
    /// Final error from the fallback path.
    pub error: String,
}

/// Advisory pre-delete summary for confirmation prompts.
///
/// Computed before `delete_all` and never re-validated at delete time, so
/// the byte figure can be stale relative to what is actually removed when
/// the store mutates concurrently. Accepted behavior, not a bug.
#[derive(Debug, Clone)]
pub struct DeletionSummary {
    /// Entries up for deletion.
    pub item_count: usize,
    /// Aggregated bytes across the candidate set at summary time.
    pub total_bytes: u64,
    /// Display names of the first entries, capped at six.
    pub top_names: Vec<String>,
}

impl DeletionSummary {
    /// Prompt text in the shape "N items totaling X".
    #[must_use]
    pub fn headline(&self) -> String {
        format!(
            "{} items totaling {}",
            self.item_count,
            format_size(self.total_bytes)
        )
    }
}

/// Deletes selected entries and counts outcomes.
pub struct DeletionEngine {
    audit: Option<AuditLogHandle>,
}

impl DeletionEngine {
    /// New engine; per-entry failures are reported through `audit` when
    /// one is given.
    #[must_use]
    pub fn new(audit: Option<AuditLogHandle>) -> Self {
        Self { audit }
    }

    /// Advisory size/name summary over the candidate set.
    #[must_use]
    pub fn summarize(entries: &[Arc<dyn FileNode>]) -> DeletionSummary {
        let total_bytes = entries
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(aggregate_size(e.as_ref())));
        let top_names = entries
            .iter()
            .take(TOP_NAMES_SHOWN)
            .map(|e| e.name().unwrap_or_else(|| "unknown".to_string()))
            .collect();
        DeletionSummary {
            item_count: entries.len(),
            total_bytes,
            top_names,
        }
    }

    /// Delete every entry, independently, and report what happened.
    ///
    /// Never returns an error: partial trouble is counted, not thrown.
    pub fn delete_all(&self, entries: &[Arc<dyn FileNode>]) -> DeletionOutcome {
        let mut outcome = DeletionOutcome::default();
        for entry in entries {
            match delete_entry(entry.as_ref()) {
                Ok(()) => outcome.deleted += 1,
                Err(err) => {
                    outcome.failed += 1;
                    let failure = DeletionFailure {
                        name: entry.name(),
                        error: err.to_string(),
                    };
                    if let Some(audit) = &self.audit {
                        audit.record(format!(
                            "DeleteFailed:{} {}",
                            failure.name.as_deref().unwrap_or("unknown"),
                            failure.error
                        ));
                    }
                    outcome.failures.push(failure);
                }
            }
        }
        outcome
    }
}

/// Primary delete, then the recursive fallback.
fn delete_entry(node: &dyn FileNode) -> io::Result<()> {
    match node.delete() {
        Ok(()) => Ok(()),
        Err(_) => delete_recursive(node),
    }
}

/// Depth-first removal: children before parent.
///
/// Child failures are tolerated while descending; a child left behind
/// surfaces as the parent's own delete failing on a non-empty directory,
/// which is the error the caller sees.
fn delete_recursive(node: &dyn FileNode) -> io::Result<()> {
    if node.kind() == NodeKind::Directory
        && let Ok(children) = node.children()
    {
        for child in children {
            let _ = delete_recursive(child.as_ref());
        }
    }
    node.delete()
}
