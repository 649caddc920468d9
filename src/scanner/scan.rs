//! Root scanning: enumerate top-level entries and rank them by size.
//!
//! One scan resolves each granted root, lists its immediate children (one
//! level only), sizes every child's full subtree, and publishes a single
//! sorted [`ScanResult`]. Sizing work fans out over a crossbeam worker
//! pool; results are re-keyed by encounter index before sorting, so the
//! parallelism is observable only as latency.
//!
//! Results carry a monotonically increasing version. Starting a new scan
//! bumps the scanner generation, which any in-flight scan observes and
//! answers with [`ScanOutcome::Cancelled`] — a result mixing entries from
//! two invocations cannot exist.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam_channel as channel;

use crate::scanner::size::aggregate_size;
use crate::store::{FileNode, NodeStore, Root};

/// A top-level child of a root paired with its aggregated subtree size.
#[derive(Clone)]
pub struct ScanEntry {
    /// Live handle to the entry, usable for deletion while this result is
    /// current.
    pub node: Arc<dyn FileNode>,
    /// Display name, if the store knows one.
    pub name: Option<String>,
    /// Aggregated subtree size in bytes, unreadable parts counted as 0.
    pub size_bytes: u64,
}

impl std::fmt::Debug for ScanEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanEntry")
            .field("name", &self.name)
            .field("size_bytes", &self.size_bytes)
            .finish_non_exhaustive()
    }
}

/// The ordered outcome of one scan invocation.
///
/// Entries are sorted by size descending; exact ties keep encounter order
/// (root grant order, then child enumeration order).
#[derive(Debug, Clone)]
pub struct ScanResult {
    version: u64,
    entries: Vec<ScanEntry>,
}

impl ScanResult {
    /// Version of the scan that produced this result. Selections are only
    /// valid against the matching version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Sorted entries.
    #[must_use]
    pub fn entries(&self) -> &[ScanEntry] {
        &self.entries
    }

    /// Whether the scan found nothing. Not an error condition: no roots
    /// and no children both land here.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How a scan invocation ended.
#[derive(Debug)]
pub enum ScanOutcome {
    /// The scan ran to completion and this result is current.
    Completed(ScanResult),
    /// A newer scan superseded this one (or `cancel` was called) before it
    /// finished; no result was published.
    Cancelled,
}

impl ScanOutcome {
    /// The completed result, if any.
    #[must_use]
    pub fn completed(self) -> Option<ScanResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Cancelled => None,
        }
    }
}

/// Scans granted roots and ranks their top-level entries by size.
pub struct TreeScanner<S> {
    store: S,
    parallelism: usize,
    generation: AtomicU64,
}

impl<S: NodeStore> TreeScanner<S> {
    /// New scanner over `store` sizing entries on `parallelism` workers.
    pub fn new(store: S, parallelism: usize) -> Self {
        Self {
            store,
            parallelism: parallelism.max(1),
            generation: AtomicU64::new(0),
        }
    }

    /// Cancel whatever scan is currently in flight.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Scan `roots` and produce a fresh, fully-replacing result.
    ///
    /// Roots that fail to resolve are skipped silently — a previously
    /// granted root may have become inaccessible, which is expected. An
    /// empty result is returned when there are no roots or no children.
    pub fn scan(&self, roots: &[Root]) -> ScanOutcome {
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        // Gather candidates one level deep, in encounter order.
        let mut candidates: Vec<Arc<dyn FileNode>> = Vec::new();
        for root in roots {
            if self.superseded(my_generation) {
                return ScanOutcome::Cancelled;
            }
            let Ok(node) = self.store.resolve(root) else {
                continue;
            };
            let Ok(children) = node.children() else {
                continue;
            };
            candidates.extend(children);
        }

        let Some(sizes) = self.size_candidates(&candidates, my_generation) else {
            return ScanOutcome::Cancelled;
        };

        let mut entries: Vec<ScanEntry> = candidates
            .into_iter()
            .zip(sizes)
            .map(|(node, size_bytes)| ScanEntry {
                name: node.name(),
                node,
                size_bytes,
            })
            .collect();

        // Stable sort: exact ties keep encounter order.
        entries.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));

        if self.superseded(my_generation) {
            return ScanOutcome::Cancelled;
        }
        ScanOutcome::Completed(ScanResult {
            version: my_generation,
            entries,
        })
    }

    /// Aggregate sizes for all candidates, keyed back to encounter index.
    /// Returns `None` when the scan was superseded mid-flight.
    fn size_candidates(
        &self,
        candidates: &[Arc<dyn FileNode>],
        my_generation: u64,
    ) -> Option<Vec<u64>> {
        let workers = self.parallelism.min(candidates.len());
        if workers <= 1 {
            let mut sizes = Vec::with_capacity(candidates.len());
            for node in candidates {
                if self.superseded(my_generation) {
                    return None;
                }
                sizes.push(aggregate_size(node.as_ref()));
            }
            return Some(sizes);
        }

        let (work_tx, work_rx) = channel::bounded::<(usize, Arc<dyn FileNode>)>(candidates.len());
        let (result_tx, result_rx) = channel::unbounded::<(usize, u64)>();
        for (idx, node) in candidates.iter().enumerate() {
            let _ = work_tx.send((idx, Arc::clone(node)));
        }
        drop(work_tx);

        let mut sizes = vec![0u64; candidates.len()];
        let mut received = 0usize;
        thread::scope(|scope| {
            for _ in 0..workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    while let Ok((idx, node)) = work_rx.recv() {
                        if self.superseded(my_generation) {
                            break;
                        }
                        let _ = result_tx.send((idx, aggregate_size(node.as_ref())));
                    }
                });
            }
            drop(result_tx);

            while let Ok((idx, size)) = result_rx.recv() {
                sizes[idx] = size;
                received += 1;
            }
        });

        if received == candidates.len() && !self.superseded(my_generation) {
            Some(sizes)
        } else {
            None
        }
    }

    fn superseded(&self, my_generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != my_generation
    }
}
