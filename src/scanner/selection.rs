//! Selection bookkeeping over the current scan result.
//!
//! A selection is only meaningful against the result whose indices it was
//! built from, so every selection is tagged with the result version it
//! belongs to. Touching a selection with a result of a different version
//! discards the stale indices instead of letting them silently point at
//! the wrong entries.

use std::collections::BTreeSet;

use crate::scanner::scan::{ScanEntry, ScanResult};

/// Tracks which entries of the current [`ScanResult`] are marked for
/// deletion.
#[derive(Debug, Default)]
pub struct SelectionModel {
    version: Option<u64>,
    indices: BTreeSet<usize>,
}

impl SelectionModel {
    /// Empty selection bound to no result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the entry at `index` in `result`.
    ///
    /// A selection carried over from an older result is discarded first;
    /// an out-of-range index is ignored. Returns whether the entry is
    /// selected afterwards.
    pub fn toggle(&mut self, result: &ScanResult, index: usize) -> bool {
        self.rebind(result);
        if index >= result.entries().len() {
            return false;
        }
        if self.indices.remove(&index) {
            false
        } else {
            self.indices.insert(index);
            true
        }
    }

    /// The selected entries of `result`, in result order.
    ///
    /// Empty when the selection belongs to a different result version.
    #[must_use]
    pub fn selected_entries(&self, result: &ScanResult) -> Vec<ScanEntry> {
        if self.version != Some(result.version()) {
            return Vec::new();
        }
        self.indices
            .iter()
            .filter_map(|i| result.entries().get(*i).cloned())
            .collect()
    }

    /// Number of selected entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Drop the selection and its result binding.
    pub fn clear(&mut self) {
        self.version = None;
        self.indices.clear();
    }

    fn rebind(&mut self, result: &ScanResult) {
        if self.version != Some(result.version()) {
            self.indices.clear();
            self.version = Some(result.version());
        }
    }
}
