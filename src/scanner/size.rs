//! Subtree size aggregation.
//!
//! Sizes are best-effort by contract: a node whose length or child listing
//! cannot be read contributes 0 instead of failing the walk. Storage
//! permissions or another process mutating the tree can legitimately make
//! any node unreadable mid-scan.

use crate::store::{FileNode, NodeKind};

/// Total bytes of the subtree rooted at `node`.
///
/// Files contribute their direct length; directories contribute the sum
/// over their children. Read failures contribute 0. Pure with respect to
/// the store and terminates on any finite tree.
pub fn aggregate_size(node: &dyn FileNode) -> u64 {
    match node.kind() {
        NodeKind::File => node.len().unwrap_or(0),
        NodeKind::Directory => match node.children() {
            Ok(children) => children
                .iter()
                .fold(0u64, |acc, c| acc.saturating_add(aggregate_size(c.as_ref()))),
            Err(_) => 0,
        },
    }
}

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable size, 1024-based, one decimal place: `"1.5 MB"`.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn format_size(size: u64) -> String {
    if size == 0 {
        return "0 B".to_string();
    }
    let group = ((size as f64).log2() / 10.0) as usize;
    let group = group.min(UNITS.len() - 1);
    let scaled = size as f64 / 1024f64.powi(group as i32);
    if group == 0 {
        format!("{size} B")
    } else {
        format!("{scaled:.1} {}", UNITS[group])
    }
}
