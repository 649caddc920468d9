//! Scan engine: size aggregation, root scanning, selection, deletion.

pub mod deletion;
pub mod scan;
pub mod selection;
pub mod size;
