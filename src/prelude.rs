//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use rootsweep::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, RswError};

// Store
pub use crate::store::{FileNode, NodeKind, NodeStore, Root};

// Registry
pub use crate::registry::RootRegistry;

// Scanner
pub use crate::scanner::deletion::{DeletionEngine, DeletionOutcome, DeletionSummary};
pub use crate::scanner::scan::{ScanEntry, ScanOutcome, ScanResult, TreeScanner};
pub use crate::scanner::selection::SelectionModel;
pub use crate::scanner::size::{aggregate_size, format_size};

// Logger
pub use crate::logger::audit::{AuditLog, AuditLogHandle, spawn_audit_logger};
