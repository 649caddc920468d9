#![forbid(unsafe_code)]

//! rootsweep — scan user-granted root directories, rank their top-level
//! entries by subtree size, and delete the selected ones.
//!
//! The engine is deliberately failure-tolerant: unreadable nodes size as 0,
//! unresolvable roots are skipped, failed deletions are counted instead of
//! thrown, and every deletion run leaves a best-effort audit record.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use rootsweep::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use rootsweep::scanner::scan::TreeScanner;
//! use rootsweep::store::fs::FsStore;
//! ```

pub mod prelude;

pub mod core;
pub mod logger;
pub mod registry;
pub mod scanner;
pub mod store;
