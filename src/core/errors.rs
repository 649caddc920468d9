//! RSW-prefixed error types with structured error codes.
//!
//! The scan and deletion engines never surface these for partial trouble
//! (unreadable nodes, failed entries); errors exist for the edges only:
//! config loading, registry file I/O, and runtime wiring.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, RswError>;

/// Top-level error type for rootsweep.
#[derive(Debug, Error)]
pub enum RswError {
    #[error("[RSW-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[RSW-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[RSW-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[RSW-2001] root not resolvable: {location}")]
    RootUnresolvable { location: String },

    #[error("[RSW-2002] registry parse failure: {details}")]
    RegistryParse { details: String },

    #[error("[RSW-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[RSW-3001] permission denied for {path}")]
    PermissionDenied { path: PathBuf },

    #[error("[RSW-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[RSW-3003] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[RSW-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl RswError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "RSW-1001",
            Self::MissingConfig { .. } => "RSW-1002",
            Self::ConfigParse { .. } => "RSW-1003",
            Self::RootUnresolvable { .. } => "RSW-2001",
            Self::RegistryParse { .. } => "RSW-2002",
            Self::Serialization { .. } => "RSW-2101",
            Self::PermissionDenied { .. } => "RSW-3001",
            Self::Io { .. } => "RSW-3002",
            Self::ChannelClosed { .. } => "RSW-3003",
            Self::Runtime { .. } => "RSW-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::ChannelClosed { .. }
                | Self::RootUnresolvable { .. }
                | Self::Runtime { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for RswError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for RswError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
