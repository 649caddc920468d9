//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, RswError};

/// Full rootsweep configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub scan: ScanConfig,
    pub paths: PathsConfig,
}

/// Scan behavior knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScanConfig {
    /// Worker threads used to size top-level entries in parallel.
    pub parallelism: usize,
}

/// Filesystem paths used by rootsweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    /// Persisted list of granted roots.
    pub roots_file: PathBuf,
    /// Primary append-only audit log.
    pub audit_log: PathBuf,
    /// Optional more-visible mirror of the audit log.
    ///
    /// `RSW_MIRROR_LOG=""` disables mirroring; absent keeps the default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror_log: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            parallelism: std::thread::available_parallelism()
                .map_or(2, |n| n.get().saturating_div(2).max(1)),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[RSW-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        let cfg = home_dir.join(".config").join("rootsweep").join("config.toml");
        let data = home_dir.join(".local").join("share").join("rootsweep");
        Self {
            config_file: cfg,
            roots_file: data.join("roots.list"),
            audit_log: data.join("cleanup_log.txt"),
            mirror_log: Some(data.join("cleanup_report.txt")),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from the default
    /// path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| RswError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(RswError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for audit records.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes and
    /// Rust releases (unlike `DefaultHasher`).
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_env_overrides_from(|name| env::var(name).ok())
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("RSW_SCAN_PARALLELISM") {
            self.scan.parallelism = raw.parse().map_err(|_| RswError::InvalidConfig {
                details: format!("RSW_SCAN_PARALLELISM must be a nonnegative integer, got {raw:?}"),
            })?;
        }
        if let Some(raw) = lookup("RSW_ROOTS_FILE")
            && !raw.is_empty()
        {
            self.paths.roots_file = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("RSW_AUDIT_LOG")
            && !raw.is_empty()
        {
            self.paths.audit_log = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("RSW_MIRROR_LOG") {
            self.paths.mirror_log = if raw.is_empty() {
                None
            } else {
                Some(PathBuf::from(raw))
            };
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.scan.parallelism == 0 {
            return Err(RswError::InvalidConfig {
                details: "scan.parallelism must be at least 1".to_string(),
            });
        }
        if self.paths.roots_file.as_os_str().is_empty() {
            return Err(RswError::InvalidConfig {
                details: "paths.roots_file must not be empty".to_string(),
            });
        }
        if self.paths.audit_log.as_os_str().is_empty() {
            return Err(RswError::InvalidConfig {
                details: "paths.audit_log must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
