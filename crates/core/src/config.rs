// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal configuration
//!
//! Loaded from TOML; durations use humantime notation (`"30s"`, `"2m"`):
//!
//! ```toml
//! path = "/var/lib/study/journal.log"
//! snapshot_interval = 1000
//!
//! [lock]
//! strategy = "symlink"
//! stale_threshold = "30s"   # default when omitted; "0s" disables reclaim
//! acquire_timeout = "2m"
//! initial_backoff = "1ms"
//! max_backoff = "1s"
//! ```

use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How the journal's critical section is guarded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockStrategy {
    /// Marker is a symlink created atomically next to the journal
    #[default]
    Symlink,
    /// Marker is a control file created with exclusive-create semantics
    Open,
}

/// Lock provider settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LockConfig {
    pub strategy: LockStrategy,
    /// How long a marker may sit unchanged before it is presumed abandoned;
    /// `None` (written `"0s"` in TOML) disables reclaim; omitted means the
    /// 30s default. Too short risks two holders; too long stalls acquirers
    /// after a crash.
    #[serde(with = "humantime_serde")]
    pub stale_threshold: Option<Duration>,
    /// Total time an acquirer waits before giving up with a timeout
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub initial_backoff: Duration,
    #[serde(with = "humantime_serde")]
    pub max_backoff: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            strategy: LockStrategy::Symlink,
            stale_threshold: Some(Duration::from_secs(30)),
            acquire_timeout: Duration::from_secs(120),
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_secs(1),
        }
    }
}

impl LockConfig {
    pub fn with_strategy(mut self, strategy: LockStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// A zero threshold is stored as `None`
    pub fn with_stale_threshold(mut self, threshold: Option<Duration>) -> Self {
        self.stale_threshold = threshold.filter(|t| !t.is_zero());
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn with_initial_backoff(mut self, delay: Duration) -> Self {
        self.initial_backoff = delay;
        self
    }

    pub fn with_max_backoff(mut self, delay: Duration) -> Self {
        self.max_backoff = delay;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_backoff.is_zero() {
            return Err(ConfigError::Invalid(
                "lock.initial_backoff must be positive".to_string(),
            ));
        }
        if self.max_backoff < self.initial_backoff {
            return Err(ConfigError::Invalid(
                "lock.max_backoff must not be shorter than lock.initial_backoff".to_string(),
            ));
        }
        if let Some(threshold) = self.stale_threshold {
            // otherwise a crashed holder can never be reclaimed before timeout
            if self.acquire_timeout <= threshold {
                return Err(ConfigError::Invalid(format!(
                    "lock.acquire_timeout ({}) must exceed lock.stale_threshold ({})",
                    humantime::format_duration(self.acquire_timeout),
                    humantime::format_duration(threshold),
                )));
            }
        }
        Ok(())
    }
}

/// Top-level journal configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JournalConfig {
    /// Journal data file; lock, commit index and snapshot live beside it
    pub path: PathBuf,
    /// Mutating records between snapshot attempts; omit to disable snapshots
    #[serde(default)]
    pub snapshot_interval: Option<NonZeroU64>,
    #[serde(default)]
    pub lock: LockConfig,
}

impl JournalConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            snapshot_interval: None,
            lock: LockConfig::default(),
        }
    }

    pub fn with_snapshot_interval(mut self, interval: NonZeroU64) -> Self {
        self.snapshot_interval = Some(interval);
        self
    }

    pub fn with_lock(mut self, lock: LockConfig) -> Self {
        self.lock = lock;
        self
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text)?;
        if config.lock.stale_threshold == Some(Duration::ZERO) {
            config.lock.stale_threshold = None;
        }
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// A relative `path` inside the file is resolved against the file's
    /// directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if config.path.is_relative() {
            if let Some(dir) = path.parent() {
                config.path = dir.join(&config.path);
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.file_name().is_none() {
            return Err(ConfigError::Invalid(format!(
                "path {} does not name a file",
                self.path.display()
            )));
        }
        self.lock.validate()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
