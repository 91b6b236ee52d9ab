// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-process mutual exclusion for journal critical sections
//!
//! This module provides:
//! - **JournalLock** - the lock provider contract, implemented by marker strategies
//! - **LockGuard** - scoped ownership of a lock token
//! - **StaleTracker** - detection of markers abandoned by crashed holders
//! - **Backoff** - bounded exponential wait between acquisition attempts

pub mod backoff;
pub mod stale;

pub use backoff::Backoff;
pub use stale::{MarkerFingerprint, StaleTracker, StaleVerdict};

use crate::journal::format_wait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors from lock providers
#[derive(Debug, Error)]
pub enum LockError {
    #[error("timed out after {} waiting for lock {}", format_wait(.waited), .resource.display())]
    Timeout { resource: PathBuf, waited: Duration },
    #[error("lock IO error: {0}")]
    Io(#[from] io::Error),
    #[error("lock {} is not held by this token", .resource.display())]
    NotHeld { resource: PathBuf },
}

/// Identity of a lock holder, recorded inside the marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockOwner {
    pub pid: u32,
    pub host: String,
    /// Unique per acquisition; two tokens are the same iff nonces match
    pub nonce: String,
    pub acquired_at: DateTime<Utc>,
}

impl LockOwner {
    /// Identity for a fresh acquisition by this process
    pub fn current() -> Self {
        Self {
            pid: std::process::id(),
            host: host_name(),
            nonce: uuid::Uuid::new_v4().to_string(),
            acquired_at: Utc::now(),
        }
    }

    /// Serialize to the single-line marker payload
    pub fn to_marker(&self) -> io::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a marker payload; `None` for empty or foreign content
    pub fn from_marker(text: &str) -> Option<Self> {
        serde_json::from_str(text.trim()).ok()
    }
}

impl std::fmt::Display for LockOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pid {}@{} ({})", self.pid, self.host, self.nonce)
    }
}

fn host_name() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/proc/sys/kernel/hostname").ok())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Proof of one successful acquisition
#[derive(Debug, Clone)]
pub struct LockToken {
    owner: LockOwner,
}

impl LockToken {
    pub fn new(owner: LockOwner) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> &LockOwner {
        &self.owner
    }

    /// Whether a marker payload names this token
    pub fn matches_marker(&self, text: &str) -> bool {
        LockOwner::from_marker(text).is_some_and(|owner| owner.nonce == self.owner.nonce)
    }
}

impl PartialEq for LockToken {
    fn eq(&self, other: &Self) -> bool {
        self.owner.nonce == other.owner.nonce
    }
}

impl Eq for LockToken {}

/// Lock provider over one named resource
///
/// Usable by processes that share nothing but the storage medium. At most one
/// live token exists per resource outside of crash recovery.
pub trait JournalLock: Send + Sync {
    /// Path of the marker that identifies the lock
    fn resource(&self) -> &Path;

    /// Block (with bounded backoff) until the lock is granted
    fn acquire(&self) -> Result<LockToken, LockError>;

    /// Give the lock back; `NotHeld` if the marker no longer names `token`
    fn release(&self, token: &LockToken) -> Result<(), LockError>;

    /// Whether the marker still names `token`
    fn holds(&self, token: &LockToken) -> Result<bool, LockError>;
}

/// A critical section; the lock is released when the guard goes away
pub struct LockGuard<'a> {
    lock: &'a dyn JournalLock,
    token: LockToken,
    released: bool,
}

impl<'a> LockGuard<'a> {
    pub fn acquire(lock: &'a dyn JournalLock) -> Result<Self, LockError> {
        let token = lock.acquire()?;
        Ok(Self {
            lock,
            token,
            released: false,
        })
    }

    pub fn token(&self) -> &LockToken {
        &self.token
    }

    /// Whether the lock is still ours (it may have been reclaimed as stale)
    pub fn holds(&self) -> Result<bool, LockError> {
        self.lock.holds(&self.token)
    }

    /// Release now, surfacing any failure
    pub fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        self.lock.release(&self.token)
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.lock.release(&self.token) {
            tracing::warn!(
                resource = %self.lock.resource().display(),
                error = %e,
                "failed to release journal lock"
            );
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
