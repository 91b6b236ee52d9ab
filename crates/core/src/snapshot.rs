// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot store contract
//!
//! A snapshot store holds one opaque blob: the latest checkpoint of state
//! rebuilt from the journal. It only accelerates reconstruction. The journal
//! stays the source of truth, so every snapshot failure is recoverable by
//! replaying from log number 0.

use std::num::NonZeroU64;
use thiserror::Error;

/// Raised by a loader when snapshot bytes are invalid or incompatible
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("snapshot cannot be restored: {reason}")]
pub struct SnapshotRestoreError {
    pub reason: String,
}

impl SnapshotRestoreError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors from the snapshot medium itself
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot backend unavailable: {0}")]
    BackendUnavailable(#[from] std::io::Error),
}

/// Result of [`SnapshotStore::load_snapshot`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotLoad {
    /// The loader accepted the stored blob
    Loaded,
    /// No snapshot has been saved
    Absent,
    /// A blob exists but is unusable; replay from log number 0
    Rejected(SnapshotRestoreError),
}

impl SnapshotLoad {
    pub fn is_loaded(&self) -> bool {
        matches!(self, SnapshotLoad::Loaded)
    }
}

/// Callback handed the stored bytes during a load
pub type SnapshotLoader<'a> = dyn FnMut(&[u8]) -> Result<(), SnapshotRestoreError> + 'a;

/// Single-slot, atomically replaced snapshot storage
pub trait SnapshotStore: Send + Sync {
    /// Mutating records the reconstructor should apply between snapshots
    fn snapshot_interval(&self) -> NonZeroU64;

    /// Replace the stored blob; readers never observe a partial write
    fn save_snapshot(&self, snapshot: &[u8]) -> Result<(), SnapshotError>;

    /// Hand the stored blob to `loader`, at most once
    ///
    /// A loader error is absorbed into [`SnapshotLoad::Rejected`]; it is an
    /// expected outcome, not a failure of the store.
    fn load_snapshot(&self, loader: &mut SnapshotLoader<'_>) -> Result<SnapshotLoad, SnapshotError>;
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for std::sync::Arc<T> {
    fn snapshot_interval(&self) -> NonZeroU64 {
        (**self).snapshot_interval()
    }

    fn save_snapshot(&self, snapshot: &[u8]) -> Result<(), SnapshotError> {
        (**self).save_snapshot(snapshot)
    }

    fn load_snapshot(&self, loader: &mut SnapshotLoader<'_>) -> Result<SnapshotLoad, SnapshotError> {
        (**self).load_snapshot(loader)
    }
}
