// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State reconstruction from snapshot plus journal replay
//!
//! ```text
//! SnapshotStore::load_snapshot ─► SnapshotEnvelope { log_number_read: L, state }
//!                                              │ (absent or rejected → L = 0, empty state)
//!                                              ▼
//! JournalBackend::read_logs(L) ─► ReplayState::apply, in log-number order
//!                                              │ every `snapshot_interval` mutations
//!                                              ▼
//!                                SnapshotStore::save_snapshot
//! ```
//!
//! The resume position always comes from the envelope itself, never from
//! when the snapshot was written.

use crate::journal::{JournalBackend, JournalError};
use crate::record::{LogNumber, LogRecord};
use crate::snapshot::{SnapshotError, SnapshotLoad, SnapshotRestoreError, SnapshotStore};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Whether a record changed state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Mutated,
    Skipped,
}

/// Domain state rebuilt from records
///
/// `apply` must be deterministic: the same records in the same order always
/// produce the same state. Records the state does not understand should be
/// skipped, not rejected.
pub trait ReplayState: Default + Serialize + DeserializeOwned {
    fn apply(&mut self, log_number: LogNumber, record: &LogRecord) -> Applied;
}

/// Snapshot blob layout: state plus the log position it reflects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEnvelope<S> {
    pub version: u32,
    /// Records `0..log_number_read` are folded into `state`
    pub log_number_read: LogNumber,
    pub state: S,
}

/// Current version of the snapshot envelope
pub const SNAPSHOT_VERSION: u32 = 1;

/// Replays a journal into a [`ReplayState`] and checkpoints it
#[derive(Debug, Default)]
pub struct Reconstructor<S> {
    state: S,
    log_number_read: LogNumber,
    mutations_since_snapshot: u64,
}

impl<S: ReplayState> Reconstructor<S> {
    pub fn new() -> Self {
        Self {
            state: S::default(),
            log_number_read: 0,
            mutations_since_snapshot: 0,
        }
    }

    /// Rebuild state: seed from a usable snapshot if any, then replay the tail
    pub fn cold_start<J: JournalBackend + ?Sized>(
        journal: &J,
        snapshots: Option<&dyn SnapshotStore>,
    ) -> Result<Self, JournalError> {
        let mut reconstructor = Self::new();
        if let Some(store) = snapshots {
            reconstructor.restore(store);
        }
        reconstructor.sync(journal)?;
        Ok(reconstructor)
    }

    /// Try to seed from `store`; on any failure state stays empty at log 0
    pub fn restore(&mut self, store: &dyn SnapshotStore) -> bool {
        let mut restored = None;
        let outcome = store.load_snapshot(&mut |bytes| {
            restored = Some(Self::decode_snapshot(bytes)?);
            Ok(())
        });

        match (outcome, restored) {
            (Ok(SnapshotLoad::Loaded), Some(envelope)) => {
                tracing::debug!(
                    log_number_read = envelope.log_number_read,
                    "restored state from snapshot"
                );
                self.state = envelope.state;
                self.log_number_read = envelope.log_number_read;
                self.mutations_since_snapshot = 0;
                true
            }
            (Ok(SnapshotLoad::Rejected(e)), _) => {
                tracing::warn!(error = %e, "ignoring unusable snapshot, replaying from log 0");
                false
            }
            (Err(e), _) => {
                tracing::warn!(error = %e, "snapshot unavailable, replaying from log 0");
                false
            }
            _ => false,
        }
    }

    /// Parse and version-check a snapshot blob
    pub fn decode_snapshot(bytes: &[u8]) -> Result<SnapshotEnvelope<S>, SnapshotRestoreError> {
        let envelope: SnapshotEnvelope<S> = serde_json::from_slice(bytes)
            .map_err(|e| SnapshotRestoreError::new(format!("undecodable snapshot: {e}")))?;
        if envelope.version != SNAPSHOT_VERSION {
            return Err(SnapshotRestoreError::new(format!(
                "unsupported snapshot version {} (expected {})",
                envelope.version, SNAPSHOT_VERSION
            )));
        }
        Ok(envelope)
    }

    /// Apply every record not yet seen; returns how many were read
    pub fn sync<J: JournalBackend + ?Sized>(&mut self, journal: &J) -> Result<usize, JournalError> {
        let logs = journal.read_logs(self.log_number_read)?;
        for log in &logs {
            if self.state.apply(self.log_number_read, log) == Applied::Mutated {
                self.mutations_since_snapshot += 1;
            }
            self.log_number_read += 1;
        }
        if !logs.is_empty() {
            tracing::debug!(
                count = logs.len(),
                log_number_read = self.log_number_read,
                "replayed journal tail"
            );
        }
        Ok(logs.len())
    }

    /// Serialize the current state with its log position
    pub fn snapshot_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&SnapshotEnvelope {
            version: SNAPSHOT_VERSION,
            log_number_read: self.log_number_read,
            state: &self.state,
        })
    }

    /// Whether enough mutations accumulated for `store`'s interval
    pub fn snapshot_due(&self, store: &dyn SnapshotStore) -> bool {
        self.mutations_since_snapshot >= store.snapshot_interval().get()
    }

    /// Save unconditionally
    pub fn save_snapshot(&mut self, store: &dyn SnapshotStore) -> Result<(), SnapshotError> {
        let bytes = self.snapshot_bytes().map_err(std::io::Error::from)?;
        store.save_snapshot(&bytes)?;
        self.mutations_since_snapshot = 0;
        Ok(())
    }

    /// Save if due; failures are logged and left for the next attempt
    pub fn maybe_snapshot(&mut self, store: &dyn SnapshotStore) -> bool {
        if !self.snapshot_due(store) {
            return false;
        }
        match self.save_snapshot(store) {
            Ok(()) => {
                tracing::debug!(log_number_read = self.log_number_read, "saved snapshot");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to save snapshot");
                false
            }
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }

    /// Next log number to read; also the count of records applied
    pub fn log_number_read(&self) -> LogNumber {
        self.log_number_read
    }

    pub fn mutations_since_snapshot(&self) -> u64 {
        self.mutations_since_snapshot
    }
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
