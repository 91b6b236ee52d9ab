// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory journal and snapshot slot
//!
//! The mutex gives native atomic multi-record append, so no lock provider is
//! involved. Shared between threads via `Arc`; nothing survives the process.

use crate::journal::{JournalBackend, JournalError};
use crate::record::{LogNumber, LogRecord};
use crate::snapshot::{SnapshotError, SnapshotLoad, SnapshotLoader, SnapshotStore};
use std::num::NonZeroU64;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryJournal {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed records (the next log number)
    pub fn len(&self) -> u64 {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl JournalBackend for MemoryJournal {
    fn read_logs(&self, log_number_from: LogNumber) -> Result<Vec<LogRecord>, JournalError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let start = usize::try_from(log_number_from)
            .unwrap_or(usize::MAX)
            .min(records.len());
        Ok(records[start..].to_vec())
    }

    fn append_logs(&self, logs: &[LogRecord]) -> Result<(), JournalError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(logs);
        Ok(())
    }
}

#[derive(Debug)]
pub struct MemorySnapshot {
    interval: NonZeroU64,
    slot: Mutex<Option<Vec<u8>>>,
}

impl MemorySnapshot {
    pub fn new(interval: NonZeroU64) -> Self {
        Self {
            interval,
            slot: Mutex::new(None),
        }
    }

    /// Copy of the stored blob
    pub fn stored(&self) -> Option<Vec<u8>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl SnapshotStore for MemorySnapshot {
    fn snapshot_interval(&self) -> NonZeroU64 {
        self.interval
    }

    fn save_snapshot(&self, snapshot: &[u8]) -> Result<(), SnapshotError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.to_vec());
        Ok(())
    }

    fn load_snapshot(&self, loader: &mut SnapshotLoader<'_>) -> Result<SnapshotLoad, SnapshotError> {
        // Copy out so the loader runs without holding the slot
        let Some(bytes) = self.stored() else {
            return Ok(SnapshotLoad::Absent);
        };
        Ok(match loader(&bytes) {
            Ok(()) => SnapshotLoad::Loaded,
            Err(e) => SnapshotLoad::Rejected(e),
        })
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
