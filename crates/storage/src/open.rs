// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Open a journal and its snapshot slot from configuration

use crate::journal::JournalFile;
use crate::snapshot::FileSnapshot;
use jl_core::{JournalConfig, JournalError, Reconstructor, ReplayState, SnapshotStore};
use tracing::info;

/// A journal plus, when snapshots are enabled, its snapshot slot
#[derive(Debug)]
pub struct JournalStorage {
    pub journal: JournalFile,
    pub snapshots: Option<FileSnapshot>,
}

impl JournalStorage {
    pub fn snapshot_store(&self) -> Option<&dyn SnapshotStore> {
        self.snapshots.as_ref().map(|s| s as &dyn SnapshotStore)
    }

    /// Rebuild `S` from the latest usable snapshot plus the journal
    pub fn reconstruct<S: ReplayState>(&self) -> Result<Reconstructor<S>, JournalError> {
        Reconstructor::cold_start(&self.journal, self.snapshot_store())
    }
}

/// Open the storage described by an already-validated `config`
pub fn open(config: &JournalConfig) -> Result<JournalStorage, JournalError> {
    let journal = JournalFile::with_lock_config(&config.path, &config.lock)?;
    let snapshots = config
        .snapshot_interval
        .map(|interval| FileSnapshot::for_journal(&config.path, interval));
    info!(
        path = %config.path.display(),
        strategy = ?config.lock.strategy,
        snapshots = snapshots.is_some(),
        "opened journal"
    );
    Ok(JournalStorage { journal, snapshots })
}

#[cfg(test)]
#[path = "open_tests.rs"]
mod tests;
