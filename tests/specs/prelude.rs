//! Shared fixtures for the behavioral specs

#![allow(dead_code)]

pub use jl_core::{
    Applied, JournalBackend, JournalError, LockConfig, LockStrategy, LogNumber, LogRecord,
    MemoryJournal, MemorySnapshot, Reconstructor, ReplayState, SnapshotStore,
};
pub use jl_storage::{FileSnapshot, JournalFile};
pub use serde_json::json;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroU64;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

pub const STRATEGIES: [LockStrategy; 2] = [LockStrategy::Symlink, LockStrategy::Open];

/// A journal directory that independent handles can open
pub struct Store {
    dir: TempDir,
}

impl Store {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("journal.log")
    }

    pub fn lock_config(strategy: LockStrategy) -> LockConfig {
        LockConfig::default()
            .with_strategy(strategy)
            .with_acquire_timeout(Duration::from_secs(60))
            .with_max_backoff(Duration::from_millis(20))
    }

    /// A fresh handle, as a separate process would open it
    pub fn handle(&self, strategy: LockStrategy) -> JournalFile {
        JournalFile::with_lock_config(self.path(), &Self::lock_config(strategy)).unwrap()
    }

    pub fn snapshots(&self, interval: u64) -> FileSnapshot {
        FileSnapshot::for_journal(&self.path(), NonZeroU64::new(interval).unwrap())
    }
}

pub fn create(id: u64) -> LogRecord {
    LogRecord::new().with("op", "create").with("id", id)
}

pub fn set(id: u64, value: &str) -> LogRecord {
    LogRecord::new()
        .with("op", "set")
        .with("id", id)
        .with("value", value)
}

pub fn field(record: &LogRecord, key: &str) -> u64 {
    record.get(key).and_then(|v| v.as_u64()).unwrap()
}

/// Registry of created items and their latest values
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    pub items: BTreeMap<u64, Option<String>>,
    pub last: Option<LogNumber>,
}

impl ReplayState for Registry {
    fn apply(&mut self, log_number: LogNumber, record: &LogRecord) -> Applied {
        let Some(id) = record.get("id").and_then(|v| v.as_u64()) else {
            return Applied::Skipped;
        };
        let applied = match record.op().and_then(|v| v.as_str()) {
            Some("create") if !self.items.contains_key(&id) => {
                self.items.insert(id, None);
                Applied::Mutated
            }
            Some("set") => match self.items.get_mut(&id) {
                Some(slot) => {
                    *slot = record.get("value").and_then(|v| v.as_str()).map(String::from);
                    Applied::Mutated
                }
                None => Applied::Skipped,
            },
            _ => Applied::Skipped,
        };
        if applied == Applied::Mutated {
            self.last = Some(log_number);
        }
        applied
    }
}
