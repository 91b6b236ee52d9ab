// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! jl-core: contracts for a process-safe, append-only journal
//!
//! This crate provides:
//! - The log record model and its line-oriented encoding
//! - The journal backend, snapshot store, and lock provider traits
//! - Stale-marker tracking and bounded backoff for lock acquisition
//! - An in-memory reference backend
//! - State reconstruction from snapshots plus log replay
//! - TOML configuration

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod clock;
pub mod config;
pub mod journal;
pub mod lock;
pub mod memory;
pub mod record;
pub mod replay;
pub mod snapshot;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, JournalConfig, LockConfig, LockStrategy};
pub use journal::{JournalBackend, JournalError};
pub use lock::{
    Backoff, JournalLock, LockError, LockGuard, LockOwner, LockToken, MarkerFingerprint,
    StaleTracker, StaleVerdict,
};
pub use memory::{MemoryJournal, MemorySnapshot};
pub use record::{encode_batch, LogNumber, LogRecord, RecordError};
pub use replay::{Applied, Reconstructor, ReplayState, SnapshotEnvelope, SNAPSHOT_VERSION};
pub use snapshot::{
    SnapshotError, SnapshotLoad, SnapshotLoader, SnapshotRestoreError, SnapshotStore,
};
