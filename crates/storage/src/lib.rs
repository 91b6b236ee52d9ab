// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! jl-storage: file-backed journal, lock strategies and snapshot slot
//!
//! All files live beside the journal data file `P`:
//!
//! ```text
//! P            one record per line, append-only
//! P.commit     {"records": N, "bytes": B}; only the first B bytes are visible
//! P.lock       lock marker (symlink or exclusive-create control file)
//! P.snapshot   latest snapshot, replaced by atomic rename
//! ```

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod fsutil;

pub mod commit;
pub mod journal;
pub mod lock;
pub mod open;
pub mod snapshot;

pub use commit::CommitIndex;
pub use journal::JournalFile;
pub use lock::{ExclusiveOpen, MarkerKind, MarkerLock, OpenLock};
#[cfg(unix)]
pub use lock::{Symlink, SymlinkLock};
pub use open::{open, JournalStorage};
pub use snapshot::FileSnapshot;
