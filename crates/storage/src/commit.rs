// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commit index: how much of the data file is visible
//!
//! The data file may carry a torn or abandoned batch past the committed
//! length. Readers never look past `bytes`, and the next appender truncates
//! anything beyond it before writing.

use crate::fsutil::{replace_file, sibling};
use jl_core::{JournalError, LogNumber};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// Committed record count and the byte length they occupy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitIndex {
    pub records: LogNumber,
    pub bytes: u64,
}

impl CommitIndex {
    pub fn path_for(journal: &Path) -> PathBuf {
        sibling(journal, ".commit")
    }

    /// Index after appending `records` encoded into `bytes`
    pub fn advance(&self, records: u64, bytes: u64) -> Self {
        Self {
            records: self.records + records,
            bytes: self.bytes + bytes,
        }
    }

    /// Read the index at `path`, `None` if it has never been written
    pub fn load(path: &Path) -> Result<Option<Self>, JournalError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| JournalError::Corrupted {
                log_number: 0,
                reason: format!("unreadable commit index {}: {e}", path.display()),
            })
    }

    /// Atomically replace the index at `path`
    pub fn store(&self, path: &Path) -> Result<(), JournalError> {
        let text = serde_json::to_string(self)?;
        replace_file(path, text.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "commit_tests.rs"]
mod tests;
