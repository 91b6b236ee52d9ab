// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-slot snapshot file
//!
//! Layout: one JSON header line `{"version":1,"len":L,"checksum":C}` then
//! exactly `L` opaque bytes whose CRC-32 is `C`. Saves replace the file by
//! atomic rename, so a load sees the previous snapshot or the new one.

use crate::fsutil::{replace_file, sibling};
use jl_core::{SnapshotError, SnapshotLoad, SnapshotLoader, SnapshotRestoreError, SnapshotStore};
use serde::{Deserialize, Serialize};
use std::io;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const FRAME_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    version: u32,
    len: u64,
    checksum: u32,
}

#[derive(Debug, Clone)]
pub struct FileSnapshot {
    path: PathBuf,
    interval: NonZeroU64,
}

impl FileSnapshot {
    pub fn new(path: impl Into<PathBuf>, interval: NonZeroU64) -> Self {
        Self {
            path: path.into(),
            interval,
        }
    }

    /// Snapshot slot at `<journal>.snapshot`
    pub fn for_journal(journal: &Path, interval: NonZeroU64) -> Self {
        Self::new(sibling(journal, ".snapshot"), interval)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn frame(snapshot: &[u8]) -> Result<Vec<u8>, serde_json::Error> {
    let header = Header {
        version: FRAME_VERSION,
        len: snapshot.len() as u64,
        checksum: crc32fast::hash(snapshot),
    };
    let mut out = serde_json::to_vec(&header)?;
    out.push(b'\n');
    out.extend_from_slice(snapshot);
    Ok(out)
}

fn unframe(data: &[u8]) -> Result<&[u8], SnapshotRestoreError> {
    let split = data
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| SnapshotRestoreError::new("missing snapshot header"))?;
    let header: Header = serde_json::from_slice(&data[..split])
        .map_err(|e| SnapshotRestoreError::new(format!("bad snapshot header: {e}")))?;
    if header.version != FRAME_VERSION {
        return Err(SnapshotRestoreError::new(format!(
            "unsupported snapshot frame version {}",
            header.version
        )));
    }
    let body = &data[split + 1..];
    if body.len() as u64 != header.len {
        return Err(SnapshotRestoreError::new(format!(
            "snapshot is {} bytes, header says {}",
            body.len(),
            header.len
        )));
    }
    if crc32fast::hash(body) != header.checksum {
        return Err(SnapshotRestoreError::new("snapshot checksum mismatch"));
    }
    Ok(body)
}

impl SnapshotStore for FileSnapshot {
    fn snapshot_interval(&self) -> NonZeroU64 {
        self.interval
    }

    fn save_snapshot(&self, snapshot: &[u8]) -> Result<(), SnapshotError> {
        let framed = frame(snapshot).map_err(io::Error::other)?;
        replace_file(&self.path, &framed)?;
        debug!(path = %self.path.display(), bytes = snapshot.len(), "saved snapshot");
        Ok(())
    }

    fn load_snapshot(&self, loader: &mut SnapshotLoader<'_>) -> Result<SnapshotLoad, SnapshotError> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SnapshotLoad::Absent),
            Err(e) => return Err(e.into()),
        };
        let outcome = unframe(&data).and_then(|body| loader(body));
        match outcome {
            Ok(()) => Ok(SnapshotLoad::Loaded),
            Err(reason) => {
                warn!(path = %self.path.display(), error = %reason, "snapshot rejected");
                Ok(SnapshotLoad::Rejected(reason))
            }
        }
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
