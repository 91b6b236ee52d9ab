// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed journal
//!
//! One compact JSON record per line. Appends happen under the journal lock
//! and become visible only when the commit index is replaced, so a reader
//! sees either all of a batch or none of it and never needs the lock.

use crate::commit::CommitIndex;
use crate::lock;
use jl_core::{
    encode_batch, JournalBackend, JournalError, JournalLock, LockConfig, LockGuard, LogNumber,
    LogRecord,
};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Remember the byte offset of every Nth record
const OFFSET_STRIDE: LogNumber = 256;

pub struct JournalFile {
    path: PathBuf,
    commit_path: PathBuf,
    lock: Box<dyn JournalLock>,
    /// Known `log_number -> byte offset` pairs, always includes `0 -> 0`
    offsets: Mutex<BTreeMap<LogNumber, u64>>,
}

impl std::fmt::Debug for JournalFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalFile")
            .field("path", &self.path)
            .field("lock", &self.lock.resource())
            .finish_non_exhaustive()
    }
}

impl JournalFile {
    /// Open (creating if needed) the journal at `path` guarded by `lock`.
    ///
    /// A data file without a commit index is adopted: its complete lines
    /// become the committed prefix.
    pub fn open(path: impl Into<PathBuf>, lock: Box<dyn JournalLock>) -> Result<Self, JournalError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(&path)?;

        let journal = Self {
            commit_path: CommitIndex::path_for(&path),
            path,
            lock,
            offsets: Mutex::new(BTreeMap::from([(0, 0)])),
        };
        if CommitIndex::load(&journal.commit_path)?.is_none() {
            journal.adopt()?;
        }
        Ok(journal)
    }

    /// Open with the lock strategy described by `config`
    pub fn with_lock_config(path: impl Into<PathBuf>, config: &LockConfig) -> Result<Self, JournalError> {
        let path = path.into();
        let lock = lock::from_config(&path, config);
        Self::open(path, lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock(&self) -> &dyn JournalLock {
        self.lock.as_ref()
    }

    /// Current commit index
    pub fn committed(&self) -> Result<CommitIndex, JournalError> {
        CommitIndex::load(&self.commit_path)?.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("commit index {} is missing", self.commit_path.display()),
            )
            .into()
        })
    }

    fn adopt(&self) -> Result<(), JournalError> {
        let guard = LockGuard::acquire(self.lock.as_ref())?;
        // Another process may have adopted while we waited
        if CommitIndex::load(&self.commit_path)?.is_some() {
            return Ok(guard.release()?);
        }

        let (index, len) = scan_complete(&self.path)?;
        if len > index.bytes {
            warn!(
                path = %self.path.display(),
                discarded = len - index.bytes,
                "ignoring incomplete trailing line"
            );
        }
        if index.records > 0 {
            info!(path = %self.path.display(), records = index.records, "adopted existing journal");
        }
        index.store(&self.commit_path)?;
        Ok(guard.release()?)
    }

    /// Nearest cached position at or before `log_number`
    fn seek_point(&self, log_number: LogNumber) -> (LogNumber, u64) {
        let offsets = self.offsets.lock().unwrap_or_else(|e| e.into_inner());
        offsets
            .range(..=log_number)
            .next_back()
            .map(|(n, offset)| (*n, *offset))
            .unwrap_or((0, 0))
    }

    fn remember(&self, points: impl IntoIterator<Item = (LogNumber, u64)>) {
        let mut offsets = self.offsets.lock().unwrap_or_else(|e| e.into_inner());
        offsets.extend(points);
    }
}

impl JournalBackend for JournalFile {
    fn read_logs(&self, log_number_from: LogNumber) -> Result<Vec<LogRecord>, JournalError> {
        let commit = self.committed()?;
        if log_number_from >= commit.records {
            return Ok(Vec::new());
        }

        let (mut log_number, mut offset) = self.seek_point(log_number_from);
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut reader = BufReader::new(file.take(commit.bytes.saturating_sub(offset)));

        let mut logs = Vec::new();
        let mut points = Vec::new();
        let mut line = Vec::new();
        while log_number < commit.records {
            line.clear();
            let n = reader.read_until(b'\n', &mut line)?;
            if line.last() != Some(&b'\n') {
                return Err(JournalError::Corrupted {
                    log_number,
                    reason: format!(
                        "data file ends inside the committed region ({} of {} bytes)",
                        offset + n as u64,
                        commit.bytes
                    ),
                });
            }
            if log_number >= log_number_from {
                logs.push(decode_line(log_number, &line)?);
            }
            offset += n as u64;
            log_number += 1;
            if log_number % OFFSET_STRIDE == 0 || log_number == commit.records {
                points.push((log_number, offset));
            }
        }
        self.remember(points);

        debug!(from = log_number_from, count = logs.len(), "read journal logs");
        Ok(logs)
    }

    fn append_logs(&self, logs: &[LogRecord]) -> Result<(), JournalError> {
        if logs.is_empty() {
            return Ok(());
        }
        let batch = encode_batch(logs)?;

        let guard = LockGuard::acquire(self.lock.as_ref())?;
        let commit = self.committed()?;

        // Append mode: concurrent writers can only add past the end, never
        // overwrite what is committed.
        let mut file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        let len = file.metadata()?.len();
        if len < commit.bytes {
            return Err(JournalError::Corrupted {
                log_number: commit.records,
                reason: format!("data file is {len} bytes but {} are committed", commit.bytes),
            });
        }
        if len > commit.bytes {
            warn!(
                path = %self.path.display(),
                discarded = len - commit.bytes,
                "discarding uncommitted journal tail"
            );
            file.set_len(commit.bytes)?;
        }

        file.write_all(&batch)?;
        file.sync_data()?;

        if !guard.holds()? {
            return Err(JournalError::AppendConflict(
                "journal lock was reclaimed while writing".to_string(),
            ));
        }
        if CommitIndex::load(&self.commit_path)? != Some(commit) {
            return Err(JournalError::AppendConflict(
                "commit index moved while writing".to_string(),
            ));
        }
        if !landed_at(&mut file, commit.bytes, &batch)? {
            return Err(JournalError::AppendConflict(
                "another writer interleaved with this batch".to_string(),
            ));
        }

        let next = commit.advance(logs.len() as u64, batch.len() as u64);
        next.store(&self.commit_path)?;
        self.remember([(next.records, next.bytes)]);
        debug!(first = commit.records, count = logs.len(), "appended journal batch");

        // Committed; a failed release must not make the caller retry
        if let Err(e) = guard.release() {
            warn!(path = %self.path.display(), error = %e, "failed to release journal lock");
        }
        Ok(())
    }
}

fn decode_line(log_number: LogNumber, line: &[u8]) -> Result<LogRecord, JournalError> {
    let corrupted = |reason: String| JournalError::Corrupted { log_number, reason };
    let text = std::str::from_utf8(line).map_err(|e| corrupted(e.to_string()))?;
    LogRecord::from_line(text).map_err(|e| corrupted(e.to_string()))
}

/// Whether the bytes at `offset` are exactly `batch`
fn landed_at(file: &mut File, offset: u64, batch: &[u8]) -> io::Result<bool> {
    file.seek(SeekFrom::Start(offset))?;
    let mut written = Vec::with_capacity(batch.len());
    file.take(batch.len() as u64).read_to_end(&mut written)?;
    Ok(written == batch)
}

/// Count the complete, decodable lines at the head of `path`.
///
/// Returns the committed prefix and the total file length. A trailing
/// line without its newline is a torn write and left out; a complete line
/// that does not decode is corruption.
fn scan_complete(path: &Path) -> Result<(CommitIndex, u64), JournalError> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let mut index = CommitIndex::default();
    let mut line = Vec::new();
    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line)?;
        if n == 0 || line.last() != Some(&b'\n') {
            return Ok((index, len));
        }
        decode_line(index.records, &line)?;
        index = index.advance(1, n as u64);
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
