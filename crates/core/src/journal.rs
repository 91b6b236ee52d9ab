// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal backend contract
//!
//! A journal is a totally ordered, append-only sequence of [`LogRecord`]s.
//! Implementations must be process safe: any number of processes may call
//! [`JournalBackend::read_logs`] and [`JournalBackend::append_logs`]
//! concurrently against the same backing medium.

use crate::lock::LockError;
use crate::record::{LogNumber, LogRecord};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by journal backends
///
/// Backends never retry internally beyond bounded lock backoff; whether to
/// retry is the caller's decision (see [`JournalError::is_retryable`]).
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[from] std::io::Error),
    #[error("append conflict: {0}")]
    AppendConflict(String),
    #[error("timed out after {} waiting for lock {}", format_wait(.waited), .resource.display())]
    LockTimeout { resource: PathBuf, waited: Duration },
    #[error("journal corrupted at log {log_number}: {reason}")]
    Corrupted { log_number: LogNumber, reason: String },
    #[error("failed to encode log record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl JournalError {
    /// Whether retrying the whole operation from scratch may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            JournalError::BackendUnavailable(_)
                | JournalError::AppendConflict(_)
                | JournalError::LockTimeout { .. }
        )
    }
}

impl From<LockError> for JournalError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Timeout { resource, waited } => {
                JournalError::LockTimeout { resource, waited }
            }
            LockError::Io(e) => JournalError::BackendUnavailable(e),
            LockError::NotHeld { resource } => JournalError::AppendConflict(format!(
                "lock {} was reclaimed before the batch was committed",
                resource.display()
            )),
        }
    }
}

pub(crate) fn format_wait(waited: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*waited)
}

/// Append-only record store
pub trait JournalBackend: Send + Sync {
    /// Read every record with log number >= `log_number_from`, in order
    ///
    /// `0` reads the whole history. Returns an empty vector when no record
    /// qualifies.
    fn read_logs(&self, log_number_from: LogNumber) -> Result<Vec<LogRecord>, JournalError>;

    /// Append `logs` as one batch
    ///
    /// The batch receives the next consecutive log numbers in the given
    /// order and becomes visible to readers entirely or not at all.
    fn append_logs(&self, logs: &[LogRecord]) -> Result<(), JournalError>;
}

impl<T: JournalBackend + ?Sized> JournalBackend for std::sync::Arc<T> {
    fn read_logs(&self, log_number_from: LogNumber) -> Result<Vec<LogRecord>, JournalError> {
        (**self).read_logs(log_number_from)
    }

    fn append_logs(&self, logs: &[LogRecord]) -> Result<(), JournalError> {
        (**self).append_logs(logs)
    }
}

impl<T: JournalBackend + ?Sized> JournalBackend for Box<T> {
    fn read_logs(&self, log_number_from: LogNumber) -> Result<Vec<LogRecord>, JournalError> {
        (**self).read_logs(log_number_from)
    }

    fn append_logs(&self, logs: &[LogRecord]) -> Result<(), JournalError> {
        (**self).append_logs(logs)
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
