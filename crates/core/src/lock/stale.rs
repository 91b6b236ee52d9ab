// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stale marker detection
//!
//! An acquirer that keeps finding the same marker, unchanged, for longer than
//! the stale threshold presumes the holder died inside its critical section
//! and may reclaim the lock. "Unchanged" means identical owner payload and
//! modification time. The duration is measured on the acquirer's own clock,
//! so skew between hosts sharing a filesystem does not matter.
//!
//! The threshold trades stall time against safety: too short and a slow but
//! live holder loses its lock mid-section (its commit then fails with an
//! append conflict); too long and every writer stalls that long after a real
//! crash.

use crate::clock::Clock;
use std::time::{Duration, Instant, SystemTime};

/// What an acquirer saw at the marker path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerFingerprint {
    /// Raw marker payload (owner record, possibly empty)
    pub owner: String,
    /// Modification time, when the medium reports one
    pub modified: Option<SystemTime>,
}

impl MarkerFingerprint {
    pub fn new(owner: impl Into<String>, modified: Option<SystemTime>) -> Self {
        Self {
            owner: owner.into(),
            modified,
        }
    }
}

/// Outcome of observing a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleVerdict {
    /// Holder presumed alive; keep waiting
    Fresh { unchanged_for: Duration },
    /// Holder presumed dead; reclaim allowed
    Stale { unchanged_for: Duration },
}

impl StaleVerdict {
    pub fn is_stale(&self) -> bool {
        matches!(self, StaleVerdict::Stale { .. })
    }
}

/// Per-acquisition memory of the last marker seen
#[derive(Debug, Clone)]
pub struct StaleTracker {
    threshold: Option<Duration>,
    observed: Option<(MarkerFingerprint, Instant)>,
}

impl StaleTracker {
    /// `None` or a zero threshold disables reclaim entirely
    pub fn new(threshold: Option<Duration>) -> Self {
        Self {
            threshold: threshold.filter(|t| !t.is_zero()),
            observed: None,
        }
    }

    /// Record an observation and judge the holder
    pub fn observe(&mut self, fingerprint: MarkerFingerprint, clock: &impl Clock) -> StaleVerdict {
        let since = match &self.observed {
            Some((seen, since)) if *seen == fingerprint => *since,
            _ => {
                let now = clock.now();
                self.observed = Some((fingerprint, now));
                now
            }
        };

        let unchanged_for = clock.elapsed_since(since);
        match self.threshold {
            Some(threshold) if unchanged_for > threshold => StaleVerdict::Stale { unchanged_for },
            _ => StaleVerdict::Fresh { unchanged_for },
        }
    }

    /// The marker currently being timed, if any
    pub fn observed(&self) -> Option<&MarkerFingerprint> {
        self.observed.as_ref().map(|(fingerprint, _)| fingerprint)
    }

    /// Forget the current observation (marker vanished or was reclaimed)
    pub fn reset(&mut self) {
        self.observed = None;
    }
}

#[cfg(test)]
#[path = "stale_tests.rs"]
mod tests;
