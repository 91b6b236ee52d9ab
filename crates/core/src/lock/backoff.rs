// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded exponential backoff for lock acquisition

use crate::clock::Clock;
use crate::config::LockConfig;
use std::time::{Duration, Instant};

/// Delay schedule for one acquisition attempt sequence
///
/// Delays double from `initial` up to `max`. Once `budget` has elapsed since
/// the schedule started, no further delay is handed out and the caller must
/// give up.
#[derive(Debug, Clone)]
pub struct Backoff<C: Clock> {
    clock: C,
    started: Instant,
    next: Duration,
    max: Duration,
    budget: Duration,
}

impl<C: Clock> Backoff<C> {
    pub fn new(initial: Duration, max: Duration, budget: Duration, clock: C) -> Self {
        let started = clock.now();
        Self {
            clock,
            started,
            next: initial.min(max),
            max,
            budget,
        }
    }

    pub fn from_config(config: &LockConfig, clock: C) -> Self {
        Self::new(
            config.initial_backoff,
            config.max_backoff,
            config.acquire_timeout,
            clock,
        )
    }

    /// Next delay, clipped to the remaining budget; `None` once exhausted
    pub fn next_delay(&mut self) -> Option<Duration> {
        let remaining = self.budget.checked_sub(self.elapsed())?;
        if remaining.is_zero() {
            return None;
        }
        let delay = self.next.min(remaining);
        self.next = self.next.saturating_mul(2).min(self.max);
        Some(delay)
    }

    /// Time since the schedule started
    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed_since(self.started)
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
