// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem lock strategies
//!
//! Both strategies share one acquisition loop and differ only in how the
//! marker is created and read back. The marker content is the holder's
//! [`LockOwner`] record. A marker whose fingerprint stays unchanged for
//! longer than the stale threshold is reclaimed.

mod open;
#[cfg(unix)]
mod symlink;

pub use open::ExclusiveOpen;
#[cfg(unix)]
pub use symlink::Symlink;

use crate::fsutil::{remove_if_exists, scratch, sibling};
use jl_core::{
    Backoff, Clock, JournalLock, LockConfig, LockError, LockOwner, LockStrategy, LockToken,
    MarkerFingerprint, StaleTracker, StaleVerdict, SystemClock,
};
use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// How a marker is created and read back
pub trait MarkerKind {
    const NAME: &'static str;

    /// Create the marker holding `payload`; `Ok(false)` if one already exists
    fn create(path: &Path, payload: &str) -> io::Result<bool>;

    /// Read the marker at `path`; `Ok(None)` if there is none
    fn inspect(path: &Path) -> io::Result<Option<MarkerFingerprint>>;
}

/// Lock held by the existence of a marker file
#[derive(Debug)]
pub struct MarkerLock<K: MarkerKind, C: Clock = SystemClock> {
    path: PathBuf,
    config: LockConfig,
    clock: C,
    kind: PhantomData<fn() -> K>,
}

#[cfg(unix)]
pub type SymlinkLock<C = SystemClock> = MarkerLock<Symlink, C>;
pub type OpenLock<C = SystemClock> = MarkerLock<ExclusiveOpen, C>;

impl<K: MarkerKind> MarkerLock<K, SystemClock> {
    /// Lock guarding `journal`, with its marker at `<journal>.lock`.
    /// `config` is taken as already validated.
    pub fn for_journal(journal: &Path, config: LockConfig) -> Self {
        Self::with_clock(sibling(journal, ".lock"), config, SystemClock)
    }
}

impl<K: MarkerKind, C: Clock> MarkerLock<K, C> {
    /// Lock on the marker at `marker`, timed by `clock`.
    ///
    /// `config` is taken as already validated (see [`LockConfig::validate`]);
    /// nothing here rechecks the backoff bounds or the timeout against the
    /// stale threshold. A zero threshold disables reclaim.
    pub fn with_clock(marker: PathBuf, config: LockConfig, clock: C) -> Self {
        Self {
            path: marker,
            config,
            clock,
            kind: PhantomData,
        }
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Move the marker aside under a unique name.
    ///
    /// Returns the new path and what the moved marker held, or `None` when
    /// there was no marker to move.
    fn take_marker(&self, why: &str) -> io::Result<Option<(PathBuf, MarkerFingerprint)>> {
        let moved = scratch(&self.path, why);
        match fs::rename(&self.path, &moved) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        }
        let fingerprint = K::inspect(&moved)?
            .unwrap_or_else(|| MarkerFingerprint::new(String::new(), None));
        Ok(Some((moved, fingerprint)))
    }

    /// Put back a marker that was moved aside by mistake
    fn restore_marker(&self, moved: &Path, taken: &MarkerFingerprint) -> io::Result<()> {
        if !K::create(&self.path, &taken.owner)? {
            error!(
                resource = %self.path.display(),
                holder = %taken.owner,
                "could not restore lock marker, another acquirer got in first"
            );
        }
        remove_if_exists(moved)
    }

    /// Remove a marker judged stale, unless it changed hands since we looked
    fn reclaim(&self, stale: &MarkerFingerprint) -> io::Result<()> {
        let Some((moved, taken)) = self.take_marker("reclaim")? else {
            return Ok(());
        };
        if taken.owner != stale.owner {
            warn!(
                resource = %self.path.display(),
                holder = %taken.owner,
                "lock changed hands during reclaim, restoring"
            );
            return self.restore_marker(&moved, &taken);
        }
        remove_if_exists(&moved)
    }
}

impl<K: MarkerKind, C: Clock> JournalLock for MarkerLock<K, C> {
    fn resource(&self) -> &Path {
        &self.path
    }

    fn acquire(&self) -> Result<LockToken, LockError> {
        let owner = LockOwner::current();
        let payload = owner.to_marker()?;
        let mut backoff = Backoff::from_config(&self.config, self.clock.clone());
        let mut tracker = StaleTracker::new(self.config.stale_threshold);

        loop {
            if K::create(&self.path, &payload)? {
                debug!(resource = %self.path.display(), kind = K::NAME, "acquired journal lock");
                return Ok(LockToken::new(owner));
            }

            match K::inspect(&self.path)? {
                None => tracker.reset(),
                Some(fingerprint) => {
                    if let StaleVerdict::Stale { unchanged_for } =
                        tracker.observe(fingerprint.clone(), &self.clock)
                    {
                        warn!(
                            resource = %self.path.display(),
                            holder = %fingerprint.owner,
                            unchanged_for = ?unchanged_for,
                            "reclaiming stale journal lock"
                        );
                        self.reclaim(&fingerprint)?;
                        tracker.reset();
                        continue;
                    }
                }
            }

            match backoff.next_delay() {
                Some(delay) => std::thread::sleep(delay),
                None => {
                    return Err(LockError::Timeout {
                        resource: self.path.clone(),
                        waited: backoff.elapsed(),
                    })
                }
            }
        }
    }

    fn release(&self, token: &LockToken) -> Result<(), LockError> {
        let not_held = || LockError::NotHeld {
            resource: self.path.clone(),
        };
        if !self.holds(token)? {
            return Err(not_held());
        }
        let Some((moved, taken)) = self.take_marker("release")? else {
            return Err(not_held());
        };
        if !token.matches_marker(&taken.owner) {
            self.restore_marker(&moved, &taken)?;
            return Err(not_held());
        }
        remove_if_exists(&moved)?;
        debug!(resource = %self.path.display(), kind = K::NAME, "released journal lock");
        Ok(())
    }

    fn holds(&self, token: &LockToken) -> Result<bool, LockError> {
        Ok(K::inspect(&self.path)?.is_some_and(|marker| token.matches_marker(&marker.owner)))
    }
}

/// Build the lock strategy named by `config` for the journal at `journal`
pub fn from_config(journal: &Path, config: &LockConfig) -> Box<dyn JournalLock> {
    match config.strategy {
        #[cfg(unix)]
        LockStrategy::Symlink => Box::new(SymlinkLock::for_journal(journal, config.clone())),
        #[cfg(not(unix))]
        LockStrategy::Symlink => {
            warn!("symlink locks are unsupported here, using exclusive open");
            Box::new(OpenLock::for_journal(journal, config.clone()))
        }
        LockStrategy::Open => Box::new(OpenLock::for_journal(journal, config.clone())),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
