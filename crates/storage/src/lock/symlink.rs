// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Symlink markers: the owner record is the link target

use super::MarkerKind;
use jl_core::MarkerFingerprint;
use std::fs;
use std::io;
use std::path::Path;

/// Creating a symlink is atomic and fails if the name exists
#[derive(Debug, Clone, Copy)]
pub struct Symlink;

impl MarkerKind for Symlink {
    const NAME: &'static str = "symlink";

    fn create(path: &Path, payload: &str) -> io::Result<bool> {
        match std::os::unix::fs::symlink(payload, path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn inspect(path: &Path) -> io::Result<Option<MarkerFingerprint>> {
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let owner = match fs::read_link(path) {
            Ok(target) => target.to_string_lossy().into_owned(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            // Something other than a symlink is squatting on the name
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => String::new(),
            Err(e) => return Err(e),
        };
        Ok(Some(MarkerFingerprint::new(owner, meta.modified().ok())))
    }
}
