// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-file markers created with exclusive create

use super::MarkerKind;
use jl_core::MarkerFingerprint;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// `O_CREAT | O_EXCL` control file holding the owner record
///
/// Between create and write the file is briefly empty; an empty marker is
/// still a held lock.
#[derive(Debug, Clone, Copy)]
pub struct ExclusiveOpen;

impl MarkerKind for ExclusiveOpen {
    const NAME: &'static str = "open";

    fn create(path: &Path, payload: &str) -> io::Result<bool> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e),
        };
        if let Err(e) = file.write_all(payload.as_bytes()).and_then(|()| file.sync_all()) {
            let _ = fs::remove_file(path);
            return Err(e);
        }
        Ok(true)
    }

    fn inspect(path: &Path) -> io::Result<Option<MarkerFingerprint>> {
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let owner = match fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(Some(MarkerFingerprint::new(owner, meta.modified().ok())))
    }
}
