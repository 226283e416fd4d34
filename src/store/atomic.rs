//! Crash-safe single-file replace.
//!
//! Every persisted file in this crate (collections, counters, artifacts,
//! config) goes through [`write_atomic`]: the bytes land in a sibling temp
//! file first and a single same-filesystem rename moves them onto the
//! target. A reader never observes a truncated or half-written file; a
//! killed writer leaves the target in its prior state.

use crate::error::Result;
use std::fs;
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

/// Atomically replace `path` with `bytes`, creating parent directories on
/// demand. On any failure after the temp file is created, the temp file is
/// removed and the original target is untouched.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("file");
    // Random suffix so concurrent writers against the same target never
    // collide on the temp name.
    let tmp = dir.join(format!(".{}-{}.tmp", file_name, Uuid::new_v4()));

    let outcome = (|| -> Result<()> {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, path)?;
        Ok(())
    })();

    if outcome.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    outcome
}
