//! Cross-collection file reconciliation.
//!
//! The registry joins every known collection's metadata against its artifact
//! directory by filename and surfaces the mismatches: a file no record
//! references is *orphaned*, a reference to a missing file is *broken*.
//! Listings are derived views rebuilt on every call, never persisted, and
//! never a source of truth. Diagnostics are read-only: orphans are reported,
//! not auto-deleted.

use crate::error::Result;
use crate::store::{ArtifactRecord, ArtifactSource};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// File on disk with a record pointing at it.
    Linked,
    /// File on disk no record points at.
    Orphaned,
    /// Record reference with no file behind it.
    Broken,
}

/// One joined filename↔record entry.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub filename: String,
    pub collection: String,
    pub status: FileStatus,
    pub record: Option<ArtifactRecord>,
    /// File size in bytes; `None` for broken entries.
    pub size: Option<u64>,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub collection: Option<String>,
    pub status: Option<FileStatus>,
    /// Case-insensitive substring over filename and document number.
    pub search: Option<String>,
}

/// Outcome of a coupled delete. `NotFound` is deliberately not an error:
/// the owning domain delete must tolerate this sub-operation finding
/// nothing without aborting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted {
        collection: String,
        record_id: Uuid,
        filename: String,
    },
    NotFound,
}

pub struct FileRegistry {
    sources: Vec<Arc<dyn ArtifactSource>>,
}

impl FileRegistry {
    pub fn new(sources: Vec<Arc<dyn ArtifactSource>>) -> Self {
        Self { sources }
    }

    /// Build the joined index by loading every collection and independently
    /// scanning every artifact directory.
    pub fn list(&self, filter: &ListFilter) -> Result<Vec<FileEntry>> {
        let mut entries = Vec::new();
        for source in &self.sources {
            if let Some(only) = &filter.collection {
                if only != source.name() {
                    continue;
                }
            }
            self.collect_source(source.as_ref(), &mut entries)?;
        }

        let needle = filter.search.as_deref().map(str::to_lowercase);
        entries.retain(|entry| {
            if let Some(status) = filter.status {
                if entry.status != status {
                    return false;
                }
            }
            match &needle {
                Some(needle) => {
                    entry.filename.to_lowercase().contains(needle)
                        || entry
                            .record
                            .as_ref()
                            .is_some_and(|record| record.number.to_lowercase().contains(needle))
                }
                None => true,
            }
        });
        entries.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(entries)
    }

    fn collect_source(
        &self,
        source: &dyn ArtifactSource,
        entries: &mut Vec<FileEntry>,
    ) -> Result<()> {
        let mut by_filename: HashMap<String, ArtifactRecord> = source
            .artifact_records()?
            .into_iter()
            .map(|record| (record.filename.clone(), record))
            .collect();

        // A missing directory is an empty directory for diagnostics.
        let dir = source.artifact_dir();
        if dir.exists() {
            for entry in fs::read_dir(dir)? {
                let entry = entry?;
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let filename = match path.file_name().and_then(|name| name.to_str()) {
                    Some(name) => name.to_string(),
                    None => continue,
                };
                if filename.starts_with('.') {
                    continue;
                }
                let metadata = entry.metadata().ok();
                let size = metadata.as_ref().map(|m| m.len());
                let modified = metadata
                    .and_then(|m| m.modified().ok())
                    .map(DateTime::<Utc>::from);

                let record = by_filename.remove(&filename);
                let status = if record.is_some() {
                    FileStatus::Linked
                } else {
                    FileStatus::Orphaned
                };
                entries.push(FileEntry {
                    filename,
                    collection: source.name().to_string(),
                    status,
                    record,
                    size,
                    modified,
                });
            }
        }

        // Whatever is left references a file the scan never saw.
        for (filename, record) in by_filename {
            entries.push(FileEntry {
                filename,
                collection: source.name().to_string(),
                status: FileStatus::Broken,
                record: Some(record),
                size: None,
                modified: None,
            });
        }
        Ok(())
    }

    /// Locate the owning record across all collections, clear its artifact
    /// reference, persist the collection, then remove the physical file.
    ///
    /// Idempotent: a filename with no owning record yields
    /// [`DeleteOutcome::NotFound`] and mutates nothing on disk.
    pub fn delete_by_filename(&self, filename: &str) -> Result<DeleteOutcome> {
        for source in &self.sources {
            let record_id = match source.detach_artifact(filename)? {
                Some(id) => id,
                None => continue,
            };
            let path = source.artifact_dir().join(filename);
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!(collection = source.name(), filename, "artifact deleted");
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    // Broken reference: the record side is now clean.
                    warn!(collection = source.name(), filename, "artifact file was already gone");
                }
                Err(e) => return Err(e.into()),
            }
            return Ok(DeleteOutcome::Deleted {
                collection: source.name().to_string(),
                record_id,
                filename: filename.to_string(),
            });
        }
        warn!(filename, "delete_by_filename: no record references this artifact");
        Ok(DeleteOutcome::NotFound)
    }
}
