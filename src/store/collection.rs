//! Generic record collection persisted as one pretty-printed JSON array.
//!
//! An absent file is a valid empty collection, not an error. Every mutation
//! runs under a mutex keyed by the collection file, so the read-modify-write
//! cycle is linearizable across *all* store instances over that file:
//! without it, two concurrent updates against the same collection would both
//! read the pre-update snapshot and the second `save_all` would silently
//! clobber the first writer's change.

use crate::config::NumberFormat;
use crate::error::{PaperworkError, Result};
use crate::model::{Direction, DocumentPayload, NewRecord, Record};
use crate::store::atomic;
use crate::store::counter::CounterStore;
use crate::store::query::{self, ListQuery, Page};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;
use uuid::Uuid;

// One mutex per collection file, shared by every store instance constructed
// over that file in this process. Entries are tiny and never evicted.
static COLLECTION_LOCKS: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn lock_for(file: &Path) -> Arc<Mutex<()>> {
    let mut locks = COLLECTION_LOCKS
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(file.to_path_buf()).or_default())
}

/// Static description of one collection: where it lives, which counter mints
/// its numbers and how those numbers are rendered.
#[derive(Debug, Clone)]
pub struct CollectionSpec {
    /// Collection name, e.g. `purchase-orders`.
    pub name: String,
    /// Counter name, e.g. `PO`.
    pub counter: String,
    pub number: NumberFormat,
    /// The JSON array file.
    pub file: PathBuf,
    /// Directory holding this collection's rendered artifacts.
    pub artifact_dir: PathBuf,
}

pub struct CollectionStore<P> {
    spec: CollectionSpec,
    counter: Arc<CounterStore>,
    lock: Arc<Mutex<()>>,
    _payload: PhantomData<fn() -> P>,
}

impl<P: DocumentPayload> CollectionStore<P> {
    pub fn new(spec: CollectionSpec, counter: Arc<CounterStore>) -> Self {
        let lock = lock_for(&spec.file);
        Self {
            spec,
            counter,
            lock,
            _payload: PhantomData,
        }
    }

    pub fn spec(&self) -> &CollectionSpec {
        &self.spec
    }

    /// Load the full collection in file order. Absent file means empty.
    pub fn load_all(&self) -> Result<Vec<Record<P>>> {
        if !self.spec.file.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.spec.file)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Persist the full collection atomically, overwriting.
    pub fn save_all(&self, records: &[Record<P>]) -> Result<()> {
        let content = serde_json::to_string_pretty(records)?;
        atomic::write_atomic(&self.spec.file, content.as_bytes())
    }

    /// Mint a number, stamp timestamps, append and persist.
    pub fn create(&self, new: NewRecord<P>) -> Result<Record<P>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut records = self.load_all()?;
        let value = self.counter.next(&self.spec.counter)?;
        let number = self.spec.number.render(value);
        let record = Record::new(number, new.created_by, new.payload);
        records.push(record.clone());
        self.save_all(&records)?;
        debug!(collection = %self.spec.name, number = %record.number, "record created");
        Ok(record)
    }

    pub fn get(&self, id: Uuid) -> Result<Record<P>> {
        self.load_all()?
            .into_iter()
            .find(|record| record.id == id)
            .ok_or(PaperworkError::RecordNotFound(id))
    }

    /// Apply `apply` to the record and persist. Identity fields (`id`,
    /// `number`, `created_by`, `created_at`) are restored after the closure
    /// runs; only mutable fields survive the merge. `updated_at` is stamped
    /// by the store.
    pub fn update<F>(&self, id: Uuid, apply: F) -> Result<Record<P>>
    where
        F: FnOnce(&mut Record<P>),
    {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut records = self.load_all()?;
        let record = records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(PaperworkError::RecordNotFound(id))?;

        let number = record.number.clone();
        let created_by = record.created_by.clone();
        let created_at = record.created_at;
        apply(record);
        record.id = id;
        record.number = number;
        record.created_by = created_by;
        record.created_at = created_at;
        record.updated_at = chrono::Utc::now();

        let updated = record.clone();
        self.save_all(&records)?;
        Ok(updated)
    }

    /// Record the rendered artifact (or clear it with `None`s).
    pub fn set_artifact(
        &self,
        id: Uuid,
        filename: Option<String>,
        language: Option<Direction>,
    ) -> Result<Record<P>> {
        self.update(id, |record| {
            record.artifact_filename = filename;
            record.artifact_language = language;
        })
    }

    /// Remove the record and persist; returns the removed record so the
    /// caller can clean up its artifact.
    pub fn delete(&self, id: Uuid) -> Result<Record<P>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut records = self.load_all()?;
        let position = records
            .iter()
            .position(|record| record.id == id)
            .ok_or(PaperworkError::RecordNotFound(id))?;
        let removed = records.remove(position);
        self.save_all(&records)?;
        debug!(collection = %self.spec.name, number = %removed.number, "record deleted");
        Ok(removed)
    }

    /// Clear the collection and reset its counter as one locked operation.
    ///
    /// The collection is cleared first: a crash between the two steps leaves
    /// an empty collection with a stale counter, which only skips numbers
    /// forward and can never mint a duplicate.
    pub fn reset(&self) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.save_all(&[])?;
        self.counter.reset(&self.spec.counter)
    }

    /// Guard for domain-unique fields (supplier email, phone, ...) ahead of
    /// `create` or `update`: `Conflict` if any record other than `except`
    /// matches the predicate.
    pub fn ensure_unique<F>(&self, except: Option<Uuid>, message: &str, matches: F) -> Result<()>
    where
        F: Fn(&Record<P>) -> bool,
    {
        let clash = self
            .load_all()?
            .into_iter()
            .any(|record| Some(record.id) != except && matches(&record));
        if clash {
            Err(PaperworkError::Conflict(message.to_string()))
        } else {
            Ok(())
        }
    }

    /// Filter, sort and paginate after a full load. `visible` is the
    /// caller's ownership predicate, applied before pagination.
    pub fn list<F>(&self, query: &ListQuery, visible: F) -> Result<Page<Record<P>>>
    where
        F: Fn(&Record<P>) -> bool,
    {
        Ok(query::select(self.load_all()?, query, visible))
    }
}

/// Registry-facing view of a collection, independent of the payload type.
/// See `registry::FileRegistry`.
pub trait ArtifactSource: Send + Sync {
    fn name(&self) -> &str;
    fn artifact_dir(&self) -> &Path;
    /// Every record that currently references an artifact file.
    fn artifact_records(&self) -> Result<Vec<ArtifactRecord>>;
    /// Clear the artifact reference on the record owning `filename` and
    /// persist; `None` if no record in this collection references it.
    fn detach_artifact(&self, filename: &str) -> Result<Option<Uuid>>;
}

/// Flattened record metadata carried by registry listings.
#[derive(Debug, Clone)]
pub struct ArtifactRecord {
    pub filename: String,
    pub record_id: Uuid,
    pub number: String,
    pub created_by: String,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl<P: DocumentPayload> ArtifactSource for CollectionStore<P> {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn artifact_dir(&self) -> &Path {
        &self.spec.artifact_dir
    }

    fn artifact_records(&self) -> Result<Vec<ArtifactRecord>> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter_map(|record| {
                record.artifact_filename.clone().map(|filename| ArtifactRecord {
                    filename,
                    record_id: record.id,
                    number: record.number.clone(),
                    created_by: record.created_by.clone(),
                    updated_at: record.updated_at,
                })
            })
            .collect())
    }

    fn detach_artifact(&self, filename: &str) -> Result<Option<Uuid>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut records = self.load_all()?;
        let record = match records
            .iter_mut()
            .find(|record| record.artifact_filename.as_deref() == Some(filename))
        {
            Some(record) => record,
            None => return Ok(None),
        };
        record.artifact_filename = None;
        record.artifact_language = None;
        record.updated_at = chrono::Utc::now();
        let id = record.id;
        self.save_all(&records)?;
        Ok(Some(id))
    }
}
