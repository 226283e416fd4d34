//! Named monotonic counters, persisted as one small JSON object.
//!
//! Counters mint the numeric part of human-readable document numbers
//! (`PO00007`, `IMR0001`). Values are strictly increasing per name, start at
//! 1, and survive process restarts. A counter is never decremented except by
//! [`CounterStore::reset`], which callers must pair with clearing the owning
//! collection (`CollectionStore::reset` does both atomically).

use crate::error::Result;
use crate::store::atomic;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

pub struct CounterStore {
    path: PathBuf,
    // Serializes the read-increment-write cycle; the atomic writer alone
    // only protects individual file replacements, not the whole cycle.
    lock: Mutex<()>,
}

impl CounterStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Increment the named counter and return the new value.
    pub fn next(&self, name: &str) -> Result<u64> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut counters = self.load()?;
        let entry = counters.entry(name.to_string()).or_insert(0);
        *entry += 1;
        let value = *entry;
        self.persist(&counters)?;
        Ok(value)
    }

    /// Current value of the named counter (0 if it was never incremented).
    pub fn current(&self, name: &str) -> Result<u64> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.get(name).copied().unwrap_or(0))
    }

    /// Set the named counter back to 0.
    ///
    /// Unsafe to call while the corresponding collection is non-empty: future
    /// `next` calls would mint numbers already present in the collection.
    /// Prefer `CollectionStore::reset`, which clears the collection in the
    /// same locked operation.
    pub fn reset(&self, name: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut counters = self.load()?;
        counters.insert(name.to_string(), 0);
        self.persist(&counters)
    }

    fn load(&self) -> Result<BTreeMap<String, u64>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn persist(&self, counters: &BTreeMap<String, u64>) -> Result<()> {
        let content = serde_json::to_string_pretty(counters)?;
        atomic::write_atomic(&self.path, content.as_bytes())
    }
}
