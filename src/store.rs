use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::record::Record;

/// Persistence collaborator for sealed records.
///
/// Implementations only need "a successful `put` is visible to a later
/// `get`"; nothing here assumes transactions. `put` on an existing
/// identifier replaces the whole record.
pub trait RecordStore: Send + Sync {
    fn put(&self, record: &Record) -> impl Future<Output = Result<()>> + Send;

    fn get(&self, identifier: &str) -> impl Future<Output = Result<Option<Record>>> + Send;

    /// Returns `false` if nothing was stored under `identifier`.
    fn delete(&self, identifier: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Every readable record, in no particular order.
    ///
    /// Entries that cannot be parsed are skipped rather than failing the
    /// whole listing.
    fn list_all(&self) -> impl Future<Output = Result<Vec<Record>>> + Send;

    /// Remove every entry, including ones `list_all` skips. Returns how
    /// many were removed.
    fn clear(&self) -> impl Future<Output = Result<usize>> + Send;
}

/// In-process store, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<MutexGuard<'_, HashMap<String, Record>>> {
        self.records
            .lock()
            .map_err(|_| Error::Worker("memory store lock poisoned".to_string()))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.records()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.records()?.is_empty())
    }
}

impl RecordStore for MemoryStore {
    async fn put(&self, record: &Record) -> Result<()> {
        self.records()?
            .insert(record.identifier().to_string(), record.clone());
        Ok(())
    }

    async fn get(&self, identifier: &str) -> Result<Option<Record>> {
        Ok(self.records()?.get(identifier).cloned())
    }

    async fn delete(&self, identifier: &str) -> Result<bool> {
        Ok(self.records()?.remove(identifier).is_some())
    }

    async fn list_all(&self) -> Result<Vec<Record>> {
        Ok(self.records()?.values().cloned().collect())
    }

    async fn clear(&self) -> Result<usize> {
        let mut records = self.records()?;
        let removed = records.len();
        records.clear();
        Ok(removed)
    }
}
