//! In-memory record store.
//!
//! Records live in a `Vec` behind an `RwLock`; readers clone a full
//! snapshot, writers hold the lock only for the splice. The sequence
//! order is the collection's default ordering, newest inserts first.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::error::StoreError;
use crate::models::{record_id, Record};
use crate::store::RecordStore;

pub struct MemoryStore {
    name: &'static str,
    records: RwLock<Vec<Record>>,
}

impl MemoryStore {
    pub fn new(name: &'static str, records: Vec<Record>) -> Self {
        Self {
            name,
            records: RwLock::new(records),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Record>>, StoreError> {
        self.records
            .read()
            .map_err(|_| StoreError::Poisoned(self.name))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Record>>, StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::Poisoned(self.name))
    }
}

fn has_id(record: &Record, id: &str) -> bool {
    record_id(record).as_deref() == Some(id)
}

impl RecordStore for MemoryStore {
    fn all(&self) -> Result<Vec<Record>, StoreError> {
        Ok(self.read()?.clone())
    }

    fn get(&self, id: &str) -> Result<Option<Record>, StoreError> {
        Ok(self.read()?.iter().find(|r| has_id(r, id)).cloned())
    }

    fn insert(&self, record: Record) -> Result<(), StoreError> {
        let mut records = self.write()?;
        records.insert(0, record);
        debug!(collection = self.name, size = records.len(), "inserted record");
        Ok(())
    }

    fn replace(&self, record: Record) -> Result<bool, StoreError> {
        let Some(id) = record_id(&record) else {
            return Ok(false);
        };
        let mut records = self.write()?;
        match records.iter_mut().find(|r| has_id(r, &id)) {
            Some(slot) => {
                *slot = record;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove(&self, ids: &[String]) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut records = self.write()?;
        let before = records.len();
        records.retain(|r| !ids.iter().any(|id| has_id(r, id)));
        let removed = before - records.len();
        debug!(collection = self.name, removed, "removed records");
        Ok(removed)
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.len())
    }
}
