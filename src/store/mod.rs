//! Record stores and the collection registry.
//!
//! The `RecordStore` trait isolates the process-wide, mutable record
//! sequence of a collection behind get-all/get/insert/replace/remove.
//! The query engine only ever sees the snapshot returned by
//! [`RecordStore::all`].

mod memory;

pub use memory::MemoryStore;

use time::OffsetDateTime;

use crate::error::StoreError;
use crate::models::Record;
use crate::schema::{self, EntitySchema};
use crate::seed::{self, SeedCounts};

/// Pluggable storage for one collection's records.
pub trait RecordStore: Send + Sync {
    /// Snapshot of every record in stored order.
    fn all(&self) -> Result<Vec<Record>, StoreError>;

    /// Look up a record by id.
    fn get(&self, id: &str) -> Result<Option<Record>, StoreError>;

    /// Add a record at the front of the sequence.
    fn insert(&self, record: Record) -> Result<(), StoreError>;

    /// Replace the record carrying the same id. Returns `false` when no
    /// such record exists.
    fn replace(&self, record: Record) -> Result<bool, StoreError>;

    /// Remove every record whose id is listed. Returns the number removed.
    fn remove(&self, ids: &[String]) -> Result<usize, StoreError>;

    /// Number of stored records.
    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

/// A named record store paired with its schema.
pub struct Collection {
    schema: &'static EntitySchema,
    store: Box<dyn RecordStore>,
}

impl Collection {
    pub fn new(schema: &'static EntitySchema, store: Box<dyn RecordStore>) -> Self {
        Self { schema, store }
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }
}

/// Every collection served by the process.
pub struct Registry {
    collections: Vec<Collection>,
}

impl Registry {
    pub fn new(collections: Vec<Collection>) -> Self {
        Self { collections }
    }

    /// Build in-memory collections populated with synthetic records.
    pub fn seeded(counts: &SeedCounts, now: OffsetDateTime) -> Self {
        let collections = schema::all()
            .into_iter()
            .map(|schema| {
                let records = seed::generate(schema, counts.for_collection(schema.name), now);
                Collection::new(schema, Box::new(MemoryStore::new(schema.name, records)))
            })
            .collect();
        Self { collections }
    }

    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.schema.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Collection> {
        self.collections.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn seeded_registry_uses_configured_counts() {
        let counts = SeedCounts {
            activities: 5,
            managed_users: 7,
            events: 0,
        };
        let registry = Registry::seeded(&counts, datetime!(2024-05-01 00:00:00 UTC));

        let sizes: Vec<(&str, usize)> = registry
            .iter()
            .map(|c| (c.schema().name, c.store().len().expect("len")))
            .collect();
        assert_eq!(
            sizes,
            vec![("activities", 5), ("managed-users", 7), ("events", 0)]
        );
        assert!(registry.get("events").expect("events").store().is_empty().expect("empty"));
        assert!(registry.get("crew").is_none());
    }
}
