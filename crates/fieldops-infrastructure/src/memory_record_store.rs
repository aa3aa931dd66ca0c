//! In-memory RecordStore implementation.
//!
//! The default backend for tests and development. Collections preserve
//! insertion order, which is the documented query order for this store.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use fieldops_core::error::FieldOpsError;
use fieldops_core::store::{RecordPredicate, RecordStore, StoredRecord, merge_patch};
use fieldops_core::Result;

/// A RecordStore keeping everything in process memory.
#[derive(Default)]
pub struct MemoryRecordStore {
    collections: RwLock<HashMap<String, Vec<StoredRecord>>>,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record with a caller-chosen id, for test setup.
    pub async fn seed(&self, collection: &str, id: &str, data: Value) {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(StoredRecord::new(id, data));
    }

    /// Number of records currently held in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|records| records.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredRecord>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|records| records.iter().find(|record| record.id == id).cloned()))
    }

    async fn query(
        &self,
        collection: &str,
        predicate: RecordPredicate,
    ) -> Result<Vec<StoredRecord>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| predicate(&record.data))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn add(&self, collection: &str, data: Value) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(StoredRecord::new(id.clone(), data));
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<()> {
        let mut collections = self.collections.write().await;
        let record = collections
            .get_mut(collection)
            .and_then(|records| records.iter_mut().find(|record| record.id == id))
            .ok_or_else(|| FieldOpsError::not_found("record", id))?;
        merge_patch(&mut record.data, patch)
    }
}
