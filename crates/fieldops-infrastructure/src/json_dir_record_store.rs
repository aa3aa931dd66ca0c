//! Directory-backed RecordStore implementation.
//!
//! One JSON file per record, one directory per collection:
//!
//! ```text
//! base_dir/
//! ├── visit_sessions/
//! │   ├── <record-id>.json
//! │   └── <record-id>.json
//! └── relationships/
//!     └── <record-id>.json
//! ```
//!
//! Queries return records in lexicographic id order, which is this
//! store's documented stable order. Record ids are store-generated UUIDs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;

use fieldops_core::Result;
use fieldops_core::error::FieldOpsError;
use fieldops_core::store::{RecordPredicate, RecordStore, StoredRecord, merge_patch};

use crate::paths::FieldOpsPaths;

/// A RecordStore persisting each record as a JSON file.
pub struct JsonDirRecordStore {
    base_dir: PathBuf,
}

impl JsonDirRecordStore {
    /// Creates a store rooted at the platform data directory
    /// (`<data_dir>/fieldops/records`).
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be determined or
    /// created.
    pub async fn default_location() -> Result<Self> {
        Self::new(FieldOpsPaths::records_dir()?).await
    }

    /// Creates a store rooted at `base_dir`, creating it if needed.
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).await?;
        Ok(Self { base_dir })
    }

    /// The directory this store persists into.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn record_path(&self, collection: &str, id: &str) -> PathBuf {
        self.base_dir.join(collection).join(format!("{id}.json"))
    }

    async fn read_record(&self, path: &Path, id: &str) -> Result<StoredRecord> {
        let raw = fs::read_to_string(path).await?;
        let data: Value = serde_json::from_str(&raw)?;
        Ok(StoredRecord::new(id, data))
    }

    async fn write_record(&self, collection: &str, id: &str, data: &Value) -> Result<()> {
        let dir = self.base_dir.join(collection);
        fs::create_dir_all(&dir).await?;
        let raw = serde_json::to_string_pretty(data)?;
        fs::write(self.record_path(collection, id), raw).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonDirRecordStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredRecord>> {
        let path = self.record_path(collection, id);
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        Ok(Some(self.read_record(&path, id).await?))
    }

    async fn query(
        &self,
        collection: &str,
        predicate: RecordPredicate,
    ) -> Result<Vec<StoredRecord>> {
        let dir = self.base_dir.join(collection);
        if !fs::try_exists(&dir).await? {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(id) = name.strip_suffix(".json") {
                ids.push(id.to_string());
            }
        }
        // Lexicographic id order is the documented stable order.
        ids.sort();

        let mut records = Vec::new();
        for id in ids {
            let path = self.record_path(collection, &id);
            match self.read_record(&path, &id).await {
                Ok(record) => {
                    if predicate(&record.data) {
                        records.push(record);
                    }
                }
                Err(err) => {
                    tracing::warn!(record_id = %id, "skipping unreadable record file: {}", err);
                }
            }
        }
        Ok(records)
    }

    async fn add(&self, collection: &str, data: Value) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.write_record(collection, &id, &data).await?;
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<()> {
        let path = self.record_path(collection, id);
        if !fs::try_exists(&path).await? {
            return Err(FieldOpsError::not_found("record", id));
        }

        let mut record = self.read_record(&path, id).await?;
        merge_patch(&mut record.data, patch)?;
        self.write_record(collection, id, &record.data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    async fn store() -> (TempDir, JsonDirRecordStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonDirRecordStore::new(dir.path().join("records"))
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_round_trips_through_real_files() {
        let (_dir, store) = store().await;

        let id = store
            .add("visit_sessions", json!({"status": "active", "customer_id": "cust-1"}))
            .await
            .unwrap();

        let record = store.get("visit_sessions", &id).await.unwrap().unwrap();
        assert_eq!(record.data["status"], "active");
        assert!(
            store
                .base_dir()
                .join("visit_sessions")
                .join(format!("{id}.json"))
                .exists()
        );
    }

    #[tokio::test]
    async fn test_update_persists_merged_document() {
        let (_dir, store) = store().await;
        let id = store
            .add("visit_sessions", json!({"status": "active", "notes": "n"}))
            .await
            .unwrap();

        store
            .update("visit_sessions", &id, json!({"status": "completed"}))
            .await
            .unwrap();

        // A fresh store over the same directory sees the merged document.
        let reopened = JsonDirRecordStore::new(store.base_dir()).await.unwrap();
        let record = reopened.get("visit_sessions", &id).await.unwrap().unwrap();
        assert_eq!(record.data["status"], "completed");
        assert_eq!(record.data["notes"], "n");
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let (_dir, store) = store().await;
        let err = store
            .update("visit_sessions", "missing", json!({"status": "completed"}))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_query_filters_and_orders_by_id() {
        let (_dir, store) = store().await;
        let mut active_ids = Vec::new();
        for i in 0..3 {
            let id = store
                .add("visit_sessions", json!({"status": "active", "n": i}))
                .await
                .unwrap();
            active_ids.push(id);
        }
        store
            .add("visit_sessions", json!({"status": "completed"}))
            .await
            .unwrap();

        let active = store
            .query(
                "visit_sessions",
                Box::new(|data| data["status"] == "active"),
            )
            .await
            .unwrap();

        assert_eq!(active.len(), 3);
        active_ids.sort();
        let queried: Vec<&str> = active.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(queried, active_ids.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_query_missing_collection_is_empty() {
        let (_dir, store) = store().await;
        assert!(
            store
                .query("nothing", Box::new(|_| true))
                .await
                .unwrap()
                .is_empty()
        );
    }
}
