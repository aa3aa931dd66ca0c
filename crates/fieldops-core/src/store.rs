//! Record store abstraction.
//!
//! The core never talks to a concrete backend. All persistence goes
//! through [`RecordStore`], an abstract document-collection contract that
//! decouples the dashboard and workflow logic from the storage mechanism
//! (in-memory, directory of JSON files, remote document database).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FieldOpsError, Result};

/// Well-known collection names used by the core.
pub mod collections {
    /// Visit workflow sessions (one record per started visit).
    pub const VISIT_SESSIONS: &str = "visit_sessions";
    /// Customer / prospect master records.
    pub const CUSTOMERS: &str = "customers";
    /// Prospecting relationship records, one per customer.
    pub const RELATIONSHIPS: &str = "relationships";
    /// Append-only interaction log for relationships.
    pub const RELATIONSHIP_INTERACTIONS: &str = "relationship_interactions";
    /// Scheduled and historical jobs (dashboard schedule feeds).
    pub const JOBS: &str = "jobs";
    /// Operational alerts and notifications.
    pub const ALERTS: &str = "alerts";
    /// Customer feedback entries.
    pub const FEEDBACK: &str = "feedback";
    /// Per-technician earnings summaries.
    pub const EARNINGS: &str = "earnings";
    /// Per-technician performance summaries.
    pub const PERFORMANCE: &str = "performance";
    /// Serviced equipment records (kitchen maintenance vertical).
    pub const EQUIPMENT: &str = "equipment";
    /// Van-stock parts inventory (kitchen maintenance vertical).
    pub const PARTS: &str = "parts";
    /// Team member roster and metrics.
    pub const TEAM_MEMBERS: &str = "team_members";
    /// Growth opportunities (training, certification, promotion, expansion).
    pub const OPPORTUNITIES: &str = "opportunities";
}

/// A record as returned by a store: its id plus the stored JSON document.
///
/// The store-assigned id is authoritative. Documents may carry an `id`
/// field of their own (sessions do), but consumers must treat the
/// [`StoredRecord::id`] as the canonical one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub data: Value,
}

impl StoredRecord {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Predicate applied to each record's document during a query.
pub type RecordPredicate = Box<dyn Fn(&Value) -> bool + Send + Sync>;

/// An abstract record store.
///
/// This trait defines the contract for persisting and retrieving opaque
/// JSON documents grouped into named collections.
///
/// # Implementation Notes
///
/// Implementations must:
/// - Generate record ids on [`RecordStore::add`]
/// - Shallow-merge object patches on [`RecordStore::update`] (top-level
///   keys of the patch replace the stored keys)
/// - Return query results in a stable, documented order
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetches one record by id.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))`: record found
    /// - `Ok(None)`: record not found
    /// - `Err(_)`: backend failure
    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredRecord>>;

    /// Returns all records of a collection whose document satisfies the
    /// predicate, in the backend's stable order. A missing collection
    /// yields an empty result, not an error.
    async fn query(&self, collection: &str, predicate: RecordPredicate)
        -> Result<Vec<StoredRecord>>;

    /// Adds a record and returns the generated id.
    async fn add(&self, collection: &str, data: Value) -> Result<String>;

    /// Shallow-merges `patch` into an existing record's document.
    ///
    /// # Errors
    ///
    /// Returns [`FieldOpsError::NotFound`] if the record does not exist.
    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<()>;
}

/// Merges the top-level keys of an object `patch` into `target`.
///
/// Shared by store implementations so update semantics cannot drift
/// between backends. Non-object targets are replaced wholesale.
pub fn merge_patch(target: &mut Value, patch: Value) -> Result<()> {
    let Value::Object(patch_map) = patch else {
        return Err(FieldOpsError::data_access(
            "update patch must be a JSON object",
        ));
    };

    match target {
        Value::Object(target_map) => {
            for (key, value) in patch_map {
                target_map.insert(key, value);
            }
        }
        other => {
            *other = Value::Object(patch_map);
        }
    }

    Ok(())
}
