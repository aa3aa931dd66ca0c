//! Visit session domain model.
//!
//! This is the "pure" model the workflow logic operates on, independent
//! of any specific storage format. Sessions serialize to opaque JSON for
//! the record store; timestamps are RFC 3339 strings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::catalog::{VisitKind, VisitStep};

/// Lifecycle status of a visit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
    Cancelled,
}

/// Direction of a step navigation, carried on the `StepChanged` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepDirection {
    Forward,
    Back,
}

/// A photo captured during a visit, associated with one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoAttachment {
    pub id: String,
    pub uri: String,
    pub step: VisitStep,
    #[serde(default)]
    pub caption: String,
    pub taken_at: String,
}

/// One technician visit progressing through an ordered step catalog.
///
/// Invariants maintained by the session manager:
/// - `current_step` is always a member of `kind`'s catalog
/// - `completed_steps` is a subset of `kind`'s catalog
/// - the session id mirrors the owning store record id (the record id is
///   authoritative and overwrites this field on load)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitSession {
    #[serde(default)]
    pub id: String,
    pub technician_id: String,
    pub customer_id: String,
    pub kind: VisitKind,
    pub status: SessionStatus,
    pub current_step: VisitStep,
    #[serde(default)]
    pub completed_steps: Vec<VisitStep>,
    #[serde(default)]
    pub step_data: HashMap<VisitStep, Value>,
    #[serde(default)]
    pub photos: Vec<PhotoAttachment>,
    #[serde(default)]
    pub notes: String,
    pub started_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<String>,
}

impl VisitSession {
    /// Creates a fresh active session positioned on the first step of the
    /// kind's catalog. The id is assigned once the store has generated it.
    pub fn new(
        technician_id: impl Into<String>,
        customer_id: impl Into<String>,
        kind: VisitKind,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: String::new(),
            technician_id: technician_id.into(),
            customer_id: customer_id.into(),
            kind,
            status: SessionStatus::Active,
            current_step: kind.first_step(),
            completed_steps: Vec::new(),
            step_data: HashMap::new(),
            photos: Vec::new(),
            notes: String::new(),
            started_at: now.clone(),
            updated_at: now,
            ended_at: None,
            completion_notes: None,
            cancellation_reason: None,
            cancelled_at: None,
        }
    }

    /// Whether this session is still in progress.
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Position of the current step within the kind's catalog.
    pub fn current_step_index(&self) -> usize {
        self.kind
            .steps()
            .iter()
            .position(|step| *step == self.current_step)
            .unwrap_or(0)
    }

    /// Marks a step completed (idempotent) and makes it current.
    pub fn record_step(&mut self, step: VisitStep, payload: Value) {
        self.step_data.insert(step, payload);
        if !self.completed_steps.contains(&step) {
            self.completed_steps.push(step);
        }
        self.current_step = step;
    }
}

/// One catalog step tagged with its progress relative to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepStatus {
    pub step: VisitStep,
    pub title: &'static str,
    pub completed: bool,
    pub current: bool,
}

/// Relationship fields captured when a prospecting visit converts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipUpdate {
    /// Relationship stage; defaults to `initial_contact` on first contact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// 1-5 prospect interest score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_level: Option<u8>,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

/// Final data recorded when a session completes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionReport {
    #[serde(default)]
    pub notes: String,
    /// Present only for prospecting visits that produced a conversion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<RelationshipUpdate>,
}
