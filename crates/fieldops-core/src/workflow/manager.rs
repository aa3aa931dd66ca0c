//! Visit workflow session management.
//!
//! [`WorkflowSessionManager`] is the state machine driving one technician
//! through a visit checklist: `Idle -> Active -> (Completed | Cancelled)
//! -> Idle`. Every mutation persists the session before the in-memory
//! handle is updated, so a store failure always leaves the manager on the
//! last good state, and an interrupted visit can be resumed from the
//! store after a crash or reload.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::RwLock;

use super::catalog::{VisitKind, VisitStep};
use super::model::{
    CompletionReport, PhotoAttachment, RelationshipUpdate, SessionStatus, StepDirection,
    StepStatus, VisitSession,
};
use crate::error::{FieldOpsError, Result};
use crate::event::{Event, EventBus};
use crate::store::{RecordStore, collections};

/// Manages the lifecycle of at most one active visit session.
///
/// One manager instance belongs to one technician. Construction performs
/// no IO; callers that want crash recovery await
/// [`WorkflowSessionManager::resume`] explicitly so startup can be
/// sequenced deterministically.
pub struct WorkflowSessionManager {
    store: Arc<dyn RecordStore>,
    bus: Arc<EventBus>,
    technician_id: String,
    current: RwLock<Option<VisitSession>>,
}

impl WorkflowSessionManager {
    /// Creates an idle manager for one technician.
    pub fn new(
        store: Arc<dyn RecordStore>,
        bus: Arc<EventBus>,
        technician_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            bus,
            technician_id: technician_id.into(),
            current: RwLock::new(None),
        }
    }

    /// The technician this manager's sessions belong to.
    pub fn technician_id(&self) -> &str {
        &self.technician_id
    }

    /// Adopts this technician's persisted in-progress session, if any.
    ///
    /// Queries the store for `active` sessions and resumes the most
    /// recently updated one, emitting [`Event::SessionLoaded`]. Malformed
    /// session records are logged and skipped. Calling `resume` while a
    /// session is already held is a no-op returning that session.
    pub async fn resume(&self) -> Result<Option<VisitSession>> {
        let mut guard = self.current.write().await;
        if guard.is_some() {
            return Ok(guard.clone());
        }

        let technician_id = self.technician_id.clone();
        let records = self
            .store
            .query(
                collections::VISIT_SESSIONS,
                Box::new(move |data| {
                    data["status"] == "active" && data["technician_id"] == technician_id.as_str()
                }),
            )
            .await?;

        let mut resumed: Option<VisitSession> = None;
        for record in records {
            match serde_json::from_value::<VisitSession>(record.data) {
                Ok(mut session) => {
                    // The store record id is authoritative.
                    session.id = record.id;
                    let newer = resumed
                        .as_ref()
                        .is_none_or(|best| session.updated_at > best.updated_at);
                    if newer {
                        resumed = Some(session);
                    }
                }
                Err(err) => {
                    tracing::warn!(record_id = %record.id, "skipping malformed session record: {}", err);
                }
            }
        }

        match resumed {
            Some(session) => {
                tracing::info!(session_id = %session.id, "resumed in-progress visit session");
                *guard = Some(session.clone());
                self.bus.emit(Event::SessionLoaded {
                    session: session.clone(),
                });
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    /// Starts a new visit session for a customer.
    ///
    /// # Errors
    ///
    /// Returns [`FieldOpsError::SessionActive`] if a session is already in
    /// progress, an expected user-flow race (double tap) rather than a fault.
    /// The write lock is held across persistence, so of two concurrent
    /// `start` calls exactly one wins.
    pub async fn start(&self, customer_id: &str, kind: VisitKind) -> Result<VisitSession> {
        let mut guard = self.current.write().await;
        if let Some(active) = guard.as_ref() {
            return Err(FieldOpsError::SessionActive(active.id.clone()));
        }

        let mut session = VisitSession::new(&self.technician_id, customer_id, kind);
        let id = self
            .store
            .add(collections::VISIT_SESSIONS, serde_json::to_value(&session)?)
            .await?;
        session.id = id;

        tracing::info!(session_id = %session.id, "started {} visit session", kind);
        *guard = Some(session.clone());
        self.bus.emit(Event::SessionStarted {
            session: session.clone(),
        });

        Ok(session)
    }

    /// Saves a step payload, marks the step completed and makes it the
    /// current step (saving does not necessarily advance).
    pub async fn save_step(&self, step: VisitStep, payload: Value) -> Result<()> {
        let mut guard = self.current.write().await;
        let session = guard.as_mut().ok_or(FieldOpsError::NoActiveSession)?;
        Self::ensure_in_catalog(session.kind, step)?;

        let mut updated = session.clone();
        updated.record_step(step, payload);
        updated.updated_at = chrono::Utc::now().to_rfc3339();
        self.persist(&updated).await?;
        *session = updated;

        self.bus.emit(Event::StepSaved {
            session_id: session.id.clone(),
            step,
        });
        Ok(())
    }

    /// Moves one step forward in the catalog, clamped at the last step.
    ///
    /// At the boundary the call is a silent no-op returning the unchanged
    /// current step: nothing persists and no event fires.
    pub async fn next(&self) -> Result<VisitStep> {
        self.navigate(StepDirection::Forward).await
    }

    /// Moves one step back in the catalog, clamped at the first step.
    pub async fn previous(&self) -> Result<VisitStep> {
        self.navigate(StepDirection::Back).await
    }

    async fn navigate(&self, direction: StepDirection) -> Result<VisitStep> {
        let mut guard = self.current.write().await;
        let session = guard.as_mut().ok_or(FieldOpsError::NoActiveSession)?;

        // The catalog is consulted on every call rather than cached on
        // the session, so it cannot drift from the fixed configuration.
        let steps = session.kind.steps();
        let index = session.current_step_index();
        let target = match direction {
            StepDirection::Forward => {
                if index + 1 < steps.len() {
                    Some(steps[index + 1])
                } else {
                    None
                }
            }
            StepDirection::Back => {
                if index > 0 {
                    Some(steps[index - 1])
                } else {
                    None
                }
            }
        };
        let Some(target) = target else {
            return Ok(session.current_step);
        };

        let mut updated = session.clone();
        updated.current_step = target;
        updated.updated_at = chrono::Utc::now().to_rfc3339();
        self.persist(&updated).await?;
        *session = updated;

        self.bus.emit(Event::StepChanged {
            session_id: session.id.clone(),
            step: target,
            direction,
        });
        Ok(target)
    }

    /// Appends a photo attachment to the active session.
    pub async fn add_photo(
        &self,
        uri: &str,
        step: VisitStep,
        caption: &str,
    ) -> Result<PhotoAttachment> {
        let mut guard = self.current.write().await;
        let session = guard.as_mut().ok_or(FieldOpsError::NoActiveSession)?;
        Self::ensure_in_catalog(session.kind, step)?;

        let photo = PhotoAttachment {
            id: uuid::Uuid::new_v4().to_string(),
            uri: uri.to_string(),
            step,
            caption: caption.to_string(),
            taken_at: chrono::Utc::now().to_rfc3339(),
        };

        let mut updated = session.clone();
        updated.photos.push(photo.clone());
        updated.updated_at = chrono::Utc::now().to_rfc3339();
        self.persist(&updated).await?;
        *session = updated;

        self.bus.emit(Event::PhotoAdded {
            session_id: session.id.clone(),
            photo: photo.clone(),
        });
        Ok(photo)
    }

    /// Completes the active session and returns the manager to idle.
    ///
    /// For prospecting visits carrying relationship data this also
    /// upserts the customer's relationship record (see
    /// [`Self::upsert_relationship`]). An upsert failure is logged and
    /// does not fail the completion; the session itself is already
    /// persisted as completed at that point.
    pub async fn complete(&self, report: CompletionReport) -> Result<VisitSession> {
        let mut guard = self.current.write().await;
        let session = guard.as_ref().ok_or(FieldOpsError::NoActiveSession)?;

        let now = chrono::Utc::now().to_rfc3339();
        let mut updated = session.clone();
        updated.status = SessionStatus::Completed;
        updated.ended_at = Some(now.clone());
        updated.completion_notes = Some(report.notes.clone());
        updated.updated_at = now;
        self.persist(&updated).await?;

        if updated.kind == VisitKind::Prospecting {
            if let Some(relationship) = &report.relationship {
                if let Err(err) = self.upsert_relationship(&updated, relationship).await {
                    tracing::warn!(
                        customer_id = %updated.customer_id,
                        "relationship upsert failed: {}",
                        err
                    );
                }
            }
        }

        tracing::info!(session_id = %updated.id, "completed visit session");
        *guard = None;
        self.bus.emit(Event::SessionCompleted {
            session: updated.clone(),
        });
        Ok(updated)
    }

    /// Cancels the active session and returns the manager to idle.
    pub async fn cancel(&self, reason: &str) -> Result<VisitSession> {
        let mut guard = self.current.write().await;
        let session = guard.as_ref().ok_or(FieldOpsError::NoActiveSession)?;

        let now = chrono::Utc::now().to_rfc3339();
        let mut updated = session.clone();
        updated.status = SessionStatus::Cancelled;
        updated.cancellation_reason = Some(reason.to_string());
        updated.cancelled_at = Some(now.clone());
        updated.updated_at = now;
        self.persist(&updated).await?;

        tracing::info!(session_id = %updated.id, "cancelled visit session");
        *guard = None;
        self.bus.emit(Event::SessionCancelled {
            session: updated.clone(),
            reason: reason.to_string(),
        });
        Ok(updated)
    }

    /// The active session, if any.
    pub async fn current_session(&self) -> Option<VisitSession> {
        self.current.read().await.clone()
    }

    /// Every catalog step of the active session tagged completed/current.
    /// Empty when no session is active.
    pub async fn steps_with_status(&self) -> Vec<StepStatus> {
        let guard = self.current.read().await;
        let Some(session) = guard.as_ref() else {
            return Vec::new();
        };

        session
            .kind
            .steps()
            .iter()
            .map(|step| StepStatus {
                step: *step,
                title: step.title(),
                completed: session.completed_steps.contains(step),
                current: *step == session.current_step,
            })
            .collect()
    }

    /// The saved payload for one step of the active session.
    pub async fn step_data(&self, step: VisitStep) -> Option<Value> {
        let guard = self.current.read().await;
        guard
            .as_ref()
            .and_then(|session| session.step_data.get(&step).cloned())
    }

    /// All photos of the active session.
    pub async fn photos(&self) -> Vec<PhotoAttachment> {
        let guard = self.current.read().await;
        guard
            .as_ref()
            .map(|session| session.photos.clone())
            .unwrap_or_default()
    }

    fn ensure_in_catalog(kind: VisitKind, step: VisitStep) -> Result<()> {
        if kind.contains(step) {
            Ok(())
        } else {
            Err(FieldOpsError::StepNotInCatalog {
                step: step.to_string(),
                kind: kind.to_string(),
            })
        }
    }

    async fn persist(&self, session: &VisitSession) -> Result<()> {
        self.store
            .update(
                collections::VISIT_SESSIONS,
                &session.id,
                serde_json::to_value(session)?,
            )
            .await
    }

    /// Creates or updates the customer's relationship record after a
    /// prospecting conversion.
    ///
    /// An existing relationship gets its stage fields refreshed and the
    /// new notes appended; a new relationship starts at `initial_contact`
    /// with interest level 3. Either path appends one record to the
    /// interaction log.
    async fn upsert_relationship(
        &self,
        session: &VisitSession,
        update: &RelationshipUpdate,
    ) -> Result<()> {
        let customer_id = session.customer_id.clone();
        let existing = self
            .store
            .query(
                collections::RELATIONSHIPS,
                Box::new(move |data| data["customer_id"] == customer_id.as_str()),
            )
            .await?;

        let now = chrono::Utc::now().to_rfc3339();
        let follow_up_required = update.next_action.is_some();

        let relationship_id = match existing.first() {
            Some(record) => {
                let previous_notes = record.data["notes"].as_str().unwrap_or_default();
                let notes = if previous_notes.is_empty() {
                    update.notes.clone()
                } else {
                    format!("{}\n\n{}", previous_notes, update.notes)
                };

                let mut patch = serde_json::Map::new();
                patch.insert("notes".to_string(), json!(notes));
                patch.insert("updated_at".to_string(), json!(now));
                if let Some(status) = &update.status {
                    patch.insert("status".to_string(), json!(status));
                }
                if let Some(interest) = update.interest_level {
                    patch.insert("interest_level".to_string(), json!(interest));
                }
                if let Some(next_action) = &update.next_action {
                    patch.insert("next_action".to_string(), json!(next_action));
                }
                if let Some(date) = &update.next_action_date {
                    patch.insert("next_action_date".to_string(), json!(date));
                }

                self.store
                    .update(collections::RELATIONSHIPS, &record.id, Value::Object(patch))
                    .await?;
                tracing::debug!(customer_id = %session.customer_id, "updated prospect relationship");
                record.id.clone()
            }
            None => {
                let customer = self
                    .store
                    .get(collections::CUSTOMERS, &session.customer_id)
                    .await?;
                let prospect_name = customer
                    .as_ref()
                    .and_then(|record| record.data["name"].as_str())
                    .unwrap_or(&session.customer_id)
                    .to_string();
                let business_name = customer
                    .as_ref()
                    .and_then(|record| record.data["business_name"].as_str())
                    .unwrap_or(&prospect_name)
                    .to_string();

                let id = self
                    .store
                    .add(
                        collections::RELATIONSHIPS,
                        json!({
                            "customer_id": session.customer_id,
                            "prospect_name": prospect_name,
                            "business_name": business_name,
                            "status": update.status.clone().unwrap_or_else(|| "initial_contact".to_string()),
                            "interest_level": update.interest_level.unwrap_or(3),
                            "notes": update.notes,
                            "next_action": update.next_action.clone().unwrap_or_default(),
                            "next_action_date": update.next_action_date,
                            "created_at": now,
                            "updated_at": now,
                        }),
                    )
                    .await?;
                tracing::debug!(customer_id = %session.customer_id, "created prospect relationship");
                id
            }
        };

        let default_outcome = if existing.is_empty() {
            "Initial visit completed"
        } else {
            ""
        };
        self.store
            .add(
                collections::RELATIONSHIP_INTERACTIONS,
                json!({
                    "relationship_id": relationship_id,
                    "session_id": session.id,
                    "interaction_type": "visit",
                    "date": now,
                    "notes": update.notes,
                    "outcome": update.outcome.clone().unwrap_or_else(|| default_outcome.to_string()),
                    "follow_up_required": follow_up_required,
                    "follow_up_date": update.next_action_date,
                }),
            )
            .await?;

        Ok(())
    }
}
