//! The workflow-facing widget: the technician's in-progress visit.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::dashboard::module::{DashboardModule, ModuleView, ViewBody};
use crate::error::Result;
use crate::store::{RecordStore, collections};
use crate::workflow::VisitStep;

/// Shows the in-progress visit session and its checklist progress.
///
/// This module reads the session record the workflow manager persists, so
/// the dashboard reflects workflow progress without holding a reference
/// to the manager itself.
pub struct ActiveVisitModule {
    technician_id: String,
}

impl ActiveVisitModule {
    pub fn new(technician_id: impl Into<String>) -> Self {
        Self {
            technician_id: technician_id.into(),
        }
    }
}

#[async_trait]
impl DashboardModule for ActiveVisitModule {
    fn id(&self) -> &str {
        "active_visit"
    }

    fn title(&self) -> &str {
        "Current Visit"
    }

    fn priority(&self) -> u32 {
        5
    }

    async fn load(&self, store: &dyn RecordStore) -> Result<Value> {
        let technician_id = self.technician_id.clone();
        let sessions = store
            .query(
                collections::VISIT_SESSIONS,
                Box::new(move |data| {
                    data["status"] == "active" && data["technician_id"] == technician_id.as_str()
                }),
            )
            .await?;

        let Some(record) = sessions.last() else {
            return Ok(json!({"active": false}));
        };

        let data = &record.data;
        let completed = data["completed_steps"]
            .as_array()
            .map(|steps| steps.len())
            .unwrap_or(0);
        let total = match data["kind"].as_str() {
            Some("prospecting") => crate::workflow::PROSPECTING_VISIT_STEPS.len(),
            _ => crate::workflow::STANDARD_VISIT_STEPS.len(),
        };
        let step_title = data["current_step"]
            .as_str()
            .and_then(|id| serde_json::from_value::<VisitStep>(json!(id)).ok())
            .map(|step| step.title())
            .unwrap_or("Unknown step");

        Ok(json!({
            "active": true,
            "customer_id": data["customer_id"],
            "kind": data["kind"],
            "current_step_title": step_title,
            "completed": completed,
            "total": total,
        }))
    }

    fn render(&self, payload: &Value) -> ModuleView {
        if !payload["active"].as_bool().unwrap_or(false) {
            return ModuleView::new(
                self.id(),
                self.title(),
                ViewBody::Placeholder {
                    message: "No visit in progress".to_string(),
                },
            );
        }

        let completed = payload["completed"].as_u64().unwrap_or(0);
        let total = payload["total"].as_u64().unwrap_or(0);
        let mut details = vec![(
            "Customer".to_string(),
            payload["customer_id"].as_str().unwrap_or("").to_string(),
        )];
        if let Some(kind) = payload["kind"].as_str() {
            details.push(("Visit type".to_string(), kind.to_string()));
        }

        ModuleView::new(
            self.id(),
            self.title(),
            ViewBody::Stat {
                value: format!("{completed}/{total}"),
                label: payload["current_step_title"]
                    .as_str()
                    .unwrap_or("")
                    .to_string(),
                trend: None,
                details,
            },
        )
    }
}
