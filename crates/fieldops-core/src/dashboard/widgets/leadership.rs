//! Widgets for providers who run a team.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::dashboard::context::{BusinessContext, ProviderTier};
use crate::dashboard::module::{DashboardModule, ModuleView, ModuleVisibility, ViewBody};
use crate::error::Result;
use crate::store::{RecordStore, collections};

/// Team member ratings and job counts, for elite technicians and
/// territory leaders running a team.
pub struct TeamPerformanceModule;

impl TeamPerformanceModule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TeamPerformanceModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DashboardModule for TeamPerformanceModule {
    fn id(&self) -> &str {
        "team_performance"
    }

    fn title(&self) -> &str {
        "Team Performance"
    }

    fn priority(&self) -> u32 {
        70
    }

    fn refresh_interval(&self) -> Duration {
        Duration::from_secs(60 * 60)
    }

    fn visibility(&self) -> ModuleVisibility {
        ModuleVisibility::default()
            .tiers([ProviderTier::EliteTechnician, ProviderTier::TerritoryLeader])
            .contexts([BusinessContext::TeamLeader])
    }

    async fn load(&self, store: &dyn RecordStore) -> Result<Value> {
        let members = store
            .query(collections::TEAM_MEMBERS, Box::new(|_| true))
            .await?;

        let count = members.len();
        let average_rating = if count == 0 {
            0.0
        } else {
            let total: f64 = members
                .iter()
                .map(|record| record.data["rating"].as_f64().unwrap_or(0.0))
                .sum();
            (total / count as f64 * 100.0).round() / 100.0
        };
        let entries: Vec<Value> = members
            .iter()
            .map(|record| {
                json!({
                    "name": record.data["name"],
                    "rating": record.data["rating"],
                    "jobs_completed": record.data["jobs_completed"],
                })
            })
            .collect();

        Ok(json!({
            "member_count": count,
            "average_rating": average_rating,
            "members": entries,
        }))
    }

    fn render(&self, payload: &Value) -> ModuleView {
        let members = payload["members"].as_array().cloned().unwrap_or_default();
        let rows = members
            .iter()
            .map(|member| {
                vec![
                    member["name"].as_str().unwrap_or("").to_string(),
                    format!("{}/5", member["rating"].as_f64().unwrap_or(0.0)),
                    member["jobs_completed"].as_u64().unwrap_or(0).to_string(),
                ]
            })
            .collect();

        ModuleView::new(
            self.id(),
            self.title(),
            ViewBody::Table {
                columns: vec![
                    "Member".to_string(),
                    "Rating".to_string(),
                    "Jobs".to_string(),
                ],
                rows,
            },
        )
    }
}
