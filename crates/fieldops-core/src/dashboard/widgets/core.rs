//! Widgets every provider sees regardless of vertical, tier or context.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::dashboard::context::ProviderTier;
use crate::dashboard::module::{DashboardModule, ListItem, ModuleView, Trend, ViewBody};
use crate::error::Result;
use crate::store::{RecordStore, collections};

fn trend_from(value: &Value) -> Option<Trend> {
    match value.as_str() {
        Some("up") => Some(Trend::Up),
        Some("down") => Some(Trend::Down),
        Some("neutral") => Some(Trend::Neutral),
        _ => None,
    }
}

fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

/// Today's job count and completion progress.
pub struct ScheduleModule {
    technician_id: String,
}

impl ScheduleModule {
    pub fn new(technician_id: impl Into<String>) -> Self {
        Self {
            technician_id: technician_id.into(),
        }
    }
}

#[async_trait]
impl DashboardModule for ScheduleModule {
    fn id(&self) -> &str {
        "schedule"
    }

    fn title(&self) -> &str {
        "Today's Schedule"
    }

    fn priority(&self) -> u32 {
        10
    }

    fn refresh_interval(&self) -> Duration {
        Duration::from_secs(5 * 60)
    }

    async fn load(&self, store: &dyn RecordStore) -> Result<Value> {
        let technician_id = self.technician_id.clone();
        let date = today();
        let jobs = store
            .query(
                collections::JOBS,
                Box::new(move |data| {
                    data["technician_id"] == technician_id.as_str()
                        && data["date"] == date.as_str()
                }),
            )
            .await?;

        let completed = jobs
            .iter()
            .filter(|record| record.data["status"] == "completed")
            .count();
        let entries: Vec<Value> = jobs
            .iter()
            .map(|record| {
                json!({
                    "time": record.data["start_time"],
                    "client": record.data["customer_name"],
                    "type": record.data["service_type"],
                    "status": record.data["status"],
                })
            })
            .collect();

        Ok(json!({
            "count": jobs.len(),
            "completed": completed,
            "jobs": entries,
        }))
    }

    fn render(&self, payload: &Value) -> ModuleView {
        let count = payload["count"].as_u64().unwrap_or(0);
        let completed = payload["completed"].as_u64().unwrap_or(0);
        ModuleView::new(
            self.id(),
            self.title(),
            ViewBody::Stat {
                value: count.to_string(),
                label: "Jobs Today".to_string(),
                trend: None,
                details: vec![("Completed".to_string(), format!("{completed} of {count}"))],
            },
        )
    }
}

/// Rating, completed-job count and on-time rate for the technician.
pub struct PerformanceModule {
    technician_id: String,
}

impl PerformanceModule {
    pub fn new(technician_id: impl Into<String>) -> Self {
        Self {
            technician_id: technician_id.into(),
        }
    }
}

#[async_trait]
impl DashboardModule for PerformanceModule {
    fn id(&self) -> &str {
        "performance"
    }

    fn title(&self) -> &str {
        "Current Performance"
    }

    fn priority(&self) -> u32 {
        20
    }

    fn refresh_interval(&self) -> Duration {
        Duration::from_secs(15 * 60)
    }

    async fn load(&self, store: &dyn RecordStore) -> Result<Value> {
        let record = store
            .get(collections::PERFORMANCE, &self.technician_id)
            .await?;
        Ok(record.map(|r| r.data).unwrap_or_else(|| json!({})))
    }

    fn render(&self, payload: &Value) -> ModuleView {
        let rating = payload["rating"].as_f64().unwrap_or(0.0);
        ModuleView::new(
            self.id(),
            self.title(),
            ViewBody::Stat {
                value: format!("{rating}%"),
                label: "Performance Score".to_string(),
                trend: trend_from(&payload["trend"]),
                details: vec![
                    (
                        "Completed Jobs".to_string(),
                        payload["completed_jobs"].as_u64().unwrap_or(0).to_string(),
                    ),
                    (
                        "On-Time Rate".to_string(),
                        format!("{}%", payload["on_time_rate"].as_f64().unwrap_or(0.0)),
                    ),
                ],
            },
        )
    }
}

/// Average customer rating with the most recent comments.
pub struct FeedbackModule {
    technician_id: String,
}

impl FeedbackModule {
    pub fn new(technician_id: impl Into<String>) -> Self {
        Self {
            technician_id: technician_id.into(),
        }
    }
}

#[async_trait]
impl DashboardModule for FeedbackModule {
    fn id(&self) -> &str {
        "feedback"
    }

    fn title(&self) -> &str {
        "Feedback Score"
    }

    fn priority(&self) -> u32 {
        30
    }

    fn refresh_interval(&self) -> Duration {
        Duration::from_secs(15 * 60)
    }

    async fn load(&self, store: &dyn RecordStore) -> Result<Value> {
        let technician_id = self.technician_id.clone();
        let entries = store
            .query(
                collections::FEEDBACK,
                Box::new(move |data| data["technician_id"] == technician_id.as_str()),
            )
            .await?;

        let count = entries.len();
        let score = if count == 0 {
            0.0
        } else {
            let total: f64 = entries
                .iter()
                .map(|record| record.data["score"].as_f64().unwrap_or(0.0))
                .sum();
            (total / count as f64 * 100.0).round() / 100.0
        };
        let recent: Vec<Value> = entries
            .iter()
            .rev()
            .take(2)
            .map(|record| {
                json!({
                    "client": record.data["customer_name"],
                    "score": record.data["score"],
                    "comment": record.data["comment"],
                })
            })
            .collect();

        Ok(json!({"score": score, "count": count, "recent": recent}))
    }

    fn render(&self, payload: &Value) -> ModuleView {
        let score = payload["score"].as_f64().unwrap_or(0.0);
        let count = payload["count"].as_u64().unwrap_or(0);
        ModuleView::new(
            self.id(),
            self.title(),
            ViewBody::Stat {
                value: format!("{score}/5"),
                label: "Customer Rating".to_string(),
                trend: None,
                details: vec![("Reviews".to_string(), count.to_string())],
            },
        )
    }
}

/// Weekly earnings with trend and monthly projection.
pub struct EarningsModule {
    technician_id: String,
}

impl EarningsModule {
    pub fn new(technician_id: impl Into<String>) -> Self {
        Self {
            technician_id: technician_id.into(),
        }
    }
}

#[async_trait]
impl DashboardModule for EarningsModule {
    fn id(&self) -> &str {
        "earnings"
    }

    fn title(&self) -> &str {
        "Earnings This Week"
    }

    fn priority(&self) -> u32 {
        40
    }

    fn refresh_interval(&self) -> Duration {
        Duration::from_secs(60 * 60)
    }

    async fn load(&self, store: &dyn RecordStore) -> Result<Value> {
        let record = store.get(collections::EARNINGS, &self.technician_id).await?;
        Ok(record.map(|r| r.data).unwrap_or_else(|| json!({})))
    }

    fn render(&self, payload: &Value) -> ModuleView {
        let weekly = &payload["weekly"];
        let amount = weekly["amount"].as_f64().unwrap_or(0.0);
        let mut details = Vec::new();
        if let Some(projected) = payload["projected_monthly"]["amount"].as_f64() {
            details.push(("Projected Monthly".to_string(), format!("${projected}")));
        }
        if let Some(change) = weekly["change_percent"].as_f64() {
            details.push(("Change".to_string(), format!("{change}%")));
        }

        ModuleView::new(
            self.id(),
            self.title(),
            ViewBody::Stat {
                value: format!("${amount}"),
                label: "This Week".to_string(),
                trend: trend_from(&weekly["trend"]),
                details,
            },
        )
    }
}

/// Newest alerts, capped at three with a view-all tail item.
pub struct AlertsModule {
    technician_id: String,
}

impl AlertsModule {
    pub fn new(technician_id: impl Into<String>) -> Self {
        Self {
            technician_id: technician_id.into(),
        }
    }
}

#[async_trait]
impl DashboardModule for AlertsModule {
    fn id(&self) -> &str {
        "alerts"
    }

    fn title(&self) -> &str {
        "Alerts & Notifications"
    }

    fn priority(&self) -> u32 {
        50
    }

    fn refresh_interval(&self) -> Duration {
        Duration::from_secs(5 * 60)
    }

    async fn load(&self, store: &dyn RecordStore) -> Result<Value> {
        let technician_id = self.technician_id.clone();
        let alerts = store
            .query(
                collections::ALERTS,
                Box::new(move |data| data["technician_id"] == technician_id.as_str()),
            )
            .await?;

        let entries: Vec<Value> = alerts
            .iter()
            .map(|record| {
                json!({
                    "type": record.data["type"],
                    "message": record.data["message"],
                    "timestamp": record.data["timestamp"],
                })
            })
            .collect();

        Ok(json!({"count": entries.len(), "alerts": entries}))
    }

    fn render(&self, payload: &Value) -> ModuleView {
        let count = payload["count"].as_u64().unwrap_or(0);
        let alerts = payload["alerts"].as_array().cloned().unwrap_or_default();

        let mut items: Vec<ListItem> = alerts
            .iter()
            .take(3)
            .map(|alert| {
                let mut item =
                    ListItem::new(alert["message"].as_str().unwrap_or("Alert").to_string());
                if let Some(kind) = alert["type"].as_str() {
                    item = item.badge(kind);
                }
                item
            })
            .collect();
        if count > 3 {
            items.push(ListItem::new(format!("View all {count} alerts")));
        }

        ModuleView::new(self.id(), self.title(), ViewBody::List { items })
    }
}

/// Upcoming jobs beyond today, as a date/time/client/type table.
pub struct UpcomingJobsModule {
    technician_id: String,
}

impl UpcomingJobsModule {
    pub fn new(technician_id: impl Into<String>) -> Self {
        Self {
            technician_id: technician_id.into(),
        }
    }
}

#[async_trait]
impl DashboardModule for UpcomingJobsModule {
    fn id(&self) -> &str {
        "upcoming_jobs"
    }

    fn title(&self) -> &str {
        "Upcoming Jobs"
    }

    fn priority(&self) -> u32 {
        60
    }

    fn refresh_interval(&self) -> Duration {
        Duration::from_secs(15 * 60)
    }

    async fn load(&self, store: &dyn RecordStore) -> Result<Value> {
        let technician_id = self.technician_id.clone();
        let date = today();
        let jobs = store
            .query(
                collections::JOBS,
                Box::new(move |data| {
                    data["technician_id"] == technician_id.as_str()
                        && data["date"].as_str().is_some_and(|d| d > date.as_str())
                }),
            )
            .await?;

        let entries: Vec<Value> = jobs
            .iter()
            .map(|record| {
                json!({
                    "date": record.data["date"],
                    "time": record.data["start_time"],
                    "client": record.data["customer_name"],
                    "type": record.data["service_type"],
                })
            })
            .collect();

        Ok(json!({"count": entries.len(), "jobs": entries}))
    }

    fn render(&self, payload: &Value) -> ModuleView {
        let jobs = payload["jobs"].as_array().cloned().unwrap_or_default();
        let rows = jobs
            .iter()
            .map(|job| {
                vec![
                    job["date"].as_str().unwrap_or("").to_string(),
                    job["time"].as_str().unwrap_or("").to_string(),
                    job["client"].as_str().unwrap_or("").to_string(),
                    job["type"].as_str().unwrap_or("").to_string(),
                ]
            })
            .collect();

        ModuleView::new(
            self.id(),
            self.title(),
            ViewBody::Table {
                columns: vec![
                    "Date".to_string(),
                    "Time".to_string(),
                    "Client".to_string(),
                    "Type".to_string(),
                ],
                rows,
            },
        )
    }
}

/// Growth opportunities, filtered to what the provider's tier can act on.
pub struct GrowthOpportunitiesModule {
    tier: ProviderTier,
}

impl GrowthOpportunitiesModule {
    pub fn new(tier: ProviderTier) -> Self {
        Self { tier }
    }

    /// Opportunity types a tier can pursue. Certified technicians see the
    /// learning/advancement track, elite technicians the expansion track,
    /// territory leaders everything.
    fn allowed_types(&self) -> Option<[&'static str; 3]> {
        match self.tier {
            ProviderTier::CertifiedTechnician => {
                Some(["training", "certification", "promotion"])
            }
            ProviderTier::EliteTechnician => Some(["promotion", "expansion", "certification"]),
            ProviderTier::TerritoryLeader => None,
        }
    }
}

#[async_trait]
impl DashboardModule for GrowthOpportunitiesModule {
    fn id(&self) -> &str {
        "growth_opportunities"
    }

    fn title(&self) -> &str {
        "Growth Opportunities"
    }

    fn priority(&self) -> u32 {
        80
    }

    fn refresh_interval(&self) -> Duration {
        Duration::from_secs(24 * 60 * 60)
    }

    async fn load(&self, store: &dyn RecordStore) -> Result<Value> {
        let allowed = self.allowed_types();
        let opportunities = store
            .query(
                collections::OPPORTUNITIES,
                Box::new(move |data| match allowed {
                    Some(types) => data["type"]
                        .as_str()
                        .is_some_and(|kind| types.contains(&kind)),
                    None => true,
                }),
            )
            .await?;

        let entries: Vec<Value> = opportunities
            .iter()
            .map(|record| {
                json!({
                    "title": record.data["title"],
                    "type": record.data["type"],
                })
            })
            .collect();

        Ok(json!({"count": entries.len(), "opportunities": entries}))
    }

    fn render(&self, payload: &Value) -> ModuleView {
        let opportunities = payload["opportunities"].as_array().cloned().unwrap_or_default();
        let items = opportunities
            .iter()
            .map(|opportunity| {
                let mut item = ListItem::new(
                    opportunity["title"].as_str().unwrap_or("Opportunity").to_string(),
                );
                if let Some(kind) = opportunity["type"].as_str() {
                    item = item.badge(kind);
                }
                item
            })
            .collect();

        ModuleView::new(self.id(), self.title(), ViewBody::List { items })
    }
}
