//! Dashboard module contract and view model.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::context::{BusinessContext, DashboardContext, ProviderTier, ServiceVertical};
use crate::error::Result;
use crate::store::RecordStore;

/// Default render priority for modules that do not declare one.
pub const DEFAULT_PRIORITY: u32 = 100;

/// Default refresh cadence for modules that do not declare one.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Allow-lists gating where a module appears.
///
/// A module is visible when each of the three lists contains the
/// corresponding value of the dashboard context. The default is visible
/// everywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleVisibility {
    pub verticals: Vec<ServiceVertical>,
    pub tiers: Vec<ProviderTier>,
    pub contexts: Vec<BusinessContext>,
}

impl Default for ModuleVisibility {
    fn default() -> Self {
        Self {
            verticals: ServiceVertical::ALL.to_vec(),
            tiers: ProviderTier::ALL.to_vec(),
            contexts: BusinessContext::ALL.to_vec(),
        }
    }
}

impl ModuleVisibility {
    /// Visible in every vertical, tier and context.
    pub fn everywhere() -> Self {
        Self::default()
    }

    /// Restricts visibility to the given verticals.
    pub fn verticals(mut self, verticals: impl IntoIterator<Item = ServiceVertical>) -> Self {
        self.verticals = verticals.into_iter().collect();
        self
    }

    /// Restricts visibility to the given tiers.
    pub fn tiers(mut self, tiers: impl IntoIterator<Item = ProviderTier>) -> Self {
        self.tiers = tiers.into_iter().collect();
        self
    }

    /// Restricts visibility to the given business contexts.
    pub fn contexts(mut self, contexts: impl IntoIterator<Item = BusinessContext>) -> Self {
        self.contexts = contexts.into_iter().collect();
        self
    }

    /// Tests all three axes against a context.
    pub fn allows(&self, context: &DashboardContext) -> bool {
        self.verticals.contains(&context.vertical)
            && self.tiers.contains(&context.tier)
            && self.contexts.contains(&context.context)
    }
}

/// A self-contained dashboard widget.
///
/// Implementations own their data source (a query against the record
/// store), their render logic (payload to view model) and their refresh
/// cadence. The composer and scheduler drive them; modules never call
/// each other.
#[async_trait]
pub trait DashboardModule: Send + Sync {
    /// Unique module identifier within a registry.
    fn id(&self) -> &str;

    /// Human-readable card title.
    fn title(&self) -> &str;

    /// Render priority; lower renders earlier.
    fn priority(&self) -> u32 {
        DEFAULT_PRIORITY
    }

    /// How stale this module's payload may get before the scheduler
    /// reloads it.
    fn refresh_interval(&self) -> Duration {
        DEFAULT_REFRESH_INTERVAL
    }

    /// Where this module appears.
    fn visibility(&self) -> ModuleVisibility {
        ModuleVisibility::default()
    }

    /// Loads the module's payload from the record store.
    async fn load(&self, store: &dyn RecordStore) -> Result<Value>;

    /// Projects a payload into a markup-agnostic view model.
    fn render(&self, payload: &Value) -> ModuleView;
}

/// Direction of a stat's movement since the previous period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

/// One entry of a [`ViewBody::List`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItem {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

impl ListItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            badge: None,
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = Some(badge.into());
        self
    }
}

/// Markup-agnostic body of a rendered module card.
///
/// The embedding UI decides how each shape maps to pixels; the core only
/// decides what is shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewBody {
    /// Shown before the first successful load, or when the first load failed.
    Placeholder { message: String },
    /// A single highlighted figure with an optional trend and detail rows.
    Stat {
        value: String,
        label: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        trend: Option<Trend>,
        details: Vec<(String, String)>,
    },
    /// Column-oriented tabular data.
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// A vertical list of items.
    List { items: Vec<ListItem> },
}

/// A rendered module card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleView {
    pub module_id: String,
    pub title: String,
    pub body: ViewBody,
}

impl ModuleView {
    pub fn new(module_id: impl Into<String>, title: impl Into<String>, body: ViewBody) -> Self {
        Self {
            module_id: module_id.into(),
            title: title.into(),
            body,
        }
    }

    /// The view shown while a module has never loaded successfully.
    pub fn placeholder(module_id: impl Into<String>, title: impl Into<String>) -> Self {
        let title = title.into();
        let message = format!("Loading {}...", title.to_lowercase());
        Self {
            module_id: module_id.into(),
            title,
            body: ViewBody::Placeholder { message },
        }
    }
}

/// Per-module mutable runtime record.
///
/// Created for every registered module when a composer is built, mutated
/// only by loader outcomes, and kept for the composer's lifetime.
#[derive(Debug, Clone, Default)]
pub struct ModuleRuntimeState {
    /// Last successfully loaded payload. `None` until the first success;
    /// a failed refresh never clears a previous payload.
    pub payload: Option<Value>,
    /// Time of the last successful load.
    pub last_load: Option<Instant>,
}

impl ModuleRuntimeState {
    /// Whether the payload is due for a reload.
    pub fn is_stale(&self, refresh_interval: Duration, now: Instant) -> bool {
        match self.last_load {
            Some(loaded) => now.duration_since(loaded) >= refresh_interval,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_visibility_allows_everything() {
        let visibility = ModuleVisibility::default();
        for vertical in ServiceVertical::ALL {
            for tier in ProviderTier::ALL {
                for context in BusinessContext::ALL {
                    assert!(visibility.allows(&DashboardContext::new(vertical, tier, context)));
                }
            }
        }
    }

    #[test]
    fn test_restricted_visibility_gates_each_axis() {
        let visibility = ModuleVisibility::default()
            .verticals([ServiceVertical::KitchenMaintenance])
            .tiers([ProviderTier::EliteTechnician, ProviderTier::TerritoryLeader])
            .contexts([BusinessContext::TeamLeader]);

        assert!(visibility.allows(&DashboardContext::new(
            ServiceVertical::KitchenMaintenance,
            ProviderTier::EliteTechnician,
            BusinessContext::TeamLeader,
        )));
        assert!(!visibility.allows(&DashboardContext::new(
            ServiceVertical::LawnCare,
            ProviderTier::EliteTechnician,
            BusinessContext::TeamLeader,
        )));
        assert!(!visibility.allows(&DashboardContext::new(
            ServiceVertical::KitchenMaintenance,
            ProviderTier::CertifiedTechnician,
            BusinessContext::TeamLeader,
        )));
        assert!(!visibility.allows(&DashboardContext::new(
            ServiceVertical::KitchenMaintenance,
            ProviderTier::EliteTechnician,
            BusinessContext::Solo,
        )));
    }

    #[test]
    fn test_runtime_state_staleness() {
        let now = Instant::now();
        let state = ModuleRuntimeState::default();
        assert!(state.is_stale(Duration::from_secs(60), now));

        let state = ModuleRuntimeState {
            payload: None,
            last_load: Some(now),
        };
        assert!(!state.is_stale(Duration::from_secs(60), now));
        assert!(state.is_stale(Duration::ZERO, now));
    }
}
