//! Built-in dashboard widgets.
//!
//! These are the stock modules a production dashboard registers before
//! adding any custom ones. Each widget owns a store query and a view
//! projection; visibility gating (vertical, tier, context) lives on the
//! widget itself, so registering everything and letting the registry
//! filter is safe.

mod core;
mod leadership;
mod vertical;
mod visit;

pub use self::core::{
    AlertsModule, EarningsModule, FeedbackModule, GrowthOpportunitiesModule, PerformanceModule,
    ScheduleModule, UpcomingJobsModule,
};
pub use leadership::TeamPerformanceModule;
pub use vertical::{EquipmentHistoryModule, PartsInventoryModule};
pub use visit::ActiveVisitModule;

use std::sync::Arc;

use super::registry::ModuleRegistry;
use crate::config::TechnicianProfile;

/// Registers the widgets every provider sees.
pub fn register_core_widgets(registry: &mut ModuleRegistry, profile: &TechnicianProfile) {
    registry.register(Arc::new(ActiveVisitModule::new(&profile.id)));
    registry.register(Arc::new(ScheduleModule::new(&profile.id)));
    registry.register(Arc::new(PerformanceModule::new(&profile.id)));
    registry.register(Arc::new(FeedbackModule::new(&profile.id)));
    registry.register(Arc::new(EarningsModule::new(&profile.id)));
    registry.register(Arc::new(AlertsModule::new(&profile.id)));
    registry.register(Arc::new(UpcomingJobsModule::new(&profile.id)));
    registry.register(Arc::new(GrowthOpportunitiesModule::new(profile.tier)));
}

/// Registers vertical-specific widgets (their visibility limits them to
/// the matching vertical).
pub fn register_vertical_widgets(registry: &mut ModuleRegistry) {
    registry.register(Arc::new(EquipmentHistoryModule::new()));
    registry.register(Arc::new(PartsInventoryModule::new()));
}

/// Registers widgets for team leads and territory leaders.
pub fn register_leadership_widgets(registry: &mut ModuleRegistry) {
    registry.register(Arc::new(TeamPerformanceModule::new()));
}

/// Registers the full stock widget set for a technician profile.
pub fn register_builtin_widgets(registry: &mut ModuleRegistry, profile: &TechnicianProfile) {
    register_core_widgets(registry, profile);
    register_vertical_widgets(registry);
    register_leadership_widgets(registry);
}
