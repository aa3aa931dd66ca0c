//! Dashboard visibility axes.
//!
//! Module visibility is gated by three independent axes: the service
//! vertical the provider operates in, the provider's tier, and the
//! solo-vs-team business context. The axes are closed enums, so an
//! "unknown axis value" cannot be constructed; a context that matches no
//! modules simply yields an empty dashboard.

use serde::{Deserialize, Serialize};

/// The service industry a provider operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceVertical {
    KitchenMaintenance,
    CleaningServices,
    LawnCare,
}

impl ServiceVertical {
    /// All verticals, used as the default visibility allow-list.
    pub const ALL: [ServiceVertical; 3] = [
        ServiceVertical::KitchenMaintenance,
        ServiceVertical::CleaningServices,
        ServiceVertical::LawnCare,
    ];
}

/// Provider tier level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderTier {
    CertifiedTechnician,
    EliteTechnician,
    TerritoryLeader,
}

impl ProviderTier {
    /// All tiers, used as the default visibility allow-list.
    pub const ALL: [ProviderTier; 3] = [
        ProviderTier::CertifiedTechnician,
        ProviderTier::EliteTechnician,
        ProviderTier::TerritoryLeader,
    ];
}

/// Solo-vs-team business structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessContext {
    Solo,
    TeamMember,
    TeamLeader,
}

impl BusinessContext {
    /// All contexts, used as the default visibility allow-list.
    pub const ALL: [BusinessContext; 3] = [
        BusinessContext::Solo,
        BusinessContext::TeamMember,
        BusinessContext::TeamLeader,
    ];
}

/// The immutable axis triple supplied at composer construction.
///
/// A context determines the visible module subset for the lifetime of one
/// composer instance; switching context means building a new composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardContext {
    pub vertical: ServiceVertical,
    pub tier: ProviderTier,
    pub context: BusinessContext,
}

impl DashboardContext {
    pub fn new(vertical: ServiceVertical, tier: ProviderTier, context: BusinessContext) -> Self {
        Self {
            vertical,
            tier,
            context,
        }
    }
}
