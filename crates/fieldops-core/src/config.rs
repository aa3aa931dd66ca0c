//! Operator configuration.

use serde::{Deserialize, Serialize};

use crate::dashboard::{BusinessContext, DashboardContext, ProviderTier, ServiceVertical};

/// The persisted identity of the technician using this device.
///
/// The profile is the single source for the dashboard axis triple and for
/// the technician id the workflow session manager scopes its sessions to.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TechnicianProfile {
    pub id: String,
    pub name: String,
    pub vertical: ServiceVertical,
    pub tier: ProviderTier,
    #[serde(default = "default_business_context")]
    pub context: BusinessContext,
}

fn default_business_context() -> BusinessContext {
    BusinessContext::Solo
}

impl TechnicianProfile {
    /// Derives the dashboard context from this profile.
    pub fn dashboard_context(&self) -> DashboardContext {
        DashboardContext::new(self.vertical, self.tier, self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_defaults_to_solo() {
        let profile: TechnicianProfile = serde_json::from_str(
            r#"{"id": "tech-1", "name": "Sam", "vertical": "kitchen_maintenance", "tier": "certified_technician"}"#,
        )
        .unwrap();

        assert_eq!(profile.context, BusinessContext::Solo);
        assert_eq!(
            profile.dashboard_context().vertical,
            ServiceVertical::KitchenMaintenance
        );
    }
}
