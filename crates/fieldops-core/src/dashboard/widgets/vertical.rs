//! Vertical-specific widgets (kitchen maintenance).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::dashboard::context::{ProviderTier, ServiceVertical};
use crate::dashboard::module::{DashboardModule, ModuleView, ModuleVisibility, ViewBody};
use crate::error::Result;
use crate::store::{RecordStore, collections};

/// Service history of the equipment on this technician's accounts.
pub struct EquipmentHistoryModule;

impl EquipmentHistoryModule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EquipmentHistoryModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DashboardModule for EquipmentHistoryModule {
    fn id(&self) -> &str {
        "equipment_history"
    }

    fn title(&self) -> &str {
        "Equipment History"
    }

    fn priority(&self) -> u32 {
        90
    }

    fn refresh_interval(&self) -> Duration {
        Duration::from_secs(60 * 60)
    }

    fn visibility(&self) -> ModuleVisibility {
        ModuleVisibility::default().verticals([ServiceVertical::KitchenMaintenance])
    }

    async fn load(&self, store: &dyn RecordStore) -> Result<Value> {
        let equipment = store
            .query(collections::EQUIPMENT, Box::new(|_| true))
            .await?;

        let entries: Vec<Value> = equipment
            .iter()
            .map(|record| {
                json!({
                    "type": record.data["type"],
                    "brand": record.data["brand"],
                    "client": record.data["customer_name"],
                    "last_service": record.data["last_service_date"],
                })
            })
            .collect();

        Ok(json!({"count": entries.len(), "equipment": entries}))
    }

    fn render(&self, payload: &Value) -> ModuleView {
        let equipment = payload["equipment"].as_array().cloned().unwrap_or_default();
        let rows = equipment
            .iter()
            .map(|item| {
                vec![
                    item["type"].as_str().unwrap_or("").to_string(),
                    item["client"].as_str().unwrap_or("").to_string(),
                    item["last_service"].as_str().unwrap_or("").to_string(),
                ]
            })
            .collect();

        ModuleView::new(
            self.id(),
            self.title(),
            ViewBody::Table {
                columns: vec![
                    "Equipment".to_string(),
                    "Client".to_string(),
                    "Last Service".to_string(),
                ],
                rows,
            },
        )
    }
}

/// Van-stock parts with reorder flags. Elite and territory tiers only:
/// certified technicians order through their leader.
pub struct PartsInventoryModule;

impl PartsInventoryModule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PartsInventoryModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DashboardModule for PartsInventoryModule {
    fn id(&self) -> &str {
        "parts_inventory"
    }

    fn title(&self) -> &str {
        "Parts Inventory"
    }

    fn priority(&self) -> u32 {
        100
    }

    fn refresh_interval(&self) -> Duration {
        Duration::from_secs(60 * 60)
    }

    fn visibility(&self) -> ModuleVisibility {
        ModuleVisibility::default()
            .verticals([ServiceVertical::KitchenMaintenance])
            .tiers([ProviderTier::EliteTechnician, ProviderTier::TerritoryLeader])
    }

    async fn load(&self, store: &dyn RecordStore) -> Result<Value> {
        let parts = store.query(collections::PARTS, Box::new(|_| true)).await?;

        let entries: Vec<Value> = parts
            .iter()
            .map(|record| {
                json!({
                    "name": record.data["name"],
                    "count": record.data["count"],
                    "reorder": record.data["reorder"],
                })
            })
            .collect();

        Ok(json!({"count": entries.len(), "parts": entries}))
    }

    fn render(&self, payload: &Value) -> ModuleView {
        let parts = payload["parts"].as_array().cloned().unwrap_or_default();
        let rows = parts
            .iter()
            .map(|part| {
                let status = if part["reorder"].as_bool().unwrap_or(false) {
                    "Reorder"
                } else {
                    "OK"
                };
                vec![
                    part["name"].as_str().unwrap_or("").to_string(),
                    part["count"].as_u64().unwrap_or(0).to_string(),
                    status.to_string(),
                ]
            })
            .collect();

        ModuleView::new(
            self.id(),
            self.title(),
            ViewBody::Table {
                columns: vec![
                    "Part".to_string(),
                    "Count".to_string(),
                    "Status".to_string(),
                ],
                rows,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::context::{BusinessContext, DashboardContext};

    #[test]
    fn test_parts_inventory_hidden_from_certified_tier() {
        let module = PartsInventoryModule::new();
        let visibility = module.visibility();

        assert!(visibility.allows(&DashboardContext::new(
            ServiceVertical::KitchenMaintenance,
            ProviderTier::EliteTechnician,
            BusinessContext::Solo,
        )));
        assert!(!visibility.allows(&DashboardContext::new(
            ServiceVertical::KitchenMaintenance,
            ProviderTier::CertifiedTechnician,
            BusinessContext::Solo,
        )));
        assert!(!visibility.allows(&DashboardContext::new(
            ServiceVertical::CleaningServices,
            ProviderTier::EliteTechnician,
            BusinessContext::Solo,
        )));
    }

    #[test]
    fn test_parts_render_flags_reorder() {
        let module = PartsInventoryModule::new();
        let payload = serde_json::json!({
            "count": 2,
            "parts": [
                {"name": "Door Gaskets", "count": 2, "reorder": true},
                {"name": "Compressor Relay", "count": 3, "reorder": false},
            ],
        });

        let view = module.render(&payload);
        let ViewBody::Table { rows, .. } = view.body else {
            panic!("parts must render a table");
        };
        assert_eq!(rows[0][2], "Reorder");
        assert_eq!(rows[1][2], "OK");
    }
}
