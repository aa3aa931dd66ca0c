//! End-to-end flows over real store backends.

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use fieldops_core::dashboard::widgets::register_builtin_widgets;
use fieldops_core::dashboard::{DashboardComposer, ModuleRegistry};
use fieldops_core::store::collections;
use fieldops_core::workflow::{CompletionReport, RelationshipUpdate};
use fieldops_core::{
    BusinessContext, EventBus, ProviderTier, RecordStore, ServiceVertical, TechnicianProfile,
    VisitKind, VisitStep, WorkflowSessionManager,
};
use fieldops_infrastructure::{JsonDirRecordStore, MemoryRecordStore};

fn certified_solo_kitchen() -> TechnicianProfile {
    TechnicianProfile {
        id: "tech-1".to_string(),
        name: "Sam".to_string(),
        vertical: ServiceVertical::KitchenMaintenance,
        tier: ProviderTier::CertifiedTechnician,
        context: BusinessContext::Solo,
    }
}

#[tokio::test]
async fn dashboard_composes_for_certified_solo_kitchen() {
    let store = Arc::new(MemoryRecordStore::new());
    let bus = Arc::new(EventBus::new());

    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    store
        .seed(
            collections::JOBS,
            "job-1",
            json!({"technician_id": "tech-1", "date": today, "status": "pending",
                   "start_time": "09:00", "customer_name": "Joe's Diner", "service_type": "Regular PM"}),
        )
        .await;
    store
        .seed(
            collections::ALERTS,
            "alert-1",
            json!({"technician_id": "tech-1", "type": "job_request", "message": "New job request", "timestamp": ""}),
        )
        .await;

    let profile = certified_solo_kitchen();
    let mut registry = ModuleRegistry::new();
    register_builtin_widgets(&mut registry, &profile);

    let composer = DashboardComposer::new(
        Arc::new(registry),
        profile.dashboard_context(),
        store,
        bus,
    );
    let layout = composer.initialize().await.unwrap();

    // Certified + solo hides team_performance (context/tier gated) and
    // parts_inventory (tier gated): 9 of the 11 stock widgets remain.
    assert_eq!(layout.len(), 9);
    assert_eq!(layout.summary.len(), 4);
    assert_eq!(layout.main.len(), 3);
    assert_eq!(layout.footer.len(), 2);

    let ids: Vec<&str> = layout.views().map(|view| view.module_id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "active_visit",
            "schedule",
            "performance",
            "feedback",
            "earnings",
            "alerts",
            "upcoming_jobs",
            "growth_opportunities",
            "equipment_history",
        ]
    );
}

#[tokio::test]
async fn prospecting_visit_converts_into_relationship() {
    let store = Arc::new(MemoryRecordStore::new());
    let bus = Arc::new(EventBus::new());
    store
        .seed(
            collections::CUSTOMERS,
            "cust-9",
            json!({"name": "Maria", "business_name": "Taco Heaven"}),
        )
        .await;

    let manager = WorkflowSessionManager::new(store.clone(), bus, "tech-1");
    manager.start("cust-9", VisitKind::Prospecting).await.unwrap();
    manager
        .save_step(
            VisitStep::PainPoints,
            json!({"summary": "walk-in cooler struggles on hot days"}),
        )
        .await
        .unwrap();
    manager
        .complete(CompletionReport {
            notes: "promising prospect".to_string(),
            relationship: Some(RelationshipUpdate {
                interest_level: Some(4),
                notes: "wants a quote".to_string(),
                next_action: Some("send quote".to_string()),
                ..Default::default()
            }),
        })
        .await
        .unwrap();

    assert_eq!(store.count(collections::RELATIONSHIPS).await, 1);
    assert_eq!(store.count(collections::RELATIONSHIP_INTERACTIONS).await, 1);

    let relationships = store
        .query(collections::RELATIONSHIPS, Box::new(|_| true))
        .await
        .unwrap();
    assert_eq!(relationships[0].data["prospect_name"], "Maria");
    assert_eq!(relationships[0].data["business_name"], "Taco Heaven");
    assert_eq!(relationships[0].data["status"], "initial_contact");
}

#[tokio::test]
async fn interrupted_visit_resumes_from_disk() {
    let dir = TempDir::new().unwrap();

    {
        let store = Arc::new(JsonDirRecordStore::new(dir.path()).await.unwrap());
        let bus = Arc::new(EventBus::new());
        let manager = WorkflowSessionManager::new(store, bus, "tech-1");
        manager.start("cust-1", VisitKind::Standard).await.unwrap();
        manager
            .save_step(VisitStep::ClientIdentification, json!({"name": "Joe's Diner"}))
            .await
            .unwrap();
        manager.next().await.unwrap();
        // Manager dropped here: simulated crash.
    }

    let store = Arc::new(JsonDirRecordStore::new(dir.path()).await.unwrap());
    let bus = Arc::new(EventBus::new());
    let manager = WorkflowSessionManager::new(store, bus, "tech-1");

    let resumed = manager.resume().await.unwrap().unwrap();
    assert_eq!(resumed.current_step, VisitStep::EquipmentIdentification);
    assert_eq!(
        resumed.completed_steps,
        vec![VisitStep::ClientIdentification]
    );
    assert_eq!(
        manager
            .step_data(VisitStep::ClientIdentification)
            .await
            .unwrap()["name"],
        "Joe's Diner"
    );
}
