pub mod config;
pub mod dashboard;
pub mod error;
pub mod event;
pub mod store;
pub mod workflow;

// Re-export common error type
pub use error::{FieldOpsError, Result};

pub use config::TechnicianProfile;
pub use dashboard::{
    BusinessContext, DashboardComposer, DashboardContext, DashboardLayout, DashboardModule,
    ModuleRegistry, ProviderTier, RefreshScheduler, ServiceVertical,
};
pub use event::{Event, EventBus, EventKind, SubscriptionId};
pub use store::{RecordStore, StoredRecord};
pub use workflow::{
    CompletionReport, SessionStatus, VisitKind, VisitSession, VisitStep, WorkflowSessionManager,
};
