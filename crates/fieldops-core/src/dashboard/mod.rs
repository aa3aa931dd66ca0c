//! Dashboard domain module.
//!
//! Assembles a dashboard from independently registered modules filtered
//! by three orthogonal axes, and keeps it fresh in the background.
//!
//! # Module Structure
//!
//! - `context`: visibility axes (`ServiceVertical`, `ProviderTier`,
//!   `BusinessContext`) and the `DashboardContext` triple
//! - `module`: the `DashboardModule` trait, visibility rules and the
//!   markup-agnostic view model
//! - `registry`: module registration and the visibility filter
//! - `composer`: initial load, layout ordering, per-module re-render
//! - `scheduler`: serialized background refresh
//! - `widgets`: the built-in module set

mod composer;
mod context;
mod module;
mod registry;
mod scheduler;
pub mod widgets;

// Re-export public API
pub use composer::{DashboardComposer, DashboardLayout};
pub use context::{BusinessContext, DashboardContext, ProviderTier, ServiceVertical};
pub use module::{
    DEFAULT_PRIORITY, DEFAULT_REFRESH_INTERVAL, DashboardModule, ListItem, ModuleRuntimeState,
    ModuleView, ModuleVisibility, Trend, ViewBody,
};
pub use registry::ModuleRegistry;
pub use scheduler::{DEFAULT_TICK_INTERVAL, RefreshScheduler};
