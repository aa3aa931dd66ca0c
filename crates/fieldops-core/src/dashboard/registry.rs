//! Module registry and visibility filtering.

use std::collections::HashMap;
use std::sync::Arc;

use super::context::DashboardContext;
use super::module::DashboardModule;

struct RegisteredModule {
    module: Arc<dyn DashboardModule>,
    /// Position of the first registration under this id. Replacement
    /// keeps the position so priority ties stay stable.
    seq: u64,
}

/// Holds the registered module set.
///
/// The registry is mutable only through [`ModuleRegistry::register`] and
/// is expected to be fully populated before it is shared with a composer.
/// Registering an id twice replaces the prior definition. Last-write-wins
/// is intentional: later registration passes (vertical, tier, context) may
/// override core defaults.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, RegisteredModule>,
    next_seq: u64,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module, replacing any prior module with the same id.
    pub fn register(&mut self, module: Arc<dyn DashboardModule>) {
        let id = module.id().to_string();
        let seq = match self.modules.get(&id) {
            Some(existing) => existing.seq,
            None => {
                self.next_seq += 1;
                self.next_seq
            }
        };
        tracing::debug!(module_id = %id, "registered dashboard module");
        self.modules.insert(id, RegisteredModule { module, seq });
    }

    /// Looks up a module by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn DashboardModule>> {
        self.modules.get(id).map(|entry| entry.module.clone())
    }

    /// Returns every registered module, in registration order.
    pub fn all_modules(&self) -> Vec<Arc<dyn DashboardModule>> {
        let mut entries: Vec<&RegisteredModule> = self.modules.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries.iter().map(|entry| entry.module.clone()).collect()
    }

    /// Returns the modules visible in `context`, ascending by priority.
    ///
    /// Pure and deterministic: equal inputs always yield the same ordered
    /// result (ties break on registration order). A context that matches
    /// nothing yields an empty list; that is a normal business outcome,
    /// not a fault.
    pub fn visible_modules(&self, context: &DashboardContext) -> Vec<Arc<dyn DashboardModule>> {
        let mut entries: Vec<&RegisteredModule> = self
            .modules
            .values()
            .filter(|entry| entry.module.visibility().allows(context))
            .collect();
        entries.sort_by_key(|entry| (entry.module.priority(), entry.seq));
        entries.iter().map(|entry| entry.module.clone()).collect()
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
