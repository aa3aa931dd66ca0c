//! Dashboard composition.
//!
//! The composer owns the per-module runtime state for one dashboard
//! context. It performs the initial concurrent load, produces the ordered
//! layout, and re-renders individual modules after background refreshes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tokio::sync::RwLock;

use super::context::DashboardContext;
use super::module::{DashboardModule, ModuleRuntimeState, ModuleView};
use super::registry::ModuleRegistry;
use crate::error::{FieldOpsError, Result};
use crate::event::{Event, EventBus};
use crate::store::RecordStore;

/// The rendered dashboard, grouped into presentation rows.
///
/// The grouping rule is fixed for visual parity with the production
/// layout: the first four visible modules form a compact summary row, the
/// next three a wide main row, and the remainder the footer row.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DashboardLayout {
    pub summary: Vec<ModuleView>,
    pub main: Vec<ModuleView>,
    pub footer: Vec<ModuleView>,
}

impl DashboardLayout {
    fn from_views(mut views: Vec<ModuleView>) -> Self {
        let footer = views.split_off(views.len().min(7));
        let main = views.split_off(views.len().min(4));
        Self {
            summary: views,
            main,
            footer,
        }
    }

    /// All views in render order.
    pub fn views(&self) -> impl Iterator<Item = &ModuleView> {
        self.summary
            .iter()
            .chain(self.main.iter())
            .chain(self.footer.iter())
    }

    /// Total number of rendered module cards.
    pub fn len(&self) -> usize {
        self.summary.len() + self.main.len() + self.footer.len()
    }

    /// Whether the dashboard rendered no modules at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Orchestrates module loading and rendering for one dashboard context.
///
/// The context is fixed at construction; building a dashboard for a
/// different vertical, tier or business context means building a new
/// composer.
pub struct DashboardComposer {
    registry: Arc<ModuleRegistry>,
    context: DashboardContext,
    store: Arc<dyn RecordStore>,
    bus: Arc<EventBus>,
    runtime: RwLock<HashMap<String, ModuleRuntimeState>>,
}

impl DashboardComposer {
    /// Creates a composer with an empty runtime state for every
    /// registered module. No IO happens until [`DashboardComposer::initialize`].
    pub fn new(
        registry: Arc<ModuleRegistry>,
        context: DashboardContext,
        store: Arc<dyn RecordStore>,
        bus: Arc<EventBus>,
    ) -> Self {
        let runtime = registry
            .all_modules()
            .iter()
            .map(|module| (module.id().to_string(), ModuleRuntimeState::default()))
            .collect();

        Self {
            registry,
            context,
            store,
            bus,
            runtime: RwLock::new(runtime),
        }
    }

    /// The axis triple this composer was built for.
    pub fn context(&self) -> DashboardContext {
        self.context
    }

    /// The modules visible in this composer's context, in render order.
    pub fn visible_modules(&self) -> Vec<Arc<dyn DashboardModule>> {
        self.registry.visible_modules(&self.context)
    }

    /// Loads every visible module concurrently, then renders the full
    /// layout and emits [`Event::Composed`].
    ///
    /// A loader failure is contained to its module: the failure is logged,
    /// the module keeps its previous payload (or renders a placeholder if
    /// it never loaded), and composition proceeds for all other modules.
    pub async fn initialize(&self) -> Result<DashboardLayout> {
        let modules = self.visible_modules();

        let loads = modules.iter().map(|module| {
            let module = module.clone();
            let store = self.store.clone();
            async move {
                let outcome = module.load(store.as_ref()).await;
                (module.id().to_string(), outcome)
            }
        });
        let outcomes = futures::future::join_all(loads).await;

        {
            let mut runtime = self.runtime.write().await;
            for (module_id, outcome) in outcomes {
                match outcome {
                    Ok(payload) => {
                        let state = runtime.entry(module_id).or_default();
                        state.payload = Some(payload);
                        state.last_load = Some(Instant::now());
                    }
                    Err(err) => {
                        tracing::warn!(module_id = %module_id, "initial module load failed: {}", err);
                    }
                }
            }
        }

        let layout = self.render().await;
        self.bus.emit(Event::Composed {
            module_ids: modules.iter().map(|m| m.id().to_string()).collect(),
        });

        Ok(layout)
    }

    /// Renders every visible module from its current runtime payload.
    pub async fn render(&self) -> DashboardLayout {
        let modules = self.visible_modules();
        let runtime = self.runtime.read().await;

        let views = modules
            .iter()
            .map(|module| Self::view_for(module, runtime.get(module.id())))
            .collect();

        DashboardLayout::from_views(views)
    }

    /// Re-renders a single module in place from its current payload and
    /// emits [`Event::ModuleRendered`].
    ///
    /// # Errors
    ///
    /// Returns [`FieldOpsError::UnknownModule`] for an id that was never
    /// registered; nothing is mutated in that case.
    pub async fn render_one(&self, module_id: &str) -> Result<ModuleView> {
        let module = self
            .registry
            .get(module_id)
            .ok_or_else(|| FieldOpsError::UnknownModule(module_id.to_string()))?;

        let view = {
            let runtime = self.runtime.read().await;
            Self::view_for(&module, runtime.get(module_id))
        };

        self.bus.emit(Event::ModuleRendered {
            module_id: module_id.to_string(),
        });

        Ok(view)
    }

    /// The last successfully loaded payload for a module, if any.
    pub async fn payload(&self, module_id: &str) -> Option<Value> {
        let runtime = self.runtime.read().await;
        runtime.get(module_id).and_then(|state| state.payload.clone())
    }

    fn view_for(module: &Arc<dyn DashboardModule>, state: Option<&ModuleRuntimeState>) -> ModuleView {
        match state.and_then(|s| s.payload.as_ref()) {
            Some(payload) => module.render(payload),
            None => ModuleView::placeholder(module.id(), module.title()),
        }
    }

    /// The record store loaders read from.
    pub(crate) fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// The bus this composer publishes on.
    pub(crate) fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Snapshot of a module's runtime state, for staleness checks.
    pub(crate) async fn runtime_state(&self, module_id: &str) -> Option<ModuleRuntimeState> {
        let runtime = self.runtime.read().await;
        runtime.get(module_id).cloned()
    }

    /// Stores a freshly loaded payload and stamps the load time.
    pub(crate) async fn commit_payload(&self, module_id: &str, payload: Value) {
        let mut runtime = self.runtime.write().await;
        let state = runtime.entry(module_id.to_string()).or_default();
        state.payload = Some(payload);
        state.last_load = Some(Instant::now());
    }

    /// Stamps the load time without touching the payload (refresh came
    /// back structurally unchanged).
    pub(crate) async fn touch(&self, module_id: &str) {
        let mut runtime = self.runtime.write().await;
        let state = runtime.entry(module_id.to_string()).or_default();
        state.last_load = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::context::{BusinessContext, ProviderTier, ServiceVertical};
    use crate::dashboard::module::ViewBody;
    use crate::event::EventKind;
    use crate::store::{RecordPredicate, StoredRecord};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullStore;

    #[async_trait]
    impl RecordStore for NullStore {
        async fn get(&self, _collection: &str, _id: &str) -> Result<Option<StoredRecord>> {
            Ok(None)
        }

        async fn query(
            &self,
            _collection: &str,
            _predicate: RecordPredicate,
        ) -> Result<Vec<StoredRecord>> {
            Ok(Vec::new())
        }

        async fn add(&self, _collection: &str, _data: Value) -> Result<String> {
            Ok("id".to_string())
        }

        async fn update(&self, _collection: &str, _id: &str, _patch: Value) -> Result<()> {
            Ok(())
        }
    }

    struct FixedModule {
        id: String,
        priority: u32,
        payload: Value,
    }

    #[async_trait]
    impl DashboardModule for FixedModule {
        fn id(&self) -> &str {
            &self.id
        }

        fn title(&self) -> &str {
            &self.id
        }

        fn priority(&self) -> u32 {
            self.priority
        }

        async fn load(&self, _store: &dyn RecordStore) -> Result<Value> {
            Ok(self.payload.clone())
        }

        fn render(&self, payload: &Value) -> ModuleView {
            ModuleView::new(
                self.id.clone(),
                self.id.clone(),
                ViewBody::Stat {
                    value: payload["value"].to_string(),
                    label: self.id.to_string(),
                    trend: None,
                    details: Vec::new(),
                },
            )
        }
    }

    struct FailingModule;

    #[async_trait]
    impl DashboardModule for FailingModule {
        fn id(&self) -> &str {
            "failing"
        }

        fn title(&self) -> &str {
            "Failing"
        }

        fn priority(&self) -> u32 {
            1
        }

        async fn load(&self, _store: &dyn RecordStore) -> Result<Value> {
            Err(FieldOpsError::data_access("backend unavailable"))
        }

        fn render(&self, _payload: &Value) -> ModuleView {
            ModuleView::new(
                "failing",
                "Failing",
                ViewBody::Placeholder {
                    message: "should not be rendered from a payload".to_string(),
                },
            )
        }
    }

    fn context() -> DashboardContext {
        DashboardContext::new(
            ServiceVertical::KitchenMaintenance,
            ProviderTier::CertifiedTechnician,
            BusinessContext::Solo,
        )
    }

    fn composer_with(modules: Vec<Arc<dyn DashboardModule>>) -> DashboardComposer {
        let mut registry = ModuleRegistry::new();
        for module in modules {
            registry.register(module);
        }
        DashboardComposer::new(
            Arc::new(registry),
            context(),
            Arc::new(NullStore),
            Arc::new(EventBus::new()),
        )
    }

    fn fixed(id: &str, priority: u32) -> Arc<dyn DashboardModule> {
        Arc::new(FixedModule {
            id: id.to_string(),
            priority,
            payload: json!({"value": 1}),
        })
    }

    #[tokio::test]
    async fn test_failing_loader_does_not_block_others() {
        let composer = composer_with(vec![Arc::new(FailingModule), fixed("ok", 10)]);

        let layout = composer.initialize().await.unwrap();

        assert_eq!(layout.len(), 2);
        // The failing module renders its unloaded placeholder...
        assert!(matches!(
            layout.summary[0].body,
            ViewBody::Placeholder { .. }
        ));
        // ...while the healthy module rendered from its payload.
        assert!(matches!(layout.summary[1].body, ViewBody::Stat { .. }));
    }

    #[tokio::test]
    async fn test_layout_groups_four_three_rest() {
        let modules: Vec<Arc<dyn DashboardModule>> = (0..9)
            .map(|i| fixed(&format!("m{i}"), (i + 1) as u32 * 10))
            .collect();
        let composer = composer_with(modules);

        let layout = composer.initialize().await.unwrap();

        assert_eq!(layout.summary.len(), 4);
        assert_eq!(layout.main.len(), 3);
        assert_eq!(layout.footer.len(), 2);
        assert_eq!(layout.summary[0].module_id, "m0");
        assert_eq!(layout.footer[1].module_id, "m8");
    }

    #[tokio::test]
    async fn test_initialize_emits_composed_with_ordered_ids() {
        let mut registry = ModuleRegistry::new();
        registry.register(fixed("slow", 50));
        registry.register(fixed("fast", 5));
        let bus = Arc::new(EventBus::new());

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        bus.on(EventKind::Composed, move |event| {
            if let Event::Composed { module_ids } = event {
                seen_clone.lock().unwrap().push(module_ids.clone());
            }
        });

        let composer =
            DashboardComposer::new(Arc::new(registry), context(), Arc::new(NullStore), bus);
        composer.initialize().await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], vec!["fast".to_string(), "slow".to_string()]);
    }

    #[tokio::test]
    async fn test_render_one_unknown_module_is_config_error() {
        let composer = composer_with(vec![fixed("known", 10)]);

        let err = composer.render_one("missing").await.unwrap_err();
        assert!(matches!(err, FieldOpsError::UnknownModule(_)));
    }

    #[tokio::test]
    async fn test_render_one_emits_module_rendered() {
        let mut registry = ModuleRegistry::new();
        registry.register(fixed("known", 10));
        let bus = Arc::new(EventBus::new());

        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        bus.on(EventKind::ModuleRendered, move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        let composer =
            DashboardComposer::new(Arc::new(registry), context(), Arc::new(NullStore), bus);
        composer.initialize().await.unwrap();
        composer.render_one("known").await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
