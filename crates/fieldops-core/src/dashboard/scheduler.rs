//! Background refresh scheduling.
//!
//! The scheduler re-invokes stale module loaders on a fixed cadence.
//! Ticks are strictly serialized: the run loop awaits each pass before
//! the next one starts, so a module's view is never updated by two
//! overlapping ticks. A failed refresh keeps the previous payload and
//! waits for the next natural tick, which doubles as the backoff.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use super::composer::DashboardComposer;
use crate::error::Result;
use crate::event::Event;

/// Default interval between staleness checks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically reloads stale modules for one composer.
pub struct RefreshScheduler {
    composer: Arc<DashboardComposer>,
    tick_interval: Duration,
}

impl RefreshScheduler {
    /// Creates a scheduler with the default 60 second cadence.
    pub fn new(composer: Arc<DashboardComposer>) -> Self {
        Self::with_interval(composer, DEFAULT_TICK_INTERVAL)
    }

    /// Creates a scheduler with a custom cadence.
    pub fn with_interval(composer: Arc<DashboardComposer>, tick_interval: Duration) -> Self {
        Self {
            composer,
            tick_interval,
        }
    }

    /// Runs one refresh pass over the currently visible modules.
    ///
    /// For every module whose payload is older than its refresh interval
    /// the loader is re-invoked. A structurally changed payload updates
    /// the runtime state, re-renders the module and emits
    /// [`Event::ModuleDataChanged`]; an unchanged payload only refreshes
    /// the timestamp so views are not churned for identical data.
    pub async fn tick(&self) -> Result<()> {
        let now = Instant::now();

        for module in self.composer.visible_modules() {
            let module_id = module.id().to_string();

            let Some(state) = self.composer.runtime_state(&module_id).await else {
                continue;
            };
            if !state.is_stale(module.refresh_interval(), now) {
                continue;
            }

            let payload = match module.load(self.composer.store().as_ref()).await {
                Ok(payload) => payload,
                Err(err) => {
                    tracing::warn!(module_id = %module_id, "module refresh failed: {}", err);
                    continue;
                }
            };

            if state.payload.as_ref() == Some(&payload) {
                self.composer.touch(&module_id).await;
                continue;
            }

            self.composer.commit_payload(&module_id, payload.clone()).await;
            if let Err(err) = self.composer.render_one(&module_id).await {
                tracing::warn!(module_id = %module_id, "re-render after refresh failed: {}", err);
            }
            self.composer.bus().emit(Event::ModuleDataChanged {
                module_id,
                payload,
            });
        }

        Ok(())
    }

    /// Spawns the tick loop until the token is cancelled.
    ///
    /// Tick errors are logged and the loop keeps running; the scheduler
    /// never dies from a transient backend failure.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.tick_interval);
            // Delay, not burst: a slow tick must push the next one out
            // rather than letting it start immediately afterwards.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(
                "refresh scheduler started ({}s interval)",
                self.tick_interval.as_secs()
            );

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("refresh scheduler stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(err) = self.tick().await {
                            tracing::error!("refresh tick failed: {}", err);
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::context::{BusinessContext, DashboardContext, ProviderTier, ServiceVertical};
    use crate::dashboard::module::{DashboardModule, ModuleView, ViewBody};
    use crate::dashboard::registry::ModuleRegistry;
    use crate::error::FieldOpsError;
    use crate::event::{EventBus, EventKind};
    use crate::store::{RecordPredicate, RecordStore, StoredRecord};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex;
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

    /// Returns a sequence of payloads, then keeps returning the last one.
    struct SequenceModule {
        id: &'static str,
        payloads: Mutex<Vec<Value>>,
        loads: AtomicUsize,
        fail_after_first: bool,
    }

    impl SequenceModule {
        fn new(id: &'static str, payloads: Vec<Value>) -> Self {
            Self {
                id,
                payloads: Mutex::new(payloads),
                loads: AtomicUsize::new(0),
                fail_after_first: false,
            }
        }
    }

    #[async_trait]
    impl DashboardModule for SequenceModule {
        fn id(&self) -> &str {
            self.id
        }

        fn title(&self) -> &str {
            self.id
        }

        fn refresh_interval(&self) -> Duration {
            // Always stale, so every tick reloads.
            Duration::ZERO
        }

        async fn load(&self, _store: &dyn RecordStore) -> Result<Value> {
            let count = self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail_after_first && count > 0 {
                return Err(FieldOpsError::data_access("flaky backend"));
            }
            let mut payloads = self.payloads.lock().unwrap();
            if payloads.len() > 1 {
                Ok(payloads.remove(0))
            } else {
                Ok(payloads[0].clone())
            }
        }

        fn render(&self, payload: &Value) -> ModuleView {
            ModuleView::new(
                self.id,
                self.id,
                ViewBody::Stat {
                    value: payload.to_string(),
                    label: self.id.to_string(),
                    trend: None,
                    details: Vec::new(),
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

    struct Fixture {
        composer: Arc<DashboardComposer>,
        changes: Arc<AtomicUsize>,
        renders: Arc<AtomicUsize>,
    }

    fn fixture(module: Arc<dyn DashboardModule>) -> Fixture {
        let mut registry = ModuleRegistry::new();
        registry.register(module);
        let bus = Arc::new(EventBus::new());

        let changes = Arc::new(AtomicUsize::new(0));
        let changes_clone = changes.clone();
        bus.on(EventKind::ModuleDataChanged, move |_| {
            changes_clone.fetch_add(1, Ordering::SeqCst);
        });

        let renders = Arc::new(AtomicUsize::new(0));
        let renders_clone = renders.clone();
        bus.on(EventKind::ModuleRendered, move |_| {
            renders_clone.fetch_add(1, Ordering::SeqCst);
        });

        let composer = Arc::new(DashboardComposer::new(
            Arc::new(registry),
            context(),
            Arc::new(NullStore),
            bus.clone(),
        ));

        Fixture {
            composer,
            changes,
            renders,
        }
    }

    #[tokio::test]
    async fn test_unchanged_payload_emits_nothing() {
        let fixture = fixture(Arc::new(SequenceModule::new("steady", vec![json!({"n": 1})])));
        fixture.composer.initialize().await.unwrap();

        let scheduler = RefreshScheduler::new(fixture.composer.clone());
        scheduler.tick().await.unwrap();
        scheduler.tick().await.unwrap();

        assert_eq!(fixture.changes.load(Ordering::SeqCst), 0);
        assert_eq!(fixture.renders.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_changed_payload_rerenders_and_emits() {
        let fixture = fixture(Arc::new(SequenceModule::new(
            "moving",
            vec![json!({"n": 1}), json!({"n": 2})],
        )));
        fixture.composer.initialize().await.unwrap();

        let scheduler = RefreshScheduler::new(fixture.composer.clone());
        scheduler.tick().await.unwrap();

        assert_eq!(fixture.changes.load(Ordering::SeqCst), 1);
        assert_eq!(fixture.renders.load(Ordering::SeqCst), 1);
        assert_eq!(
            fixture.composer.payload("moving").await,
            Some(json!({"n": 2}))
        );

        // Payload is now steady again: further ticks stay silent.
        scheduler.tick().await.unwrap();
        assert_eq!(fixture.changes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_payload() {
        let module = Arc::new(SequenceModule {
            id: "flaky",
            payloads: Mutex::new(vec![json!({"n": 1})]),
            loads: AtomicUsize::new(0),
            fail_after_first: true,
        });
        let fixture = fixture(module);
        fixture.composer.initialize().await.unwrap();

        let scheduler = RefreshScheduler::new(fixture.composer.clone());
        scheduler.tick().await.unwrap();
        scheduler.tick().await.unwrap();

        assert_eq!(fixture.changes.load(Ordering::SeqCst), 0);
        assert_eq!(
            fixture.composer.payload("flaky").await,
            Some(json!({"n": 1}))
        );
    }

    #[tokio::test]
    async fn test_fresh_module_is_not_reloaded() {
        struct FreshModule {
            loads: AtomicUsize,
        }

        #[async_trait]
        impl DashboardModule for FreshModule {
            fn id(&self) -> &str {
                "fresh"
            }

            fn title(&self) -> &str {
                "Fresh"
            }

            // Default 60s interval: just-loaded modules are never stale
            // within a test run.
            async fn load(&self, _store: &dyn RecordStore) -> Result<Value> {
                self.loads.fetch_add(1, Ordering::SeqCst);
                Ok(json!({"n": 1}))
            }

            fn render(&self, _payload: &Value) -> ModuleView {
                ModuleView::new(
                    "fresh",
                    "Fresh",
                    ViewBody::Placeholder {
                        message: String::new(),
                    },
                )
            }
        }

        let module = Arc::new(FreshModule {
            loads: AtomicUsize::new(0),
        });
        let fixture = fixture(module.clone());
        fixture.composer.initialize().await.unwrap();
        assert_eq!(module.loads.load(Ordering::SeqCst), 1);

        let scheduler = RefreshScheduler::new(fixture.composer.clone());
        scheduler.tick().await.unwrap();

        assert_eq!(module.loads.load(Ordering::SeqCst), 1);
    }
}
