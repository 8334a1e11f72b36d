use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};

use engine_logging::{engine_debug, engine_info};
use squeeze_core::{Effect, RequestId};
use squeeze_engine::EngineHandle;

use super::config_store::ConfigStore;
use super::indicator::Indicator;
use super::listeners::ListenerSet;

/// Executes the effects the core returns from each transition.
///
/// Shared between the hook-calling thread and the engine event pump; all
/// interior state sits behind its own lock, and the runner never calls back
/// into the state machine.
#[derive(Clone)]
pub struct EffectRunner {
    engine: EngineHandle,
    store: Arc<Mutex<ConfigStore>>,
    listeners: Arc<Mutex<ListenerSet>>,
    indicator: Arc<Mutex<Box<dyn Indicator>>>,
    pending: Arc<Mutex<HashMap<RequestId, mpsc::Sender<Option<String>>>>>,
    setup_requested: Arc<AtomicBool>,
}

impl EffectRunner {
    pub fn new(
        engine: EngineHandle,
        store: Arc<Mutex<ConfigStore>>,
        listeners: Arc<Mutex<ListenerSet>>,
        indicator: Box<dyn Indicator>,
    ) -> Self {
        Self {
            engine,
            store,
            listeners,
            indicator: Arc::new(Mutex::new(indicator)),
            pending: Arc::new(Mutex::new(HashMap::new())),
            setup_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn run(&self, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::AttachListeners => {
                    let added = self.listeners.lock().expect("lock listeners").attach_all();
                    if !added.is_empty() {
                        engine_debug!("Registered hooks: {:?}", added);
                    }
                }
                Effect::DetachListeners => {
                    let removed = self.listeners.lock().expect("lock listeners").detach_all();
                    if !removed.is_empty() {
                        engine_debug!("Unregistered hooks: {:?}", removed);
                    }
                }
                Effect::SetIndicator { enabled } => {
                    self.indicator
                        .lock()
                        .expect("lock indicator")
                        .set_enabled(*enabled);
                }
                Effect::OpenSetupSurface => {
                    self.setup_requested.store(true, Ordering::Relaxed);
                    engine_info!("Setup surface requested: no usable proxy endpoint configured");
                }
                Effect::ResolveRedirect { request_id, target } => {
                    self.fulfill(*request_id, Some(target.clone()));
                }
                Effect::ResolveNoRedirect { request_id } => {
                    self.fulfill(*request_id, None);
                }
                Effect::ProbeRedirect {
                    request_id,
                    epoch,
                    url,
                } => {
                    self.engine.probe(*request_id, *epoch, url.clone());
                }
                Effect::PersistStatistics(statistics) => {
                    self.store
                        .lock()
                        .expect("lock store")
                        .set_statistics(*statistics);
                }
                Effect::PersistWebpSupport(supported) => {
                    self.store
                        .lock()
                        .expect("lock store")
                        .set_webp_support(*supported);
                }
            }
        }
    }

    /// Whether any transition asked the platform to open the setup surface.
    pub fn setup_requested(&self) -> bool {
        self.setup_requested.load(Ordering::Relaxed)
    }

    /// Parks the answer channel for a deferred redirect until the probe
    /// settles.
    pub(crate) fn park_deferred(&self, request_id: RequestId, tx: mpsc::Sender<Option<String>>) {
        self.pending
            .lock()
            .expect("lock pending")
            .insert(request_id, tx);
    }

    /// Drops a parked channel whose request resolved without a probe.
    pub(crate) fn cancel_deferred(&self, request_id: RequestId) {
        self.pending.lock().expect("lock pending").remove(&request_id);
    }

    fn fulfill(&self, request_id: RequestId, target: Option<String>) {
        if let Some(tx) = self.pending.lock().expect("lock pending").remove(&request_id) {
            // The hook may have given up waiting; a dead receiver is fine.
            let _ = tx.send(target);
        }
    }
}
