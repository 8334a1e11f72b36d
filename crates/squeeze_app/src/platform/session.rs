use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use engine_logging::engine_warn;
use squeeze_core::{
    page_host_of, patch_content_security, update, AppState, Config, ConfigChanges, Effect,
    Header, Msg, ProbeOutcome, RedirectCapability, RequestFacts, ResourceType, SessionView,
};
use squeeze_engine::{EngineEvent, EngineHandle, ProbeSettings, ProbeVerdict};

use super::config_store::ConfigStore;
use super::effects::EffectRunner;
use super::indicator::{Indicator, LogIndicator};
use super::listeners::{Hook, ListenerSet};

/// Answer to the interception hook.
pub enum RedirectDecision {
    /// Let the request through unmodified.
    None,
    /// Redirect to the rewritten proxy URL.
    Redirect(String),
    /// Pending the verification probe.
    Deferred(DeferredRedirect),
}

/// Redirect decision that settles when the verification probe completes.
pub struct DeferredRedirect {
    rx: mpsc::Receiver<Option<String>>,
}

impl DeferredRedirect {
    /// Blocks until the probe settles or `timeout` elapses. `None` means
    /// the request proceeds unmodified.
    pub fn wait(self, timeout: Duration) -> Option<String> {
        self.rx.recv_timeout(timeout).ok().flatten()
    }
}

/// Session façade the host embeds: forwards hook invocations into the core
/// state machine and executes the effects it returns.
///
/// All transitions run under one lock, preserving the single
/// event-dispatch sequence the core assumes.
pub struct Session {
    shared: Arc<Mutex<AppState>>,
    store: Arc<Mutex<ConfigStore>>,
    listeners: Arc<Mutex<ListenerSet>>,
    runner: EffectRunner,
    capability: RedirectCapability,
    next_request_id: AtomicU64,
    stop_pump: Arc<AtomicBool>,
}

impl Session {
    /// Opens a session over `store` with the platform's declared redirect
    /// capability, the production prober and the logging indicator.
    pub fn new(store: ConfigStore, capability: RedirectCapability) -> Self {
        Self::with_parts(
            store,
            capability,
            EngineHandle::new(ProbeSettings::default()),
            Box::new(LogIndicator::default()),
        )
    }

    /// Fully injectable constructor for embedders and tests.
    pub fn with_parts(
        store: ConfigStore,
        capability: RedirectCapability,
        engine: EngineHandle,
        indicator: Box<dyn Indicator>,
    ) -> Self {
        let config = store.config().clone();
        let store = Arc::new(Mutex::new(store));
        let listeners = Arc::new(Mutex::new(ListenerSet::default()));
        let runner = EffectRunner::new(
            engine.clone(),
            store.clone(),
            listeners.clone(),
            indicator,
        );
        let shared = Arc::new(Mutex::new(AppState::new(config.clone(), capability)));

        // Bring hook registration in line with the enabled flag, then kick
        // off the one-shot WebP capability detection.
        if config.enabled {
            runner.run(&[Effect::AttachListeners]);
        }
        engine.detect_webp();

        let stop_pump = Arc::new(AtomicBool::new(false));
        spawn_event_pump(engine, shared.clone(), runner.clone(), stop_pump.clone());

        Self {
            shared,
            store,
            listeners,
            runner,
            capability,
            next_request_id: AtomicU64::new(1),
            stop_pump,
        }
    }

    /// Interception hook: decides whether `url` should be rerouted through
    /// the compression proxy.
    pub fn on_before_request(
        &self,
        url: &str,
        document_url: &str,
        resource_type: ResourceType,
    ) -> RedirectDecision {
        if !self.has_hook(Hook::BeforeRequest) {
            return RedirectDecision::None;
        }
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let msg = Msg::RequestStarted {
            request_id,
            facts: RequestFacts {
                url: url.to_string(),
                document_url: document_url.to_string(),
                resource_type,
            },
        };

        match self.capability {
            RedirectCapability::Immediate => {
                let effects = dispatch(&self.shared, &self.runner, msg);
                effects
                    .into_iter()
                    .find_map(|effect| match effect {
                        Effect::ResolveRedirect {
                            request_id: id,
                            target,
                        } if id == request_id => Some(target),
                        _ => None,
                    })
                    .map_or(RedirectDecision::None, RedirectDecision::Redirect)
            }
            RedirectCapability::Deferred => {
                // Park the answer channel first so a probe that settles
                // immediately still finds it.
                let (tx, rx) = mpsc::channel();
                self.runner.park_deferred(request_id, tx);
                let effects = dispatch(&self.shared, &self.runner, msg);
                let probing = effects.iter().any(|effect| {
                    matches!(effect, Effect::ProbeRedirect { request_id: id, .. } if *id == request_id)
                });
                if probing {
                    RedirectDecision::Deferred(DeferredRedirect { rx })
                } else {
                    self.runner.cancel_deferred(request_id);
                    RedirectDecision::None
                }
            }
        }
    }

    /// Completion hook: folds savings headers into the statistics.
    pub fn on_response_completed(&self, headers: Vec<Header>, from_cache: bool) {
        if !self.has_hook(Hook::Completed) {
            return;
        }
        dispatch(
            &self.shared,
            &self.runner,
            Msg::ResponseCompleted {
                headers,
                from_cache,
            },
        );
    }

    /// Headers-received hook: patches the page's content-security policy so
    /// it accepts images served from the proxy.
    pub fn on_headers_received(&self, headers: Vec<Header>) -> Vec<Header> {
        if !self.has_hook(Hook::HeadersReceived) {
            return headers;
        }
        let proxy_url = self
            .shared
            .lock()
            .expect("lock session state")
            .config()
            .proxy_url
            .clone();
        patch_content_security(headers, &proxy_url)
    }

    /// Tab-activation hook: ends the previous page view.
    pub fn on_tab_activated(&self, document_url: &str) {
        if !self.has_hook(Hook::TabActivated) {
            return;
        }
        dispatch(
            &self.shared,
            &self.runner,
            Msg::TabActivated {
                host: page_host_of(document_url),
            },
        );
    }

    /// In-tab update hook: ends the current page view.
    pub fn on_tab_updated(&self) {
        if !self.has_hook(Hook::TabUpdated) {
            return;
        }
        dispatch(&self.shared, &self.runner, Msg::TabUpdated);
    }

    /// Change-notification stream from the config store. Delivered even
    /// while detached; this is what re-attaches a disabled session.
    pub fn on_config_changed(&self, changes: ConfigChanges) {
        if changes.is_empty() {
            return;
        }
        dispatch(&self.shared, &self.runner, Msg::ConfigChanged(changes));
    }

    /// Platform install/startup signal.
    pub fn on_install_startup(&self) {
        dispatch(&self.shared, &self.runner, Msg::InstallStartup);
    }

    /// Applies a local settings edit: persists it, then feeds the resulting
    /// change notification back into the state machine.
    pub fn apply_settings(&self, config: Config) {
        let changes = self.store.lock().expect("lock store").set(config);
        self.on_config_changed(changes);
    }

    /// Writes out any deferred statistics update.
    pub fn flush(&self) {
        self.store.lock().expect("lock store").flush();
    }

    pub fn view(&self) -> SessionView {
        self.shared.lock().expect("lock session state").view()
    }

    /// Whether any transition asked the platform to open the setup surface.
    pub fn setup_requested(&self) -> bool {
        self.runner.setup_requested()
    }

    fn has_hook(&self, hook: Hook) -> bool {
        self.listeners.lock().expect("lock listeners").has(hook)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop_pump.store(true, Ordering::Relaxed);
    }
}

/// Runs one message through the state machine and executes its effects.
/// The effect run happens outside the state lock so the event pump and the
/// hook threads cannot deadlock each other.
fn dispatch(shared: &Mutex<AppState>, runner: &EffectRunner, msg: Msg) -> Vec<Effect> {
    let effects = {
        let mut guard = shared.lock().expect("lock session state");
        let (next, effects) = update(guard.clone(), msg);
        *guard = next;
        effects
    };
    runner.run(&effects);
    effects
}

fn spawn_event_pump(
    engine: EngineHandle,
    shared: Arc<Mutex<AppState>>,
    runner: EffectRunner,
    stop: Arc<AtomicBool>,
) {
    thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            match engine.try_recv() {
                Some(EngineEvent::ProbeResolved {
                    request_id,
                    epoch,
                    result,
                }) => {
                    let outcome = match result {
                        Ok(ProbeVerdict::Redirect) => ProbeOutcome::Redirect,
                        Ok(ProbeVerdict::NoRedirect) => ProbeOutcome::NoRedirect,
                        Err(err) => {
                            engine_warn!("Probe for request {} failed: {}", request_id, err.kind);
                            ProbeOutcome::Failed
                        }
                    };
                    dispatch(
                        &shared,
                        &runner,
                        Msg::ProbeResolved {
                            request_id,
                            epoch,
                            outcome,
                        },
                    );
                }
                Some(EngineEvent::WebpDetected(supported)) => {
                    dispatch(&shared, &runner, Msg::WebpProbeResolved(supported));
                }
                None => thread::sleep(Duration::from_millis(20)),
            }
        }
    });
}
