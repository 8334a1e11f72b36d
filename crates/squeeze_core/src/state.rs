use std::collections::{HashMap, HashSet};

use crate::view_model::SessionView;
use crate::{should_compress, Config, RequestFacts, ResourceType, Statistics};

/// Identifier the platform binding assigns to one intercepted request.
pub type RequestId = u64;

/// Generation counter for the current page view. Bumped on every dedup
/// clear; probe resolutions carrying an older epoch are discarded.
pub type PageEpoch = u64;

/// Listener attachment state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Detached,
    Attached,
}

/// How the host platform consumes redirect decisions.
///
/// Declared by the platform binding at composition time, never sniffed from
/// environment identification strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectCapability {
    /// The interception hook must return its decision synchronously.
    Immediate,
    /// The hook may return a deferred decision, leaving room for a HEAD
    /// probe against the original URL before committing to the redirect.
    Deferred,
}

impl RedirectCapability {
    /// Resource types the platform intercepts under this capability.
    ///
    /// Deferred platforms cast a wider net; the verification probe weeds
    /// out targets that turn out not to be images.
    pub fn intercepts(self, resource_type: ResourceType) -> bool {
        match self {
            RedirectCapability::Immediate => matches!(resource_type, ResourceType::Image),
            RedirectCapability::Deferred => resource_type.is_image_bearing(),
        }
    }
}

/// Per-page set of URLs already rewritten to point at the proxy.
///
/// Scoped to one page view: cleared wholesale on tab activation and in-tab
/// updates, never partially evicted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DedupSet {
    urls: HashSet<String>,
}

impl DedupSet {
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn insert(&mut self, url: impl Into<String>) {
        self.urls.insert(url.into());
    }

    pub fn clear(&mut self) {
        self.urls.clear();
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Owned session context: configuration mirror, dedup set, setup latch and
/// attachment state, bundled so every transition takes and returns it
/// explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    config: Config,
    capability: RedirectCapability,
    session: SessionState,
    setup_open: bool,
    page_host: Option<String>,
    compressed: DedupSet,
    page_epoch: PageEpoch,
    // Redirect targets held back while their verification probe is in
    // flight, keyed by request.
    pending_probes: HashMap<RequestId, String>,
}

impl AppState {
    /// Builds the session context from a loaded configuration. The session
    /// starts `Attached` iff the configuration says enabled.
    pub fn new(config: Config, capability: RedirectCapability) -> Self {
        let session = if config.enabled {
            SessionState::Attached
        } else {
            SessionState::Detached
        };
        Self {
            config,
            capability,
            session,
            setup_open: false,
            page_host: None,
            compressed: DedupSet::default(),
            page_epoch: 0,
            pending_probes: HashMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn capability(&self) -> RedirectCapability {
        self.capability
    }

    pub fn setup_open(&self) -> bool {
        self.setup_open
    }

    pub fn page_host(&self) -> Option<&str> {
        self.page_host.as_deref()
    }

    pub fn page_epoch(&self) -> PageEpoch {
        self.page_epoch
    }

    pub fn compressed(&self) -> &DedupSet {
        &self.compressed
    }

    /// Indicator state for the current page: off when compression is
    /// disabled globally or for the active host.
    pub fn indicator_enabled(&self) -> bool {
        self.config.enabled
            && !self
                .page_host
                .as_deref()
                .is_some_and(|host| self.config.is_disabled_host(host))
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session: self.session,
            indicator_enabled: self.indicator_enabled(),
            proxy_configured: !self.config.needs_setup(),
            setup_open: self.setup_open,
            statistics: self.config.statistics,
        }
    }

    pub(crate) fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub(crate) fn set_session(&mut self, session: SessionState) {
        self.session = session;
    }

    pub(crate) fn mark_setup_open(&mut self) {
        self.setup_open = true;
    }

    pub(crate) fn set_page_host(&mut self, host: Option<String>) {
        self.page_host = host;
    }

    /// Ends the current page view: drops the dedup set and invalidates any
    /// probe still in flight for it.
    pub(crate) fn clear_page(&mut self) {
        self.compressed.clear();
        self.page_epoch += 1;
    }

    /// Runs the decision engine against this context, recording the URL in
    /// the dedup set on a positive decision.
    pub(crate) fn decide_and_mark(&mut self, facts: &RequestFacts, page_host: &str) -> bool {
        should_compress(facts, page_host, &self.config, &mut self.compressed)
    }

    pub(crate) fn register_pending_probe(&mut self, request_id: RequestId, target: String) {
        self.pending_probes.insert(request_id, target);
    }

    pub(crate) fn take_pending_probe(&mut self, request_id: RequestId) -> Option<String> {
        self.pending_probes.remove(&request_id)
    }

    /// Folds one completed response's savings into the counters and returns
    /// the updated block for persistence.
    pub(crate) fn apply_savings(&mut self, bytes_processed: u64, bytes_saved: u64) -> Statistics {
        let stats = &mut self.config.statistics;
        stats.files_processed += 1;
        stats.bytes_processed += bytes_processed;
        stats.bytes_saved += bytes_saved;
        *stats
    }
}
