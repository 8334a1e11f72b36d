use crate::{
    int_header_value, page_host_of, AppState, ConfigChanges, Effect, Header, Msg, PageEpoch,
    ProbeOutcome, RedirectCapability, RequestFacts, RequestId, SessionState,
};

/// Pure transition function: applies a message to the session context and
/// returns the effects the platform must execute.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::RequestStarted { request_id, facts } => {
            on_request_started(&mut state, request_id, facts)
        }
        Msg::ProbeResolved {
            request_id,
            epoch,
            outcome,
        } => on_probe_resolved(&mut state, request_id, epoch, outcome),
        Msg::ResponseCompleted {
            headers,
            from_cache,
        } => on_response_completed(&mut state, &headers, from_cache),
        Msg::TabActivated { host } => on_tab_activated(&mut state, host),
        Msg::TabUpdated => {
            // A same-URL in-page update still ends the page view; the dedup
            // set must not outlive it.
            state.clear_page();
            Vec::new()
        }
        Msg::ConfigChanged(changes) => on_config_changed(&mut state, changes),
        Msg::InstallStartup => ensure_setup(&mut state),
        Msg::WebpProbeResolved(supported) => {
            state.config_mut().is_webp_supported = supported;
            vec![Effect::PersistWebpSupport(supported)]
        }
    };

    (state, effects)
}

/// Re-establishes the attach invariant and opens the setup surface at most
/// once per session when no usable proxy endpoint is configured.
fn ensure_setup(state: &mut AppState) -> Vec<Effect> {
    let mut effects = Vec::new();
    if !state.config().enabled {
        return effects;
    }
    if state.session() == SessionState::Detached {
        state.set_session(SessionState::Attached);
        effects.push(Effect::AttachListeners);
    }
    if !state.setup_open() && state.config().needs_setup() {
        state.mark_setup_open();
        effects.push(Effect::OpenSetupSurface);
    }
    effects
}

fn on_request_started(
    state: &mut AppState,
    request_id: RequestId,
    facts: RequestFacts,
) -> Vec<Effect> {
    let mut effects = ensure_setup(state);

    if !state.capability().intercepts(facts.resource_type) {
        return effects;
    }

    // The host recorded at tab activation wins; fall back to the request's
    // own document URL when activation has not resolved yet.
    let page_host = match state
        .page_host()
        .map(str::to_owned)
        .or_else(|| page_host_of(&facts.document_url))
    {
        Some(host) => host,
        None => return effects,
    };

    if !state.decide_and_mark(&facts, &page_host) {
        return effects;
    }

    let target = crate::build_compress_url(&facts.url, state.config());
    match state.capability() {
        RedirectCapability::Immediate => {
            effects.push(Effect::ResolveRedirect { request_id, target });
        }
        RedirectCapability::Deferred => {
            let epoch = state.page_epoch();
            state.register_pending_probe(request_id, target);
            effects.push(Effect::ProbeRedirect {
                request_id,
                epoch,
                url: facts.url,
            });
        }
    }
    effects
}

fn on_probe_resolved(
    state: &mut AppState,
    request_id: RequestId,
    epoch: PageEpoch,
    outcome: ProbeOutcome,
) -> Vec<Effect> {
    let target = state.take_pending_probe(request_id);
    let current_page = epoch == state.page_epoch();

    // The decision is final either way: a probe that settles after the page
    // view ended resolves to "unmodified", never back into the new page.
    let effect = match (target, outcome) {
        (Some(target), ProbeOutcome::Redirect) if current_page => {
            Effect::ResolveRedirect { request_id, target }
        }
        _ => Effect::ResolveNoRedirect { request_id },
    };
    vec![effect]
}

fn on_response_completed(
    state: &mut AppState,
    headers: &[Header],
    from_cache: bool,
) -> Vec<Effect> {
    // Cached responses carry no new savings and must not double-count.
    if from_cache {
        return Vec::new();
    }
    let bytes_saved = int_header_value(headers, "x-bytes-saved");
    let bytes_processed = int_header_value(headers, "x-original-size");
    match (bytes_saved, bytes_processed) {
        (Some(saved), Some(processed)) => {
            let stats = state.apply_savings(processed, saved);
            vec![Effect::PersistStatistics(stats)]
        }
        _ => Vec::new(),
    }
}

fn on_tab_activated(state: &mut AppState, host: Option<String>) -> Vec<Effect> {
    state.set_page_host(host);
    state.clear_page();
    vec![Effect::SetIndicator {
        enabled: state.indicator_enabled(),
    }]
}

fn on_config_changed(state: &mut AppState, changes: ConfigChanges) -> Vec<Effect> {
    let mut effects = Vec::new();

    if let Some(change) = changes.enabled {
        if state.config().enabled != change.new {
            state.config_mut().enabled = change.new;
            match (change.new, state.session()) {
                (true, SessionState::Detached) => {
                    state.set_session(SessionState::Attached);
                    effects.push(Effect::AttachListeners);
                }
                (false, SessionState::Attached) => {
                    state.set_session(SessionState::Detached);
                    effects.push(Effect::DetachListeners);
                }
                _ => {}
            }
            effects.push(Effect::SetIndicator {
                enabled: state.indicator_enabled(),
            });
        }
    }
    if let Some(change) = changes.proxy_url {
        if state.config().proxy_url != change.new {
            state.config_mut().proxy_url = change.new;
        }
    }
    if let Some(change) = changes.disabled_hosts {
        if state.config().disabled_hosts != change.new {
            state.config_mut().disabled_hosts = change.new;
            effects.push(Effect::SetIndicator {
                enabled: state.indicator_enabled(),
            });
        }
    }
    if let Some(change) = changes.convert_bw {
        if state.config().convert_bw != change.new {
            state.config_mut().convert_bw = change.new;
        }
    }
    if let Some(change) = changes.compression_level {
        if state.config().compression_level != change.new {
            state.config_mut().compression_level = change.new;
        }
    }
    if let Some(change) = changes.is_webp_supported {
        if state.config().is_webp_supported != change.new {
            state.config_mut().is_webp_supported = change.new;
        }
    }
    if let Some(change) = changes.statistics {
        if state.config().statistics != change.new {
            state.config_mut().statistics = change.new;
        }
    }

    effects
}
