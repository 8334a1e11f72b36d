use crate::{ConfigChanges, Header, PageEpoch, RequestFacts, RequestId};

/// Inbound messages to the session state machine, one per host hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// An outgoing request was intercepted.
    RequestStarted {
        request_id: RequestId,
        facts: RequestFacts,
    },
    /// The verification probe for a deferred redirect settled.
    ProbeResolved {
        request_id: RequestId,
        /// Page epoch the probe was issued under.
        epoch: PageEpoch,
        outcome: ProbeOutcome,
    },
    /// A request finished; savings headers may be present.
    ResponseCompleted {
        headers: Vec<Header>,
        from_cache: bool,
    },
    /// The user switched to a different tab. `host` is the new page's
    /// hostname when the platform resolved it in time.
    TabActivated { host: Option<String> },
    /// The current tab navigated or updated in place.
    TabUpdated,
    /// The config store reported changed keys.
    ConfigChanged(ConfigChanges),
    /// Platform install/startup signal.
    InstallStartup,
    /// The WebP decode-capability probe settled.
    WebpProbeResolved(bool),
}

/// Outcome of the verification probe, as seen by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The target looks like a compressible image.
    Redirect,
    /// Headers disqualified the target.
    NoRedirect,
    /// The probe itself failed. Folded into "do not redirect".
    Failed,
}
