use crate::{PageEpoch, RequestId, Statistics};

/// Effects the platform binding must execute after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Register every interception hook not already registered.
    AttachListeners,
    /// Unregister every interception hook.
    DetachListeners,
    /// Update the visible enabled/disabled indicator.
    SetIndicator { enabled: bool },
    /// Ask the platform to open the first-run setup surface.
    OpenSetupSurface,
    /// Answer the interception hook: redirect to `target`.
    ResolveRedirect {
        request_id: RequestId,
        target: String,
    },
    /// Answer the interception hook: let the request through unmodified.
    ResolveNoRedirect { request_id: RequestId },
    /// Run the HEAD verification probe for `url` before committing to the
    /// redirect held back for this request.
    ProbeRedirect {
        request_id: RequestId,
        epoch: PageEpoch,
        url: String,
    },
    /// Durably store the updated statistics block.
    PersistStatistics(Statistics),
    /// Durably store the settled WebP capability.
    PersistWebpSupport(bool),
}
