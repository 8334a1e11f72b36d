use std::fmt;

/// Identifier the platform binding assigned to one intercepted request.
pub type RequestId = u64;

/// Page-view generation a probe was issued under. Echoed back unchanged so
/// the session can discard resolutions that outlived their page.
pub type PageEpoch = u64;

/// Probe conclusion about the original URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeVerdict {
    /// Commit to the held-back redirect.
    Redirect,
    /// Let the request through unmodified.
    NoRedirect,
}

/// Transport-level probe failure. The session folds this into "do not
/// redirect"; it is never surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeError {
    pub kind: ProbeFailure,
    pub message: String,
}

impl ProbeError {
    pub(crate) fn new(kind: ProbeFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFailure {
    InvalidUrl,
    Timeout,
    Network,
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::InvalidUrl => write!(f, "invalid url"),
            ProbeFailure::Timeout => write!(f, "timeout"),
            ProbeFailure::Network => write!(f, "network error"),
        }
    }
}

/// Events the engine reports back to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A verification probe settled.
    ProbeResolved {
        request_id: RequestId,
        epoch: PageEpoch,
        result: Result<ProbeVerdict, ProbeError>,
    },
    /// The one-shot WebP capability detection settled.
    WebpDetected(bool),
}
