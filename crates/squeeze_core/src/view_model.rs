use crate::{SessionState, Statistics};

/// Read-only snapshot of the session for indicator and stats surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionView {
    pub session: SessionState,
    /// Whether the visible indicator should show compression as active for
    /// the current page.
    pub indicator_enabled: bool,
    pub proxy_configured: bool,
    pub setup_open: bool,
    pub statistics: Statistics,
}
