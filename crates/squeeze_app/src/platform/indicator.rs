use engine_logging::engine_info;

/// Visible on/off indicator for the active page.
///
/// The real surface (a toolbar icon, a tray badge) is host-specific; the
/// session only pushes state transitions into it.
pub trait Indicator: Send {
    fn set_enabled(&mut self, enabled: bool);
}

/// Default indicator: records transitions in the log.
#[derive(Debug, Default)]
pub struct LogIndicator {
    last: Option<bool>,
}

impl Indicator for LogIndicator {
    fn set_enabled(&mut self, enabled: bool) {
        if self.last != Some(enabled) {
            self.last = Some(enabled);
            engine_info!(
                "Indicator: compression {}",
                if enabled { "active" } else { "inactive" }
            );
        }
    }
}
