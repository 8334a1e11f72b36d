//! Squeeze app: platform binding around the core session state machine.
//!
//! The host embeds [`Session`] and forwards its interception hooks to it;
//! everything else (config persistence, listener bookkeeping, probe
//! dispatch, indicator) hangs off the effects the core returns.
pub mod platform;

pub use platform::config_store::ConfigStore;
pub use platform::effects::EffectRunner;
pub use platform::indicator::{Indicator, LogIndicator};
pub use platform::listeners::{Hook, ListenerSet};
pub use platform::session::{DeferredRedirect, RedirectDecision, Session};
