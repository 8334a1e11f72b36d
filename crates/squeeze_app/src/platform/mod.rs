//! Host-platform pieces: persistence, listener registry, indicator,
//! logging, effect execution and the session façade.
pub mod config_store;
pub mod effects;
pub mod indicator;
pub mod listeners;
pub mod logging;
pub mod session;
