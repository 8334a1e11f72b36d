//! Squeeze core: pure session state machine and redirect decision engine.
mod config;
mod decision;
mod effect;
mod headers;
mod msg;
mod state;
mod update;
mod view_model;

pub use config::{
    is_retired_proxy, Change, Config, ConfigChanges, Statistics, RETIRED_PROXY_HOST,
};
pub use decision::{build_compress_url, page_host_of, should_compress, RequestFacts, ResourceType};
pub use effect::Effect;
pub use headers::{int_header_value, patch_content_security, Header};
pub use msg::{Msg, ProbeOutcome};
pub use state::{AppState, DedupSet, PageEpoch, RedirectCapability, RequestId, SessionState};
pub use update::update;
pub use view_model::SessionView;
