//! Squeeze engine: IO side of the session — verification probes, capability
//! detection and persistence primitives.
mod capability;
mod engine;
mod persist;
mod probe;
mod types;

pub use capability::{can_decode_webp, detect_webp_support};
pub use engine::EngineHandle;
pub use persist::{ensure_state_dir, AtomicStateFile, PersistError};
pub use probe::{ImageProber, ProbeSettings, ReqwestProber};
pub use types::{EngineEvent, PageEpoch, ProbeError, ProbeFailure, ProbeVerdict, RequestId};
