//! Transport layer for configuration endpoints

pub mod context;
pub mod session;

pub use context::{CancelHandle, GuardedStream, ResolveContext};
pub use session::{ConfigSession, CONFIG_GET_CLUSTER};
