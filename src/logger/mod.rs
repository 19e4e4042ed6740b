//! Process-wide `tracing` setup. Installed once from `main`; tests rely on
//! the default no-op subscriber.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
