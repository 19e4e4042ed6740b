mod anomaly_notifier;
mod auth_service;
mod session_store;

pub use anomaly_notifier::*;
pub use auth_service::*;
pub use session_store::*;
