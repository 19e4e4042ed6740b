mod anomaly_notifier_email;
mod anomaly_notifier_log;
mod auth_service_impl;
mod fingerprint_argon2;
mod session_store_impl;
mod token_codec_jwt;

pub use anomaly_notifier_email::*;
pub use anomaly_notifier_log::*;
pub use auth_service_impl::*;
pub use fingerprint_argon2::*;
pub use session_store_impl::*;
pub use token_codec_jwt::*;
