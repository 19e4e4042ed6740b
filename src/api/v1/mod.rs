mod error;
mod handler;
mod router;

pub use error::recover_error;
pub use handler::REFRESH_COOKIE_NAME;
pub use router::routes;
