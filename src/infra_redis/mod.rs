mod session_repo_redis;

pub use session_repo_redis::*;
