mod session_repo_mysql;

pub use session_repo_mysql::*;
