use super::UserId;
use std::fmt;

/// PHC-encoded Argon2 hash of the SHA-256 digest of a refresh token.
///
/// The raw refresh token is never stored; this is the only thing persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Stored hashes stay out of logs.
impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Fingerprint(..)")
    }
}

/// The single live session of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub fingerprint: Fingerprint,
}

impl Session {
    pub fn new(user_id: UserId, fingerprint: Fingerprint) -> Self {
        Self {
            user_id,
            fingerprint,
        }
    }
}
