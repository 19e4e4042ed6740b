use crate::application_port::{AuthError, RefreshToken};
use crate::domain_model::*;

/// Turns refresh tokens into stored fingerprints and checks them back.
#[async_trait::async_trait]
pub trait TokenFingerprinter: Send + Sync {
    async fn fingerprint(&self, token: &RefreshToken) -> Result<Fingerprint, AuthError>;
    async fn matches(
        &self,
        token: &RefreshToken,
        fingerprint: &Fingerprint,
    ) -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Verify the presented token against the user's stored fingerprint.
    ///
    /// A missing session and a mismatching fingerprint both yield
    /// `InappropriateRefreshToken`. On success returns the session that matched.
    async fn check_token(
        &self,
        user_id: UserId,
        token: &RefreshToken,
    ) -> Result<Session, AuthError>;
    /// Upsert: one session per user, the fingerprint is overwritten.
    async fn create_session(&self, session: &Session) -> Result<(), AuthError>;
    /// Overwrite `current` with `next` only if `current` is still the stored session.
    async fn replace_session(&self, current: &Session, next: &Session) -> Result<(), AuthError>;
    async fn delete_session(&self, user_id: UserId) -> Result<(), AuthError>;
}
