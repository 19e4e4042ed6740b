use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid token")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("inappropriate refresh token")]
    InappropriateRefreshToken,
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("signing failure: {0}")]
    SigningFailure(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Errors caused by what the client presented, as opposed to server faults.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::TokenInvalid
                | AuthError::TokenExpired
                | AuthError::InappropriateRefreshToken
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RefreshToken(pub String);

/// What gets signed into every token. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPayload {
    pub user_id: UserId,
    pub origin: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenPayload {
    /// A payload with no expiry stamped yet.
    pub fn new(user_id: UserId, origin: impl Into<String>) -> Self {
        Self {
            user_id,
            origin: origin.into(),
            expires_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

/// Signs and verifies token payloads. Pure CPU work, no I/O.
pub trait TokenCodec: Send + Sync {
    fn generate_jwt(&self, payload: &TokenPayload) -> Result<String, AuthError>;
    fn validate_jwt(&self, token: &str) -> Result<TokenPayload, AuthError>;
    fn generate_pair(&self, payload: &TokenPayload) -> Result<TokenPair, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Issue a fresh pair for an already-authenticated user and open (or replace) its session.
    async fn authenticate(&self, user_id: UserId, origin: &str) -> Result<TokenPair, AuthError>;
    /// Exchange a refresh token for a new pair, invalidating the presented one.
    async fn refresh(&self, refresh_token: &RefreshToken, origin: &str)
    -> Result<TokenPair, AuthError>;
    /// Drop the session the refresh token belongs to.
    async fn invalidate(&self, refresh_token: &RefreshToken) -> Result<(), AuthError>;
}
