use crate::application_port::{AccessToken, AuthError, RefreshToken, TokenCodec, TokenPair, TokenPayload};
use crate::domain_model::UserId;
use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

const ALGORITHM: Algorithm = Algorithm::HS512;
// Ten years.
const MAX_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

#[derive(Clone)]
pub struct JwtConfig {
    pub signing_key: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("signing_key", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    ip: String,
    exp: i64,
    iat: i64,
    jti: Uuid, // keeps two tokens minted in the same second apart
}

pub struct JwtHs512Codec {
    cfg: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtHs512Codec {
    pub fn try_new(cfg: JwtConfig) -> Result<Self, AuthError> {
        if cfg.signing_key.is_empty() {
            return Err(AuthError::SigningFailure("empty signing key".to_string()));
        }
        if cfg.access_ttl.is_zero() || cfg.refresh_ttl.is_zero() {
            return Err(AuthError::SigningFailure("token TTLs must be positive".to_string()));
        }
        if cfg.access_ttl > MAX_TTL || cfg.refresh_ttl > MAX_TTL {
            return Err(AuthError::SigningFailure(format!(
                "token TTLs must not exceed {} seconds",
                MAX_TTL.as_secs()
            )));
        }

        // Expiry is compared by hand after decoding so it can be told apart from a bad signature.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(JwtHs512Codec {
            encoding_key: EncodingKey::from_secret(&cfg.signing_key),
            decoding_key: DecodingKey::from_secret(&cfg.signing_key),
            validation,
            cfg,
        })
    }

    fn stamp(payload: &TokenPayload, ttl: Duration) -> Result<TokenPayload, AuthError> {
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| AuthError::SigningFailure("token expiry out of range".to_string()))?;
        Ok(TokenPayload {
            expires_at: expires_at.trunc_subsecs(0),
            ..payload.clone()
        })
    }
}

impl TokenCodec for JwtHs512Codec {
    fn generate_jwt(&self, payload: &TokenPayload) -> Result<String, AuthError> {
        let claims = Claims {
            sub: payload.user_id.0,
            ip: payload.origin.clone(),
            exp: payload.expires_at.timestamp(),
            iat: Utc::now().timestamp(),
            jti: Uuid::new_v4(),
        };
        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::SigningFailure(e.to_string()))
    }

    fn validate_jwt(&self, token: &str) -> Result<TokenPayload, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!("rejecting token: {}", e);
            AuthError::TokenInvalid
        })?;
        let claims = data.claims;

        let expires_at =
            DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or(AuthError::TokenInvalid)?;
        if expires_at <= Utc::now() {
            debug!(user_id = %claims.sub, "token expired");
            return Err(AuthError::TokenExpired);
        }

        Ok(TokenPayload {
            user_id: UserId(claims.sub),
            origin: claims.ip,
            expires_at,
        })
    }

    fn generate_pair(&self, payload: &TokenPayload) -> Result<TokenPair, AuthError> {
        let access = Self::stamp(payload, self.cfg.access_ttl)?;
        let access_token = self.generate_jwt(&access)?;

        let refresh = Self::stamp(payload, self.cfg.refresh_ttl)?;
        let refresh_token = self.generate_jwt(&refresh)?;

        Ok(TokenPair {
            access_token: AccessToken(access_token),
            refresh_token: RefreshToken(refresh_token),
            access_token_expires_at: access.expires_at,
            refresh_token_expires_at: refresh.expires_at,
        })
    }
}
