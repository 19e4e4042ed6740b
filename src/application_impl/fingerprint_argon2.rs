use crate::application_port::{AuthError, RefreshToken, TokenFingerprinter};
use crate::domain_model::Fingerprint;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use sha2::{Digest, Sha256};

/// Argon2id cost parameters for refresh-token fingerprints.
#[derive(Debug, Clone, Copy)]
pub struct FingerprintConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// SHA-256 first, so arbitrarily long tokens reach Argon2 as a fixed-size input;
/// then salted Argon2id, stored as a PHC string.
pub struct Argon2Fingerprinter {
    argon2: Argon2<'static>,
}

impl Argon2Fingerprinter {
    pub fn try_new(cfg: FingerprintConfig) -> Result<Self, AuthError> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| AuthError::InternalError(format!("argon2 params: {}", e)))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    fn digest(token: &RefreshToken) -> String {
        hex::encode(Sha256::digest(token.0.as_bytes()))
    }
}

#[async_trait::async_trait]
impl TokenFingerprinter for Argon2Fingerprinter {
    async fn fingerprint(&self, token: &RefreshToken) -> Result<Fingerprint, AuthError> {
        let argon2 = self.argon2.clone();
        let digest = Self::digest(token);

        let hash = tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(digest.as_bytes(), &salt)
                .map(|hash| hash.to_string())
        })
        .await
        .map_err(|e| AuthError::InternalError(e.to_string()))?
        .map_err(|e| AuthError::InternalError(e.to_string()))?;

        Ok(Fingerprint(hash))
    }

    async fn matches(
        &self,
        token: &RefreshToken,
        fingerprint: &Fingerprint,
    ) -> Result<bool, AuthError> {
        let argon2 = self.argon2.clone();
        let digest = Self::digest(token);
        let stored = fingerprint.0.clone();

        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&stored).map_err(|e| {
                AuthError::InternalError(format!("invalid PHC hash: {}", e))
            })?;

            match argon2.verify_password(digest.as_bytes(), &parsed) {
                Ok(_) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(AuthError::InternalError(format!("verify error: {}", e))),
            }
        })
        .await
        .map_err(|e| AuthError::InternalError(e.to_string()))?
    }
}
