use crate::application_port::*;
use crate::domain_model::*;
use chrono::Utc;
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

/// Issues token pairs and rotates them on every refresh.
///
/// Holds no mutable state of its own: the session store's per-user atomic
/// writes are what keep concurrent refreshes of one token from both winning.
pub struct RealAuthService {
    token_codec: Arc<dyn TokenCodec>,
    session_store: Arc<dyn SessionStore>,
    fingerprinter: Arc<dyn TokenFingerprinter>,
    notifier: Arc<dyn AnomalyNotifier>,
    background: TaskTracker,
}

impl RealAuthService {
    pub fn new(
        token_codec: Arc<dyn TokenCodec>,
        session_store: Arc<dyn SessionStore>,
        fingerprinter: Arc<dyn TokenFingerprinter>,
        notifier: Arc<dyn AnomalyNotifier>,
    ) -> Self {
        Self {
            token_codec,
            session_store,
            fingerprinter,
            notifier,
            background: TaskTracker::new(),
        }
    }

    /// Tracker of in-flight notifications, for draining on shutdown.
    pub fn background(&self) -> TaskTracker {
        self.background.clone()
    }

    fn report_origin_change(&self, change: OriginChange) {
        let notifier = self.notifier.clone();
        self.background.spawn(async move {
            if let Err(e) = notifier.notify(&change).await {
                warn!(user_id = %change.user_id, "anomaly notification failed: {:#}", e);
            }
        });
    }

    async fn session_for(&self, user_id: UserId, pair: &TokenPair) -> Result<Session, AuthError> {
        let fingerprint = self.fingerprinter.fingerprint(&pair.refresh_token).await?;
        Ok(Session::new(user_id, fingerprint))
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn authenticate(&self, user_id: UserId, origin: &str) -> Result<TokenPair, AuthError> {
        let payload = TokenPayload::new(user_id, origin);

        let pair = self.token_codec.generate_pair(&payload).inspect_err(|e| {
            error!(user_id = %user_id, "failed to generate pair token: {}", e);
        })?;

        let session = self.session_for(user_id, &pair).await?;
        self.session_store
            .create_session(&session)
            .await
            .inspect_err(|e| error!(user_id = %user_id, "failed to create session: {}", e))?;

        info!(user_id = %user_id, "session opened");
        Ok(pair)
    }

    async fn refresh(
        &self,
        refresh_token: &RefreshToken,
        origin: &str,
    ) -> Result<TokenPair, AuthError> {
        // Signature and expiry first: a forged or stale token never reaches the store.
        let mut payload = self.token_codec.validate_jwt(&refresh_token.0)?;
        let user_id = payload.user_id;

        let current = self
            .session_store
            .check_token(user_id, refresh_token)
            .await
            .inspect_err(|e| warn!(user_id = %user_id, "refresh rejected: {}", e))?;

        if payload.origin != origin {
            info!(user_id = %user_id, "refresh token presented from a new origin");
            let previous_origin = std::mem::replace(&mut payload.origin, origin.to_string());
            self.report_origin_change(OriginChange {
                user_id,
                previous_origin,
                current_origin: payload.origin.clone(),
                detected_at: Utc::now(),
            });
        }

        let pair = self.token_codec.generate_pair(&payload).inspect_err(|e| {
            error!(user_id = %user_id, "failed to generate pair token: {}", e);
        })?;

        // Rotation: the old fingerprint is replaced only now that a new pair exists.
        let next = self.session_for(user_id, &pair).await?;
        self.session_store
            .replace_session(&current, &next)
            .await
            .inspect_err(|e| warn!(user_id = %user_id, "rotation failed: {}", e))?;

        info!(user_id = %user_id, "refresh token rotated");
        Ok(pair)
    }

    async fn invalidate(&self, refresh_token: &RefreshToken) -> Result<(), AuthError> {
        let payload = self.token_codec.validate_jwt(&refresh_token.0)?;
        self.session_store
            .check_token(payload.user_id, refresh_token)
            .await?;
        self.session_store.delete_session(payload.user_id).await?;

        info!(user_id = %payload.user_id, "session closed");
        Ok(())
    }
}
