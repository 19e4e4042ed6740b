use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::SessionRepo;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct RealSessionStore {
    repo: Arc<dyn SessionRepo>,
    fingerprinter: Arc<dyn TokenFingerprinter>,
    op_timeout: Duration,
}

impl RealSessionStore {
    pub fn new(
        repo: Arc<dyn SessionRepo>,
        fingerprinter: Arc<dyn TokenFingerprinter>,
        op_timeout: Duration,
    ) -> Self {
        Self {
            repo,
            fingerprinter,
            op_timeout,
        }
    }

    /// Every repository call fails fast instead of hanging on an unreachable backend.
    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, AuthError>>,
    ) -> Result<T, AuthError> {
        tokio::time::timeout(self.op_timeout, op)
            .await
            .map_err(|_| AuthError::StoreUnavailable("session store timed out".to_string()))?
    }
}

#[async_trait::async_trait]
impl SessionStore for RealSessionStore {
    async fn check_token(
        &self,
        user_id: UserId,
        token: &RefreshToken,
    ) -> Result<Session, AuthError> {
        let Some(session) = self.bounded(self.repo.find_by_user(user_id)).await? else {
            debug!(user_id = %user_id, "no session");
            return Err(AuthError::InappropriateRefreshToken);
        };

        if !self.fingerprinter.matches(token, &session.fingerprint).await? {
            debug!(user_id = %user_id, "fingerprint mismatch");
            return Err(AuthError::InappropriateRefreshToken);
        }

        Ok(session)
    }

    async fn create_session(&self, session: &Session) -> Result<(), AuthError> {
        self.bounded(self.repo.upsert(session)).await
    }

    async fn replace_session(&self, current: &Session, next: &Session) -> Result<(), AuthError> {
        if current.user_id != next.user_id {
            return Err(AuthError::InternalError(
                "session replacement across users".to_string(),
            ));
        }

        let swapped = self
            .bounded(self.repo.compare_and_swap(
                current.user_id,
                &current.fingerprint,
                &next.fingerprint,
            ))
            .await?;
        if !swapped {
            debug!(user_id = %current.user_id, "lost rotation race");
            return Err(AuthError::InappropriateRefreshToken);
        }

        Ok(())
    }

    async fn delete_session(&self, user_id: UserId) -> Result<(), AuthError> {
        self.bounded(self.repo.delete(user_id)).await
    }
}
