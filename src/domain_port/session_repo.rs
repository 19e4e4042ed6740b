use crate::application_port::*;
use crate::domain_model::*;

/// Raw persistence of the `sessions` table: one row per user.
#[async_trait::async_trait]
pub trait SessionRepo: Send + Sync {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Session>, AuthError>;

    /// Insert, or overwrite the fingerprint of the existing row.
    async fn upsert(&self, session: &Session) -> Result<(), AuthError>;

    /// Single conditional write: set `next` only if the row still holds `current`.
    /// Returns `false` when the row is gone or holds something else.
    async fn compare_and_swap(
        &self,
        user_id: UserId,
        current: &Fingerprint,
        next: &Fingerprint,
    ) -> Result<bool, AuthError>;

    async fn delete(&self, user_id: UserId) -> Result<(), AuthError>;
}
