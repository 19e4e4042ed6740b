use crate::domain_model::UserId;
use chrono::{DateTime, Utc};

/// A refresh token came back from a different network origin than it was issued to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginChange {
    pub user_id: UserId,
    pub previous_origin: String,
    pub current_origin: String,
    pub detected_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait AnomalyNotifier: Send + Sync {
    async fn notify(&self, change: &OriginChange) -> anyhow::Result<()>;
}
