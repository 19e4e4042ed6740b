use crate::application_port::*;
use tracing::warn;

/// Records origin changes in the log only.
#[derive(Debug, Default)]
pub struct LogAnomalyNotifier;

impl LogAnomalyNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl AnomalyNotifier for LogAnomalyNotifier {
    async fn notify(&self, change: &OriginChange) -> anyhow::Result<()> {
        warn!(
            user_id = %change.user_id,
            previous_origin = %change.previous_origin,
            current_origin = %change.current_origin,
            "refresh token used from a new origin"
        );
        Ok(())
    }
}
