use crate::application_port::*;
use anyhow::Context;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct EmailNotifierConfig {
    pub base_url: String,
    pub sender: String,
    pub recipient: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: String,
}

/// Sends an alert through an HTTP e-mail API (`POST {base_url}/email`).
pub struct EmailAnomalyNotifier {
    http_client: reqwest::Client,
    base_url: String,
    sender: String,
    recipient: String,
}

impl EmailAnomalyNotifier {
    pub fn try_new(cfg: EmailNotifierConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .context("building e-mail http client")?;
        Ok(Self {
            http_client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            sender: cfg.sender,
            recipient: cfg.recipient,
        })
    }

    fn render(change: &OriginChange) -> String {
        format!(
            "<p>The session of user <b>{}</b> was refreshed from a new network address.</p>\
             <p>Previous address: {}<br/>New address: {}<br/>Detected at: {}</p>\
             <p>If this was not you, sign out and sign in again.</p>",
            change.user_id,
            change.previous_origin,
            change.current_origin,
            change.detected_at.to_rfc3339(),
        )
    }
}

#[async_trait::async_trait]
impl AnomalyNotifier for EmailAnomalyNotifier {
    async fn notify(&self, change: &OriginChange) -> anyhow::Result<()> {
        let url = format!("{}/email", self.base_url);
        let request = SendEmailRequest {
            from: &self.sender,
            to: &self.recipient,
            subject: "Warning: your network address changed",
            html: Self::render(change),
        };

        self.http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("sending anomaly e-mail")?
            .error_for_status()
            .context("e-mail service rejected anomaly alert")?;

        info!(user_id = %change.user_id, "anomaly e-mail sent");
        Ok(())
    }
}
