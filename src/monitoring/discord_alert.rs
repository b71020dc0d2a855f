//! Discord webhook notifier
//!
//! Sends each notification as an embed colored by change kind.

use crate::event::ChangeKind;
use crate::monitoring::notifier::{http_client, transport_error, truncate_message};
use crate::monitoring::{Notification, Notifier};
use crate::utils::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, instrument};

/// Discord caps embed descriptions at 4096 characters
const MAX_DESCRIPTION_CHARS: usize = 4096;

/// Discord caps embed titles at 256 characters
const MAX_TITLE_CHARS: usize = 256;

/// Discord webhook message payload
#[derive(Debug, Serialize)]
pub struct DiscordMessage {
    /// Message content (plain text)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Rich embeds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<DiscordEmbed>>,
}

/// Discord embed for rich messages
#[derive(Debug, Clone, Serialize)]
pub struct DiscordEmbed {
    pub title: String,
    pub description: String,
    /// Color (as decimal integer)
    pub color: u32,
    /// Timestamp (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Embed colors
pub mod colors {
    /// Created - green
    pub const CREATED: u32 = 3066993; // #2ECC71
    /// Deleted - red
    pub const DELETED: u32 = 15158332; // #E74C3C
    /// Changed - yellow
    pub const CHANGED: u32 = 16776960; // #FFFF00
}

/// Discord webhook notifier
#[derive(Debug, Clone)]
pub struct DiscordNotifier {
    webhook_url: String,
    client: Client,
}

impl DiscordNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            client: http_client(),
        }
    }

    pub fn kind_to_color(kind: ChangeKind) -> u32 {
        match kind {
            ChangeKind::Added => colors::CREATED,
            ChangeKind::Deleted => colors::DELETED,
            ChangeKind::Modified => colors::CHANGED,
        }
    }

    /// Build the webhook payload; `*x*` emphasis becomes Discord bold `**x**`
    pub fn build_message(notification: &Notification) -> DiscordMessage {
        let title_prefix = match notification.kind {
            ChangeKind::Added => "🟢 Created",
            ChangeKind::Deleted => "🔴 Deleted",
            ChangeKind::Modified => "🟡 Status changed",
        };

        // Cut before translating so no `**` pair is split; each `*` doubles
        let description = truncate_message(&notification.message, MAX_DESCRIPTION_CHARS, |c| {
            if c == '*' {
                2
            } else {
                1
            }
        })
        .replace('*', "**");

        let title: String = format!("{}: {}", title_prefix, notification.object)
            .chars()
            .take(MAX_TITLE_CHARS)
            .collect();

        let embed = DiscordEmbed {
            title,
            description,
            color: Self::kind_to_color(notification.kind),
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        };

        DiscordMessage {
            content: None,
            embeds: Some(vec![embed]),
        }
    }

    /// Send raw Discord message payload
    async fn send_payload(&self, payload: &DiscordMessage) -> Result<(), AppError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                let err = transport_error("Failed to send Discord webhook", e);
                error!(error = %err, "Failed to send Discord webhook");
                err
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Discord webhook returned error");
            return Err(AppError::transport(
                Some(status.as_u16()),
                format!("Discord webhook error: {} - {}", status, body),
            ));
        }

        debug!("Discord alert sent successfully");
        Ok(())
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    /// Webhook host only, the path carries the webhook token
    fn destination(&self) -> String {
        reqwest::Url::parse(&self.webhook_url)
            .ok()
            .and_then(|url| url.host_str().map(|h| format!("discord:{}", h)))
            .unwrap_or_else(|| "discord".to_string())
    }

    #[instrument(skip(self, notification), fields(notification_id = %notification.id, kind = %notification.kind))]
    async fn send(&self, notification: &Notification) -> Result<(), AppError> {
        let payload = Self::build_message(notification);
        self.send_payload(&payload).await
    }
}
