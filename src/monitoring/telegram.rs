//! Telegram Bot API notifier
//!
//! Messages are sent with legacy Markdown parse mode, so `*name*` renders bold.

use crate::monitoring::notifier::{http_client, transport_error, truncate_message};
use crate::monitoring::{Notification, Notifier};
use crate::utils::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// `sendMessage` text limit, counted in UTF-16 code units
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Shorten `text` to what a single `sendMessage` accepts
pub fn fit_message(text: &str) -> String {
    truncate_message(text, MAX_MESSAGE_LEN, char::len_utf16)
}

/// `sendMessage` request body
#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
}

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    #[serde(default)]
    username: Option<String>,
    first_name: String,
}

/// Telegram chat notifier
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    token: String,
    chat_id: i64,
    api_base: String,
    client: Client,
}

impl TelegramNotifier {
    pub fn with_api_base(token: impl Into<String>, chat_id: i64, api_base: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            chat_id,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client: http_client(),
        }
    }

    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// Check the token with `getMe` and return the bot's account name
    pub async fn authorize(&self) -> Result<String, AppError> {
        let response = self
            .client
            .get(self.method_url("getMe"))
            .send()
            .await
            .map_err(|e| transport_error("Failed to reach Telegram", e))?;

        let status = response.status();
        let body: ApiResponse<BotUser> = response
            .json()
            .await
            .map_err(|e| transport_error("Invalid Telegram getMe response", e))?;

        match body.result {
            Some(user) if body.ok => {
                let account = user.username.unwrap_or(user.first_name);
                info!("Authorized on account {}", account);
                Ok(account)
            }
            _ => Err(AppError::transport(
                Some(status.as_u16()),
                format!(
                    "Telegram authorization failed: {}",
                    body.description.unwrap_or_else(|| status.to_string())
                ),
            )),
        }
    }

    async fn post_message(&self, payload: &SendMessage<'_>) -> Result<(), AppError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(payload)
            .send()
            .await
            .map_err(|e| transport_error("Failed to send Telegram message", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let description = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body)
                .ok()
                .and_then(|r| r.description)
                .unwrap_or(body);
            return Err(AppError::transport(
                Some(status.as_u16()),
                format!("Telegram API error: {} - {}", status, description),
            ));
        }

        Ok(())
    }
}

/// Telegram refused the Markdown in the message
pub fn is_markup_rejection(error: &AppError) -> bool {
    match error {
        AppError::TransportFailure {
            status: Some(400),
            message,
        } => message.contains("can't parse entities"),
        _ => false,
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn destination(&self) -> String {
        self.chat_id.to_string()
    }

    #[instrument(skip(self, notification), fields(notification_id = %notification.id))]
    async fn send(&self, notification: &Notification) -> Result<(), AppError> {
        info!("[{}] {}", self.chat_id, notification.message);

        let text = fit_message(&notification.message);
        if text != notification.message {
            warn!(limit = MAX_MESSAGE_LEN, "Message too long for Telegram, truncated");
        }
        let payload = SendMessage {
            chat_id: self.chat_id,
            text: &text,
            parse_mode: Some("Markdown"),
        };

        match self.post_message(&payload).await {
            Err(e) if is_markup_rejection(&e) => {
                warn!(error = %e, "Markdown rejected, resending as plain text");
                let plain = fit_message(&notification.plain_text());
                self.post_message(&SendMessage {
                    chat_id: self.chat_id,
                    text: &plain,
                    parse_mode: None,
                })
                .await
            }
            Err(e) => Err(e),
            Ok(()) => {
                debug!("Telegram message sent");
                Ok(())
            }
        }
    }
}
