//! Notifier abstraction

use crate::event::ChangeKind;
use crate::utils::AppError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Per-request timeout for HTTP transports
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP client shared by the chat transports
pub(crate) fn http_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to build HTTP client with timeout, using defaults");
            Client::new()
        })
}

/// Appended to messages cut to a transport's size limit
pub const TRUNCATION_MARKER: &str = "\n…";

/// Cut `text` so that its total `cost` stays within `limit`.
///
/// `cost` gives the size of one character as the transport counts it. A dangling
/// `*` left by the cut is removed so emphasis markers stay paired.
pub(crate) fn truncate_message(text: &str, limit: usize, cost: impl Fn(char) -> usize) -> String {
    if text.chars().map(&cost).sum::<usize>() <= limit {
        return text.to_string();
    }

    let budget = limit.saturating_sub(TRUNCATION_MARKER.chars().map(&cost).sum());
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        used += cost(c);
        if used > budget {
            break;
        }
        out.push(c);
    }

    if out.matches('*').count() % 2 == 1 {
        if let Some(pos) = out.rfind('*') {
            out.remove(pos);
        }
    }
    out.push_str(TRUNCATION_MARKER);
    out
}

/// Map a reqwest failure to a transport error without leaking the request URL
pub(crate) fn transport_error(context: &str, err: reqwest::Error) -> AppError {
    let status = err.status().map(|s| s.as_u16());
    AppError::transport(status, format!("{}: {}", context, err.without_url()))
}

/// A rendered message waiting for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Correlation ID for logs
    pub id: Uuid,
    pub kind: ChangeKind,
    /// `<namespace>/<name>`
    pub object: String,
    /// Message text; `*...*` marks emphasis
    pub message: String,
}

impl Notification {
    pub fn new(kind: ChangeKind, object: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            object: object.into(),
            message: message.into(),
        }
    }

    /// Message with emphasis markers removed
    pub fn plain_text(&self) -> String {
        self.message.replace('*', "")
    }
}

/// Transport that delivers a message to its configured destination.
///
/// Implementations are driven by a single worker task, one call at a time.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Destination identifier (chat id, webhook host, ...) for logs
    fn destination(&self) -> String;

    async fn send(&self, notification: &Notification) -> Result<(), AppError>;
}

/// Writes messages to the log only
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn destination(&self) -> String {
        "log".to_string()
    }

    async fn send(&self, notification: &Notification) -> Result<(), AppError> {
        info!(
            notification_id = %notification.id,
            kind = %notification.kind,
            object = %notification.object,
            "{}",
            notification.message
        );
        Ok(())
    }
}
