use crate::event::{WatchFilter, WatchFilterBuilder};
use crate::monitoring::telegram::DEFAULT_API_BASE;
use crate::monitoring::worker::DEFAULT_QUEUE_CAPACITY;
use crate::monitoring::{
    DiscordNotifier, LogNotifier, Notifier, RetryPolicy, TelegramNotifier,
};
use std::env;
use std::time::Duration;

const DEFAULT_MAX_RETRY_SECS: u64 = 30;

/// Selected chat transport and its destination
#[derive(Debug, Clone, PartialEq)]
pub enum NotifierConfig {
    Telegram {
        token: String,
        chat_id: i64,
        api_base: String,
    },
    Discord {
        webhook_url: String,
    },
    Log,
}

impl NotifierConfig {
    pub fn build(&self) -> Box<dyn Notifier> {
        match self {
            NotifierConfig::Telegram {
                token,
                chat_id,
                api_base,
            } => Box::new(TelegramNotifier::with_api_base(
                token.clone(),
                *chat_id,
                api_base.clone(),
            )),
            NotifierConfig::Discord { webhook_url } => {
                Box::new(DiscordNotifier::new(webhook_url.clone()))
            }
            NotifierConfig::Log => Box::new(LogNotifier),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NotifierConfig::Telegram { .. } => "telegram",
            NotifierConfig::Discord { .. } => "discord",
            NotifierConfig::Log => "log",
        }
    }
}

/// 애플리케이션 설정
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub notifier: NotifierConfig,
    pub queue_capacity: usize,
    pub retry: RetryPolicy,
    pub filter: WatchFilter,
}

impl AppConfig {
    /// 환경 변수에서 설정 로드
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let notifier = match lookup("NOTIFIER")
            .unwrap_or_else(|| "telegram".to_string())
            .trim()
            .to_lowercase()
            .as_str()
        {
            "telegram" => {
                let token = non_empty(lookup("BOT_TOKEN")).ok_or(ConfigError::MissingBotToken)?;
                let chat_id = non_empty(lookup("BOT_CHATID"))
                    .ok_or(ConfigError::MissingChatId)?
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidChatId)?;
                let api_base = non_empty(lookup("TELEGRAM_API_BASE"))
                    .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
                NotifierConfig::Telegram {
                    token,
                    chat_id,
                    api_base,
                }
            }
            "discord" => NotifierConfig::Discord {
                webhook_url: non_empty(lookup("DISCORD_WEBHOOK_URL"))
                    .ok_or(ConfigError::MissingWebhookUrl)?,
            },
            "log" => {
                tracing::warn!("NOTIFIER=log: notifications are written to the log only");
                NotifierConfig::Log
            }
            other => return Err(ConfigError::UnknownNotifier(other.to_string())),
        };

        let queue_capacity = match non_empty(lookup("NOTIFY_QUEUE_CAPACITY")) {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(capacity) if capacity > 0 => capacity,
                _ => return Err(ConfigError::InvalidQueueCapacity),
            },
            None => DEFAULT_QUEUE_CAPACITY,
        };

        let max_retry_secs = match non_empty(lookup("NOTIFY_MAX_RETRY_SECS")) {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidRetrySecs)?,
            None => DEFAULT_MAX_RETRY_SECS,
        };
        let retry = if max_retry_secs == 0 {
            RetryPolicy::none()
        } else {
            RetryPolicy::default().with_max_elapsed(Duration::from_secs(max_retry_secs))
        };

        let filter = WatchFilterBuilder::new().load_from(&lookup).build();

        Ok(Self {
            notifier,
            queue_capacity,
            retry,
            filter,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BOT_TOKEN environment variable is required for the telegram notifier")]
    MissingBotToken,
    #[error("BOT_CHATID environment variable is required for the telegram notifier")]
    MissingChatId,
    #[error("BOT_CHATID is not numeric")]
    InvalidChatId,
    #[error("DISCORD_WEBHOOK_URL environment variable is required for the discord notifier")]
    MissingWebhookUrl,
    #[error("Unknown notifier `{0}`: expected telegram, discord or log")]
    UnknownNotifier(String),
    #[error("NOTIFY_QUEUE_CAPACITY must be a positive integer")]
    InvalidQueueCapacity,
    #[error("NOTIFY_MAX_RETRY_SECS must be a non-negative integer")]
    InvalidRetrySecs,
}
