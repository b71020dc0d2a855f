//! Notification pipeline
//!
//! - Dispatcher: change events to notification messages
//! - Bounded notify queue with a single worker owning the transport
//! - Telegram / Discord / log-only notifiers
//! - Retry with exponential backoff for transient transport failures

pub mod discord_alert;
pub mod dispatcher;
pub mod notifier;
pub mod retry;
pub mod telegram;
pub mod worker;

pub use discord_alert::DiscordNotifier;
pub use dispatcher::{DispatchOutcome, DispatchStats, Dispatcher};
pub use notifier::{LogNotifier, Notification, Notifier};
pub use retry::RetryPolicy;
pub use telegram::TelegramNotifier;
pub use worker::{
    join_notify_worker, notify_channel, spawn_notify_worker, NotifyHandle, NotifyWorker,
    WorkerStats,
};
