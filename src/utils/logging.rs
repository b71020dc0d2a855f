//! 로깅 초기화 모듈
//!
//! JSON lines on stdout, where the cluster's log collector picks them up.
//! A daily rolling file is added only when `LOG_DIR` is set.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,podwatch=debug";
const LOG_FILE_PREFIX: &str = "podwatch.log";

/// Logging settings taken from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// `RUST_LOG` directives
    pub filter: String,
    /// Directory of the rolling log file; `None` logs to stdout only
    pub log_dir: Option<PathBuf>,
}

impl LogSettings {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            filter: non_empty("RUST_LOG").unwrap_or_else(|| DEFAULT_FILTER.to_string()),
            log_dir: non_empty("LOG_DIR").map(PathBuf::from),
        }
    }
}

/// 로깅 시스템을 초기화합니다.
///
/// Returns the file writer's guard when `LOG_DIR` is set. `main` must hold it
/// until exit, otherwise buffered file output is lost.
pub fn init_logging() -> Option<WorkerGuard> {
    let settings = LogSettings::from_lookup(|key| std::env::var(key).ok());

    let filter = EnvFilter::try_new(&settings.filter).unwrap_or_else(|e| {
        eprintln!(
            "Invalid RUST_LOG `{}` ({}), falling back to `{}`",
            settings.filter, e, DEFAULT_FILTER
        );
        EnvFilter::new(DEFAULT_FILTER)
    });

    let stdout_layer = fmt::layer()
        .json()
        .with_timer(UtcTime::rfc_3339())
        .with_current_span(true)
        .flatten_event(true);

    let (file_layer, guard) = match &settings.log_dir {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(rolling::daily(dir, LOG_FILE_PREFIX));
            let layer = fmt::layer()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .with_current_span(true)
                .flatten_event(true)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    if let Err(err) = tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("Failed to initialize tracing: {}", err);
    }

    if let Some(dir) = &settings.log_dir {
        tracing::info!(log_dir = %dir.display(), "Writing daily log file");
    }

    guard
}
