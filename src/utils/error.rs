use thiserror::Error;

/// Application-wide error type
///
/// Every variant is recoverable at the event boundary. Bootstrap problems live in
/// [`crate::config::ConfigError`] instead.
#[derive(Debug, Error)]
pub enum AppError {
    /// Old and new status records disagree structurally
    #[error("schema mismatch at `{path}`: {detail}")]
    SchemaMismatch { path: String, detail: String },

    /// A snapshot could not be decoded into the known schema
    #[error("serialization failure: {0}")]
    SerializationFailure(String),

    /// The notifier could not deliver a message
    #[error("transport failure: {message}")]
    TransportFailure {
        status: Option<u16>,
        message: String,
    },

    /// The notify worker is gone and no longer accepts messages
    #[error("notify queue closed: {0}")]
    QueueClosed(String),

    /// A background task died unexpectedly
    #[error("internal error: {0}")]
    InternalError(String),
}

impl AppError {
    /// 에러 코드 반환
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::SchemaMismatch { .. } => "DIFF001",
            AppError::SerializationFailure(_) => "SRC001",
            AppError::TransportFailure { .. } => "NOTIFY001",
            AppError::QueueClosed(_) => "NOTIFY002",
            AppError::InternalError(_) => "COMMON500",
        }
    }
}

/// 편의 함수들
impl AppError {
    pub fn schema_mismatch(path: impl Into<String>, detail: impl Into<String>) -> Self {
        AppError::SchemaMismatch {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        AppError::SerializationFailure(msg.into())
    }

    pub fn transport(status: Option<u16>, msg: impl Into<String>) -> Self {
        AppError::TransportFailure {
            status,
            message: msg.into(),
        }
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        AppError::InternalError(msg.into())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationFailure(err.to_string())
    }
}
