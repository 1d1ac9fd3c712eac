//! Error types for the paginated pipeline.

use std::sync::Arc;

use thiserror::Error;

/// The main error type for the paginated pipeline.
///
/// Collaborator failures and cancellation travel through the same
/// write-once error slot, so this type is cheap to clone.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The page source failed to count or fetch
    #[error("source error: {0}")]
    Source(Arc<dyn std::error::Error + Send + Sync>),

    /// The caller cancelled the pipeline
    #[error("pipeline was cancelled")]
    Cancelled,

    /// The end-to-end deadline elapsed
    #[error("pipeline deadline of {duration_ms}ms exceeded")]
    DeadlineExceeded { duration_ms: u64 },

    /// A page size of zero was requested
    #[error("page size must be greater than zero")]
    InvalidPageSize,

    /// The consumer dropped the item stream
    #[error("item stream was closed by the consumer")]
    ChannelClosed,

    /// A fetch worker panicked
    #[error("fetch task panicked: {0}")]
    TaskPanicked(String),

    /// A custom error with a message
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Create a source error from any error type
    pub fn from_source<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Error::Source(Arc::new(error))
    }

    /// Create a deadline error
    pub fn deadline(duration_ms: u64) -> Self {
        Error::DeadlineExceeded { duration_ms }
    }

    /// Create a custom error with a message
    pub fn custom<S: Into<String>>(message: S) -> Self {
        Error::Custom(message.into())
    }

    /// Whether this error came from cancellation rather than from the source.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded { .. })
    }

    /// Short label used for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Source(_) => "source",
            Error::Cancelled => "cancelled",
            Error::DeadlineExceeded { .. } => "deadline",
            Error::InvalidPageSize => "invalid_page_size",
            Error::ChannelClosed => "channel_closed",
            Error::TaskPanicked(_) => "panicked",
            Error::Custom(_) => "custom",
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::TaskPanicked(err.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for Error {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Error::ChannelClosed
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Custom(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Custom(s.to_string())
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Helper trait for converting foreign errors into a source error
pub trait IntoError<T> {
    fn into_source_error(self) -> Result<T>;
}

impl<T, E> IntoError<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn into_source_error(self) -> Result<T> {
        self.map_err(Error::from_source)
    }
}
