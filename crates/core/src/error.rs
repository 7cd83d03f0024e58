/// Result alias that carries the custom [`DashError`] type.
pub type Result<T> = std::result::Result<T, DashError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum DashError {
    /// Free-form message for failures that have no dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Transport or status failure reported by the HTTP client.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// A base URL or endpoint could not be parsed.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// Configuration loaded from disk or flags is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// A playback resource failed to start or stopped with an error. The
    /// message is surfaced verbatim as the controller's last error.
    #[error("{0}")]
    Playback(String),
}

impl DashError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn playback<T: Into<String>>(msg: T) -> Self {
        Self::Playback(msg.into())
    }
}

impl From<&str> for DashError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for DashError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
