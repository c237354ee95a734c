use std::time::Duration;

/// Errors returned by a transport before they are normalized into a terminal
/// session failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Upstream answered with a non-success HTTP status.
    #[error("upstream returned status {status}: {message}")]
    Status { status: u16, message: String },
    /// Connecting, sending, or reading the response body failed.
    #[error("transport error: {message}")]
    Transport { message: String },
}

impl ProviderError {
    /// Creates a status error.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Creates a transport-level error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Returns the human-readable message for this error.
    pub fn message(&self) -> &str {
        match self {
            Self::Status { message, .. } | Self::Transport { message } => message,
        }
    }
}

/// Terminal session failure, mirrored by exactly one `Event::Error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum StreamFailure {
    /// The upstream request was rejected with a non-success status.
    #[error("generation request failed with status {status}")]
    Provider { status: u16 },
    /// The connection failed before or while reading the body.
    #[error("transport failure: {message}")]
    Transport { message: String },
    /// A caller-supplied timeout elapsed before the session finished.
    #[error("generation timed out after {after:?}")]
    TimedOut { after: Duration },
}

impl StreamFailure {
    /// True when upstream rejected the caller's credentials.
    ///
    /// Callers use this to send the user back through login instead of
    /// surfacing a generic failure.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Provider { status: 401 | 403 })
    }
}

impl From<&ProviderError> for StreamFailure {
    fn from(err: &ProviderError) -> Self {
        match err {
            ProviderError::Status { status, .. } => Self::Provider { status: *status },
            ProviderError::Transport { message } => Self::Transport {
                message: message.clone(),
            },
        }
    }
}

/// Top-level error type for the public generator API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreviewError {
    /// Invalid generator or client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// The caller's request was rejected before a session started.
    #[error("validation error: {0}")]
    Validation(String),
    /// A started session ended in failure.
    #[error(transparent)]
    Failed(StreamFailure),
    /// The spawned session task ended without reporting an outcome.
    #[error("session task ended without an outcome")]
    Detached,
}

impl From<StreamFailure> for PreviewError {
    fn from(value: StreamFailure) -> Self {
        PreviewError::Failed(value)
    }
}
