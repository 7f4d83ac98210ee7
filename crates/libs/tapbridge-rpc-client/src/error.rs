use std::time::Duration;

use tokio_tungstenite::tungstenite::Error as WsError;

/// Errors returned by [`crate::RpcClient`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ClientError {
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: Box<WsError>,
    },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// The server answered with an error envelope.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("{method} timed out after {after:?}")]
    Timeout { method: String, after: Duration },

    #[error("connection closed (code {code:?}): {reason}")]
    Closed { code: Option<u16>, reason: String },

    #[error("transport error: {0}")]
    Transport(#[source] Box<WsError>),

    #[error("failed to decode result: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Returns `true` for transient errors that may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport(_))
    }

    /// The server refused the bearer token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Closed { code: Some(4001), .. })
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest { message: message.into() }
    }
}

impl From<WsError> for ClientError {
    fn from(err: WsError) -> Self {
        Self::Transport(Box::new(err))
    }
}
