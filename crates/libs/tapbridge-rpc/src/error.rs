use serde_json::Value as JsonValue;

use crate::types::{
    RpcError, CAPABILITY_UNAVAILABLE, INTERNAL_ERROR, INVALID_PARAMS, NOT_IN_SCOPE, TIMEOUT,
};

/// Errors returned by host capabilities.
///
/// Hosts that lack a capability (a community edition without a scanner, or
/// the [`crate::StubHost`]) answer with `Unsupported`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum HostError {
    #[error("{capability} is not available in this host")]
    Unsupported { capability: String },

    #[error("not in scope: {url}")]
    NotInScope { url: String },

    #[error("timeout: {operation}")]
    Timeout { operation: String },

    #[error("not found: {resource}")]
    NotFound { resource: String },

    #[error("{message}")]
    Failed { message: String },
}

impl HostError {
    /// Returns `true` for transient errors that may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn unsupported(capability: impl Into<String>) -> Self {
        Self::Unsupported { capability: capability.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed { message: message.into() }
    }

    /// JSON-RPC error code reported to clients.
    pub fn code(&self) -> i64 {
        match self {
            Self::Unsupported { .. } => CAPABILITY_UNAVAILABLE,
            Self::NotInScope { .. } => NOT_IN_SCOPE,
            Self::Timeout { .. } => TIMEOUT,
            Self::NotFound { .. } => INVALID_PARAMS,
            Self::Failed { .. } => INTERNAL_ERROR,
        }
    }
}

/// Failure of a single method invocation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MethodError {
    #[error("{message}")]
    Rpc { code: i64, message: String, data: Option<JsonValue> },

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

impl MethodError {
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc { code, message: message.into(), data: None }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::rpc(INVALID_PARAMS, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::rpc(INTERNAL_ERROR, message)
    }

    pub fn capability_unavailable(message: impl Into<String>) -> Self {
        Self::rpc(CAPABILITY_UNAVAILABLE, message)
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::Rpc { code, .. } => *code,
            Self::Host(err) => err.code(),
            Self::Encode(_) => INTERNAL_ERROR,
        }
    }

    pub fn into_rpc_error(self) -> RpcError {
        let code = self.code();
        match self {
            Self::Rpc { message, data, .. } => RpcError { code, message, data },
            other => RpcError::new(code, other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("method {name} is already registered")]
    DuplicateMethod { name: String },
}
