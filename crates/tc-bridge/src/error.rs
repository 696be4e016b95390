//! Bridge error types

use serde_json::Value;
use tc_proto::ProtoError;
use tc_provider::ProviderError;
use thiserror::Error;

/// Bridge error type
#[derive(Debug, Error)]
pub enum BridgeError {
    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request was valid JSON but not a request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Method not found
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Bridge is not accepting requests
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Provider failure, passed through unchanged
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProtoError> for BridgeError {
    fn from(err: ProtoError) -> Self {
        Self::Provider(ProviderError::Proto(err))
    }
}

impl BridgeError {
    /// Get the JSON-RPC error code for this error
    pub const fn code(&self) -> i32 {
        use crate::protocol::*;
        match self {
            Self::Json(_) => PARSE_ERROR,
            Self::InvalidRequest(_) => INVALID_REQUEST,
            Self::MethodNotFound(_) => METHOD_NOT_FOUND,
            Self::InvalidParams(_) => INVALID_PARAMS,
            Self::Unavailable(_) => UNAVAILABLE,
            Self::Provider(e) => match e {
                ProviderError::SchemaNotFound { .. } => SCHEMA_NOT_FOUND,
                ProviderError::Validation(_) | ProviderError::Proto(_) => VALIDATION_FAILED,
                ProviderError::CreateFailed { .. }
                | ProviderError::ReadFailed { .. }
                | ProviderError::UpdateFailed { .. }
                | ProviderError::DeleteFailed { .. } => BACKEND_FAILED,
                ProviderError::NotFound { .. } => NOT_FOUND,
                ProviderError::Cancelled { .. } => CANCELLED,
                ProviderError::Config(_) => CONFIGURATION_FAILED,
            },
            Self::Internal(_) | Self::Io(_) => INTERNAL_ERROR,
        }
    }

    /// Stable machine-readable name for the error class
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Json(_) => "parse_error",
            Self::InvalidRequest(_) => "invalid_request",
            Self::MethodNotFound(_) => "method_not_found",
            Self::InvalidParams(_) => "invalid_params",
            Self::Unavailable(_) => "unavailable",
            Self::Provider(e) => e.kind(),
            Self::Internal(_) | Self::Io(_) => "internal",
        }
    }

    /// Structured detail sent alongside the message
    pub fn data(&self) -> Option<Value> {
        match self {
            Self::Provider(ProviderError::Validation(failures)) => {
                serde_json::to_value(failures).ok()
            }
            _ => None,
        }
    }
}

/// Bridge result type
pub type BridgeResult<T> = Result<T, BridgeError>;
