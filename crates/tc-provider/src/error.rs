//! Error types for the provider core.

use tc_proto::{ProtoError, ResourceId, ValidationResult};
use thiserror::Error;

/// Errors surfaced by the schema registry and the lifecycle executor.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No schema is registered for the type token.
    #[error("unknown resource type '{type_token}'")]
    SchemaNotFound {
        /// The unregistered type token.
        type_token: String,
    },

    /// Inputs did not match the schema.
    #[error("invalid inputs: {0}")]
    Validation(ValidationResult),

    /// The backend rejected a create.
    #[error("create of {urn} failed: {reason}")]
    CreateFailed {
        /// Resource being created.
        urn: String,
        /// Backend message, verbatim.
        reason: String,
    },

    /// The backend failed while reading.
    #[error("read of {id} failed: {reason}")]
    ReadFailed {
        /// Resource being read.
        id: ResourceId,
        /// Backend message, verbatim.
        reason: String,
    },

    /// The backend rejected an update.
    #[error("update of {id} failed: {reason}")]
    UpdateFailed {
        /// Resource being updated.
        id: ResourceId,
        /// Backend message, verbatim.
        reason: String,
    },

    /// The backend rejected a delete.
    #[error("delete of {id} failed: {reason}")]
    DeleteFailed {
        /// Resource being deleted.
        id: ResourceId,
        /// Backend message, verbatim.
        reason: String,
    },

    /// The resource does not exist in the backend.
    #[error("resource {id} not found")]
    NotFound {
        /// The missing resource.
        id: ResourceId,
    },

    /// The operation was cancelled before it completed.
    #[error("{operation} cancelled")]
    Cancelled {
        /// Which lifecycle operation was cancelled.
        operation: &'static str,
    },

    /// Provider configuration could not be applied.
    #[error("configuration error: {0}")]
    Config(String),

    /// Protocol-level value error.
    #[error(transparent)]
    Proto(#[from] ProtoError),
}

impl ProviderError {
    /// Stable machine-readable name for the error class.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SchemaNotFound { .. } => "schema_not_found",
            Self::Validation(_) | Self::Proto(_) => "validation",
            Self::CreateFailed { .. } => "create_failed",
            Self::ReadFailed { .. } => "read_failed",
            Self::UpdateFailed { .. } => "update_failed",
            Self::DeleteFailed { .. } => "delete_failed",
            Self::NotFound { .. } => "not_found",
            Self::Cancelled { .. } => "cancelled",
            Self::Config(_) => "config",
        }
    }
}

/// Result type alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::SchemaNotFound {
            type_token: "teamcity:index:Missing".to_string(),
        };
        assert_eq!(err.to_string(), "unknown resource type 'teamcity:index:Missing'");
        assert_eq!(err.kind(), "schema_not_found");

        let err = ProviderError::Cancelled { operation: "create" };
        assert_eq!(err.to_string(), "create cancelled");
        assert_eq!(err.kind(), "cancelled");
    }

    #[test]
    fn test_backend_reason_is_kept_verbatim() {
        let id = ResourceId::new("r-1").expect("valid id");
        let err = ProviderError::DeleteFailed {
            id,
            reason: "permission denied on /var/lib/state".to_string(),
        };
        assert!(err.to_string().ends_with("permission denied on /var/lib/state"));
    }
}
