//! Error types for the tc-proto crate.

use thiserror::Error;

/// Errors that can occur while handling protocol values.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// A URN did not have the expected shape.
    #[error("invalid urn '{urn}': {reason}")]
    InvalidUrn {
        /// The offending URN.
        urn: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A resource id was rejected.
    #[error("invalid resource id: {0}")]
    InvalidResourceId(String),

    /// Failed to decode a wire value.
    #[error("decoding error for property '{property}': {reason}")]
    Decoding {
        /// Property the value belonged to.
        property: String,
        /// Why decoding failed.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtoError::InvalidUrn {
            urn: "bogus".to_string(),
            reason: "missing prefix".to_string(),
        };
        assert_eq!(err.to_string(), "invalid urn 'bogus': missing prefix");

        let err = ProtoError::Decoding {
            property: "length".to_string(),
            reason: "arrays are not supported".to_string(),
        };
        assert!(err.to_string().contains("length"));
        assert!(err.to_string().contains("arrays"));
    }
}
