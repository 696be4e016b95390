//! Bridge protocol types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC request
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    /// Request ID for correlation
    pub id: u64,
    /// Method name (e.g., "create", "diff")
    pub method: String,
    /// Method parameters
    #[serde(default)]
    pub params: Value,
}

/// JSON-RPC response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Request ID for correlation
    pub id: u64,
    /// Result on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

impl Response {
    /// Create a success response
    pub fn success(id: u64, result: impl Serialize) -> Self {
        Self {
            id,
            result: Some(serde_json::to_value(result).unwrap_or(Value::Null)),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: u64, code: i32, kind: &str, message: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(ErrorResponse {
                code,
                kind: kind.to_string(),
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Attach structured detail to an error response
    #[must_use]
    pub fn with_data(mut self, data: Option<Value>) -> Self {
        if let Some(error) = self.error.as_mut() {
            error.data = data;
        }
        self
    }

    /// Returns true if this is an error response
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// JSON-RPC error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code
    pub code: i32,
    /// Stable error class, e.g. "not_found"
    pub kind: String,
    /// Error message
    pub message: String,
    /// Structured detail, e.g. per-property validation failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// Standard JSON-RPC error codes
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// Custom error codes
pub const NOT_FOUND: i32 = -32000;
pub const UNAVAILABLE: i32 = -32003;
pub const CANCELLED: i32 = -32004;
pub const VALIDATION_FAILED: i32 = -32005;
pub const SCHEMA_NOT_FOUND: i32 = -32006;
pub const BACKEND_FAILED: i32 = -32007;
pub const CONFIGURATION_FAILED: i32 = -32008;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_omits_error() {
        let response = Response::success(3, json!({"version": "0.1.0"}));
        let json = serde_json::to_value(response).expect("serialize");
        assert_eq!(json, json!({"id": 3, "result": {"version": "0.1.0"}}));
    }

    #[test]
    fn error_carries_kind() {
        let response = Response::error(9, NOT_FOUND, "not_found", "resource r-1 not found");
        let json = serde_json::to_value(&response).expect("serialize");
        let expected = json!({
            "id": 9,
            "error": {"code": -32000, "kind": "not_found", "message": "resource r-1 not found"},
        });
        assert_eq!(json, expected);
        assert!(response.is_error());
    }

    #[test]
    fn request_params_default_to_null() {
        let request: Request =
            serde_json::from_str(r#"{"id": 1, "method": "cancel"}"#).expect("parse");
        assert_eq!(request.params, Value::Null);
    }
}
