//! Request handlers
//!
//! Dispatches incoming requests to the provider.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tc_proto::{wire, PropertyBag};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::bridge::Bridge;
use crate::error::{BridgeError, BridgeResult};
use crate::protocol::Response;

pub mod config;
pub mod plugin;
pub mod resource;

/// Methods that bypass the in-flight limit so they are never stuck behind
/// the operations they control.
pub const CONTROL_METHODS: &[&str] = &["cancel", "shutdown"];

/// Handle an incoming request
pub async fn handle_request(bridge: &Bridge, id: u64, method: &str, params: Value) -> Response {
    let cancel = bridge.cancel_token();
    handle_scoped(bridge, &cancel, id, method, params).await
}

/// Handle a request whose lifecycle calls observe `cancel` rather than the
/// bridge's current token.
pub async fn handle_scoped(
    bridge: &Bridge,
    cancel: &CancellationToken,
    id: u64,
    method: &str,
    params: Value,
) -> Response {
    let result = match bridge.admit() {
        Ok(()) => dispatch(bridge, cancel, method, params).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(value) => {
            debug!(id, method, "request succeeded");
            Response::success(id, value)
        }
        Err(e) => {
            warn!(id, method, kind = e.kind(), error = %e, "request failed");
            error_response(id, &e)
        }
    }
}

/// The response reporting `error` for request `id`.
#[must_use]
pub fn error_response(id: u64, error: &BridgeError) -> Response {
    Response::error(id, error.code(), error.kind(), error.to_string()).with_data(error.data())
}

/// Dispatch a method call to the appropriate handler
async fn dispatch(
    bridge: &Bridge,
    cancel: &CancellationToken,
    method: &str,
    params: Value,
) -> BridgeResult<Value> {
    match method {
        // Plugin
        "get_plugin_info" => plugin::get_plugin_info(bridge, params),
        "get_schema" => plugin::get_schema(bridge, params),
        "cancel" => plugin::cancel(bridge, params),
        "shutdown" => plugin::shutdown(bridge, params),

        // Provider configuration
        "configure" => config::configure(bridge, params).await,
        "check_config" => config::check_config(bridge, params),
        "diff_config" => config::diff_config(bridge, params),

        // Resources
        "check" => resource::check(bridge, params),
        "diff" => resource::diff(bridge, params),
        "create" => resource::create(bridge, cancel, params).await,
        "read" => resource::read(bridge, cancel, params).await,
        "update" => resource::update(bridge, cancel, params).await,
        "delete" => resource::delete(bridge, cancel, params).await,

        // Unknown method
        _ => Err(BridgeError::MethodNotFound(method.to_string())),
    }
}

// ─────────────────────────────────────────────────────────────
// Helper functions
// ─────────────────────────────────────────────────────────────

/// Parse params into a typed struct
pub fn parse_params<T: for<'de> Deserialize<'de>>(params: Value) -> BridgeResult<T> {
    let params = if params.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        params
    };
    serde_json::from_value(params).map_err(|e| BridgeError::InvalidParams(e.to_string()))
}

/// Decode a wire-encoded property bag; malformed values are validation errors
pub fn decode_bag(raw: &Value) -> BridgeResult<PropertyBag> {
    wire::decode_bag(raw).map_err(BridgeError::from)
}

/// Convert a result to JSON value
pub fn to_json<T: Serialize>(value: T) -> BridgeResult<Value> {
    serde_json::to_value(value).map_err(BridgeError::from)
}
