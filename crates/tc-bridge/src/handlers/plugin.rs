//! Plugin-level handlers: version, schema and control requests.

use serde::Serialize;
use serde_json::{json, Value};
use tc_provider::VERSION;

use crate::bridge::Bridge;
use crate::error::BridgeResult;
use crate::handlers::to_json;

#[derive(Debug, Serialize)]
pub struct PluginInfo {
    pub name: String,
    pub version: &'static str,
}

/// Report the plugin version
pub fn get_plugin_info(bridge: &Bridge, _params: Value) -> BridgeResult<Value> {
    to_json(PluginInfo {
        name: bridge.provider().metadata().name.clone(),
        version: VERSION,
    })
}

/// Return the package schema document
pub fn get_schema(bridge: &Bridge, _params: Value) -> BridgeResult<Value> {
    Ok(bridge.provider().package_schema())
}

/// Cancel every in-flight operation
pub fn cancel(bridge: &Bridge, _params: Value) -> BridgeResult<Value> {
    bridge.cancel_all();
    Ok(json!({}))
}

/// Stop accepting requests
pub fn shutdown(bridge: &Bridge, _params: Value) -> BridgeResult<Value> {
    bridge.shutdown();
    Ok(json!({}))
}
