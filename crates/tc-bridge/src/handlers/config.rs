//! Provider configuration handlers

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tc_provider::ProviderConfig;
use tracing::info;

use crate::bridge::Bridge;
use crate::error::BridgeResult;
use crate::handlers::{decode_bag, parse_params, to_json};

#[derive(Debug, Deserialize)]
pub struct ConfigureParams {
    #[serde(default)]
    pub variables: Value,
}

#[derive(Debug, Serialize)]
pub struct ConfigureResult {
    pub accept_secrets: bool,
}

/// Apply provider configuration.
///
/// A `stateDir` switches later operations to the file backend in that
/// directory; without one the current backend is kept.
pub async fn configure(bridge: &Bridge, params: Value) -> BridgeResult<Value> {
    let params: ConfigureParams = parse_params(params)?;
    let variables = decode_bag(&params.variables)?;
    let config = ProviderConfig::from_bag(&variables)?;

    if config.state_dir.is_some() {
        let backend = config.open_backend().await?;
        bridge.set_backend(backend);
    }
    info!(variables = variables.len(), "provider configured");

    to_json(ConfigureResult { accept_secrets: true })
}

#[derive(Debug, Deserialize)]
pub struct ConfigInputsParams {
    #[serde(default)]
    pub olds: Value,
    #[serde(default)]
    pub news: Value,
}

/// Validate provider configuration
pub fn check_config(bridge: &Bridge, params: Value) -> BridgeResult<Value> {
    let params: ConfigInputsParams = parse_params(params)?;
    let news = decode_bag(&params.news)?;
    to_json(bridge.provider().check_config(&news))
}

/// Classify a provider configuration change
pub fn diff_config(bridge: &Bridge, params: Value) -> BridgeResult<Value> {
    let params: ConfigInputsParams = parse_params(params)?;
    let olds = decode_bag(&params.olds)?;
    let news = decode_bag(&params.news)?;
    to_json(bridge.provider().diff_config(&olds, &news))
}
