//! Resource handlers
//!
//! These handlers check, diff and drive the lifecycle of resources through
//! the provider's executor. Property bags arrive and leave wire-encoded.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tc_proto::{PropertyBag, ResourceId, Urn};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::bridge::Bridge;
use crate::error::BridgeResult;
use crate::handlers::{decode_bag, parse_params, to_json};

#[derive(Debug, Deserialize)]
pub struct CheckParams {
    pub urn: Urn,
    #[serde(default)]
    pub olds: Value,
    #[serde(default)]
    pub news: Value,
}

/// Validate resource inputs. Failures are part of the result.
pub fn check(bridge: &Bridge, params: Value) -> BridgeResult<Value> {
    let params: CheckParams = parse_params(params)?;
    let news = decode_bag(&params.news)?;
    to_json(bridge.provider().check(&params.urn, &news)?)
}

#[derive(Debug, Deserialize)]
pub struct DiffParams {
    pub urn: Urn,
    #[serde(default)]
    pub id: Option<ResourceId>,
    #[serde(default)]
    pub olds: Value,
    #[serde(default)]
    pub news: Value,
}

/// Classify a change between prior and new inputs
pub fn diff(bridge: &Bridge, params: Value) -> BridgeResult<Value> {
    let params: DiffParams = parse_params(params)?;
    let olds = decode_bag(&params.olds)?;
    let news = decode_bag(&params.news)?;
    to_json(bridge.provider().diff(&params.urn, &olds, &news)?)
}

#[derive(Debug, Deserialize)]
pub struct CreateParams {
    pub urn: Urn,
    #[serde(default)]
    pub properties: Value,
    #[serde(default)]
    pub preview: bool,
}

#[derive(Debug, Serialize)]
pub struct ResourceResult {
    pub id: ResourceId,
    pub properties: PropertyBag,
}

/// Create a resource
pub async fn create(
    bridge: &Bridge,
    cancel: &CancellationToken,
    params: Value,
) -> BridgeResult<Value> {
    let params: CreateParams = parse_params(params)?;
    let inputs = decode_bag(&params.properties)?;

    let ctx = bridge.context_with(cancel.clone());
    let created = bridge
        .provider()
        .executor()
        .create(&ctx, &params.urn, &inputs, params.preview)
        .await?;

    to_json(ResourceResult {
        id: created.id,
        properties: created.outputs,
    })
}

#[derive(Debug, Deserialize)]
pub struct ResourceParams {
    pub urn: Urn,
    pub id: ResourceId,
}

/// Read a resource's current outputs
pub async fn read(
    bridge: &Bridge,
    cancel: &CancellationToken,
    params: Value,
) -> BridgeResult<Value> {
    let params: ResourceParams = parse_params(params)?;

    let ctx = bridge.context_with(cancel.clone());
    let properties = bridge
        .provider()
        .executor()
        .read(&ctx, &params.urn, &params.id)
        .await?;

    to_json(ResourceResult {
        id: params.id,
        properties,
    })
}

#[derive(Debug, Deserialize)]
pub struct UpdateParams {
    pub urn: Urn,
    pub id: ResourceId,
    #[serde(default)]
    pub olds: Value,
    #[serde(default)]
    pub news: Value,
    #[serde(default)]
    pub preview: bool,
}

#[derive(Debug, Serialize)]
pub struct UpdateResult {
    pub properties: PropertyBag,
}

/// Update a resource in place
pub async fn update(
    bridge: &Bridge,
    cancel: &CancellationToken,
    params: Value,
) -> BridgeResult<Value> {
    let params: UpdateParams = parse_params(params)?;
    let olds = decode_bag(&params.olds)?;
    let news = decode_bag(&params.news)?;

    let ctx = bridge.context_with(cancel.clone());
    let properties = bridge
        .provider()
        .executor()
        .update(&ctx, &params.urn, &params.id, &olds, &news, params.preview)
        .await?;

    to_json(UpdateResult { properties })
}

/// Delete a resource
pub async fn delete(
    bridge: &Bridge,
    cancel: &CancellationToken,
    params: Value,
) -> BridgeResult<Value> {
    let params: ResourceParams = parse_params(params)?;

    let ctx = bridge.context_with(cancel.clone());
    bridge
        .provider()
        .executor()
        .delete(&ctx, &params.urn, &params.id)
        .await?;
    info!(urn = %params.urn, id = %params.id, "delete acknowledged");

    Ok(json!({}))
}
