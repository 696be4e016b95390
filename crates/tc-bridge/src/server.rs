//! Newline-delimited JSON-RPC server.
//!
//! Requests are read one line at a time. Each one is handled on its own task
//! and its response is queued for a single writer task, so responses go out
//! in completion order and clients correlate them by id.
//!
//! The reader never waits for an in-flight slot: tasks queue for one
//! themselves, so `cancel` and `shutdown` are read while the limit is
//! reached. A request is bound to the cancellation token current when it was
//! read, and a queued request that is cancelled never runs.

use std::sync::Arc;

use serde_json::Value;
use tc_provider::ProviderError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::bridge::Bridge;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::handlers::{error_response, handle_scoped, CONTROL_METHODS};
use crate::protocol::{Request, Response};

/// Serves a [`Bridge`] over a pair of byte streams.
#[derive(Debug)]
pub struct BridgeServer {
    bridge: Arc<Bridge>,
    config: BridgeConfig,
}

impl BridgeServer {
    /// Create a server.
    #[must_use]
    pub const fn new(bridge: Arc<Bridge>, config: BridgeConfig) -> Self {
        Self { bridge, config }
    }

    /// The shared bridge.
    #[must_use]
    pub const fn bridge(&self) -> &Arc<Bridge> {
        &self.bridge
    }

    /// Serve stdin/stdout until stdin closes.
    pub async fn serve_stdio(&self) -> BridgeResult<()> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
    }

    /// Serve until `reader` reaches end of stream, then wait for in-flight
    /// requests and flush their responses.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> BridgeResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (response_tx, response_rx) = mpsc::channel::<Response>(self.config.response_buffer);
        let write_task = tokio::spawn(write_responses(writer, response_rx));
        let in_flight = Arc::new(Semaphore::new(self.config.max_in_flight));

        info!(max_in_flight = self.config.max_in_flight, "bridge serving");

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            // Skip empty lines
            if line.trim().is_empty() {
                continue;
            }

            let request = match parse_request(&line) {
                Ok(request) => request,
                Err(response) => {
                    if response_tx.send(response).await.is_err() {
                        break;
                    }
                    continue;
                }
            };

            debug!(id = request.id, method = %request.method, "handling request");

            let limit = if CONTROL_METHODS.contains(&request.method.as_str()) {
                None
            } else {
                Some(Arc::clone(&in_flight))
            };
            let cancel = self.bridge.cancel_token();
            let bridge = Arc::clone(&self.bridge);
            let tx = response_tx.clone();
            tokio::spawn(async move {
                let id = request.id;
                let response = match wait_for_slot(limit, &cancel).await {
                    Ok(_permit) => {
                        handle_scoped(&bridge, &cancel, id, &request.method, request.params).await
                    }
                    Err(e) => {
                        warn!(id, method = %request.method, kind = e.kind(), "request not started");
                        error_response(id, &e)
                    }
                };
                if tx.send(response).await.is_err() {
                    warn!(id, "response dropped: writer has stopped");
                }
            });
        }

        info!("input closed, draining in-flight requests");
        drop(response_tx);

        write_task
            .await
            .map_err(|e| BridgeError::Internal(format!("writer task failed: {e}")))??;

        info!("bridge stopped");
        Ok(())
    }
}

/// Wait for an in-flight slot, giving up once `cancel` fires.
///
/// Without a limit the request starts immediately.
async fn wait_for_slot(
    limit: Option<Arc<Semaphore>>,
    cancel: &CancellationToken,
) -> BridgeResult<Option<OwnedSemaphorePermit>> {
    let Some(limit) = limit else {
        return Ok(None);
    };
    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            Err(ProviderError::Cancelled { operation: "request" }.into())
        }
        permit = limit.acquire_owned() => {
            permit.map(Some).map_err(|e| BridgeError::Internal(e.to_string()))
        }
    }
}

/// Parse one input line, producing the error response on failure.
fn parse_request(line: &str) -> Result<Request, Response> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| error_response(0, &BridgeError::from(e)))?;

    let id = value.get("id").and_then(Value::as_u64).unwrap_or(0);
    serde_json::from_value(value)
        .map_err(|e| error_response(id, &BridgeError::InvalidRequest(e.to_string())))
}

async fn write_responses<W>(
    mut writer: W,
    mut responses: mpsc::Receiver<Response>,
) -> BridgeResult<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = responses.recv().await {
        let mut json = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                error!(id = response.id, error = %e, "failed to serialize response");
                continue;
            }
        };
        json.push('\n');
        writer.write_all(json.as_bytes()).await?;
        writer.flush().await?;
        debug!(id = response.id, "response sent");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol;

    #[test]
    fn malformed_json_is_parse_error() {
        let response = parse_request("{not json").expect_err("parse error");
        let error = response.error.expect("error");
        assert_eq!(response.id, 0);
        assert_eq!(error.code, protocol::PARSE_ERROR);
        assert_eq!(error.kind, "parse_error");
    }

    #[test]
    fn missing_method_is_invalid_request() {
        let response = parse_request(r#"{"id": 12, "params": {}}"#).expect_err("invalid");
        let error = response.error.expect("error");
        assert_eq!(response.id, 12);
        assert_eq!(error.code, protocol::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn cancelled_request_gives_up_its_place_in_line() {
        let limit = Arc::new(Semaphore::new(1));
        let _held = Arc::clone(&limit).acquire_owned().await.expect("permit");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = wait_for_slot(Some(limit), &cancel).await.expect_err("cancelled");
        assert_eq!(err.kind(), "cancelled");
    }

    #[tokio::test]
    async fn control_methods_skip_the_queue() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(wait_for_slot(None, &cancel).await.expect("no limit").is_none());
    }

    #[test]
    fn well_formed_request_parses() {
        let request = parse_request(r#"{"id": 4, "method": "get_plugin_info"}"#).expect("valid");
        assert_eq!(request.id, 4);
        assert_eq!(request.method, "get_plugin_info");
    }
}
