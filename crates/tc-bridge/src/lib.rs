//! Teamcity Provider Bridge
//!
//! JSON-RPC bridge between the orchestrating engine and the Teamcity
//! provider. The engine launches the plugin and exchanges requests with it
//! over stdin/stdout.
//!
//! ## Protocol
//!
//! One JSON object per line (newline-delimited JSON).
//!
//! Request:
//! ```json
//! {"id": 1, "method": "read", "params": {"urn": "urn:pulumi:dev::demo::teamcity:index:Random::r",
//!   "id": "r-3f2a9c01"}}
//! ```
//!
//! Response:
//! ```json
//! {"id": 1, "result": {"id": "r-3f2a9c01", "properties": {"length": 24, "result": "..."}}}
//! ```
//!
//! Error:
//! ```json
//! {"id": 1, "error": {"code": -32000, "kind": "not_found", "message": "..."}}
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod server;

pub use bridge::{Bridge, BridgeState};
pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult};
pub use handlers::handle_request;
pub use protocol::{ErrorResponse, Request, Response};
pub use server::BridgeServer;
