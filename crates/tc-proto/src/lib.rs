//! # tc-proto
//!
//! Property model shared by the Teamcity provider and its RPC bridge.
//!
//! - [`PropertyValue`] / [`PropertyBag`]: tagged resource properties, with
//!   secrets redacted from every formatted output
//! - [`Urn`] / [`ResourceId`]: orchestrator and backend identities
//! - [`wire`]: the JSON encoding the orchestrator speaks
//! - [`validation`]: per-property failures collected during checks

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod urn;
pub mod validation;
pub mod value;
pub mod wire;

pub use error::ProtoError;
pub use urn::{ResourceId, Urn};
pub use validation::{ValidationError, ValidationResult};
pub use value::{PropertyBag, PropertyValue, SecretString};
