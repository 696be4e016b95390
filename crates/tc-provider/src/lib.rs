//! # tc-provider
//!
//! Core of the Teamcity resource provider.
//!
//! - [`schema`]: resource type descriptions and input checks
//! - [`diff`]: classifies a change as no-change, update or replace
//! - [`lifecycle`]: create/read/update/delete through resource handlers
//! - [`backend`]: where resource records live (memory or JSON files)
//! - [`resources`]: the resource types the package exports
//! - [`Provider`]: the package as a whole, including its schema document
//!
//! ```rust,no_run
//! use tc_provider::{Provider, ProviderContext};
//! use tc_proto::{PropertyBag, Urn};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Provider::teamcity();
//! let ctx = ProviderContext::in_memory();
//! let urn = Urn::parse("urn:pulumi:dev::demo::teamcity:index:Random::token")?;
//! let inputs = PropertyBag::new().with("length", 24u32);
//!
//! let created = provider.executor().create(&ctx, &urn, &inputs, false).await?;
//! println!("{} -> {}", created.id, created.outputs);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod config;
pub mod context;
pub mod diff;
pub mod error;
pub mod lifecycle;
pub mod provider;
pub mod resources;
pub mod schema;

pub use backend::{Backend, BackendError, FileBackend, MemoryBackend, ResourceRecord};
pub use config::ProviderConfig;
pub use context::ProviderContext;
pub use diff::{DiffKind, DiffResult};
pub use error::{ProviderError, ProviderResult};
pub use lifecycle::{Created, LifecycleExecutor, ResourceHandler};
pub use provider::{CheckOutcome, PackageMetadata, Provider, VERSION};
pub use schema::{Mutability, PropertySpec, PropertyType, ResourceSchema, SchemaRegistry};
