//! Backends: the external systems resources live in.
//!
//! The provider itself holds no resource state between calls. Every record
//! is owned by a [`Backend`], reached through the
//! [`ProviderContext`](crate::ProviderContext) passed to each lifecycle call.

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tc_proto::{PropertyBag, ResourceId};
use thiserror::Error;

/// A resource as the backend stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Backend id.
    pub id: ResourceId,
    /// Type token the record was created with.
    pub type_token: String,
    /// Inputs last applied.
    pub inputs: PropertyBag,
    /// Computed outputs.
    pub outputs: PropertyBag,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl ResourceRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(
        id: ResourceId,
        type_token: impl Into<String>,
        inputs: PropertyBag,
        outputs: PropertyBag,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            type_token: type_token.into(),
            inputs,
            outputs,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces inputs and outputs and bumps the modification time.
    pub fn touch(&mut self, inputs: PropertyBag, outputs: PropertyBag) {
        self.inputs = inputs;
        self.outputs = outputs;
        self.updated_at = Utc::now();
    }
}

/// Errors reported by a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// A record with this id already exists.
    #[error("resource {0} already exists")]
    AlreadyExists(ResourceId),

    /// No record with this id exists.
    #[error("resource {0} does not exist")]
    NotFound(ResourceId),

    /// The backend refused the request.
    #[error("{0}")]
    Rejected(String),

    /// Filesystem failure.
    #[error("io error on {path}: {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A stored record could not be decoded.
    #[error("corrupt record {path}: {reason}")]
    Corrupt {
        /// Path of the record.
        path: PathBuf,
        /// Decoder message.
        reason: String,
    },
}

/// Result type alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Storage of resource records.
///
/// Each method performs exactly one backend mutation at most; callers own
/// any retry policy.
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Stores a new record. Fails if the id is taken.
    async fn insert(&self, record: ResourceRecord) -> BackendResult<()>;

    /// Fetches a record.
    async fn get(&self, id: &ResourceId) -> BackendResult<Option<ResourceRecord>>;

    /// Overwrites an existing record. Fails if it does not exist.
    async fn replace(&self, record: ResourceRecord) -> BackendResult<()>;

    /// Removes a record, returning it. Fails if it does not exist.
    async fn remove(&self, id: &ResourceId) -> BackendResult<ResourceRecord>;
}
