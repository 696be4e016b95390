//! Provider configuration.
//!
//! The orchestrator sends configuration either as a bag of provider inputs
//! (`stateDir`) or as fully qualified variables (`teamcity:config:stateDir`).
//! Both forms are accepted.

use std::path::PathBuf;
use std::sync::Arc;

use tc_proto::{PropertyBag, PropertyValue};
use tracing::info;

use crate::backend::{Backend, FileBackend, MemoryBackend};
use crate::error::{ProviderError, ProviderResult};
use crate::schema::{PropertySpec, PropertyType, ResourceSchema};

/// Token of the provider resource itself.
pub const PROVIDER_TOKEN: &str = "pulumi:providers:teamcity";

/// Prefix of fully qualified configuration variables.
pub const CONFIG_PREFIX: &str = "teamcity:config:";

const STATE_DIR: &str = "stateDir";
const VERSION: &str = "version";

/// Schema of the provider configuration.
#[must_use]
pub fn config_schema() -> ResourceSchema {
    ResourceSchema::new(PROVIDER_TOKEN)
        .describe("The provider type for the teamcity package.")
        .idempotent(true)
        .input(
            PropertySpec::optional(STATE_DIR, PropertyType::String)
                .describe("Directory holding resource records. Kept in memory when unset.")
                .forces_replace(),
        )
        .input(
            PropertySpec::optional(VERSION, PropertyType::String)
                .describe("Version of the provider plugin."),
        )
}

/// Decoded provider configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Directory for the file backend.
    pub state_dir: Option<PathBuf>,
}

impl ProviderConfig {
    /// Decodes configuration from a property bag.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Config`] if `stateDir` is present but not a
    /// known string.
    pub fn from_bag(bag: &PropertyBag) -> ProviderResult<Self> {
        let mut config = Self::default();
        for (key, value) in bag {
            let name = key.strip_prefix(CONFIG_PREFIX).unwrap_or(key);
            if name != STATE_DIR {
                continue;
            }
            config.state_dir = match value {
                PropertyValue::Null => None,
                PropertyValue::String(_) | PropertyValue::Secret(_) => value
                    .as_str()
                    .filter(|dir| !dir.is_empty())
                    .map(PathBuf::from),
                other => {
                    return Err(ProviderError::Config(format!(
                        "{STATE_DIR} must be a string, got {}",
                        other.type_name()
                    )));
                }
            };
        }
        Ok(config)
    }

    /// Opens the backend this configuration selects.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Config`] if the state directory cannot be
    /// created.
    pub async fn open_backend(&self) -> ProviderResult<Arc<dyn Backend>> {
        match &self.state_dir {
            Some(dir) => {
                let backend = FileBackend::open(dir)
                    .await
                    .map_err(|e| ProviderError::Config(e.to_string()))?;
                info!(dir = %dir.display(), "using file backend");
                Ok(Arc::new(backend))
            }
            None => {
                info!("using in-memory backend");
                Ok(Arc::new(MemoryBackend::new()))
            }
        }
    }
}
