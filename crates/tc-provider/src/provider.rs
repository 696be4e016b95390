//! The `teamcity` package: registry, executor and package metadata wired
//! together.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tc_proto::{PropertyBag, Urn, ValidationResult};

use crate::config::config_schema;
use crate::diff::{diff, DiffResult};
use crate::error::ProviderResult;
use crate::lifecycle::{LifecycleExecutor, ResourceHandler};
use crate::resources::Random;
use crate::schema::{PropertySpec, ResourceSchema, SchemaRegistry};

/// Version reported to the orchestrator.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result of a check: checked inputs plus every failure found.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    /// Inputs with defaults applied.
    pub inputs: PropertyBag,
    /// Per-property failures.
    pub failures: ValidationResult,
}

/// Descriptive package metadata published in the package schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    /// Package name, first segment of every type token.
    pub name: String,
    /// Human readable name.
    pub display_name: String,
    /// SPDX license identifier.
    pub license: String,
    /// Source repository.
    pub repository: String,
    /// Publisher.
    pub publisher: String,
    /// Homepage.
    pub homepage: String,
    /// Where the orchestrator downloads the plugin from.
    pub plugin_download_url: String,
    /// Per-language SDK generation settings.
    pub language: Value,
}

impl PackageMetadata {
    /// Metadata of the `teamcity` package.
    #[must_use]
    pub fn teamcity() -> Self {
        Self {
            name: "teamcity".to_string(),
            display_name: "Teamcity".to_string(),
            license: "Apache-2.0".to_string(),
            repository: "https://github.com/oss4u/pulumi-teamcity-native".to_string(),
            publisher: "Oss4u".to_string(),
            homepage: "https://github.com/oss4u/".to_string(),
            plugin_download_url: "github://api.github.com/oss4u/pulumi-teamcity-native".to_string(),
            language: json!({
                "csharp": {
                    "rootNamespace": "Oss4u",
                    "respectSchemaVersion": true,
                },
                "go": {
                    "generateResourceContainerTypes": true,
                    "importBasePath": "github.com/oss4u/pulumi-teamcity-native/sdk/go/teamcity",
                    "respectSchemaVersion": true,
                },
                "nodejs": {
                    "packageName": "@oss4u/teamcity",
                    "respectSchemaVersion": true,
                },
                "python": {
                    "pyproject": { "enabled": true },
                    "respectSchemaVersion": true,
                    "packageInfo": {
                        "Download-URL": "https://github.com/oss4u/pulumi-teamcity-native?VERSION",
                    },
                },
            }),
        }
    }
}

/// A resource provider package.
#[derive(Debug, Clone)]
pub struct Provider {
    metadata: PackageMetadata,
    registry: SchemaRegistry,
    executor: LifecycleExecutor,
}

impl Provider {
    /// Creates a package with no resource types.
    #[must_use]
    pub fn new(metadata: PackageMetadata, config: ResourceSchema) -> Self {
        Self {
            metadata,
            registry: SchemaRegistry::new(config),
            executor: LifecycleExecutor::new(),
        }
    }

    /// The `teamcity` package with all of its resource types.
    #[must_use]
    pub fn teamcity() -> Self {
        Self::new(PackageMetadata::teamcity(), config_schema()).with_resource(Arc::new(Random))
    }

    /// Registers a resource type.
    #[must_use]
    pub fn with_resource(mut self, handler: Arc<dyn ResourceHandler>) -> Self {
        self.registry.register(handler.schema());
        self.executor.register(handler);
        self
    }

    /// Package metadata.
    #[must_use]
    pub const fn metadata(&self) -> &PackageMetadata {
        &self.metadata
    }

    /// The schema registry.
    #[must_use]
    pub const fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// The lifecycle executor.
    #[must_use]
    pub const fn executor(&self) -> &LifecycleExecutor {
        &self.executor
    }

    /// Checks resource inputs.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::SchemaNotFound`](crate::ProviderError::SchemaNotFound)
    /// for unregistered types. Invalid inputs are reported in the outcome.
    pub fn check(&self, urn: &Urn, news: &PropertyBag) -> ProviderResult<CheckOutcome> {
        let schema = self.registry.describe(urn.type_token())?;
        let (inputs, failures) = schema.check(news);
        Ok(CheckOutcome { inputs, failures })
    }

    /// Diffs prior inputs against new inputs of a resource.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::SchemaNotFound`](crate::ProviderError::SchemaNotFound)
    /// for unregistered types.
    pub fn diff(
        &self,
        urn: &Urn,
        olds: &PropertyBag,
        news: &PropertyBag,
    ) -> ProviderResult<DiffResult> {
        let schema = self.registry.describe(urn.type_token())?;
        Ok(diff(olds, news, schema))
    }

    /// Checks provider configuration.
    #[must_use]
    pub fn check_config(&self, news: &PropertyBag) -> CheckOutcome {
        let (inputs, failures) = self.registry.config().check(news);
        CheckOutcome { inputs, failures }
    }

    /// Diffs provider configuration.
    #[must_use]
    pub fn diff_config(&self, olds: &PropertyBag, news: &PropertyBag) -> DiffResult {
        diff(olds, news, self.registry.config())
    }

    /// The package schema document.
    #[must_use]
    pub fn package_schema(&self) -> Value {
        let meta = &self.metadata;
        let config = self.registry.config();

        let mut resources = Map::new();
        for schema in self.registry.resources() {
            resources.insert(schema.token.clone(), resource_document(schema));
        }

        json!({
            "name": meta.name,
            "displayName": meta.display_name,
            "version": VERSION,
            "license": meta.license,
            "repository": meta.repository,
            "publisher": meta.publisher,
            "homepage": meta.homepage,
            "pluginDownloadURL": meta.plugin_download_url,
            "meta": { "moduleFormat": "(.*)" },
            "config": {
                "variables": properties_document(&config.inputs),
            },
            "provider": {
                "description": config.description,
                "inputProperties": properties_document(&config.inputs),
            },
            "resources": resources,
            "language": meta.language,
        })
    }
}

fn property_document(spec: &PropertySpec) -> Value {
    let mut doc = Map::new();
    doc.insert("type".to_string(), json!(spec.kind.as_str()));
    if !spec.description.is_empty() {
        doc.insert("description".to_string(), json!(spec.description));
    }
    if spec.secret {
        doc.insert("secret".to_string(), json!(true));
    }
    if let Some(default) = &spec.default {
        doc.insert("default".to_string(), tc_proto::wire::encode_value(default));
    }
    Value::Object(doc)
}

fn properties_document(specs: &[PropertySpec]) -> Value {
    specs
        .iter()
        .map(|spec| (spec.name.clone(), property_document(spec)))
        .collect::<Map<String, Value>>()
        .into()
}

fn required_names(specs: &[PropertySpec]) -> Vec<&str> {
    specs.iter().filter(|s| s.required).map(|s| s.name.as_str()).collect()
}

fn resource_document(schema: &ResourceSchema) -> Value {
    let replaces: Vec<&str> = schema
        .inputs
        .iter()
        .filter(|s| s.replaces_on_change())
        .map(|s| s.name.as_str())
        .collect();

    let mut doc = json!({
        "description": schema.description,
        "properties": properties_document(&schema.outputs),
        "required": required_names(&schema.outputs),
        "inputProperties": properties_document(&schema.inputs),
        "requiredInputs": required_names(&schema.inputs),
    });
    if !replaces.is_empty() {
        doc["replaceOnChanges"] = json!(replaces);
    }
    doc
}
