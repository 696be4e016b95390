//! Schema registry: declarative descriptions of resource types.
//!
//! A [`ResourceSchema`] lists the input properties a resource accepts (type,
//! required/optional, whether a change forces replacement, whether the value
//! is secret) and the output properties the backend computes. The
//! [`SchemaRegistry`] maps type tokens to schemas and validates inputs
//! against them.

use std::collections::HashMap;

use serde::Serialize;
use tc_proto::{PropertyBag, PropertyValue, ValidationResult};

use crate::error::{ProviderError, ProviderResult};

/// Value type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    /// A string (plain or secret).
    String,
    /// Any number.
    Number,
    /// A whole number.
    Integer,
    /// A boolean.
    Boolean,
}

impl PropertyType {
    /// Name used in validation messages and the package schema.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }

    fn accepts(self, value: &PropertyValue) -> bool {
        match (self, value) {
            (Self::String, PropertyValue::String(_) | PropertyValue::Secret(_))
            | (Self::Number, PropertyValue::Number(_))
            | (Self::Boolean, PropertyValue::Bool(_)) => true,
            (Self::Integer, PropertyValue::Number(n)) => n.is_finite() && n.fract() == 0.0,
            _ => false,
        }
    }
}

/// How a property reacts to a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutability {
    /// The backend can apply the change to the live resource.
    InPlace,
    /// The resource must be destroyed and recreated.
    ForcesReplace,
}

/// Description of one property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySpec {
    /// Property name on the wire.
    pub name: String,
    /// Value type.
    pub kind: PropertyType,
    /// Whether inputs must supply it.
    pub required: bool,
    /// Change behaviour.
    pub mutability: Mutability,
    /// Whether values are always treated as secret.
    pub secret: bool,
    /// Human readable description.
    pub description: String,
    /// Value applied when the input is omitted.
    #[serde(skip)]
    pub default: Option<PropertyValue>,
    /// Inclusive lower bound for numbers.
    pub minimum: Option<f64>,
    /// Inclusive upper bound for numbers.
    pub maximum: Option<f64>,
}

impl PropertySpec {
    fn new(name: impl Into<String>, kind: PropertyType, required: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            required,
            mutability: Mutability::InPlace,
            secret: false,
            description: String::new(),
            default: None,
            minimum: None,
            maximum: None,
        }
    }

    /// A required property.
    #[must_use]
    pub fn required(name: impl Into<String>, kind: PropertyType) -> Self {
        Self::new(name, kind, true)
    }

    /// An optional property.
    #[must_use]
    pub fn optional(name: impl Into<String>, kind: PropertyType) -> Self {
        Self::new(name, kind, false)
    }

    /// Marks the property as forcing replacement when it changes.
    #[must_use]
    pub const fn forces_replace(mut self) -> Self {
        self.mutability = Mutability::ForcesReplace;
        self
    }

    /// Marks the property as secret.
    #[must_use]
    pub const fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets a default applied during checks.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<PropertyValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets inclusive numeric bounds.
    #[must_use]
    pub const fn with_range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    /// Returns true if a change forces replacement.
    #[must_use]
    pub fn replaces_on_change(&self) -> bool {
        self.mutability == Mutability::ForcesReplace
    }

    fn check(&self, value: &PropertyValue, failures: &mut ValidationResult) {
        if value.is_unknown() {
            return;
        }
        if value.is_null() {
            if self.required {
                failures.error(&self.name, "required property cannot be null");
            }
            return;
        }
        if !self.kind.accepts(value) {
            failures.error(
                &self.name,
                format!("expected {}, got {}", self.kind.as_str(), value.type_name()),
            );
            return;
        }
        if let Some(n) = value.as_f64() {
            if self.minimum.is_some_and(|min| n < min) || self.maximum.is_some_and(|max| n > max) {
                failures.error(
                    &self.name,
                    format!(
                        "{n} is outside the allowed range {}..={}",
                        self.minimum.unwrap_or(f64::MIN),
                        self.maximum.unwrap_or(f64::MAX)
                    ),
                );
            }
        }
    }
}

/// Description of a resource type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSchema {
    /// Type token, e.g. `teamcity:index:Random`.
    pub token: String,
    /// Human readable description.
    pub description: String,
    /// Whether repeating a create yields the same backend state.
    pub idempotent: bool,
    /// Input properties.
    pub inputs: Vec<PropertySpec>,
    /// Output properties.
    pub outputs: Vec<PropertySpec>,
}

impl ResourceSchema {
    /// Creates an empty schema for a type token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            description: String::new(),
            idempotent: false,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Records whether creates are idempotent.
    #[must_use]
    pub const fn idempotent(mut self, idempotent: bool) -> Self {
        self.idempotent = idempotent;
        self
    }

    /// Adds an input property.
    #[must_use]
    pub fn input(mut self, spec: PropertySpec) -> Self {
        self.inputs.push(spec);
        self
    }

    /// Adds an output property.
    #[must_use]
    pub fn output(mut self, spec: PropertySpec) -> Self {
        self.outputs.push(spec);
        self
    }

    /// Looks up an input property.
    #[must_use]
    pub fn input_spec(&self, name: &str) -> Option<&PropertySpec> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Returns true if a change to `name` forces replacement.
    #[must_use]
    pub fn forces_replace(&self, name: &str) -> bool {
        self.input_spec(name).is_some_and(PropertySpec::replaces_on_change)
    }

    /// Validates `news` against the input properties.
    ///
    /// Returns the checked inputs (defaults applied, secret-flagged strings
    /// promoted to secrets) along with every failure found. Unknown values
    /// pass type checks; keys starting with `__` are reserved by the
    /// orchestrator and ignored.
    #[must_use]
    pub fn check(&self, news: &PropertyBag) -> (PropertyBag, ValidationResult) {
        let mut inputs = news.clone();
        let mut failures = ValidationResult::new();

        for spec in &self.inputs {
            match inputs.get(&spec.name) {
                Some(value) => spec.check(value, &mut failures),
                None => match &spec.default {
                    Some(default) => {
                        inputs.insert(spec.name.clone(), default.clone());
                    }
                    None if spec.required => {
                        let reason = format!("missing required property '{}'", spec.name);
                        failures.error(&spec.name, reason);
                    }
                    None => {}
                },
            }

            if spec.secret {
                if let Some(PropertyValue::String(plain)) = inputs.get(&spec.name) {
                    let promoted = PropertyValue::secret(plain.clone());
                    inputs.insert(spec.name.clone(), promoted);
                }
            }
        }

        for name in news.keys() {
            if !name.starts_with("__") && self.input_spec(name).is_none() {
                failures.error(name, format!("unknown property '{name}' for {}", self.token));
            }
        }

        (inputs, failures)
    }

    /// Ensures every declared output is present, filling gaps with `fill`.
    pub fn complete_outputs(&self, outputs: &mut PropertyBag, fill: &PropertyValue) {
        for spec in &self.outputs {
            if !outputs.contains_key(&spec.name) {
                outputs.insert(spec.name.clone(), fill.clone());
            }
        }
    }
}

/// Registry of resource schemas plus the provider configuration schema.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    resources: HashMap<String, ResourceSchema>,
    config: ResourceSchema,
}

impl SchemaRegistry {
    /// Creates a registry with the given provider configuration schema.
    #[must_use]
    pub fn new(config: ResourceSchema) -> Self {
        Self {
            resources: HashMap::new(),
            config,
        }
    }

    /// Registers a resource schema, replacing any schema with the same token.
    pub fn register(&mut self, schema: ResourceSchema) {
        self.resources.insert(schema.token.clone(), schema);
    }

    /// Looks up the schema for a type token.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::SchemaNotFound`] if the token is unregistered.
    pub fn describe(&self, type_token: &str) -> ProviderResult<&ResourceSchema> {
        self.resources
            .get(type_token)
            .ok_or_else(|| ProviderError::SchemaNotFound {
                type_token: type_token.to_string(),
            })
    }

    /// The provider configuration schema.
    #[must_use]
    pub const fn config(&self) -> &ResourceSchema {
        &self.config
    }

    /// Registered resource schemas, sorted by token.
    #[must_use]
    pub fn resources(&self) -> Vec<&ResourceSchema> {
        let mut schemas: Vec<&ResourceSchema> = self.resources.values().collect();
        schemas.sort_by(|a, b| a.token.cmp(&b.token));
        schemas
    }

    /// Number of registered resource types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns true if no resource types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn widget() -> ResourceSchema {
        ResourceSchema::new("test:index:Widget")
            .input(
                PropertySpec::required("size", PropertyType::Integer)
                    .forces_replace()
                    .with_range(0.0, 10.0),
            )
            .input(PropertySpec::optional("label", PropertyType::String).with_default("none"))
            .input(PropertySpec::optional("token", PropertyType::String).secret())
            .output(PropertySpec::required("size", PropertyType::Integer))
            .output(PropertySpec::required("serial", PropertyType::String))
    }

    #[test]
    fn describe_unknown_type_fails() {
        let registry = SchemaRegistry::new(ResourceSchema::new("pulumi:providers:test"));
        let err = registry.describe("test:index:Missing").expect_err("should fail");
        assert!(matches!(err, ProviderError::SchemaNotFound { .. }));
    }

    #[test]
    fn describe_registered_type() {
        let mut registry = SchemaRegistry::new(ResourceSchema::new("pulumi:providers:test"));
        registry.register(widget());
        let schema = registry.describe("test:index:Widget").expect("registered");
        assert!(schema.forces_replace("size"));
        assert!(!schema.forces_replace("label"));
        assert!(!schema.forces_replace("not-there"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn check_applies_defaults_and_promotes_secrets() {
        let news = PropertyBag::new().with("size", 3u32).with("token", "abc");
        let (inputs, failures) = widget().check(&news);
        assert!(failures.is_valid(), "{failures}");
        assert_eq!(inputs.get("label"), Some(&PropertyValue::from("none")));
        assert!(inputs.get("token").is_some_and(PropertyValue::is_secret));
    }

    #[test]
    fn check_reports_missing_required() {
        let (_, failures) = widget().check(&PropertyBag::new());
        assert_eq!(failures.errors().len(), 1);
        assert_eq!(failures.errors()[0].property, "size");
    }

    #[test_case(PropertyValue::from("big") ; "wrong type")]
    #[test_case(PropertyValue::Number(2.5) ; "not an integer")]
    #[test_case(PropertyValue::Number(11.0) ; "above range")]
    #[test_case(PropertyValue::Number(-1.0) ; "below range")]
    #[test_case(PropertyValue::Null ; "null required")]
    fn check_rejects_bad_size(size: PropertyValue) {
        let news = PropertyBag::new().with("size", size);
        let (_, failures) = widget().check(&news);
        assert!(!failures.is_valid());
        assert_eq!(failures.errors()[0].property, "size");
    }

    #[test]
    fn check_accepts_unknown_values() {
        let news = PropertyBag::new().with("size", PropertyValue::Unknown);
        let (_, failures) = widget().check(&news);
        assert!(failures.is_valid());
    }

    #[test]
    fn check_rejects_unknown_properties_but_ignores_reserved() {
        let news = PropertyBag::new()
            .with("size", 1u32)
            .with("colour", "red")
            .with("__defaults", PropertyValue::Null);
        let (_, failures) = widget().check(&news);
        assert_eq!(failures.errors().len(), 1);
        assert_eq!(failures.errors()[0].property, "colour");
    }

    #[test]
    fn complete_outputs_fills_missing() {
        let mut outputs = PropertyBag::new().with("size", 1u32);
        widget().complete_outputs(&mut outputs, &PropertyValue::Null);
        assert_eq!(outputs.get("serial"), Some(&PropertyValue::Null));
        assert_eq!(outputs.get("size"), Some(&PropertyValue::Number(1.0)));
    }
}
