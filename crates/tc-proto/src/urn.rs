//! Resource identities: orchestrator URNs and backend ids.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProtoError;

const URN_PREFIX: &str = "urn:pulumi:";

/// Unique resource name assigned by the orchestrator.
///
/// Shape: `urn:pulumi:<stack>::<project>::<qualified type>::<name>`, where the
/// qualified type may carry parent types joined with `$`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Urn(String);

impl Urn {
    /// Parses and validates a URN.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::InvalidUrn`] if the string does not have four
    /// non-empty `::`-separated parts after the prefix.
    pub fn parse(urn: impl Into<String>) -> Result<Self, ProtoError> {
        let urn = urn.into();
        let invalid = |reason: &str| ProtoError::InvalidUrn {
            urn: urn.clone(),
            reason: reason.to_string(),
        };

        let rest = urn
            .strip_prefix(URN_PREFIX)
            .ok_or_else(|| invalid("must start with 'urn:pulumi:'"))?;
        let parts: Vec<&str> = rest.splitn(4, "::").collect();
        if parts.len() != 4 {
            return Err(invalid("expected <stack>::<project>::<type>::<name>"));
        }
        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid("stack, project, type and name must be non-empty"));
        }
        Ok(Self(urn))
    }

    /// Builds a URN from its parts.
    ///
    /// # Errors
    ///
    /// Returns an error if any part is empty.
    pub fn new(
        stack: &str,
        project: &str,
        type_token: &str,
        name: &str,
    ) -> Result<Self, ProtoError> {
        Self::parse(format!("{URN_PREFIX}{stack}::{project}::{type_token}::{name}"))
    }

    fn part(&self, index: usize) -> &str {
        self.0[URN_PREFIX.len()..]
            .splitn(4, "::")
            .nth(index)
            .unwrap_or_default()
    }

    /// Stack the resource belongs to.
    #[must_use]
    pub fn stack(&self) -> &str {
        self.part(0)
    }

    /// Project the resource belongs to.
    #[must_use]
    pub fn project(&self) -> &str {
        self.part(1)
    }

    /// Full `$`-joined type chain.
    #[must_use]
    pub fn qualified_type(&self) -> &str {
        self.part(2)
    }

    /// The resource's own type token (last segment of the qualified type).
    #[must_use]
    pub fn type_token(&self) -> &str {
        let qualified = self.qualified_type();
        qualified.rsplit('$').next().unwrap_or(qualified)
    }

    /// Logical name of the resource.
    #[must_use]
    pub fn name(&self) -> &str {
        self.part(3)
    }

    /// Returns the URN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Urn {
    type Error = ProtoError;

    fn try_from(value: String) -> Result<Self, ProtoError> {
        Self::parse(value)
    }
}

impl From<Urn> for String {
    fn from(urn: Urn) -> Self {
        urn.0
    }
}

/// Backend-assigned resource id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId(String);

impl ResourceId {
    /// Wraps an existing id.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or contains a path separator.
    pub fn new(id: impl Into<String>) -> Result<Self, ProtoError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ProtoError::InvalidResourceId("id cannot be empty".to_string()));
        }
        if id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(ProtoError::InvalidResourceId(format!(
                "id '{id}' must not contain path components"
            )));
        }
        Ok(Self(id))
    }

    /// Generates a fresh id from a logical name plus a random suffix, so a
    /// replacement created before its predecessor is deleted does not collide.
    #[must_use]
    pub fn generate(name: &str) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        let base: String = name
            .chars()
            .map(|c| if c == '/' || c == '\\' { '-' } else { c })
            .collect();
        Self(format!("{base}-{}", &suffix[..8]))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ResourceId {
    type Error = ProtoError;

    fn try_from(value: String) -> Result<Self, ProtoError> {
        Self::new(value)
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}
