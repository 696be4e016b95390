//! State diff engine.
//!
//! Classifies the change from last-known to desired inputs. Replacement
//! dominates in-place update, which dominates no change. Values unknown at
//! plan time count as changed against any known value.

use serde::Serialize;
use tc_proto::{PropertyBag, PropertyValue};

use crate::schema::ResourceSchema;

/// Classification of a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    /// Nothing changed.
    #[serde(rename = "none")]
    NoChange,
    /// Changes can be applied to the live resource.
    Update,
    /// The resource must be replaced.
    Replace,
}

/// Outcome of comparing two property bags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    /// Overall classification.
    pub changes: DiffKind,
    /// Every property that differs.
    pub diffs: Vec<String>,
    /// The differing properties that force replacement.
    pub replaces: Vec<String>,
    /// Replacements always create the new resource before deleting the old.
    pub delete_before_replace: bool,
}

impl DiffResult {
    /// A diff with no changes.
    #[must_use]
    pub const fn no_change() -> Self {
        Self {
            changes: DiffKind::NoChange,
            diffs: Vec::new(),
            replaces: Vec::new(),
            delete_before_replace: false,
        }
    }

    /// Returns true if anything differs.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.changes != DiffKind::NoChange
    }
}

/// Returns true if two values should be treated as different.
///
/// An unknown value differs from every known value. Two unknowns are
/// treated as equal: neither side carries information the other lacks.
#[must_use]
pub fn differs(old: Option<&PropertyValue>, new: Option<&PropertyValue>) -> bool {
    match (old, new) {
        (Some(PropertyValue::Unknown), Some(PropertyValue::Unknown)) => false,
        (Some(PropertyValue::Unknown), _) | (_, Some(PropertyValue::Unknown)) => true,
        (old, new) => old != new,
    }
}

/// Compares `olds` against `news` under `schema`.
#[must_use]
pub fn diff(olds: &PropertyBag, news: &PropertyBag, schema: &ResourceSchema) -> DiffResult {
    let mut result = DiffResult::no_change();

    for name in olds.union_keys(news) {
        if !differs(olds.get(name), news.get(name)) {
            continue;
        }
        result.diffs.push(name.to_string());
        if schema.forces_replace(name) {
            result.replaces.push(name.to_string());
        }
    }

    result.changes = if !result.replaces.is_empty() {
        DiffKind::Replace
    } else if !result.diffs.is_empty() {
        DiffKind::Update
    } else {
        DiffKind::NoChange
    };

    result
}
