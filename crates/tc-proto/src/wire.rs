//! JSON wire encoding for property values.
//!
//! Plain values map to JSON scalars. Secrets use the orchestrator's
//! signature envelope and unknowns use its sentinel string:
//!
//! ```json
//! {"4dabf18193072939515e22adb298388d": "1b47061264138c4ac30d75fd1eb44270", "value": "..."}
//! "04da6b54-80e4-46f7-96ec-b56ff0331ba9"
//! ```

use serde_json::{Map, Number, Value};

use crate::error::ProtoError;
use crate::value::{PropertyBag, PropertyValue, SecretString};

/// Key marking a special (signed) object.
pub const SIG_KEY: &str = "4dabf18193072939515e22adb298388d";

/// Signature value identifying a secret envelope.
pub const SECRET_SIG: &str = "1b47061264138c4ac30d75fd1eb44270";

/// Sentinel string for values unknown at plan time.
pub const UNKNOWN_SENTINEL: &str = "04da6b54-80e4-46f7-96ec-b56ff0331ba9";

/// Encodes a single value.
#[must_use]
pub fn encode_value(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Null => Value::Null,
        PropertyValue::Bool(b) => Value::Bool(*b),
        PropertyValue::Number(n) => encode_number(*n),
        PropertyValue::String(s) => Value::String(s.clone()),
        PropertyValue::Secret(s) => {
            let mut envelope = Map::new();
            envelope.insert(SIG_KEY.to_string(), Value::String(SECRET_SIG.to_string()));
            envelope.insert("value".to_string(), Value::String(s.expose().to_string()));
            Value::Object(envelope)
        }
        PropertyValue::Unknown => Value::String(UNKNOWN_SENTINEL.to_string()),
    }
}

// Whole numbers go out as JSON integers so `24` does not become `24.0`.
fn encode_number(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Value::Number(Number::from(n as i64))
    } else {
        Value::from(n)
    }
}

/// Decodes a single value belonging to `property`.
///
/// # Errors
///
/// Returns [`ProtoError::Decoding`] for arrays, plain objects and malformed
/// secret envelopes.
pub fn decode_value(property: &str, raw: &Value) -> Result<PropertyValue, ProtoError> {
    let decoding = |reason: &str| ProtoError::Decoding {
        property: property.to_string(),
        reason: reason.to_string(),
    };

    match raw {
        Value::Null => Ok(PropertyValue::Null),
        Value::Bool(b) => Ok(PropertyValue::Bool(*b)),
        Value::Number(n) => n
            .as_f64()
            .map(PropertyValue::Number)
            .ok_or_else(|| decoding("number is not representable as a double")),
        Value::String(s) if s == UNKNOWN_SENTINEL => Ok(PropertyValue::Unknown),
        Value::String(s) => Ok(PropertyValue::String(s.clone())),
        Value::Object(map) => match map.get(SIG_KEY) {
            Some(Value::String(sig)) if sig == SECRET_SIG => match map.get("value") {
                Some(Value::String(s)) if s == UNKNOWN_SENTINEL => Ok(PropertyValue::Unknown),
                Some(Value::String(s)) => Ok(PropertyValue::Secret(SecretString::new(s.clone()))),
                Some(_) => Err(decoding("only string secrets are supported")),
                None => Err(decoding("secret envelope has no value")),
            },
            Some(_) => Err(decoding("unsupported signed value")),
            None => Err(decoding("nested objects are not supported")),
        },
        Value::Array(_) => Err(decoding("arrays are not supported")),
    }
}

/// Encodes a bag as a JSON object.
#[must_use]
pub fn encode_bag(bag: &PropertyBag) -> Value {
    Value::Object(
        bag.iter()
            .map(|(name, value)| (name.clone(), encode_value(value)))
            .collect(),
    )
}

/// Decodes a bag. `null` decodes to an empty bag.
///
/// # Errors
///
/// Returns an error if `raw` is neither an object nor null, or if any
/// property fails to decode.
pub fn decode_bag(raw: &Value) -> Result<PropertyBag, ProtoError> {
    match raw {
        Value::Null => Ok(PropertyBag::new()),
        Value::Object(map) => map
            .iter()
            .map(|(name, value)| Ok((name.clone(), decode_value(name, value)?)))
            .collect(),
        other => Err(ProtoError::Decoding {
            property: "<bag>".to_string(),
            reason: format!("expected an object, got {}", json_type(other)),
        }),
    }
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
