//! Accessors and validation for the restricted dictionary shape.
//!
//! Encoded aggregates are `serde_json::Value` trees whose leaves are only
//! text, 64-bit integers, 64-bit floats, homogeneous numeric arrays, or
//! nested maps of the same shape. The helpers here centralize the shape
//! checking so every `from_dict` implementation reports malformed input the
//! same way.

use serde_json::{Map, Value};

use crate::errors::{ChronostatError, Result};
use crate::SCHEMA_VERSION;

/// Looks up a required key in a dictionary object.
pub fn get<'a>(d: &'a Value, key: &str) -> Result<&'a Value> {
    d.as_object()
        .ok_or_else(|| ChronostatError::serialization("expected a dictionary object"))?
        .get(key)
        .ok_or_else(|| ChronostatError::serialization(format!("missing key `{key}`")))
}

/// Reads a required text leaf.
pub fn get_str<'a>(d: &'a Value, key: &str) -> Result<&'a str> {
    get(d, key)?
        .as_str()
        .ok_or_else(|| ChronostatError::serialization(format!("key `{key}` is not text")))
}

/// Reads a required 64-bit integer leaf.
pub fn get_i64(d: &Value, key: &str) -> Result<i64> {
    get(d, key)?
        .as_i64()
        .ok_or_else(|| ChronostatError::serialization(format!("key `{key}` is not an integer")))
}

/// Reads a required homogeneous float array leaf.
pub fn get_f64_array(d: &Value, key: &str) -> Result<Vec<f64>> {
    let arr = get(d, key)?
        .as_array()
        .ok_or_else(|| ChronostatError::serialization(format!("key `{key}` is not an array")))?;
    arr.iter()
        .map(|v| {
            v.as_f64().ok_or_else(|| {
                ChronostatError::serialization(format!("key `{key}` is not a numeric array"))
            })
        })
        .collect()
}

/// Reads a required homogeneous integer array leaf.
pub fn get_i64_array(d: &Value, key: &str) -> Result<Vec<i64>> {
    let arr = get(d, key)?
        .as_array()
        .ok_or_else(|| ChronostatError::serialization(format!("key `{key}` is not an array")))?;
    arr.iter()
        .map(|v| {
            v.as_i64().ok_or_else(|| {
                ChronostatError::serialization(format!("key `{key}` is not an integer array"))
            })
        })
        .collect()
}

/// Reads a required nested dictionary.
pub fn get_object<'a>(d: &'a Value, key: &str) -> Result<&'a Value> {
    let v = get(d, key)?;
    if v.is_object() {
        Ok(v)
    } else {
        Err(ChronostatError::serialization(format!(
            "key `{key}` is not a nested dictionary"
        )))
    }
}

/// Reads the `class` tag of an encoded value.
pub fn class_tag(d: &Value) -> Result<&str> {
    get_str(d, "class")
}

/// Verifies that an encoded value carries the expected `class` tag.
pub fn expect_class_tag(d: &Value, expected: &str) -> Result<()> {
    let tag = class_tag(d)?;
    if tag == expected {
        Ok(())
    } else {
        Err(ChronostatError::serialization(format!(
            "expected class tag `{expected}`, found `{tag}`"
        )))
    }
}

/// Reads the `version` entry and rejects values from other schema versions.
pub fn expect_current_version(d: &Value) -> Result<String> {
    let version = get_str(d, "version")?;
    if version == SCHEMA_VERSION {
        Ok(version.to_string())
    } else {
        Err(ChronostatError::version_mismatch(SCHEMA_VERSION, version))
    }
}

/// Builds an integer-array leaf from a slice.
pub fn i64_array(values: &[i64]) -> Value {
    Value::Array(values.iter().map(|&v| Value::from(v)).collect())
}

/// Validates that a tree conforms to the restricted dictionary shape.
///
/// Used by the persistence collaborator before writing, so a malformed tree
/// fails loudly instead of producing a file that cannot be read back.
pub fn validate_tree(value: &Value) -> Result<()> {
    match value {
        Value::Object(map) => validate_object(map),
        _ => Err(ChronostatError::serialization(
            "top-level encoded value must be a dictionary",
        )),
    }
}

fn validate_object(map: &Map<String, Value>) -> Result<()> {
    for (key, item) in map {
        match item {
            Value::String(_) | Value::Number(_) => {}
            Value::Array(arr) => validate_array(key, arr)?,
            Value::Object(nested) => validate_object(nested)?,
            Value::Bool(_) | Value::Null => {
                return Err(ChronostatError::serialization(format!(
                    "key `{key}` holds a leaf kind outside the dictionary shape"
                )));
            }
        }
    }
    Ok(())
}

fn validate_array(key: &str, arr: &[Value]) -> Result<()> {
    let all_ints = arr.iter().all(|v| v.as_i64().is_some());
    let all_floats = arr.iter().all(|v| v.as_f64().is_some());
    if all_ints || all_floats {
        Ok(())
    } else {
        Err(ChronostatError::serialization(format!(
            "key `{key}` is not a homogeneous numeric array"
        )))
    }
}
