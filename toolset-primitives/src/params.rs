//! Helpers for reading typed values out of a call's argument object.
//!
//! Arguments arrive as a JSON object. A `null` argument value is treated the
//! same as an absent one.

use serde_json::{Map, Value};

use crate::{Error, Result};

fn lookup<'a>(args: &'a Value, name: &str) -> Option<&'a Value> {
    args.as_object()
        .and_then(|map: &Map<String, Value>| map.get(name))
        .filter(|value| !value.is_null())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn wrong_type(name: &str, expected: &str, value: &Value) -> Error {
    Error::invalid_parameter(
        name,
        format!("is not of type {expected}, is {}", type_name(value)),
    )
}

fn as_integer(name: &str, value: &Value) -> Result<i64> {
    if let Some(int) = value.as_i64() {
        return Ok(int);
    }
    match value.as_f64() {
        #[allow(clippy::cast_possible_truncation)]
        Some(float) if float.fract() == 0.0 && float.abs() < 9.0e15 => Ok(float as i64),
        Some(_) => Err(Error::invalid_parameter(name, "is not an integer")),
        None => Err(wrong_type(name, "number", value)),
    }
}

/// Reads a required, non-empty string.
///
/// # Errors
///
/// Returns [`Error::MissingParameter`] when absent or empty and
/// [`Error::InvalidParameter`] when the value is not a string.
pub fn required_string(args: &Value, name: &str) -> Result<String> {
    let value = lookup(args, name).ok_or_else(|| Error::missing_parameter(name))?;
    let text = value.as_str().ok_or_else(|| wrong_type(name, "string", value))?;
    if text.is_empty() {
        return Err(Error::missing_parameter(name));
    }
    Ok(text.to_owned())
}

/// Reads a required integer. Integral floats such as `42.0` are accepted.
///
/// # Errors
///
/// Returns [`Error::MissingParameter`] when absent and
/// [`Error::InvalidParameter`] when the value is not an integer.
pub fn required_int(args: &Value, name: &str) -> Result<i64> {
    let value = lookup(args, name).ok_or_else(|| Error::missing_parameter(name))?;
    as_integer(name, value)
}

/// Reads an optional string.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] when present but not a string.
pub fn optional_string(args: &Value, name: &str) -> Result<Option<String>> {
    lookup(args, name)
        .map(|value| {
            value
                .as_str()
                .map(str::to_owned)
                .ok_or_else(|| wrong_type(name, "string", value))
        })
        .transpose()
}

/// Reads an optional integer.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] when present but not an integer.
pub fn optional_int(args: &Value, name: &str) -> Result<Option<i64>> {
    lookup(args, name)
        .map(|value| as_integer(name, value))
        .transpose()
}

/// Reads an optional integer, falling back to `default` when absent.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] when present but not an integer.
pub fn optional_int_or(args: &Value, name: &str, default: i64) -> Result<i64> {
    Ok(optional_int(args, name)?.unwrap_or(default))
}

/// Reads an optional boolean, falling back to `default` when absent.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] when present but not a boolean.
pub fn optional_bool_or(args: &Value, name: &str, default: bool) -> Result<bool> {
    match lookup(args, name) {
        None => Ok(default),
        Some(value) => value
            .as_bool()
            .ok_or_else(|| wrong_type(name, "boolean", value)),
    }
}

/// Reads an optional array of strings; absent yields an empty vector.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] when the value is not an array or an
/// element is not a string.
pub fn optional_string_array(args: &Value, name: &str) -> Result<Vec<String>> {
    let Some(value) = lookup(args, name) else {
        return Ok(Vec::new());
    };
    let items = value
        .as_array()
        .ok_or_else(|| wrong_type(name, "array", value))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_owned)
                .ok_or_else(|| wrong_type(name, "string", item))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_string_distinguishes_missing_and_wrong_type() {
        let args = json!({ "owner": "octo", "repo": 7, "empty": "" });
        assert_eq!(required_string(&args, "owner").unwrap(), "octo");

        let err = required_string(&args, "repo").expect_err("wrong type");
        assert_eq!(err.to_string(), "parameter repo is not of type string, is number");

        let err = required_string(&args, "empty").expect_err("empty");
        assert!(matches!(err, Error::MissingParameter { name } if name == "empty"));

        let err = required_string(&args, "absent").expect_err("absent");
        assert!(matches!(err, Error::MissingParameter { .. }));
    }

    #[test]
    fn integers_accept_integral_floats_only() {
        let args = json!({ "a": 3, "b": 4.0, "c": 4.5, "d": "5" });
        assert_eq!(required_int(&args, "a").unwrap(), 3);
        assert_eq!(required_int(&args, "b").unwrap(), 4);
        assert!(required_int(&args, "c").is_err());
        assert!(required_int(&args, "d").is_err());
        assert_eq!(optional_int_or(&args, "missing", 30).unwrap(), 30);
    }

    #[test]
    fn null_counts_as_absent() {
        let args = json!({ "state": null });
        assert_eq!(optional_string(&args, "state").unwrap(), None);
        assert!(optional_bool_or(&args, "state", true).unwrap());
    }

    #[test]
    fn string_arrays_are_checked_elementwise() {
        let args = json!({ "labels": ["bug", "p1"], "bad": ["ok", 1], "scalar": "bug" });
        assert_eq!(
            optional_string_array(&args, "labels").unwrap(),
            vec!["bug".to_owned(), "p1".to_owned()]
        );
        assert!(optional_string_array(&args, "bad").is_err());
        assert!(optional_string_array(&args, "scalar").is_err());
        assert!(optional_string_array(&args, "missing").unwrap().is_empty());
    }
}
