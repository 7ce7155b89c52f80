//! Query array-format reconciliation.
//!
//! Raw query input may encode an array-typed field three different ways
//! (comma-joined, bracket-suffixed, repeated key). This module validates
//! that only encodings the route supports were used, normalizes the raw
//! input into the shape the schema expects, coerces boolean literals, and
//! delegates the final parse to the schema adapter.

use crate::adapter::Schema;
use crate::translate;
use pylon_core::{ApiError, ArrayFormat, ArrayFormats};
use serde_json::Value;

/// Raw key→value input as assembled by the host framework.
///
/// Values are strings, or arrays of strings when the host collected a
/// repeated bare key.
pub type RawParams = serde_json::Map<String, Value>;

/// Parses raw query input against a schema.
///
/// `raw_query` is the undecoded query string (without the leading `?`),
/// used to detect which encoding was actually present on the wire;
/// `input` is the host-assembled key→value map.
///
/// # Errors
///
/// - `invalid_query_params` when an array field uses an encoding outside
///   `supported`, or is supplied under more than one encoding at once
/// - `invalid_input` when the normalized input fails schema validation
///
/// # Example
///
/// ```
/// use pylon_core::ArrayFormats;
/// use pylon_schema::{parse_query, Schema};
/// use serde_json::json;
///
/// let schema = Schema::compile(json!({
///     "type": "object",
///     "properties": {
///         "ids": { "type": "array", "items": { "type": "string" } }
///     }
/// })).unwrap();
///
/// let mut input = serde_json::Map::new();
/// input.insert("ids".into(), json!("1,2,3"));
///
/// let parsed = parse_query(&schema, "ids=1,2,3", &input, &ArrayFormats::all()).unwrap();
/// assert_eq!(parsed["ids"], json!(["1", "2", "3"]));
/// ```
pub fn parse_query(
    schema: &Schema,
    raw_query: &str,
    input: &RawParams,
    supported: &ArrayFormats,
) -> Result<Value, ApiError> {
    let mut normalized = input.clone();

    // Without a recognizable object shape, parsing degrades to pass-through.
    if let Some(shape) = schema.shape() {
        let raw_pairs: Vec<(String, String)> = url::form_urlencoded::parse(raw_query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        for (name, field) in &shape {
            if field.is_array() {
                validate_encodings(name, &raw_pairs, supported)?;
                normalize_array_field(name, &mut normalized, supported);
            }
            if field.is_boolean() {
                coerce_boolean_field(name, &mut normalized);
            }
        }
    }

    schema
        .parse(&Value::Object(normalized))
        .map_err(|violations| translate::invalid_input(&violations))
}

/// Rejects encodings the route does not support, and ambiguous input.
fn validate_encodings(
    name: &str,
    raw_pairs: &[(String, String)],
    supported: &ArrayFormats,
) -> Result<(), ApiError> {
    let bracket_key = format!("{name}[]");
    let has_brackets = raw_pairs.iter().any(|(k, _)| k == &bracket_key);
    let bare_count = raw_pairs.iter().filter(|(k, _)| k == name).count();

    if has_brackets && !supported.contains(ArrayFormat::Brackets) {
        return Err(ApiError::invalid_query_params(format!(
            "Bracket syntax not supported for query param \"{name}\""
        )));
    }

    if bare_count > 1 && !supported.contains(ArrayFormat::Repeat) {
        return Err(ApiError::invalid_query_params(format!(
            "Repeated parameters not supported for duplicate query param \"{name}\""
        )));
    }

    // The same logical field under two encodings at once has no defined
    // winner; reject instead of silently overwriting.
    if has_brackets && bare_count > 0 {
        return Err(ApiError::invalid_query_params(format!(
            "Ambiguous array encoding for query param \"{name}\""
        )));
    }

    Ok(())
}

/// Reshapes one array-typed field into the array the schema expects.
fn normalize_array_field(name: &str, params: &mut RawParams, supported: &ArrayFormats) {
    let bracket_key = format!("{name}[]");

    if supported.contains(ArrayFormat::Brackets) {
        if let Some(value) = params.remove(&bracket_key) {
            let reshaped = match value {
                Value::String(joined) => split_commas(&joined),
                // A literal array under the bracketed key is used verbatim.
                other => other,
            };
            params.insert(name.to_string(), reshaped);
            return;
        }
    }

    if supported.contains(ArrayFormat::Comma) {
        let joined = match params.get(name) {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        };
        if let Some(joined) = joined {
            params.insert(name.to_string(), split_commas(&joined));
        }
    }

    // Repeated bare keys were collected into an array by the host already;
    // `Repeat` support only gates the validation pass.
}

/// Coerces the literal strings `"true"`/`"false"`; anything else is left
/// for schema parsing to reject.
fn coerce_boolean_field(name: &str, params: &mut RawParams) {
    let coerced = match params.get(name) {
        Some(Value::String(s)) if s == "true" => Some(true),
        Some(Value::String(s)) if s == "false" => Some(false),
        _ => None,
    };
    if let Some(flag) = coerced {
        params.insert(name.to_string(), Value::Bool(flag));
    }
}

fn split_commas(joined: &str) -> Value {
    Value::Array(
        joined
            .split(',')
            .map(|part| Value::String(part.to_string()))
            .collect(),
    )
}
