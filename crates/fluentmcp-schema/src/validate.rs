//! Argument validation and lenient coercion against a schema descriptor.

use serde_json::{Map, Number, Value};

use crate::descriptor::SchemaDescriptor;
use crate::types::{json_type_name, ParamType, SchemaError, SchemaResult};

/// Validate tool-call arguments against a schema.
///
/// Absent arguments are treated as an empty object. Every required
/// parameter must be present; undeclared fields are passed through and
/// type mismatches are not errors. Numeric-looking strings are converted
/// when the parameter is declared as a number or integer.
pub fn validate_arguments(
    schema: &SchemaDescriptor,
    arguments: Option<Value>,
) -> SchemaResult<Map<String, Value>> {
    let mut args = match arguments {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(other) => return Err(SchemaError::NotAnObject(json_type_name(&other))),
    };

    let missing: Vec<String> = schema
        .required_names()
        .filter(|name| !args.contains_key(*name))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(SchemaError::MissingRequired(missing));
    }

    for param in schema.params() {
        if let Some(value) = args.get_mut(&param.name) {
            if param.param_type.matches(value) {
                continue;
            }
            if let Some(coerced) = coerce_value(param.param_type, value) {
                tracing::debug!(
                    "Coerced argument '{}' from {} to {}",
                    param.name,
                    json_type_name(value),
                    param.param_type
                );
                *value = coerced;
            }
        }
    }

    Ok(args)
}

/// Convert a numeric-looking string to a JSON number for number/integer
/// parameters. Returns `None` when no conversion applies.
pub fn coerce_value(param_type: ParamType, value: &Value) -> Option<Value> {
    let text = value.as_str()?.trim();
    if text.is_empty() {
        return None;
    }

    match param_type {
        ParamType::Integer => {
            if let Ok(n) = text.parse::<i64>() {
                return Some(Value::Number(n.into()));
            }
            let f = text.parse::<f64>().ok()?;
            if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                Some(Value::Number((f as i64).into()))
            } else {
                None
            }
        }
        ParamType::Number => {
            if let Ok(n) = text.parse::<i64>() {
                return Some(Value::Number(n.into()));
            }
            let f = text.parse::<f64>().ok()?;
            Number::from_f64(f).map(Value::Number)
        }
        _ => None,
    }
}
