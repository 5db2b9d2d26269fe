//! Helpers for normalising step configs into typed operator structs.
//!
//! Several operators accept more than one shape (a bare string or a settings
//! object, one path or a list of paths). These helpers fold those shapes into
//! one representation at build time and name the offending key on failure.

use serde_json::{Map, Value};

use recast_core::types::kind_name;

use crate::traits::OpError;

pub type Args = Map<String, Value>;

/// The config as a settings object.
pub fn object<'a>(value: &'a Value, what: &str) -> Result<&'a Args, OpError> {
    value
        .as_object()
        .ok_or_else(|| OpError::Config(format!("{what} must be a mapping, got {}", kind_name(value))))
}

/// First present key among `names` (aliases), treating `null` as missing.
pub fn get<'a>(args: &'a Args, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|n| args.get(*n))
        .find(|v| !v.is_null())
}

pub fn string(value: &Value, what: &str) -> Result<String, OpError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| OpError::Config(format!("{what} must be a string, got {}", kind_name(value))))
}

pub fn required_str(args: &Args, names: &[&str]) -> Result<String, OpError> {
    match get(args, names) {
        Some(v) => string(v, names[0]),
        None => Err(OpError::Config(format!("missing required '{}'", names[0]))),
    }
}

pub fn optional_str(args: &Args, names: &[&str]) -> Result<Option<String>, OpError> {
    get(args, names).map(|v| string(v, names[0])).transpose()
}

/// One string or a list of strings; never empty.
pub fn string_list(value: &Value, what: &str) -> Result<Vec<String>, OpError> {
    let list = match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .map(|v| string(v, what))
            .collect::<Result<Vec<_>, _>>()?,
        other => {
            return Err(OpError::Config(format!(
                "{what} must be a string or a list of strings, got {}",
                kind_name(other)
            )))
        }
    };
    if list.is_empty() {
        return Err(OpError::Config(format!("{what} must name at least one field")));
    }
    Ok(list)
}

pub fn required_list(args: &Args, names: &[&str]) -> Result<Vec<String>, OpError> {
    match get(args, names) {
        Some(v) => string_list(v, names[0]),
        None => Err(OpError::Config(format!("missing required '{}'", names[0]))),
    }
}

/// Non-negative integer (integral floats are accepted).
pub fn count(value: &Value, what: &str) -> Result<usize, OpError> {
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).map_err(|_| OpError::Config(format!("{what} is too large")));
    }
    match value.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= usize::MAX as f64 => Ok(f as usize),
        _ => Err(OpError::Config(format!(
            "{what} must be a non-negative integer, got {value}"
        ))),
    }
}

pub fn optional_count(args: &Args, names: &[&str]) -> Result<Option<usize>, OpError> {
    get(args, names).map(|v| count(v, names[0])).transpose()
}

/// Signed integer (integral floats are accepted).
pub fn integer(value: &Value, what: &str) -> Result<i64, OpError> {
    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        _ => Err(OpError::Config(format!("{what} must be an integer, got {value}"))),
    }
}

pub fn optional_bool(args: &Args, names: &[&str]) -> Result<Option<bool>, OpError> {
    match get(args, names) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(OpError::Config(format!(
            "'{}' must be a boolean, got {}",
            names[0],
            kind_name(other)
        ))),
    }
}

/// First character of an optional single-character setting.
pub fn optional_char(args: &Args, names: &[&str], default: char) -> Result<char, OpError> {
    match optional_str(args, names)? {
        None => Ok(default),
        Some(s) => s
            .chars()
            .next()
            .ok_or_else(|| OpError::Config(format!("'{}' must not be empty", names[0]))),
    }
}
