//! Typed accessors over raw configuration tables.
//!
//! Statements arrive as plain key-value tables. These helpers are the one place where a missing
//! key becomes [`MapperError::MissingField`] and a badly typed one [`MapperError::InvalidValue`].

use crate::error::{MapperError, Result};
use toml::Value;

/// The raw key-value table of one statement.
pub type Definition = toml::Table;

/// Numeric value of an integer or float.
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) => Some(*f),
        Value::Integer(i) => Some(*i as f64),
        _ => None,
    }
}

pub fn require<'a>(
    def: &'a Definition,
    key: &str,
    operation: &'static str,
    context: &str,
) -> Result<&'a Value> {
    def.get(key)
        .ok_or_else(|| MapperError::missing(operation, key, context))
}

pub fn require_str<'a>(
    def: &'a Definition,
    key: &str,
    operation: &'static str,
    context: &str,
) -> Result<&'a str> {
    let value = require(def, key, operation, context)?;
    value
        .as_str()
        .ok_or_else(|| MapperError::invalid(operation, key, value))
}

pub fn opt_str<'a>(def: &'a Definition, key: &str, operation: &'static str) -> Result<Option<&'a str>> {
    match def.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_str()
            .map(Some)
            .ok_or_else(|| MapperError::invalid(operation, key, v)),
    }
}

pub fn require_f64(def: &Definition, key: &str, operation: &'static str, context: &str) -> Result<f64> {
    let value = require(def, key, operation, context)?;
    number(value).ok_or_else(|| MapperError::invalid(operation, key, value))
}

pub fn opt_f64(def: &Definition, key: &str, operation: &'static str) -> Result<Option<f64>> {
    match def.get(key) {
        None => Ok(None),
        Some(v) => number(v)
            .map(Some)
            .ok_or_else(|| MapperError::invalid(operation, key, v)),
    }
}

pub fn opt_bool(def: &Definition, key: &str, operation: &'static str) -> Result<Option<bool>> {
    match def.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_bool()
            .map(Some)
            .ok_or_else(|| MapperError::invalid(operation, key, v)),
    }
}

pub fn opt_table<'a>(def: &'a Definition, key: &str, operation: &'static str) -> Result<Option<&'a Definition>> {
    match def.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_table()
            .map(Some)
            .ok_or_else(|| MapperError::invalid(operation, key, v)),
    }
}

/// A list of numbers, e.g. `at = [x0, y0, x1, y1]`.
pub fn numbers(value: &Value, field: &str, operation: &'static str) -> Result<Vec<f64>> {
    let array = value
        .as_array()
        .ok_or_else(|| MapperError::invalid(operation, field, value))?;
    array
        .iter()
        .map(|v| number(v).ok_or_else(|| MapperError::invalid(operation, field, v)))
        .collect()
}

/// A fixed-size list of numbers.
pub fn numbers_n<const N: usize>(value: &Value, field: &str, operation: &'static str) -> Result<[f64; N]> {
    let list = numbers(value, field, operation)?;
    <[f64; N]>::try_from(list.as_slice()).map_err(|_| {
        if list.len() < N {
            MapperError::missing(operation, "(coordinate)", field)
        } else {
            MapperError::invalid(operation, field, value)
        }
    })
}

/// A string or a list of strings, e.g. `symbol = "lib::city"` or `symbol = ["lib::a", ""]`.
pub fn strings(value: &Value, field: &str, operation: &'static str) -> Result<Vec<String>> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| MapperError::invalid(operation, field, v))
            })
            .collect(),
        _ => Err(MapperError::invalid(operation, field, value)),
    }
}
