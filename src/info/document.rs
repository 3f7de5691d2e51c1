//! Lenient view over a JSON object.
//!
//! The server is inconsistent about scalar types: ids arrive as numbers or
//! strings, flags as `true`, `"1"` or `1`, empty maps as `[]`. [`Document`]
//! reads one key at a time and coerces the value into the requested type:
//!
//! | Target | Accepted |
//! |--------|----------|
//! | string | string, number, bool (`"1"` / `"0"`) |
//! | int | number (truncated), numeric string, `""` (0), bool (1 / 0) |
//! | float | number, numeric string, `""` (0.0), bool (1.0 / 0.0) |
//! | bool | bool, number (non-zero), `"1"`/`"t"`/`"true"`, `"0"`/`"f"`/`"false"`, `""` |
//! | list | array, a single scalar (one element), `{}` |
//! | map | object, `[]` |
//!
//! Missing keys and `null` decode to the type's default. Anything else is a
//! [`Error::Decode`] naming the dotted field path. Every key read is recorded
//! so that [`Document::remaining`] can hand back the keys no record mapped.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Lenient accessor for one JSON object.
#[derive(Debug)]
pub struct Document<'a> {
    map: &'a Map<String, Value>,
    path: String,
    seen: RefCell<HashSet<String>>,
}

impl<'a> Document<'a> {
    /// Wrap an object; `path` prefixes field names in decode errors.
    #[must_use]
    pub fn new(map: &'a Map<String, Value>, path: impl Into<String>) -> Self {
        Self {
            map,
            path: path.into(),
            seen: RefCell::new(HashSet::new()),
        }
    }

    /// Dotted path of a key in this document.
    #[must_use]
    pub fn field_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    /// Raw value for a key, `None` when missing or null. Marks the key read.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.seen.borrow_mut().insert(key.to_string());
        match self.map.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    pub fn string(&self, key: &str) -> Result<String> {
        self.get(key)
            .map_or(Ok(String::new()), |v| coerce_string(v, &self.field_path(key)))
    }

    pub fn int(&self, key: &str) -> Result<i64> {
        self.get(key)
            .map_or(Ok(0), |v| coerce_int(v, &self.field_path(key)))
    }

    pub fn float(&self, key: &str) -> Result<f64> {
        self.get(key)
            .map_or(Ok(0.0), |v| coerce_float(v, &self.field_path(key)))
    }

    pub fn bool(&self, key: &str) -> Result<bool> {
        self.get(key)
            .map_or(Ok(false), |v| coerce_bool(v, &self.field_path(key)))
    }

    /// List of strings; a lone scalar becomes a one-element list.
    pub fn string_list(&self, key: &str) -> Result<Vec<String>> {
        let path = self.field_path(key);
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter(|(_, v)| !v.is_null())
                .map(|(i, v)| coerce_string(v, &format!("{path}[{i}]")))
                .collect(),
            Some(Value::Object(map)) if map.is_empty() => Ok(Vec::new()),
            Some(value @ (Value::String(_) | Value::Number(_) | Value::Bool(_))) => {
                Ok(vec![coerce_string(value, &path)?])
            }
            Some(other) => Err(mismatch(&path, "a list", other)),
        }
    }

    /// Map of string values.
    pub fn string_map(&self, key: &str) -> Result<BTreeMap<String, String>> {
        let path = self.field_path(key);
        match self.get(key) {
            None => Ok(BTreeMap::new()),
            Some(value) => coerce_string_map(value, &path),
        }
    }

    /// Nested object, `None` when missing, null or an empty array.
    pub fn object(&self, key: &str) -> Result<Option<Document<'a>>> {
        let path = self.field_path(key);
        match self.get(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(Document::new(map, path))),
            Some(Value::Array(items)) if items.is_empty() => Ok(None),
            Some(other) => Err(mismatch(&path, "an object", other)),
        }
    }

    /// Object whose values are all objects, keyed as in the payload.
    pub fn object_map(&self, key: &str) -> Result<Vec<(String, Document<'a>)>> {
        let path = self.field_path(key);
        let Some(nested) = self.object(key)? else {
            return Ok(Vec::new());
        };
        let map: &'a Map<String, Value> = nested.map;
        map.iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(name, value)| {
                let child_path = format!("{path}.{name}");
                match value {
                    Value::Object(map) => Ok((name.clone(), Document::new(map, child_path))),
                    Value::Array(items) if items.is_empty() => {
                        Ok((name.clone(), Document::new(empty_map(), child_path)))
                    }
                    other => Err(mismatch(&child_path, "an object", other)),
                }
            })
            .collect()
    }

    /// List of objects; a lone object becomes a one-element list.
    pub fn object_list(&self, key: &str) -> Result<Vec<Document<'a>>> {
        let path = self.field_path(key);
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter(|(_, v)| !v.is_null())
                .map(|(i, v)| {
                    let item_path = format!("{path}[{i}]");
                    match v {
                        Value::Object(map) => Ok(Document::new(map, item_path)),
                        other => Err(mismatch(&item_path, "an object", other)),
                    }
                })
                .collect(),
            Some(Value::Object(map)) if map.is_empty() => Ok(Vec::new()),
            Some(Value::Object(map)) => Ok(vec![Document::new(map, path)]),
            Some(other) => Err(mismatch(&path, "a list of objects", other)),
        }
    }

    /// Keys not read so far, with their raw values.
    #[must_use]
    pub fn remaining(&self) -> Map<String, Value> {
        let seen = self.seen.borrow();
        self.map
            .iter()
            .filter(|(k, _)| !seen.contains(k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

fn empty_map() -> &'static Map<String, Value> {
    static EMPTY: std::sync::OnceLock<Map<String, Value>> = std::sync::OnceLock::new();
    EMPTY.get_or_init(Map::new)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(path: &str, expected: &str, found: &Value) -> Error {
    Error::decode(path, format!("expected {expected}, found {}", kind(found)))
}

/// Coerce a scalar into a string.
pub fn coerce_string(value: &Value, path: &str) -> Result<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(if *b { "1" } else { "0" }.to_string()),
        Value::Number(n) => Ok(match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.as_f64().map(|f| f.to_string()).unwrap_or_else(|| n.to_string()),
        }),
        other => Err(mismatch(path, "a string", other)),
    }
}

/// Coerce a scalar into an integer.
pub fn coerce_int(value: &Value, path: &str) -> Result<i64> {
    match value {
        Value::Null => Ok(0),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| Error::decode(path, format!("number {n} out of range"))),
        Value::String(s) if s.trim().is_empty() => Ok(0),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| Error::decode(path, format!("cannot parse '{s}' as integer: {e}"))),
        other => Err(mismatch(path, "an integer", other)),
    }
}

/// Coerce a scalar into a float.
pub fn coerce_float(value: &Value, path: &str) -> Result<f64> {
    match value {
        Value::Null => Ok(0.0),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::decode(path, format!("number {n} out of range"))),
        Value::String(s) if s.trim().is_empty() => Ok(0.0),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| Error::decode(path, format!("cannot parse '{s}' as float: {e}"))),
        other => Err(mismatch(path, "a float", other)),
    }
}

/// Coerce a scalar into a bool.
pub fn coerce_bool(value: &Value, path: &str) -> Result<bool> {
    match value {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => match s.trim() {
            "" => Ok(false),
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            other => Err(Error::decode(path, format!("cannot parse '{other}' as bool"))),
        },
        other => Err(mismatch(path, "a bool", other)),
    }
}

/// Coerce an object of scalars into a string map.
pub fn coerce_string_map(value: &Value, path: &str) -> Result<BTreeMap<String, String>> {
    match value {
        Value::Null => Ok(BTreeMap::new()),
        Value::Array(items) if items.is_empty() => Ok(BTreeMap::new()),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| Ok((k.clone(), coerce_string(v, &format!("{path}.{k}"))?)))
            .collect(),
        other => Err(mismatch(path, "a map", other)),
    }
}
