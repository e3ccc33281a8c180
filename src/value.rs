//! Dynamic value model.
//!
//! [`Value`] is the tagged union a decoded message is made of, and the input
//! the encoder accepts: strings, 64-bit integers, 64-bit floats, booleans,
//! and nested maps/lists of the same. The set is closed; anything else must
//! be converted (or rejected) at a construction boundary such as the JSON
//! bridge below.
//!
//! # Example
//!
//! ```
//! use wiremap::Value;
//!
//! let v = Value::from(42i64);
//! assert_eq!(v.as_i64().unwrap(), 42);
//! assert!(v.as_str().is_err()); // TypeMismatch
//! ```

use std::collections::HashMap;

use crate::error::{Result, WiremapError};

/// The variant tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// UTF-8 string, at most 65 535 bytes on the wire.
    String,
    /// Signed 64-bit integer.
    Int64,
    /// IEEE-754 binary64 float.
    Float64,
    /// Boolean.
    Bool,
    /// String-keyed map of values.
    Map,
    /// Ordered list of values.
    List,
}

impl ValueKind {
    /// Lowercase name, used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Int64 => "int64",
            ValueKind::Float64 => "float64",
            ValueKind::Bool => "bool",
            ValueKind::Map => "map",
            ValueKind::List => "list",
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A node in a dynamically-typed key/value tree.
///
/// A `Map` or `List` exclusively owns its children; equality is structural,
/// including nesting. Map iteration order is not significant.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// UTF-8 string.
    Str(String),
    /// Signed 64-bit integer.
    Int64(i64),
    /// IEEE-754 binary64 float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// Nested map with string keys.
    Map(HashMap<String, Value>),
    /// Nested ordered list.
    List(Vec<Value>),
}

impl Value {
    /// Get the variant tag of this value.
    pub const fn kind(&self) -> ValueKind {
        match self {
            Value::Str(_) => ValueKind::String,
            Value::Int64(_) => ValueKind::Int64,
            Value::Float64(_) => ValueKind::Float64,
            Value::Bool(_) => ValueKind::Bool,
            Value::Map(_) => ValueKind::Map,
            Value::List(_) => ValueKind::List,
        }
    }

    fn mismatch(&self, expected: ValueKind) -> WiremapError {
        WiremapError::TypeMismatch {
            expected: expected.name(),
            actual: self.kind().name(),
        }
    }

    /// View this value as a string slice.
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(other.mismatch(ValueKind::String)),
        }
    }

    /// View this value as an `i64`.
    pub fn as_i64(&self) -> Result<i64> {
        match self {
            Value::Int64(i) => Ok(*i),
            other => Err(other.mismatch(ValueKind::Int64)),
        }
    }

    /// View this value as an `f64`.
    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Value::Float64(f) => Ok(*f),
            other => Err(other.mismatch(ValueKind::Float64)),
        }
    }

    /// View this value as a `bool`.
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(other.mismatch(ValueKind::Bool)),
        }
    }

    /// View this value as a nested map.
    pub fn as_map(&self) -> Result<&HashMap<String, Value>> {
        match self {
            Value::Map(m) => Ok(m),
            other => Err(other.mismatch(ValueKind::Map)),
        }
    }

    /// View this value as a nested list.
    pub fn as_list(&self) -> Result<&[Value]> {
        match self {
            Value::List(l) => Ok(l),
            other => Err(other.mismatch(ValueKind::List)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int64(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float64(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(m: HashMap<String, Value>) -> Self {
        Value::Map(m)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = WiremapError;

    /// Convert a JSON value into the closed variant set.
    ///
    /// Numbers become `Int64` when they fit, `Float64` otherwise. `null` has
    /// no counterpart and fails with [`WiremapError::UnsupportedType`].
    fn try_from(v: serde_json::Value) -> Result<Self> {
        match v {
            serde_json::Value::Null => Err(WiremapError::UnsupportedType("null".to_owned())),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int64(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float64(f))
                } else {
                    Err(WiremapError::UnsupportedType(format!("number {}", n)))
                }
            }
            serde_json::Value::String(s) => Ok(Value::Str(s)),
            serde_json::Value::Array(items) => {
                let list = items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::List(list))
            }
            serde_json::Value::Object(entries) => {
                let mut map = HashMap::with_capacity(entries.len());
                for (key, val) in entries {
                    map.insert(key, Value::try_from(val)?);
                }
                Ok(Value::Map(map))
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Str(s) => serde_json::Value::String(s),
            Value::Int64(i) => serde_json::Value::Number(i.into()),
            Value::Float64(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Map(m) => serde_json::Value::Object(
                m.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
            Value::List(l) => {
                serde_json::Value::Array(l.into_iter().map(Into::into).collect())
            }
        }
    }
}
