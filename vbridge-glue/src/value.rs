//! The variant type crossing the transport seam.
//!
//! Everything that travels between the glue and a backend object model is a
//! [`Value`]: scalars, strings, opaque object handles, or arrays thereof.

use serde::{Deserialize, Serialize};

use crate::error::{GlueError, Result};

/// An opaque reference to an object living in the backend object model.
///
/// Handles are only meaningful to the bridge that issued them.
pub type Handle = u64;

/// A dynamically typed value exchanged with the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Object(Handle),
    Array(Vec<Value>),
}

impl Value {
    /// Name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
        }
    }

    fn unexpected(&self, wanted: &str) -> GlueError {
        GlueError::Transport(format!("expected {}, got {}", wanted, self.type_name()))
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(other.unexpected("bool")),
        }
    }

    pub fn as_i64(&self) -> Result<i64> {
        match self {
            Value::Int(n) => Ok(*n),
            other => Err(other.unexpected("int")),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(other.unexpected("string")),
        }
    }

    pub fn as_object(&self) -> Result<Handle> {
        match self {
            Value::Object(h) => Ok(*h),
            other => Err(other.unexpected("object")),
        }
    }

    pub fn as_array(&self) -> Result<&[Value]> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(other.unexpected("array")),
        }
    }

    pub fn into_array(self) -> Result<Vec<Value>> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(other.unexpected("array")),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_accept_matching_variant() {
        assert_eq!(Value::Int(7).as_i64().unwrap(), 7);
        assert_eq!(Value::Str("x".into()).as_str().unwrap(), "x");
        assert_eq!(Value::Object(3).as_object().unwrap(), 3);
        assert!(Value::Bool(true).as_bool().unwrap());
    }

    #[test]
    fn accessors_reject_mismatched_variant() {
        let err = Value::Str("nope".into()).as_i64().unwrap_err();
        assert!(matches!(err, GlueError::Transport(_)));
        assert!(err.to_string().contains("expected int"));
    }

    #[test]
    fn into_array_unwraps_items() {
        let v = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(v.into_array().unwrap().len(), 2);
    }
}
