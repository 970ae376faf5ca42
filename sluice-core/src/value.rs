//! Dynamic value cells carried across graph edges.
//!
//! Every slot holds a [`Value`]: a tagged variant over the payload types
//! the engine knows about. Writes are checked at runtime against the
//! [`ValueKind`] a slot declares.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// The empty cell.
    Null,
    /// A boolean.
    Bool,
    /// A signed integer.
    Int,
    /// A double-precision float.
    Float,
    /// A UTF-8 string.
    Text,
    /// A contiguous array of floats.
    FloatVec,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::FloatVec => "float_vec",
        };
        f.write_str(name)
    }
}

/// Dynamically-typed value held by a slot.
///
/// `Null` is the empty cell: the state of an input before anything has
/// been written to it, and again after the engine has released it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// The empty cell.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A double-precision float.
    Float(f64),
    /// A UTF-8 string.
    Text(String),
    /// A contiguous array of floats.
    FloatVec(Vec<f64>),
}

impl Value {
    /// The type tag of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Text(_) => ValueKind::Text,
            Self::FloatVec(_) => ValueKind::FloatVec,
        }
    }

    /// Check if the cell is empty.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Convert to bool if possible.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Convert to i64 if possible.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to f64 if possible. Integers widen.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Borrow the string payload if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the float array payload if this is a float vector.
    #[must_use]
    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            Self::FloatVec(v) => Some(v),
            _ => None,
        }
    }

    /// Take the float array payload if this is a float vector.
    #[must_use]
    pub fn into_floats(self) -> Option<Vec<f64>> {
        match self {
            Self::FloatVec(v) => Some(v),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Self::FloatVec(v)
    }
}
