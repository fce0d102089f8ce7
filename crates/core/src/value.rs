use std::fmt::{Display, Formatter};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// The type tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    StringList,
    Int,
    IntList,
    Float,
    FloatList,
    Bool,
}

impl Display for ValueType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::StringList => "string list",
            Self::Int => "int",
            Self::IntList => "int list",
            Self::Float => "float",
            Self::FloatList => "float list",
            Self::Bool => "bool",
        };
        formatter.write_str(name)
    }
}

/// A single typed datum stored in [`crate::data::Data`].
///
/// Accessors never fail: reading through an accessor that does not match the
/// variant yields that accessor's zero value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    String(String),
    StringList(Vec<String>),
    Int(i64),
    IntList(Vec<i64>),
    Float(f64),
    FloatList(Vec<f64>),
    Bool(bool),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::String(_) => ValueType::String,
            Self::StringList(_) => ValueType::StringList,
            Self::Int(_) => ValueType::Int,
            Self::IntList(_) => ValueType::IntList,
            Self::Float(_) => ValueType::Float,
            Self::FloatList(_) => ValueType::FloatList,
            Self::Bool(_) => ValueType::Bool,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::String(value) => value,
            _ => "",
        }
    }

    pub fn as_string_list(&self) -> &[String] {
        match self {
            Self::StringList(values) => values,
            _ => &[],
        }
    }

    pub fn as_int(&self) -> i64 {
        match self {
            Self::Int(value) => *value,
            _ => 0,
        }
    }

    pub fn as_int_list(&self) -> &[i64] {
        match self {
            Self::IntList(values) => values,
            _ => &[],
        }
    }

    pub fn as_float(&self) -> f64 {
        match self {
            Self::Float(value) => *value,
            _ => 0.0,
        }
    }

    pub fn as_float_list(&self) -> &[f64] {
        match self {
            Self::FloatList(values) => values,
            _ => &[],
        }
    }

    pub fn as_bool(&self) -> bool {
        matches!(self, Self::Bool(true))
    }

    /// The value rendered as the individual tokens that would produce it.
    pub fn to_args(&self) -> Vec<String> {
        match self {
            Self::String(value) => vec![value.clone()],
            Self::StringList(values) => values.clone(),
            Self::Int(value) => vec![value.to_string()],
            Self::IntList(values) => values.iter().map(ToString::to_string).collect(),
            Self::Float(value) => vec![value.to_string()],
            Self::FloatList(values) => values.iter().map(ToString::to_string).collect(),
            Self::Bool(value) => vec![value.to_string()],
        }
    }
}

impl Display for Value {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(value) => formatter.write_str(value),
            Self::Int(value) => write!(formatter, "{value}"),
            Self::Float(value) => write!(formatter, "{value}"),
            Self::Bool(value) => write!(formatter, "{value}"),
            _ => formatter.write_str(&self.to_args().iter().join(" ")),
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<Vec<String>> for Value {
    fn from(values: Vec<String>) -> Self {
        Self::StringList(values)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<Vec<i64>> for Value {
    fn from(values: Vec<i64>) -> Self {
        Self::IntList(values)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<f64>> for Value {
    fn from(values: Vec<f64>) -> Self {
        Self::FloatList(values)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
