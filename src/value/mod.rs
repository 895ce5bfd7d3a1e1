//! Defines the [`Value`] enum, representing any valid renderable data.

mod from;
mod object;
#[cfg(feature = "serde")]
mod ser;

use std::borrow::Cow;
pub use std::collections::BTreeMap as Map;
use std::mem;
pub use std::vec::Vec as List;

pub use crate::value::object::{FieldAccess, Object};
use crate::render::fault;
#[cfg(feature = "serde")]
pub use crate::value::ser::to_value;

/// A value borrowed from the render data or produced while rendering.
pub(crate) type ValueCow<'a> = Cow<'a, Value>;

/// Data to be rendered represented as a recursive enum.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(List<Value>),
    Map(Map<String, Value>),
    Record(Record),
    Object(Object),
}

/// A struct-like value with a type name and named fields.
///
/// Serializing a Rust struct produces a record, fields are looked up by name
/// the same way map keys are.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    name: String,
    fields: Map<String, Value>,
}

impl Record {
    /// Construct a new empty record with the given type name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Map::new(),
        }
    }

    /// Returns the type name of this record.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field with the given name.
    #[inline]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Sets a field, returning the previous value if there was one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Returns an iterator over the fields of this record.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Value {
    /// Returns a human readable name for the type of this value.
    pub(crate) fn human(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
            Value::Object(_) => "object",
        }
    }

    /// Returns the type name shown in render errors. Host objects report
    /// their own [`type_name`][FieldAccess::type_name].
    pub(crate) fn type_name(&self) -> String {
        match self {
            Value::Object(object) => {
                let object = object.get();
                fault::guard(|| object.type_name().to_owned())
                    .unwrap_or_else(|_| self.human().to_owned())
            }
            value => value.human().to_owned(),
        }
    }

    /// Returns the truthiness of this value.
    ///
    /// Integers and floats are true if nonzero, strings are true if non-empty
    /// and bools are their own value. Everything else is false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(s), Self::Bool(o)) => s == o,
            (Self::Integer(s), Self::Integer(o)) => s == o,
            (Self::Float(s), Self::Float(o)) => s == o,
            (Self::String(s), Self::String(o)) => s == o,
            (Self::List(s), Self::List(o)) => s == o,
            (Self::Map(s), Self::Map(o)) => s == o,
            (Self::Record(s), Self::Record(o)) => s == o,
            (Self::Object(s), Self::Object(o)) => s == o,
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }
}
