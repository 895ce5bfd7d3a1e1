//! Builders for the serde compound types.

use serde::ser::{self, Error as _, Serialize};

use crate::value::{List, Map, Record};
use crate::{to_value, Error, Result, Value};

/// Wraps `value` as `{ variant: value }` if `variant` is set.
fn tag(variant: Option<&'static str>, value: Value) -> Value {
    match variant {
        Some(variant) => Value::Map(Map::from([(variant.to_owned(), value)])),
        None => value,
    }
}

/// Collects sequences, tuples and tuple structs into a [`Value::List`].
///
/// Tuple variants are collected the same way and then tagged with the
/// variant name.
pub struct SerializeList {
    variant: Option<&'static str>,
    list: List<Value>,
}

impl SerializeList {
    pub fn new(variant: Option<&'static str>, len: usize) -> Self {
        Self {
            variant,
            list: List::with_capacity(len),
        }
    }

    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.list.push(to_value(value)?);
        Ok(())
    }

    fn finish(self) -> Result<Value> {
        Ok(tag(self.variant, Value::List(self.list)))
    }
}

macro_rules! impl_serialize_list {
    ($($trait:ident::$method:ident),+) => {
        $(
            impl ser::$trait for SerializeList {
                type Ok = Value;
                type Error = Error;

                fn $method<T>(&mut self, value: &T) -> Result<()>
                where
                    T: ?Sized + Serialize,
                {
                    self.push(value)
                }

                fn end(self) -> Result<Value> {
                    self.finish()
                }
            }
        )+
    };
}

impl_serialize_list! {
    SerializeSeq::serialize_element,
    SerializeTuple::serialize_element,
    SerializeTupleStruct::serialize_field,
    SerializeTupleVariant::serialize_field
}

/// Collects a serde map into a [`Value::Map`].
#[derive(Default)]
pub struct SerializeMap {
    map: Map<String, Value>,
    key: Option<String>,
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.key = Some(map_key(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .key
            .take()
            .ok_or_else(|| Error::custom("map value serialized before its key"))?;
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Map(self.map))
    }
}

/// Converts a serialized map key to a string.
///
/// Strings, characters, unit variants and integers are accepted.
fn map_key<T>(key: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    match to_value(key)? {
        Value::String(s) => Ok(s),
        Value::Integer(i) => Ok(i.to_string()),
        _ => Err(Error::custom("map key must be a string")),
    }
}

/// Collects a struct into a [`Record`] that keeps the type name.
pub struct SerializeRecord {
    record: Record,
}

impl SerializeRecord {
    pub fn new(name: &'static str) -> Self {
        Self {
            record: Record::new(name),
        }
    }
}

impl ser::SerializeStruct for SerializeRecord {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.record.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Record(self.record))
    }
}

/// Collects a struct variant into `{ variant: { field: value, .. } }`.
pub struct SerializeStructVariant {
    variant: &'static str,
    fields: Map<String, Value>,
}

impl SerializeStructVariant {
    pub fn new(variant: &'static str) -> Self {
        Self {
            variant,
            fields: Map::new(),
        }
    }
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.fields.insert(key.to_owned(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(tag(Some(self.variant), Value::Map(self.fields)))
    }
}
