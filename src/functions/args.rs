use std::collections::BTreeMap;

use crate::functions::FunctionArg;
use crate::Value;

pub type Result<T> = std::result::Result<T, Error>;

/// Why a value could not be passed to a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// When there is a type mismatch.
    Type(
        /// Expected
        &'static str,
        /// Got
        &'static str,
    ),
    /// Failed to convert from i64 to the integer type.
    TryFromInt(
        /// Type
        &'static str,
        /// Value
        i64,
    ),
}

impl FunctionArg for bool {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::Bool(b) => Ok(b),
            v => Err(Error::Type("bool", v.human())),
        }
    }
}

macro_rules! impl_for_int {
    ($($ty:ty)+) => {
        $(
            impl FunctionArg for $ty {
                fn from_value(v: Value) -> Result<Self> {
                    match v {
                        Value::Integer(i) => i.try_into().map_err(|_| {
                            Error::TryFromInt(stringify!($ty), i)
                        }),
                        v => Err(Error::Type(stringify!($ty), v.human())),
                    }
                }
            }
        )+
    };
}

impl_for_int! { u8 u16 u32 u64 u128 usize i8 i16 i32 i64 isize i128 }

macro_rules! impl_for_float {
    ($($ty:ty)+) => {
        $(
            impl FunctionArg for $ty {
                fn from_value(v: Value) -> Result<Self> {
                    match v {
                        Value::Float(f) => Ok(f as $ty),
                        v => Err(Error::Type(stringify!($ty), v.human())),
                    }
                }
            }
        )+
    }
}

impl_for_float! { f32 f64 }

impl FunctionArg for String {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::String(s) => Ok(s),
            v => Err(Error::Type("string", v.human())),
        }
    }
}

impl FunctionArg for Vec<Value> {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::List(l) => Ok(l),
            v => Err(Error::Type("list", v.human())),
        }
    }
}

impl FunctionArg for BTreeMap<String, Value> {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::Map(m) => Ok(m),
            v => Err(Error::Type("map", v.human())),
        }
    }
}

impl FunctionArg for Value {
    fn from_value(v: Value) -> Result<Self> {
        Ok(v)
    }
}

impl<T> FunctionArg for Option<T>
where
    T: FunctionArg,
{
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::None => Ok(None),
            v => T::from_value(v).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_out_of_range() {
        assert_eq!(
            u8::from_value(Value::Integer(300)),
            Err(Error::TryFromInt("u8", 300))
        );
        assert_eq!(i32::from_value(Value::Integer(-4)), Ok(-4));
    }

    #[test]
    fn type_mismatch() {
        assert_eq!(
            String::from_value(Value::Integer(1)),
            Err(Error::Type("string", "integer"))
        );
        assert_eq!(
            bool::from_value(Value::from("true")),
            Err(Error::Type("bool", "string"))
        );
    }

    #[test]
    fn option_accepts_none() {
        assert_eq!(Option::<i64>::from_value(Value::None), Ok(None));
        assert_eq!(Option::<i64>::from_value(Value::Integer(2)), Ok(Some(2)));
    }
}
