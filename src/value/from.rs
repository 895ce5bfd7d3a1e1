use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use crate::value::{Map, Object, Record};
use crate::Value;

macro_rules! impl_from {
    ($($ty:ty => |$v:ident| $conv:expr),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from($v: $ty) -> Self {
                    $conv
                }
            }
        )+
    };
}

impl_from! {
    () => |_v| Value::None,
    bool => |v| Value::Bool(v),
    u8 => |v| Value::Integer(i64::from(v)),
    u16 => |v| Value::Integer(i64::from(v)),
    u32 => |v| Value::Integer(i64::from(v)),
    i8 => |v| Value::Integer(i64::from(v)),
    i16 => |v| Value::Integer(i64::from(v)),
    i32 => |v| Value::Integer(i64::from(v)),
    i64 => |v| Value::Integer(v),
    f32 => |v| Value::Float(f64::from(v)),
    f64 => |v| Value::Float(v),
    String => |v| Value::String(v),
    &str => |v| Value::String(v.to_owned()),
    Cow<'_, str> => |v| Value::String(v.into_owned()),
    Record => |v| Value::Record(v),
    Object => |v| Value::Object(v),
}

fn list<I>(iter: I) -> Value
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    Value::List(iter.into_iter().map(Into::into).collect())
}

fn map<I, K, V>(iter: I) -> Value
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    Value::Map(
        iter.into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<Map<_, _>>(),
    )
}

impl<V> From<Vec<V>> for Value
where
    V: Into<Value>,
{
    #[inline]
    fn from(v: Vec<V>) -> Self {
        list(v)
    }
}

impl<V, const N: usize> From<[V; N]> for Value
where
    V: Into<Value>,
{
    #[inline]
    fn from(v: [V; N]) -> Self {
        list(v)
    }
}

impl<K, V> From<BTreeMap<K, V>> for Value
where
    K: Into<String>,
    V: Into<Value>,
{
    #[inline]
    fn from(v: BTreeMap<K, V>) -> Self {
        map(v)
    }
}

impl<K, V, S> From<HashMap<K, V, S>> for Value
where
    K: Into<String>,
    V: Into<Value>,
{
    #[inline]
    fn from(v: HashMap<K, V, S>) -> Self {
        map(v)
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Value
where
    K: Into<String>,
    V: Into<Value>,
{
    #[inline]
    fn from(v: [(K, V); N]) -> Self {
        map(v)
    }
}

impl<V> From<Option<V>> for Value
where
    V: Into<Value>,
{
    fn from(opt: Option<V>) -> Self {
        opt.map_or(Value::None, Into::into)
    }
}

impl<V> FromIterator<V> for Value
where
    V: Into<Value>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = V>,
    {
        list(iter)
    }
}

impl<K, V> FromIterator<(K, V)> for Value
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        map(iter)
    }
}
