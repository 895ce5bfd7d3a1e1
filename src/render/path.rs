//! Navigation over host data by name.

use std::collections::HashMap;
use std::fmt;

use crate::render::fault;
use crate::value::ValueCow;
use crate::Value;

/// The position of a render within the host data.
///
/// A path is an ordered sequence of named values from the root data to the
/// current value. The first item is always the root and a path never shrinks
/// below it. Its [`Display`][fmt::Display] form is `/.` for the root and
/// `/.a.b` otherwise.
#[derive(Debug, Clone)]
pub struct Path<'a> {
    items: Vec<PathItem<'a>>,
}

#[derive(Debug, Clone)]
pub(crate) struct PathItem<'a> {
    pub name: String,
    pub value: ValueCow<'a>,
}

/// A failure to navigate the host data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AccessError {
    /// A selector popped the root or beyond.
    Pop { pops: usize, path: String },
    /// No such map key or field.
    NotFound { path: String },
    /// The value has no fields.
    Indirect { kind: String, path: String },
    /// Host code panicked.
    Panic { msg: String, path: String },
}

impl<'a> Path<'a> {
    pub(crate) fn new(root: &'a Value) -> Self {
        Self {
            items: vec![PathItem {
                name: String::from("/"),
                value: ValueCow::Borrowed(root),
            }],
        }
    }

    /// Returns the number of items in the path, including the root.
    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the path is only the root.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.items.len() == 1
    }

    /// Returns the names of the items after the root.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items[1..].iter().map(|item| item.name.as_str())
    }

    pub(crate) fn items(&self) -> &[PathItem<'a>] {
        &self.items
    }

    /// Returns the current value.
    pub(crate) fn value(&self) -> &ValueCow<'a> {
        &self.items[self.items.len() - 1].value
    }

    pub(crate) fn push(&mut self, name: impl Into<String>, value: ValueCow<'a>) {
        self.items.push(PathItem {
            name: name.into(),
            value,
        });
    }

    /// Returns a new path made of the first `len` items of this one.
    pub(crate) fn prefix(&self, len: usize) -> Self {
        Self {
            items: self.items[..len.max(1)].to_vec(),
        }
    }

    /// Returns the length left after popping `pops` items, never popping the
    /// root.
    pub(crate) fn pop_len(&self, pops: usize) -> Result<usize, AccessError> {
        if pops >= self.items.len() {
            return Err(AccessError::Pop {
                pops,
                path: self.to_string(),
            });
        }
        Ok(self.items.len() - pops)
    }

    /// Renders the first `len` items as a path string.
    pub(crate) fn string_upto(&self, len: usize) -> String {
        let names: Vec<&str> = self.items[1..len.max(1)]
            .iter()
            .map(|item| item.name.as_str())
            .collect();
        format!("/.{}", names.join("."))
    }

    /// Renders the path with extra keys appended, this is the key used in the
    /// override table.
    pub fn string_with(&self, keys: &[&str]) -> String {
        join_all(&self.to_string(), keys)
    }
}

impl fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/.")?;
        for (i, name) in self.names().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

/// Appends a key to a rendered path.
pub(crate) fn join(path: &str, key: &str) -> String {
    join_all(path, &[key])
}

fn join_all(path: &str, keys: &[&str]) -> String {
    if keys.is_empty() {
        return path.to_owned();
    }
    let sep = if path == "/." { "" } else { "." };
    format!("{path}{sep}{}", keys.join("."))
}

/// Looks up `key` on `value` where `path` is the rendered path of `value`.
///
/// The override table is consulted first using the full path of the key.
/// Otherwise indirect objects are unwrapped and the key is looked up as a map
/// key or a record or object field.
pub(crate) fn access<'a>(
    path: &str,
    value: &ValueCow<'a>,
    key: &str,
    overrides: &HashMap<String, ValueCow<'a>>,
) -> Result<ValueCow<'a>, AccessError> {
    let full = join(path, key);

    if let Some(value) = overrides.get(&full) {
        tracing::trace!(path = %full, "resolved override");
        return Ok(value.clone());
    }

    let found = match value {
        ValueCow::Borrowed(v) => lookup(*v, key),
        ValueCow::Owned(v) => lookup(v, key).map(|found| found.map(into_owned)),
    };

    match found {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(AccessError::NotFound { path: full }),
        Err(Fault::Indirect(kind)) => Err(AccessError::Indirect { kind, path: full }),
        Err(Fault::Panic(msg)) => Err(AccessError::Panic { msg, path: full }),
    }
}

enum Fault {
    Indirect(String),
    Panic(String),
}

fn lookup<'v>(value: &'v Value, key: &str) -> Result<Option<ValueCow<'v>>, Fault> {
    match value {
        Value::Map(map) => Ok(map.get(key).map(ValueCow::Borrowed)),
        Value::Record(record) => Ok(record.field(key).map(ValueCow::Borrowed)),
        Value::Object(object) => {
            let object = object.get();
            match fault::guard(|| object.indirect()).map_err(Fault::Panic)? {
                Some(inner) => Ok(lookup(&inner, key)?.map(into_owned)),
                None => {
                    let field = fault::guard(|| object.field(key)).map_err(Fault::Panic)?;
                    Ok(field.map(ValueCow::Owned))
                }
            }
        }
        value => Err(Fault::Indirect(value.type_name())),
    }
}

/// Unwraps indirect objects until a value that is not one is reached.
pub(crate) fn resolve_indirect(value: ValueCow<'_>) -> Result<ValueCow<'_>, String> {
    let mut value = value;
    loop {
        let inner = match &*value {
            Value::Object(object) => {
                let object = object.get();
                fault::guard(|| object.indirect())?
            }
            _ => return Ok(value),
        };
        match inner {
            Some(inner) => value = ValueCow::Owned(inner),
            None => return Ok(value),
        }
    }
}

fn into_owned<'a>(value: ValueCow<'_>) -> ValueCow<'a> {
    ValueCow::Owned(value.into_owned())
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pop { pops, path } => {
                write!(f, "cannot pop {pops} items from path `{path}`")
            }
            Self::NotFound { path } => write!(f, "field not found at `{path}`"),
            Self::Indirect { kind, path } => {
                write!(f, "cannot indirect into {kind} to find `{path}`")
            }
            Self::Panic { msg, path } => {
                write!(f, "field access panicked at `{path}`: {msg}")
            }
        }
    }
}
