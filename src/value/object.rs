//! Host objects that resolve their fields lazily.

use std::fmt;
use std::sync::Arc;

use crate::Value;

/// A host value whose fields are looked up by name at render time.
///
/// Implement this for data that is expensive to convert up front or that only
/// knows its fields when asked. Lookups happen behind a fault boundary: a
/// panic inside [`field`][FieldAccess::field] or
/// [`indirect`][FieldAccess::indirect] becomes a render error instead of
/// aborting the render.
///
/// # Examples
///
/// ```
/// use tmpl::{Engine, FieldAccess, Object, Value};
///
/// #[derive(Debug)]
/// struct Env;
///
/// impl FieldAccess for Env {
///     fn field(&self, name: &str) -> Option<Value> {
///         (name == "user").then(|| Value::from("root"))
///     }
/// }
///
/// let data = Value::Object(Object::new(Env));
/// let result = Engine::new().compile("{% .user %}")?.render_from(&data)?;
/// assert_eq!(result, "root");
/// # Ok::<(), tmpl::Error>(())
/// ```
pub trait FieldAccess: fmt::Debug + Send + Sync {
    /// Returns the value of the named field, or `None` if there is no such
    /// field.
    fn field(&self, name: &str) -> Option<Value>;

    /// Returns the value this object stands in for, if any.
    ///
    /// Navigation unwraps indirect objects until it reaches a value that is
    /// not one, so a lazily loaded or shared cell can expose its contents as
    /// an ordinary map, list or scalar.
    fn indirect(&self) -> Option<Value> {
        None
    }

    /// Returns a human readable type name used in error messages.
    fn type_name(&self) -> &str {
        "object"
    }
}

/// A shared handle to a [`FieldAccess`] implementation.
#[derive(Clone)]
pub struct Object(Arc<dyn FieldAccess>);

impl Object {
    /// Wrap a host value.
    pub fn new<T>(value: T) -> Self
    where
        T: FieldAccess + 'static,
    {
        Self(Arc::new(value))
    }

    pub(crate) fn get(&self) -> &dyn FieldAccess {
        &*self.0
    }
}

impl From<Arc<dyn FieldAccess>> for Object {
    fn from(arc: Arc<dyn FieldAccess>) -> Self {
        Self(arc)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Objects are equal only if they are the same shared instance.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
