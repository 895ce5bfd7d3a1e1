mod args;

use std::collections::BTreeMap;
use std::fmt::Display;

use crate::Value;

pub use crate::functions::args::Error as ArgError;

/// A type-erased host function as stored in the engine.
pub type FunctionFn =
    dyn Fn(Vec<Value>) -> std::result::Result<Value, CallError> + Send + Sync + 'static;

/// Why a host function call did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// The wrong number of arguments was passed.
    Arity(
        /// Expected
        usize,
        /// Got
        usize,
    ),
    /// The argument at the given index could not be converted.
    Arg(usize, ArgError),
    /// The function itself returned an error.
    Failed(String),
}

pub(crate) fn new<F, R, A>(f: F) -> Box<FunctionFn>
where
    F: Function<R, A> + Send + Sync + 'static,
    R: FunctionReturn,
    A: FunctionArgs,
{
    Box::new(move |values: Vec<Value>| {
        let args = A::from_values(values)?;
        Function::call(&f, args)
            .to_value()
            .map_err(CallError::Failed)
    })
}

pub(crate) fn new_variadic<F, R>(f: F) -> Box<FunctionFn>
where
    F: Fn(Vec<Value>) -> R + Send + Sync + 'static,
    R: FunctionReturn,
{
    Box::new(move |values: Vec<Value>| f(values).to_value().map_err(CallError::Failed))
}

/// Represents any host function that can be called from a template.
///
/// This trait is used by the [`Engine::add_function`][crate::Engine::add_function]
/// method to abstract over a variety of function and closure types. This
/// includes functions with variable argument types, return types and arity.
/// A function can take up to four arguments, the renderer checks the number
/// of arguments and their types when the function is called.
///
/// [`Function`] is implemented for functions that take any of the following
/// owned types as arguments.
/// - [`bool`]
/// - any primitive integer, out of range values are rejected
/// - [`f32`] and [`f64`]
/// - [`String`]
/// - [`Vec<Value>`]
/// - [`BTreeMap<String, Value>`][std::collections::BTreeMap]
/// - [`Value`]
/// - [`Option<T>`] of any of the above, which also accepts none
///
/// The return type decides how many values the call produces.
/// - `()` produces no value, which renders as nothing.
/// - Any type convertible into a [`Value`] produces one value.
/// - A tuple of two to four such types produces a list of values.
/// - [`Option<T>`] produces none when absent.
/// - [`Result<T, E>`] fails the render with the error message when `E` is
///   returned.
///
/// ## Examples
///
/// ```rust
/// use tmpl::{Engine, Value};
///
/// let mut engine = Engine::new();
/// engine.add_function("greet", |name: String| format!("Hello {name}!"));
/// engine.add_function("div", |a: i64, b: i64| {
///     a.checked_div(b).ok_or("division by zero")
/// });
///
/// let result = engine
///     .compile(r#"{% call greet "John" %} 9 / 3 = {% call div 9 3 %}"#)?
///     .render_from(&Value::None)?;
/// assert_eq!(result, "Hello John! 9 / 3 = 3");
/// # Ok::<(), tmpl::Error>(())
/// ```
pub trait Function<R, A> {
    #[doc(hidden)]
    fn call(&self, args: A) -> R;
}

pub trait FunctionArgs: Sized {
    fn from_values(values: Vec<Value>) -> std::result::Result<Self, CallError>;
}

pub trait FunctionArg: Sized {
    fn from_value(v: Value) -> args::Result<Self>;
}

pub trait FunctionReturn {
    fn to_value(self) -> std::result::Result<Value, String>;
}

////////////////////////////////////////////////////////////////////////////////
// Function
////////////////////////////////////////////////////////////////////////////////

impl<Func, R> Function<R, ()> for Func
where
    Func: Fn() -> R,
    R: FunctionReturn,
{
    #[doc(hidden)]
    fn call(&self, (): ()) -> R {
        self()
    }
}

impl<Func, R, A> Function<R, (A,)> for Func
where
    Func: Fn(A) -> R,
    R: FunctionReturn,
    A: FunctionArg,
{
    #[doc(hidden)]
    fn call(&self, (a,): (A,)) -> R {
        self(a)
    }
}

impl<Func, R, A, B> Function<R, (A, B)> for Func
where
    Func: Fn(A, B) -> R,
    R: FunctionReturn,
    A: FunctionArg,
    B: FunctionArg,
{
    #[doc(hidden)]
    fn call(&self, (a, b): (A, B)) -> R {
        self(a, b)
    }
}

impl<Func, R, A, B, C> Function<R, (A, B, C)> for Func
where
    Func: Fn(A, B, C) -> R,
    R: FunctionReturn,
    A: FunctionArg,
    B: FunctionArg,
    C: FunctionArg,
{
    #[doc(hidden)]
    fn call(&self, (a, b, c): (A, B, C)) -> R {
        self(a, b, c)
    }
}

impl<Func, R, A, B, C, D> Function<R, (A, B, C, D)> for Func
where
    Func: Fn(A, B, C, D) -> R,
    R: FunctionReturn,
    A: FunctionArg,
    B: FunctionArg,
    C: FunctionArg,
    D: FunctionArg,
{
    #[doc(hidden)]
    fn call(&self, (a, b, c, d): (A, B, C, D)) -> R {
        self(a, b, c, d)
    }
}

////////////////////////////////////////////////////////////////////////////////
// FunctionArgs
////////////////////////////////////////////////////////////////////////////////

impl FunctionArgs for () {
    fn from_values(values: Vec<Value>) -> std::result::Result<Self, CallError> {
        match values.len() {
            0 => Ok(()),
            n => Err(CallError::Arity(0, n)),
        }
    }
}

macro_rules! impl_function_args {
    ($n:literal; $($index:literal $ty:ident $var:ident),+) => {
        impl<$($ty),+> FunctionArgs for ($($ty,)+)
        where
            $($ty: FunctionArg,)+
        {
            fn from_values(values: Vec<Value>) -> std::result::Result<Self, CallError> {
                let [$($var),+]: [Value; $n] = values
                    .try_into()
                    .map_err(|values: Vec<Value>| CallError::Arity($n, values.len()))?;
                Ok(($(
                    $ty::from_value($var).map_err(|err| CallError::Arg($index, err))?,
                )+))
            }
        }
    };
}

impl_function_args! { 1; 0 A a }
impl_function_args! { 2; 0 A a, 1 B b }
impl_function_args! { 3; 0 A a, 1 B b, 2 C c }
impl_function_args! { 4; 0 A a, 1 B b, 2 C c, 3 D d }

////////////////////////////////////////////////////////////////////////////////
// FunctionReturn
////////////////////////////////////////////////////////////////////////////////

macro_rules! impl_function_return {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FunctionReturn for $ty {
                fn to_value(self) -> std::result::Result<Value, String> {
                    Ok(Value::from(self))
                }
            }
        )+
    };
}

impl_function_return! { Value, (), bool, u8, u16, u32, i8, i16, i32, i64, f32, f64, String, &'static str }

impl<T> FunctionReturn for Vec<T>
where
    T: Into<Value>,
{
    fn to_value(self) -> std::result::Result<Value, String> {
        Ok(Value::from(self))
    }
}

impl<V> FunctionReturn for BTreeMap<String, V>
where
    V: Into<Value>,
{
    fn to_value(self) -> std::result::Result<Value, String> {
        Ok(Value::from(self))
    }
}

impl<T> FunctionReturn for Option<T>
where
    T: FunctionReturn,
{
    fn to_value(self) -> std::result::Result<Value, String> {
        match self {
            Some(r) => r.to_value(),
            None => Ok(Value::None),
        }
    }
}

impl<T, E> FunctionReturn for std::result::Result<T, E>
where
    T: FunctionReturn,
    E: Display,
{
    fn to_value(self) -> std::result::Result<Value, String> {
        self.map_err(|err| err.to_string())?.to_value()
    }
}

macro_rules! impl_function_return_tuple {
    ($($ty:ident $var:ident),+) => {
        impl<$($ty),+> FunctionReturn for ($($ty,)+)
        where
            $($ty: Into<Value>,)+
        {
            fn to_value(self) -> std::result::Result<Value, String> {
                let ($($var,)+) = self;
                Ok(Value::List(vec![$($var.into()),+]))
            }
        }
    };
}

impl_function_return_tuple! { A a, B b }
impl_function_return_tuple! { A a, B b, C c }
impl_function_return_tuple! { A a, B b, C c, D d }
