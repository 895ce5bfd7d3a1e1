/// Construct a [`Value`][crate::Value] from a JSON-like literal.
///
/// The outermost form must be explicit: a map `{ .. }`, a list `[ .. ]`,
/// `None`, or any expression convertible with `Value::from`. Map keys are
/// identifiers or string literals.
///
/// ```
/// let data = tmpl::value!({
///     user: {
///         name: "John Smith",
///         roles: ["admin", "dev"],
///     },
///     "last-login": None,
///     visits: (40 + 2),
/// });
/// ```
#[macro_export]
macro_rules! value {
    (None) => {
        $crate::Value::None
    };

    ([ $($tt:tt)* ]) => {
        $crate::Value::List($crate::_value!(@list [] [] $($tt)*))
    };

    ({ $($tt:tt)* }) => {
        $crate::Value::Map({
            #[allow(unused_mut)]
            let mut map = $crate::Map::new();
            $crate::_value!(@map map $($tt)*);
            map
        })
    };

    ($other:expr) => {
        $crate::Value::from($other)
    };
}

// Elements and entry values are collected token by token up to the next
// top-level comma and then handed back to `value!`.
#[macro_export]
#[doc(hidden)]
macro_rules! _value {
    // Lists: `[finished elements] [tokens of the current element] input`.
    (@list [$($done:expr,)*] []) => {
        ::std::vec![$($done,)*]
    };
    (@list [$($done:expr,)*] [$($cur:tt)+]) => {
        ::std::vec![$($done,)* $crate::value!($($cur)+)]
    };
    (@list [$($done:expr,)*] [] , $($rest:tt)*) => {
        $crate::_value!(@list [$($done,)*] [] $($rest)*)
    };
    (@list [$($done:expr,)*] [$($cur:tt)+] , $($rest:tt)*) => {
        $crate::_value!(@list [$($done,)* $crate::value!($($cur)+),] [] $($rest)*)
    };
    (@list [$($done:expr,)*] [$($cur:tt)*] $next:tt $($rest:tt)*) => {
        $crate::_value!(@list [$($done,)*] [$($cur)* $next] $($rest)*)
    };

    // Maps: each entry is inserted into the map named by `$m`.
    (@map $m:ident) => {};
    (@map $m:ident $key:ident : $($rest:tt)*) => {
        $crate::_value!(@entry $m (::std::stringify!($key)) [] $($rest)*)
    };
    (@map $m:ident $key:literal : $($rest:tt)*) => {
        $crate::_value!(@entry $m ($key) [] $($rest)*)
    };
    (@entry $m:ident ($key:expr) [$($val:tt)+]) => {
        let _ = $m.insert(::std::string::String::from($key), $crate::value!($($val)+));
    };
    (@entry $m:ident ($key:expr) [$($val:tt)+] , $($rest:tt)*) => {
        let _ = $m.insert(::std::string::String::from($key), $crate::value!($($val)+));
        $crate::_value!(@map $m $($rest)*);
    };
    (@entry $m:ident ($key:expr) [$($val:tt)*] $next:tt $($rest:tt)*) => {
        $crate::_value!(@entry $m ($key) [$($val)* $next] $($rest)*)
    };
}
