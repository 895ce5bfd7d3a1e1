//! Containment of panics raised by host code.
//!
//! Host functions and [`FieldAccess`][crate::FieldAccess] implementations run
//! behind this boundary so that a panic aborts only the current render with a
//! structured error.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Runs `f`, converting a panic into its message.
pub(crate) fn guard<F, R>(f: F) -> Result<R, String>
where
    F: FnOnce() -> R,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| format_panic(&*payload))
}

fn format_panic(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
