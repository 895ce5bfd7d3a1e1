//! Output sinks and the formatting of rendered values.
//!
//! Rendering always goes through [`std::fmt::Write`]. Rendering to a
//! [`String`] writes directly, rendering to an [`std::io::Write`] goes through
//! a [`Writer`] which holds on to the underlying I/O error so that it can be
//! reported instead of the opaque [`std::fmt::Error`].

use std::fmt;
use std::fmt::Write;
use std::io;

use crate::Value;

/// A [`std::fmt::Write`] façade over an [`std::io::Write`].
pub(crate) struct Writer<W> {
    writer: W,
    err: Option<io::Error>,
}

impl<W> Writer<W>
where
    W: io::Write,
{
    pub fn new(writer: W) -> Self {
        Self { writer, err: None }
    }

    pub fn take_err(&mut self) -> Option<io::Error> {
        self.err.take()
    }
}

impl<W> fmt::Write for Writer<W>
where
    W: io::Write,
{
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.writer.write_all(s.as_bytes()).map_err(|e| {
            self.err = Some(e);
            fmt::Error
        })
    }

    #[inline]
    fn write_char(&mut self, c: char) -> fmt::Result {
        self.writer
            .write_all(c.encode_utf8(&mut [0; 4]).as_bytes())
            .map_err(|e| {
                self.err = Some(e);
                fmt::Error
            })
    }
}

/// Why a value could not be written.
#[derive(Debug)]
pub(crate) enum FormatError {
    /// The value has no textual form.
    Unrenderable(String),
    /// The sink failed.
    Write(fmt::Error),
}

impl From<fmt::Error> for FormatError {
    fn from(err: fmt::Error) -> Self {
        Self::Write(err)
    }
}

/// Writes a value to the output.
///
/// Values are formatted as follows:
/// - [`Value::None`]: empty string
/// - [`Value::Bool`]: `true` or `false`
/// - [`Value::Integer`]: the integer formatted using [`Display`][std::fmt::Display]
/// - [`Value::Float`]: the float formatted using [`Display`][std::fmt::Display]
/// - [`Value::String`]: the string, unescaped
///
/// Lists, maps, records and objects have no textual form.
pub(crate) fn write_value(f: &mut dyn Write, value: &Value) -> Result<(), FormatError> {
    match value {
        Value::None => {}
        Value::Bool(b) => write!(f, "{b}")?,
        Value::Integer(n) => write!(f, "{n}")?,
        Value::Float(n) => write!(f, "{n}")?,
        Value::String(s) => f.write_str(s)?,
        value => return Err(FormatError::Unrenderable(value.type_name())),
    }
    Ok(())
}
