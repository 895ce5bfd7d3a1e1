use std::cmp::max;
use std::fmt;
use std::io;
use std::sync::Arc;

use crate::types::span::Span;

/// An error that can occur during template compilation or rendering.
#[derive(Clone)]
pub struct Error {
    kind: ErrorKind,
    msg: String,
    name: Option<String>,
    pretty: Option<(String, Span)>,
    source: Option<Arc<io::Error>>,
}

/// The kind of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed template syntax, raised during compilation.
    Syntax,
    /// A value could not be resolved or rendered.
    Render,
    /// A function call failed.
    Call,
    /// Writing to the output failed.
    Io,
    /// The host data could not be converted into a [`Value`][crate::Value].
    Serialize,
}

impl Error {
    fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            msg: msg.into(),
            name: None,
            pretty: None,
            source: None,
        }
    }

    fn spanned(kind: ErrorKind, msg: impl Into<String>, source: &str, span: impl Into<Span>) -> Self {
        Self {
            pretty: Some((source.to_owned(), span.into())),
            ..Self::new(kind, msg)
        }
    }

    /// Constructs a new syntax error.
    pub(crate) fn syntax(msg: impl Into<String>, source: &str, span: impl Into<Span>) -> Self {
        Self::spanned(ErrorKind::Syntax, msg, source, span)
    }

    /// Constructs a new render error.
    pub(crate) fn render(msg: impl Into<String>, source: &str, span: impl Into<Span>) -> Self {
        Self::spanned(ErrorKind::Render, msg, source, span)
    }

    /// Constructs a new function call error.
    pub(crate) fn call(msg: impl Into<String>, source: &str, span: impl Into<Span>) -> Self {
        Self::spanned(ErrorKind::Call, msg, source, span)
    }

    /// Attaches the template name, keeping the innermost one if already set.
    ///
    /// Unnamed templates have an empty name. It is still attached so that an
    /// enclosing template does not claim the error, but it is never shown.
    pub(crate) fn with_template_name(mut self, name: &str) -> Self {
        if self.name.is_none() {
            self.name = Some(name.to_owned());
        }
        self
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the name of the template this error occurred in, if known.
    #[inline]
    pub fn template_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }

    /// Returns the error message without any source location.
    #[inline]
    pub fn message(&self) -> &str {
        &self.msg
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self {
            source: Some(Arc::new(err)),
            ..Self::new(ErrorKind::Io, "failed to write to output")
        }
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Self::new(ErrorKind::Io, "failed to write to output")
    }
}

#[cfg(feature = "serde")]
impl serde::ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Self::new(ErrorKind::Serialize, msg.to_string())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pretty {
            Some((source, span)) => fmt_pretty(&self.msg, self.template_name(), source, *span, f),
            None => fmt::Display::fmt(self, f),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pretty {
            Some((source, span)) => {
                if f.alternate() {
                    fmt_pretty(&self.msg, self.template_name(), source, *span, f)
                } else {
                    if let Some(name) = self.template_name() {
                        write!(f, "{name}: ")?;
                    }
                    write!(f, "{} between bytes {} and {}", self.msg, span.m, span.n)
                }
            }
            None => {
                write!(f, "{}", self.msg)?;
                if let Some(err) = &self.source {
                    write!(f, ": {err}")?;
                }
                Ok(())
            }
        }
    }
}

fn fmt_pretty(
    msg: &str,
    name: Option<&str>,
    source: &str,
    span: Span,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    let (line, col, code) = to_line_col(source, span.m);
    let width = max(1, str_width(&source[span]));

    let num = (line + 1).to_string();
    let pad = str_width(&num);
    let pipe = "|";
    let underline = "^".repeat(width);

    f.write_str("\n")?;
    if let Some(name) = name {
        writeln!(f, "{0:pad$}--> {name}:{line}:{col}", "", line = line + 1, col = col + 1)?;
    }
    write!(
        f,
        " \
        {0:pad$} {pipe}\n \
        {num:>} {pipe} {code}\n \
        {0:pad$} {pipe} {underline:>width$} {msg}\n",
        "",
        pad = pad,
        pipe = pipe,
        num = num,
        code = code,
        underline = underline,
        width = col + width,
        msg = msg
    )
}

/// Returns the zero based line and display column of a byte offset, along
/// with the text of that line.
fn to_line_col(source: &str, offset: usize) -> (usize, usize, &str) {
    let mut start = 0;
    let mut last = (0, "");
    for (i, line) in source.split_terminator('\n').enumerate() {
        let end = start + line.len();
        if offset <= end {
            return (i, str_width(&line[..offset - start]), line);
        }
        last = (i, line);
        start = end + 1;
    }
    let (i, line) = last;
    (i, str_width(line), line)
}

#[cfg(feature = "unicode")]
fn str_width(s: &str) -> usize {
    unicode_width::UnicodeWidthStr::width(s)
}

#[cfg(not(feature = "unicode"))]
fn str_width(s: &str) -> usize {
    s.chars().count()
}
