//! A small template engine with selectors, blocks and host functions.
//!
//! # Features
//!
//! ### Syntax
//!
//! - Expressions: `{% .user.name %}`
//! - Conditionals: `{% if .user.enabled %} ... {% else %} ... {% end if %}`
//! - Loops: `{% range .users as user %} ... {% end range %}`
//! - Scoped data: `{% with .user %}{% .name %}{% end with %}`
//! - Overridable blocks: `{% block title %} ... {% end block %}`
//! - Host functions: `{% call greet .user.name %}`
//! - Configurable delimiters: `<% .user.name %>`
//!
//! ### Engine
//!
//! - Constant conditions and literal text are folded at compile time
//! - Render to a [`String`] or any [`std::io::Write`] implementor
//! - Render using any [`serde`] serializable values
//! - Lazily resolved host objects through the [`FieldAccess`] trait
//! - Panics in host code abort only the render with an error
//!
//! # Getting started
//!
//! Your entry point is the [`Engine`] struct. The engine stores the syntax
//! config and the host functions. Generally, you only need to construct one
//! engine during the lifetime of a program.
//!
//! ```
//! let engine = tmpl::Engine::new();
//! ```
//!
//! Next, [`.compile`][Engine::compile] is used to compile a template.
//!
//! ```
//! # let engine = tmpl::Engine::new();
//! let template = engine.compile("Hello {% .user.name %}!")?;
//! # Ok::<(), tmpl::Error>(())
//! ```
//!
//! Finally, the template is rendered using [`.render`][Template::render].
//!
//! ```
//! # let engine = tmpl::Engine::new();
//! # let template = engine.compile("Hello {% .user.name %}!")?;
//! let result = template.render(tmpl::value!({ user: { name: "John Smith" } }))?;
//! assert_eq!(result, "Hello John Smith!");
//! # Ok::<(), tmpl::Error>(())
//! ```
//!
//! # Selectors
//!
//! A selector names a value relative to the current position in the data.
//! `.` is the current value and `.a.b` looks up `a` and then `b` on it. `/`
//! starts at the root of the data and every `$` steps one level back up
//! before looking up the rest.
//!
//! ```
//! let result = tmpl::Engine::new()
//!     .compile("{% with .user %}{% .name %} of {% $.site %}{% end with %}")?
//!     .render(tmpl::value!({ site: "example.org", user: { name: "John" } }))?;
//!
//! assert_eq!(result, "John of example.org");
//! # Ok::<(), tmpl::Error>(())
//! ```
//!
//! # Examples
//!
//! ### Render using structured data
//!
//! ```
//! #[derive(serde::Serialize)]
//! struct Data { users: Vec<User> }
//!
//! #[derive(serde::Serialize)]
//! struct User { name: String }
//!
//! let data = Data {
//!     users: vec![User { name: "John".into() }, User { name: "Jane".into() }],
//! };
//!
//! let result = tmpl::Engine::new()
//!     .compile("{% range .users as user %}<{% .user.name %}>{% end range %}")?
//!     .render(&data)?;
//!
//! assert_eq!(result, "<John><Jane>");
//! # Ok::<(), tmpl::Error>(())
//! ```
//!
//! ### Call host functions
//!
//! ```
//! let mut engine = tmpl::Engine::new();
//! engine.add_function("lower", |s: String| s.to_lowercase());
//!
//! let result = engine
//!     .compile("Hello {% call lower .value %}")?
//!     .render(tmpl::value!({ value: "WORLD!" }))?;
//!
//! assert_eq!(result, "Hello world!");
//! # Ok::<(), tmpl::Error>(())
//! ```
//!
//! See the [`Function`] trait documentation for more information.
//!
//! ### Override blocks of a base template
//!
//! ```
//! let engine = tmpl::Engine::new();
//! let base = engine.compile_named(
//!     "base",
//!     "<h1>{% block title %}Untitled{% end block %}</h1>",
//! )?;
//! let page = engine.compile_named("page", "{% block title %}{% .title %}{% end block %}")?;
//!
//! let result = base.render_extended(&page, tmpl::value!({ title: "Home" }))?;
//! assert_eq!(result, "<h1>Home</h1>");
//! # Ok::<(), tmpl::Error>(())
//! ```
//!
//! ### Render a template using custom syntax
//!
//! ```
//! let syntax = tmpl::Syntax::builder().directive("<%", "%>").build();
//!
//! let result = tmpl::Engine::with_syntax(syntax)
//!     .compile("Hello <% .user.name %>")?
//!     .render(tmpl::value!({ user: { name: "John Smith" } }))?;
//!
//! assert_eq!(result, "Hello John Smith");
//! # Ok::<(), tmpl::Error>(())
//! ```
//!
//! ### Render a template to an `impl io::Write`
//!
//! ```
//! use std::io;
//!
//! let stdout = io::BufWriter::new(io::stdout());
//!
//! tmpl::Engine::new()
//!     .compile("Hello {% .user.name %}")?
//!     .render_to_writer(stdout, tmpl::value!({ user: { name: "John Smith" } }))?;
//! # Ok::<(), tmpl::Error>(())
//! ```

mod compile;
mod error;
mod fmt;
mod functions;
mod macros;
mod render;
mod types;
mod value;

use std::io;

pub use crate::error::{Error, ErrorKind};
pub use crate::functions::{Function, FunctionArg, FunctionArgs, FunctionReturn};
pub use crate::render::{BlockScope, Context, Path};
pub use crate::types::syntax::{Syntax, SyntaxBuilder};
#[cfg(feature = "serde")]
pub use crate::value::to_value;
pub use crate::value::{FieldAccess, List, Map, Object, Record, Value};

use crate::render::Functions;
use crate::types::ast;

/// A type alias for results in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The compilation and rendering engine.
pub struct Engine<'engine> {
    syntax: Syntax,
    functions: Functions<'engine>,
}

/// A compiled template.
pub struct Template<'engine> {
    engine: &'engine Engine<'engine>,
    name: String,
    source: String,
    root: ast::Sequence,
}

impl<'engine> Default for Engine<'engine> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<'engine> Engine<'engine> {
    /// Construct a new engine.
    #[inline]
    pub fn new() -> Self {
        Self::with_syntax(Syntax::default())
    }

    /// Construct a new engine with custom syntax.
    ///
    /// # Examples
    ///
    /// ```
    /// use tmpl::{Engine, Syntax};
    ///
    /// let syntax = Syntax::builder().directive("<[", "]>").build();
    /// let engine = Engine::with_syntax(syntax);
    /// ```
    #[inline]
    pub fn with_syntax(syntax: Syntax) -> Self {
        Self {
            syntax,
            functions: Functions::new(),
        }
    }

    /// Add a new host function to the engine.
    ///
    /// A function registered under an existing name replaces it.
    #[inline]
    pub fn add_function<F, R, A>(&mut self, name: &'engine str, f: F)
    where
        F: Function<R, A> + Send + Sync + 'static,
        R: FunctionReturn,
        A: FunctionArgs,
    {
        self.functions.insert(name, functions::new(f));
    }

    /// Add a new host function taking any number of arguments.
    ///
    /// # Examples
    ///
    /// ```
    /// use tmpl::{Engine, Value};
    ///
    /// let mut engine = Engine::new();
    /// engine.add_variadic_function("count", |args: Vec<Value>| args.len() as i64);
    ///
    /// let result = engine.compile("{% call count 1, 2, 3 %}")?.render_from(&Value::None)?;
    /// assert_eq!(result, "3");
    /// # Ok::<(), tmpl::Error>(())
    /// ```
    #[inline]
    pub fn add_variadic_function<F, R>(&mut self, name: &'engine str, f: F)
    where
        F: Fn(Vec<Value>) -> R + Send + Sync + 'static,
        R: FunctionReturn,
    {
        self.functions.insert(name, functions::new_variadic(f));
    }

    /// Compile an unnamed template.
    #[inline]
    pub fn compile(&self, source: impl Into<String>) -> Result<Template<'_>> {
        self.compile_named("", source)
    }

    /// Compile a template with a name.
    ///
    /// The name is attached to errors raised by the template and tags the
    /// blocks it defines.
    pub fn compile_named(
        &self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Template<'_>> {
        let name = name.into();
        let source = source.into();
        let root = compile::template(&self.syntax, &name, &source)?;
        Ok(Template {
            engine: self,
            name,
            source,
            root,
        })
    }

    /// Construct a fresh render context over the given data.
    #[inline]
    pub fn context<'a>(&'a self, data: &'a Value) -> Context<'a> {
        Context::new(data, &self.functions)
    }
}

impl std::fmt::Debug for Engine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("syntax", &self.syntax)
            .field("functions", &self.functions.keys())
            .finish()
    }
}

impl<'engine> Template<'engine> {
    /// Render the template to a string using the provided value.
    #[cfg(feature = "serde")]
    #[inline]
    pub fn render<S>(&self, data: S) -> Result<String>
    where
        S: serde::Serialize,
    {
        self.render_from(&to_value(data)?)
    }

    /// Render the template to a string using the provided [`Value`].
    #[inline]
    pub fn render_from(&self, data: &Value) -> Result<String> {
        let mut ctx = self.engine.context(data);
        render::to_string(self, &mut ctx)
    }

    /// Render the template to a writer using the provided value.
    #[cfg(feature = "serde")]
    #[inline]
    pub fn render_to_writer<W, S>(&self, writer: W, data: S) -> Result<()>
    where
        W: io::Write,
        S: serde::Serialize,
    {
        self.render_from_to_writer(writer, &to_value(data)?)
    }

    /// Render the template to a writer using the provided [`Value`].
    #[inline]
    pub fn render_from_to_writer<W>(&self, writer: W, data: &Value) -> Result<()>
    where
        W: io::Write,
    {
        let mut ctx = self.engine.context(data);
        render::to_writer(self, writer, &mut ctx)
    }

    /// Render this template as the base of `child`.
    ///
    /// Every block defined in `child` replaces the block with the same name in
    /// this template. Blocks that `child` does not define render their own
    /// content.
    #[cfg(feature = "serde")]
    #[inline]
    pub fn render_extended<S>(&self, child: &Template<'_>, data: S) -> Result<String>
    where
        S: serde::Serialize,
    {
        self.render_extended_from(child, &to_value(data)?)
    }

    /// Render this template as the base of `child` using the provided
    /// [`Value`].
    pub fn render_extended_from(&self, child: &Template<'_>, data: &Value) -> Result<String> {
        let mut ctx = self.engine.context(data);
        let mut scope = ctx.block_scope();
        scope.define_blocks(child);
        render::to_string(self, &mut scope)
    }

    /// Execute the template with a caller supplied context.
    ///
    /// This is the low level form of rendering. The context keeps the blocks
    /// registered by this execution so that it can be reused for further
    /// templates.
    #[inline]
    pub fn execute<'a, W>(&'a self, writer: W, ctx: &mut Context<'a>) -> Result<()>
    where
        W: io::Write,
    {
        render::to_writer(self, writer, ctx)
    }

    /// Returns the name of the template, empty if it was compiled unnamed.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the original template source.
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Debug for Template<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for Template<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.root, f)
    }
}
