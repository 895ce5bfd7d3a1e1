use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};

use crate::functions::FunctionFn;
use crate::render::path::{access, join, AccessError, Path};
use crate::types::ast;
use crate::value::ValueCow;
use crate::{Template, Value};

pub(crate) type Functions<'a> = BTreeMap<&'a str, Box<FunctionFn>>;

/// The mutable state of a single render.
///
/// A context holds the current [`Path`] into the host data, the registry of
/// named blocks, the host functions of the engine and the override table of
/// synthetic bindings. It is created with
/// [`Engine::context`][crate::Engine::context] and passed to
/// [`Template::execute`][crate::Template::execute]. A context is not meant to
/// be shared between concurrent renders.
///
/// # Examples
///
/// ```
/// use tmpl::{Engine, Value};
///
/// let engine = Engine::new();
/// let base = engine.compile_named("base", "<{% block title %}none{% end block %}>")?;
/// let page = engine.compile_named("page", "{% block title %}home{% end block %}")?;
///
/// let data = Value::None;
/// let mut ctx = engine.context(&data);
/// ctx.define_blocks(&page);
///
/// let mut out = Vec::new();
/// base.execute(&mut out, &mut ctx)?;
/// assert_eq!(out, b"<home>");
/// # Ok::<(), tmpl::Error>(())
/// ```
pub struct Context<'a> {
    path: Path<'a>,
    blocks: BTreeMap<String, BlockDef<'a>>,
    backup: BTreeMap<String, BlockDef<'a>>,
    functions: &'a Functions<'a>,
    overrides: HashMap<String, ValueCow<'a>>,
}

/// A registered block: its content and the template it came from.
#[derive(Debug, Clone)]
pub(crate) struct BlockDef<'a> {
    pub content: &'a ast::Sequence,
    pub source: &'a str,
    pub file: String,
}

/// Restores the block registry of a [`Context`] when dropped.
///
/// Created with [`Context::block_scope`].
pub struct BlockScope<'c, 'a> {
    ctx: &'c mut Context<'a>,
    saved: BTreeMap<String, BlockDef<'a>>,
}

/// Restores the override table entries it replaced when dropped.
pub(crate) struct Binding<'c, 'a> {
    ctx: &'c mut Context<'a>,
    saved: Vec<(String, Option<ValueCow<'a>>)>,
}

/// Restores the path it replaced when dropped.
pub(crate) struct PathGuard<'c, 'a> {
    ctx: &'c mut Context<'a>,
    saved: Path<'a>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(data: &'a Value, functions: &'a Functions<'a>) -> Self {
        Self {
            path: Path::new(data),
            blocks: BTreeMap::new(),
            backup: BTreeMap::new(),
            functions,
            overrides: HashMap::new(),
        }
    }

    /// Returns the current path.
    #[inline]
    pub fn path(&self) -> &Path<'a> {
        &self.path
    }

    /// Binds a value at the given rendered path, e.g. `/.user.name`.
    ///
    /// Bindings take precedence over the host data.
    pub fn set_at(&mut self, path: impl Into<String>, value: impl Into<Value>) {
        self.overrides
            .insert(path.into(), ValueCow::Owned(value.into()));
    }

    /// Removes a binding made with [`set_at`][Context::set_at], returning its
    /// value.
    pub fn unset_at(&mut self, path: &str) -> Option<Value> {
        self.overrides.remove(path).map(ValueCow::into_owned)
    }

    /// Tags every registered block as coming from the named template.
    pub fn set_file(&mut self, name: &str) {
        for def in self.blocks.values_mut() {
            def.file = name.to_owned();
        }
    }

    /// Snapshots the block registry.
    pub fn dup(&mut self) {
        self.backup = self.blocks.clone();
    }

    /// Reinstates the block registry saved by the last [`dup`][Context::dup].
    pub fn restore(&mut self) {
        self.blocks = self.backup.clone();
    }

    /// Returns a guard that restores the block registry when dropped.
    pub fn block_scope(&mut self) -> BlockScope<'_, 'a> {
        let saved = self.blocks.clone();
        BlockScope { ctx: self, saved }
    }

    /// Registers every block defined in the template that is not already
    /// registered.
    ///
    /// A base template rendered afterwards executes these blocks in place of
    /// its own blocks with the same name.
    pub fn define_blocks(&mut self, template: &'a Template<'_>) {
        self.collect_blocks(&template.root, &template.source, &template.name);
    }

    fn collect_blocks(&mut self, seq: &'a ast::Sequence, source: &'a str, file: &str) {
        for node in &seq.nodes {
            match node {
                ast::Node::Block(block) => {
                    let def = BlockDef {
                        content: &block.body,
                        source,
                        file: file.to_owned(),
                    };
                    self.register_block(&block.name.name, def);
                }
                ast::Node::IfElse(if_else) => {
                    self.collect_blocks(&if_else.then_branch, source, file);
                    if let Some(branch) = &if_else.else_branch {
                        self.collect_blocks(branch, source, file);
                    }
                }
                ast::Node::Range(range) => self.collect_blocks(&range.body, source, file),
                ast::Node::With(with) => self.collect_blocks(&with.body, source, file),
                ast::Node::Text(_) | ast::Node::Expr(_) => {}
            }
        }
    }

    pub(crate) fn register_block(&mut self, name: &str, def: BlockDef<'a>) {
        if self.blocks.contains_key(name) {
            return;
        }
        tracing::trace!(block = name, file = %def.file, "registered block");
        self.blocks.insert(name.to_owned(), def);
    }

    pub(crate) fn block(&self, name: &str) -> Option<&BlockDef<'a>> {
        self.blocks.get(name)
    }

    pub(crate) fn function(&self, name: &str) -> Option<&'a FunctionFn> {
        self.functions.get(name).map(|f| &**f)
    }

    /// Computes the value of a selector without moving the path.
    pub(crate) fn value_for(&self, sel: &ast::Selector) -> Result<ValueCow<'a>, AccessError> {
        let base = self.base(sel)?;
        let mut path = self.path.string_upto(base);
        let mut value = self.path.items()[base - 1].value.clone();
        for ident in &sel.path {
            value = access(&path, &value, &ident.name, &self.overrides)?;
            path = join(&path, &ident.name);
        }
        Ok(value)
    }

    /// Moves the path to the value of a selector until the guard is dropped.
    ///
    /// The path is left untouched if the selector cannot be resolved.
    pub(crate) fn cd(&mut self, sel: &ast::Selector) -> Result<PathGuard<'_, 'a>, AccessError> {
        let base = self.base(sel)?;
        let mut path = self.path.prefix(base);
        for ident in &sel.path {
            let value = access(
                &path.to_string(),
                path.value(),
                &ident.name,
                &self.overrides,
            )?;
            path.push(ident.name.as_str(), value);
        }
        let saved = mem::replace(&mut self.path, path);
        Ok(PathGuard { ctx: self, saved })
    }

    /// Binds values in the override table until the guard is dropped.
    pub(crate) fn bind(&mut self, bindings: Vec<(String, ValueCow<'a>)>) -> Binding<'_, 'a> {
        let saved = bindings
            .into_iter()
            .map(|(key, value)| {
                let prev = self.overrides.insert(key.clone(), value);
                (key, prev)
            })
            .collect();
        Binding { ctx: self, saved }
    }

    fn base(&self, sel: &ast::Selector) -> Result<usize, AccessError> {
        match sel.anchor {
            ast::Anchor::Root => Ok(1),
            ast::Anchor::Pop(pops) => self.path.pop_len(pops),
        }
    }
}

impl fmt::Display for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[context {}", self.path)?;
        for (name, def) in &self.blocks {
            write!(f, "\n\t[block {name} {}]", def.file)?;
        }
        f.write_str("\n]")
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("path", &self.path.to_string())
            .field("blocks", &self.blocks.keys())
            .field("functions", &self.functions.keys())
            .field("overrides", &self.overrides.keys())
            .finish()
    }
}

impl Drop for BlockScope<'_, '_> {
    fn drop(&mut self) {
        self.ctx.blocks = mem::take(&mut self.saved);
    }
}

impl Drop for Binding<'_, '_> {
    fn drop(&mut self) {
        for (key, prev) in self.saved.drain(..).rev() {
            match prev {
                Some(value) => self.ctx.overrides.insert(key, value),
                None => self.ctx.overrides.remove(&key),
            };
        }
    }
}

impl Drop for PathGuard<'_, '_> {
    fn drop(&mut self) {
        mem::swap(&mut self.ctx.path, &mut self.saved);
    }
}

macro_rules! impl_deref {
    ($($guard:ident)+) => {
        $(
            impl<'a> Deref for $guard<'_, 'a> {
                type Target = Context<'a>;

                fn deref(&self) -> &Self::Target {
                    self.ctx
                }
            }

            impl<'a> DerefMut for $guard<'_, 'a> {
                fn deref_mut(&mut self) -> &mut Self::Target {
                    self.ctx
                }
            }
        )+
    };
}

impl_deref! { BlockScope Binding PathGuard }

#[cfg(test)]
mod tests {
    use super::*;

    use crate::types::ast::{Anchor, Ident, Selector};
    use crate::types::span::Span;

    const SP: Span = Span { m: 0, n: 0 };

    fn sel(anchor: Anchor, path: &[&str]) -> Selector {
        Selector {
            anchor,
            path: path
                .iter()
                .map(|name| Ident {
                    name: (*name).to_owned(),
                    span: SP,
                })
                .collect(),
            span: SP,
        }
    }

    fn data() -> Value {
        crate::value!({
            site: { title: "Home" },
            user: { name: "John", tags: ["a", "b"] },
        })
    }

    #[test]
    fn value_for_does_not_move_path() {
        let data = data();
        let functions = Functions::new();
        let ctx = Context::new(&data, &functions);
        let v = ctx.value_for(&sel(Anchor::Pop(0), &["user", "name"])).unwrap();
        assert_eq!(*v, Value::from("John"));
        assert!(ctx.path().is_root());
    }

    #[test]
    fn value_for_empty_selector_is_current_value() {
        let data = data();
        let functions = Functions::new();
        let ctx = Context::new(&data, &functions);
        let v = ctx.value_for(&sel(Anchor::Pop(0), &[])).unwrap();
        assert_eq!(*v, data);
        let v = ctx.value_for(&sel(Anchor::Root, &[])).unwrap();
        assert_eq!(*v, data);
    }

    #[test]
    fn cd_moves_and_restores_path() {
        let data = data();
        let functions = Functions::new();
        let mut ctx = Context::new(&data, &functions);
        {
            let mut user = ctx.cd(&sel(Anchor::Pop(0), &["user"])).unwrap();
            assert_eq!(user.path().to_string(), "/.user");

            let name = user.value_for(&sel(Anchor::Pop(0), &["name"])).unwrap();
            assert_eq!(*name, Value::from("John"));

            let title = user.value_for(&sel(Anchor::Pop(1), &["site", "title"])).unwrap();
            assert_eq!(*title, Value::from("Home"));

            let tags = user.cd(&sel(Anchor::Pop(0), &["tags"])).unwrap();
            assert_eq!(tags.path().to_string(), "/.user.tags");
            let root = tags.value_for(&sel(Anchor::Root, &["site", "title"])).unwrap();
            assert_eq!(*root, Value::from("Home"));
        }
        assert!(ctx.path().is_root());
    }

    #[test]
    fn cd_failure_leaves_path() {
        let data = data();
        let functions = Functions::new();
        let mut ctx = Context::new(&data, &functions);
        let mut user = ctx.cd(&sel(Anchor::Pop(0), &["user"])).unwrap();
        let err = user.cd(&sel(Anchor::Pop(0), &["missing"])).err().unwrap();
        assert_eq!(err.to_string(), "field not found at `/.user.missing`");
        let err = user.cd(&sel(Anchor::Pop(2), &[])).err().unwrap();
        assert_eq!(err.to_string(), "cannot pop 2 items from path `/.user`");
        assert_eq!(user.path().to_string(), "/.user");
    }

    #[test]
    fn bind_restores_previous_entries() {
        let data = data();
        let functions = Functions::new();
        let mut ctx = Context::new(&data, &functions);
        ctx.set_at("/.x", 1);
        {
            let b = ctx.bind(vec![
                ("/.x".into(), ValueCow::Owned(Value::from(2))),
                ("/.y".into(), ValueCow::Owned(Value::from(3))),
            ]);
            let x = b.value_for(&sel(Anchor::Pop(0), &["x"])).unwrap();
            assert_eq!(*x, Value::from(2));
        }
        assert_eq!(ctx.unset_at("/.x"), Some(Value::from(1)));
        assert_eq!(ctx.unset_at("/.y"), None);
    }

    #[test]
    fn overrides_shadow_data() {
        let data = data();
        let functions = Functions::new();
        let mut ctx = Context::new(&data, &functions);
        ctx.set_at("/.user.name", "Jane");
        let v = ctx.value_for(&sel(Anchor::Pop(0), &["user", "name"])).unwrap();
        assert_eq!(*v, Value::from("Jane"));
    }

    #[test]
    fn dup_and_restore_blocks() {
        let data = data();
        let functions = Functions::new();
        let content = ast::Sequence::new();
        let mut ctx = Context::new(&data, &functions);
        let def = |file: &str| BlockDef {
            content: &content,
            source: "",
            file: file.to_owned(),
        };
        ctx.register_block("a", def("one"));
        ctx.dup();
        ctx.register_block("b", def("one"));
        ctx.register_block("a", def("two"));
        ctx.set_file("three");
        assert_eq!(ctx.block("a").unwrap().file, "three");
        ctx.restore();
        assert_eq!(ctx.block("a").unwrap().file, "one");
        assert!(ctx.block("b").is_none());
    }

    #[test]
    fn block_scope_restores_on_drop() {
        let data = data();
        let functions = Functions::new();
        let content = ast::Sequence::new();
        let mut ctx = Context::new(&data, &functions);
        {
            let mut scope = ctx.block_scope();
            scope.register_block(
                "a",
                BlockDef {
                    content: &content,
                    source: "",
                    file: "x".into(),
                },
            );
            assert!(scope.block("a").is_some());
        }
        assert!(ctx.block("a").is_none());
    }

    #[test]
    fn context_display() {
        let data = data();
        let functions = Functions::new();
        let content = ast::Sequence::new();
        let mut ctx = Context::new(&data, &functions);
        ctx.register_block(
            "foo",
            BlockDef {
                content: &content,
                source: "",
                file: "base".into(),
            },
        );
        let user = ctx.cd(&sel(Anchor::Pop(0), &["user"])).unwrap();
        assert_eq!(user.to_string(), "[context /.user\n\t[block foo base]\n]");
    }
}
