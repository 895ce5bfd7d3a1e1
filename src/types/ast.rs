//! AST representing a compiled template.
//!
//! Every type here has a bracketed [`Display`][fmt::Display] form which is
//! only meant for debugging and error messages.

use std::fmt;

use crate::types::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(Text),
    IfElse(IfElse),
    Range(Range),
    With(With),
    Block(Block),
    Expr(Expr),
}

/// A run of raw template text.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfElse {
    pub cond: Expr,
    pub then_branch: Sequence,
    pub else_branch: Option<Sequence>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    pub selector: Selector,
    pub vars: LoopVars,
    pub body: Sequence,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoopVars {
    Item(Ident),
    KeyValue(KeyValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub key: Ident,
    pub value: Ident,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct With {
    pub selector: Selector,
    pub body: Sequence,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub name: Ident,
    pub body: Sequence,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Integer(i64, Span),
    Float(f64, Span),
    String(String, Span),
    Selector(Selector),
    Call(Call),
}

/// A path expression, e.g. `.user.name`, `/.site.title` or `$$.index`.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub anchor: Anchor,
    pub path: Vec<Ident>,
    pub span: Span,
}

/// Where a selector starts navigating from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Start at the root of the data.
    Root,
    /// Start this many items back from the current path, zero means the
    /// current value.
    Pop(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: Ident,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Sequence {
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of nodes in this sequence and all nested sequences.
    pub fn count(&self) -> usize {
        self.nodes.iter().map(Node::count).sum()
    }
}

impl Node {
    fn count(&self) -> usize {
        1 + match self {
            Node::IfElse(if_else) => {
                if_else.then_branch.count()
                    + if_else.else_branch.as_ref().map_or(0, Sequence::count)
            }
            Node::Range(range) => range.body.count(),
            Node::With(with) => with.body.count(),
            Node::Block(block) => block.body.count(),
            Node::Text(_) | Node::Expr(_) => 0,
        }
    }
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Integer(_, span) | Expr::Float(_, span) | Expr::String(_, span) => *span,
            Expr::Selector(sel) => sel.span,
            Expr::Call(call) => call.span,
        }
    }

    /// Returns the truthiness of this expression if it is a literal.
    pub fn const_truth(&self) -> Option<bool> {
        match self {
            Expr::Integer(i, _) => Some(*i != 0),
            Expr::Float(f, _) => Some(*f != 0.0),
            Expr::String(s, _) => Some(!s.is_empty()),
            Expr::Selector(_) | Expr::Call(_) => None,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Diagnostic forms
////////////////////////////////////////////////////////////////////////////////

/// Writes the display form of `item` indented by one tab.
fn indented(f: &mut fmt::Formatter<'_>, item: &dyn fmt::Display) -> fmt::Result {
    let s = item.to_string();
    write!(f, "\n\t{}", s.replace('\n', "\n\t"))
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[list")?;
        for node in &self.nodes {
            indented(f, node)?;
        }
        f.write_str("\n]")
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(text) => write!(f, "[text {:?}]", text.text),
            Node::IfElse(if_else) => {
                write!(f, "[if {}", if_else.cond)?;
                indented(f, &if_else.then_branch)?;
                if let Some(else_branch) = &if_else.else_branch {
                    indented(f, else_branch)?;
                }
                f.write_str("\n]")
            }
            Node::Range(range) => {
                write!(f, "[range {} as {}", range.selector, range.vars)?;
                indented(f, &range.body)?;
                f.write_str("\n]")
            }
            Node::With(with) => {
                write!(f, "[with {}", with.selector)?;
                indented(f, &with.body)?;
                f.write_str("\n]")
            }
            Node::Block(block) => {
                write!(f, "[block {}", block.name.name)?;
                indented(f, &block.body)?;
                f.write_str("\n]")
            }
            Node::Expr(expr) => write!(f, "{expr}"),
        }
    }
}

impl fmt::Display for LoopVars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopVars::Item(item) => f.write_str(&item.name),
            LoopVars::KeyValue(kv) => write!(f, "{}, {}", kv.key.name, kv.value.name),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Integer(i, _) => write!(f, "[int {i}]"),
            Expr::Float(n, _) => write!(f, "[float {n:.6}]"),
            Expr::String(s, _) => write!(f, "[constant {s:?}]"),
            Expr::Selector(sel) => write!(f, "{sel}"),
            Expr::Call(call) => {
                write!(f, "[call {}", call.name.name)?;
                for arg in &call.args {
                    write!(f, " {arg}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.anchor {
            Anchor::Root => f.write_str("[selector /")?,
            Anchor::Pop(pops) => write!(f, "[selector ${pops}")?,
        }
        for ident in &self.path {
            write!(f, " {}", ident.name)?;
        }
        f.write_str("]")
    }
}
