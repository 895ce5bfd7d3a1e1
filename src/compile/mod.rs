//! Compile the template source into an optimized AST.
//!
//! This process has three stages:
//! - The lexer chunks the template source into tokens.
//! - The parser constructs an AST from the token stream.
//! - The optimizer folds constant conditionals and cleans up literal text.

mod lex;
mod optimize;
mod parse;

use crate::types::ast;
use crate::types::syntax::Syntax;
use crate::Result;

/// Compile a template source into an optimized AST.
pub fn template(syntax: &Syntax, name: &str, source: &str) -> Result<ast::Sequence> {
    let raw = parse::Parser::new(syntax, source)
        .parse_template()
        .map_err(|err| err.with_template_name(name))?;
    let (root, stats) = optimize::optimize(raw);
    tracing::debug!(
        template = name,
        nodes = root.count(),
        folded = stats.folded,
        merged = stats.merged,
        elided = stats.elided,
        "compiled template"
    );
    Ok(root)
}
