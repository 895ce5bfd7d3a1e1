use std::fmt::Display;

use crate::compile::lex::{Token, TokenKind, TokenStream};
use crate::types::ast;
use crate::types::span::Span;
use crate::types::syntax::Syntax;
use crate::{Error, Result};

/// A parser that constructs an AST from a token stream.
///
/// The parser is a hand written recursive descent parser with one rule per
/// directive keyword. It does no error recovery, the first error aborts the
/// parse. It sometimes needs to look at the next token to know how to proceed
/// and uses [`peek`][TokenStream::peek] and [`backup`][TokenStream::backup]
/// for this.
pub struct Parser<'syntax, 'source> {
    /// The tokens of the template source.
    tokens: TokenStream<'syntax, 'source>,

    /// Whether we are currently within a `block` body.
    in_block: bool,
}

/// What ended a sequence of nodes.
enum Stop {
    /// The end of the template.
    Eof,
    /// An `{% else %}` directive.
    Else(Span),
    /// An `{% end <kind> %}` directive.
    End(EndKind, Span),
}

/// The kind of construct an `end` directive closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndKind {
    If,
    Range,
    With,
    Block,
}

/// A parsed directive.
enum Directive {
    Node(ast::Node),
    Else(Span),
    End(EndKind, Span),
}

impl<'syntax, 'source> Parser<'syntax, 'source> {
    /// Construct a new parser.
    pub fn new(syntax: &'syntax Syntax, source: &'source str) -> Self {
        Self {
            tokens: TokenStream::new(syntax, source),
            in_block: false,
        }
    }

    /// Parses a template.
    pub fn parse_template(mut self) -> Result<ast::Sequence> {
        let (seq, stop) = self.parse_sequence()?;
        match stop {
            Stop::Eof => Ok(seq),
            Stop::Else(span) => Err(self.err_unexpected_directive("else", span)),
            Stop::End(kind, span) => {
                Err(self.err_unexpected_directive(format!("end {}", kind.human()), span))
            }
        }
    }

    /// Parses literal text and directives until an `else`, an `end` or the
    /// end of the template.
    fn parse_sequence(&mut self) -> Result<(ast::Sequence, Stop)> {
        let mut nodes = Vec::new();
        loop {
            let tk = self.next()?;
            match tk.kind {
                TokenKind::Text => {
                    let text = self.source()[tk.span].to_owned();
                    nodes.push(ast::Node::Text(ast::Text {
                        text,
                        span: tk.span,
                    }));
                }
                TokenKind::Open => match self.parse_directive(tk.span)? {
                    Directive::Node(node) => nodes.push(node),
                    Directive::Else(span) => {
                        return Ok((ast::Sequence { nodes }, Stop::Else(span)));
                    }
                    Directive::End(kind, span) => {
                        return Ok((ast::Sequence { nodes }, Stop::End(kind, span)));
                    }
                },
                TokenKind::Eof => return Ok((ast::Sequence { nodes }, Stop::Eof)),
                _ => return Err(self.err_unexpected_token("raw template or directive", &tk)),
            }
        }
    }

    /// Parses the directive following an open delimiter.
    fn parse_directive(&mut self, open: Span) -> Result<Directive> {
        let tk = self.next()?;
        let node = match tk.kind {
            TokenKind::If => ast::Node::IfElse(self.parse_if(open)?),
            TokenKind::Range => ast::Node::Range(self.parse_range(open)?),
            TokenKind::With => ast::Node::With(self.parse_with(open)?),
            TokenKind::Block => ast::Node::Block(self.parse_block(open)?),
            TokenKind::Else => {
                let close = self.expect(TokenKind::Close)?;
                return Ok(Directive::Else(open.combine(close)));
            }
            TokenKind::End => {
                let kind = self.parse_end_kind()?;
                let close = self.expect(TokenKind::Close)?;
                return Ok(Directive::End(kind, open.combine(close)));
            }
            _ => {
                self.tokens.backup();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::Close)?;
                ast::Node::Expr(expr)
            }
        };
        Ok(Directive::Node(node))
    }

    /// Parses a conditional.
    ///
    ///   if .user.enabled %} ... {% else %} ... {% end if
    ///
    fn parse_if(&mut self, open: Span) -> Result<ast::IfElse> {
        let cond = self.parse_expr()?;
        let close = self.expect(TokenKind::Close)?;
        let span = open.combine(close);

        let (then_branch, stop) = self.parse_sequence()?;
        let else_branch = match stop {
            Stop::Else(else_span) => {
                self.expect_non_empty(&then_branch, "if", span)?;
                let (else_branch, stop) = self.parse_sequence()?;
                self.expect_end(stop, EndKind::If, span)?;
                self.expect_non_empty(&else_branch, "else", else_span)?;
                Some(else_branch)
            }
            stop => {
                self.expect_end(stop, EndKind::If, span)?;
                self.expect_non_empty(&then_branch, "if", span)?;
                None
            }
        };

        Ok(ast::IfElse {
            cond,
            then_branch,
            else_branch,
            span,
        })
    }

    /// Parses a range.
    ///
    ///   range .users as user %} ... {% end range
    ///
    ///   range .users as i, user %} ... {% end range
    ///
    fn parse_range(&mut self, open: Span) -> Result<ast::Range> {
        let selector = self.parse_selector()?;
        self.expect(TokenKind::As)?;
        let vars = self.parse_loop_vars()?;
        let close = self.expect(TokenKind::Close)?;
        let span = open.combine(close);

        let (body, stop) = self.parse_sequence()?;
        self.expect_end(stop, EndKind::Range, span)?;
        self.expect_non_empty(&body, "range", span)?;

        Ok(ast::Range {
            selector,
            vars,
            body,
            span,
        })
    }

    /// Parses a with.
    ///
    ///   with .user.address %} ... {% end with
    ///
    fn parse_with(&mut self, open: Span) -> Result<ast::With> {
        let selector = self.parse_selector()?;
        let close = self.expect(TokenKind::Close)?;
        let span = open.combine(close);

        let (body, stop) = self.parse_sequence()?;
        self.expect_end(stop, EndKind::With, span)?;
        self.expect_non_empty(&body, "with", span)?;

        Ok(ast::With {
            selector,
            body,
            span,
        })
    }

    /// Parses a block definition. An empty body is allowed.
    ///
    ///   block content %} ... {% end block
    ///
    fn parse_block(&mut self, open: Span) -> Result<ast::Block> {
        if self.in_block {
            return Err(Error::syntax(
                "blocks may not be nested",
                self.source(),
                open,
            ));
        }
        let name = self.parse_ident()?;
        let close = self.expect(TokenKind::Close)?;
        let span = open.combine(close);

        self.in_block = true;
        let (body, stop) = self.parse_sequence()?;
        self.in_block = false;
        self.expect_end(stop, EndKind::Block, span)?;

        Ok(ast::Block { name, body, span })
    }

    /// Parses the kind following an `end` keyword.
    fn parse_end_kind(&mut self) -> Result<EndKind> {
        let tk = self.next()?;
        match tk.kind {
            TokenKind::If => Ok(EndKind::If),
            TokenKind::Range => Ok(EndKind::Range),
            TokenKind::With => Ok(EndKind::With),
            TokenKind::Block => Ok(EndKind::Block),
            _ => Err(self.err_unexpected_token("`if`, `range`, `with` or `block`", &tk)),
        }
    }

    /// Parses loop variable(s).
    ///
    /// This is either a single identifier or two comma separated identifiers.
    /// Both of the following are valid:
    ///
    ///   item
    ///
    ///   key, value
    ///
    fn parse_loop_vars(&mut self) -> Result<ast::LoopVars> {
        let key = self.parse_ident()?;
        if self.tokens.peek().kind != TokenKind::Comma {
            return Ok(ast::LoopVars::Item(key));
        }
        self.expect(TokenKind::Comma)?;
        let value = self.parse_ident()?;
        let span = key.span.combine(value.span);
        Ok(ast::LoopVars::KeyValue(ast::KeyValue { key, value, span }))
    }

    /// Parses an expression, anything that can be rendered.
    ///
    ///   .user.name
    ///
    ///   call join .first, " ", .last
    ///
    ///   "John Smith"
    ///
    ///   -3.14
    ///
    fn parse_expr(&mut self) -> Result<ast::Expr> {
        if self.tokens.peek().kind == TokenKind::Call {
            let call = self.expect(TokenKind::Call)?;
            return Ok(ast::Expr::Call(self.parse_call(call)?));
        }
        self.parse_basic("expression")
    }

    /// Parses a selector or a literal.
    fn parse_basic(&mut self, exp: &str) -> Result<ast::Expr> {
        let tk = self.next()?;
        match tk.kind {
            TokenKind::StartSel => {
                self.tokens.backup();
                Ok(ast::Expr::Selector(self.parse_selector()?))
            }
            TokenKind::String => Ok(ast::Expr::String(self.parse_string(tk.span), tk.span)),
            TokenKind::Number => self.parse_number(tk.span),
            _ => Err(self.err_unexpected_token(exp, &tk)),
        }
    }

    /// Parses a function call after the `call` keyword.
    ///
    /// Arguments are basic values only, optionally separated by commas.
    ///
    ///   join .first " " .last
    ///
    ///   join .first, " ", .last
    ///
    fn parse_call(&mut self, call: Span) -> Result<ast::Call> {
        let name = self.parse_ident()?;
        let mut span = call.combine(name.span);
        let mut args = Vec::new();
        while self.is_next_basic() {
            let arg = self.parse_basic("argument")?;
            span = span.combine(arg.span());
            args.push(arg);
            if self.tokens.peek().kind == TokenKind::Comma {
                self.expect(TokenKind::Comma)?;
                if !self.is_next_basic() {
                    let tk = self.next()?;
                    return Err(self.err_unexpected_token("argument", &tk));
                }
            }
        }
        Ok(ast::Call { name, args, span })
    }

    /// Parses a selector.
    ///
    /// This is an optional root marker or one or more pop markers followed by
    /// zero or more `.ident` segments.
    ///
    ///   .
    ///
    ///   /.site.title
    ///
    ///   $$.index
    ///
    fn parse_selector(&mut self) -> Result<ast::Selector> {
        let start = self.expect(TokenKind::StartSel)?;

        let mut tk = self.next()?;
        let anchor = match tk.kind {
            TokenKind::Root => {
                tk = self.next()?;
                ast::Anchor::Root
            }
            TokenKind::Pop => {
                let mut pops = 0;
                while tk.kind == TokenKind::Pop {
                    pops += 1;
                    tk = self.next()?;
                }
                ast::Anchor::Pop(pops)
            }
            _ => ast::Anchor::Pop(0),
        };

        let mut path = Vec::new();
        let mut span = start;
        loop {
            span = span.combine(tk.span);
            match tk.kind {
                TokenKind::EndSel => break,
                TokenKind::Push => {
                    let next = self.next()?;
                    match next.kind {
                        TokenKind::Ident => {
                            let name = self.source()[next.span].to_owned();
                            span = span.combine(next.span);
                            path.push(ast::Ident {
                                name,
                                span: next.span,
                            });
                        }
                        // A lone trailing `.` denotes the anchor itself.
                        TokenKind::EndSel if path.is_empty() => break,
                        _ => return Err(self.err_unexpected_token("identifier", &next)),
                    }
                }
                _ => return Err(self.err_unexpected_token("`.`", &tk)),
            }
            tk = self.next()?;
        }

        Ok(ast::Selector { anchor, path, span })
    }

    /// Parses an integer, or a float if it is not a base 10 64-bit integer.
    fn parse_number(&self, span: Span) -> Result<ast::Expr> {
        let raw = &self.source()[span];
        if let Ok(int) = raw.parse::<i64>() {
            return Ok(ast::Expr::Integer(int, span));
        }
        match raw.parse::<f64>() {
            Ok(float) => Ok(ast::Expr::Float(float, span)),
            Err(_) => Err(Error::syntax(
                "invalid number literal",
                self.source(),
                span,
            )),
        }
    }

    /// Parses a string and handles escape characters.
    ///
    /// The lexer has already validated the escapes.
    fn parse_string(&self, span: Span) -> String {
        let raw = &self.source()[span];
        let raw = &raw[1..raw.len() - 1];
        if !raw.contains('\\') {
            return raw.to_owned();
        }
        let mut string = String::with_capacity(raw.len());
        let mut iter = raw.chars();
        while let Some(c) = iter.next() {
            if c != '\\' {
                string.push(c);
                continue;
            }
            match iter.next() {
                Some('n') => string.push('\n'),
                Some('r') => string.push('\r'),
                Some('t') => string.push('\t'),
                Some(c) => string.push(c),
                None => {}
            }
        }
        string
    }

    /// Parses an identifier.
    fn parse_ident(&mut self) -> Result<ast::Ident> {
        let span = self.expect(TokenKind::Ident)?;
        let name = self.source()[span].to_owned();
        Ok(ast::Ident { name, span })
    }

    fn expect_end(&self, stop: Stop, exp: EndKind, span: Span) -> Result<()> {
        match stop {
            Stop::End(kind, _) if kind == exp => Ok(()),
            Stop::End(kind, end) => Err(Error::syntax(
                format!("expected `end {}`, found `end {}`", exp.human(), kind.human()),
                self.source(),
                end,
            )),
            Stop::Else(end) => Err(self.err_unexpected_directive("else", end)),
            Stop::Eof => Err(Error::syntax(
                format!("unclosed `{}` directive", exp.human()),
                self.source(),
                span,
            )),
        }
    }

    fn expect_non_empty(&self, seq: &ast::Sequence, kw: &str, span: Span) -> Result<()> {
        if seq.is_empty() {
            return Err(Error::syntax(
                format!("empty `{kw}` body"),
                self.source(),
                span,
            ));
        }
        Ok(())
    }

    /// Parses the specified token and returns its span.
    fn expect(&mut self, exp: TokenKind) -> Result<Span> {
        let tk = self.next()?;
        if tk.kind == exp {
            Ok(tk.span)
        } else {
            Err(self.err_unexpected_token(exp.human(), &tk))
        }
    }

    /// Returns `true` if the next token starts a selector or a literal.
    fn is_next_basic(&mut self) -> bool {
        matches!(
            self.tokens.peek().kind,
            TokenKind::StartSel | TokenKind::String | TokenKind::Number
        )
    }

    /// Returns the next token in the stream, turning error tokens into
    /// errors.
    fn next(&mut self) -> Result<Token> {
        let tk = self.tokens.next();
        match tk.kind {
            TokenKind::Error(msg) => Err(Error::syntax(msg, self.source(), tk.span)),
            _ => Ok(tk),
        }
    }

    fn source(&self) -> &'source str {
        self.tokens.source()
    }

    fn err_unexpected_token(&self, exp: impl Display, got: &Token) -> Error {
        let human = got.kind.human();
        Error::syntax(format!("expected {exp}, found {human}"), self.source(), got.span)
    }

    fn err_unexpected_directive(&self, what: impl Display, span: Span) -> Error {
        Error::syntax(format!("unexpected `{what}` directive"), self.source(), span)
    }
}

impl EndKind {
    const fn human(&self) -> &'static str {
        match self {
            Self::If => "if",
            Self::Range => "range",
            Self::With => "with",
            Self::Block => "block",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_raw() {
        let seq = parse("lorem ipsum").unwrap();
        assert_eq!(seq.to_string(), "[list\n\t[text \"lorem ipsum\"]\n]");
    }

    #[test]
    fn parse_selectors() {
        for (src, exp) in [
            ("{% . %}", "[selector $0]"),
            ("{% / %}", "[selector /]"),
            ("{% /. %}", "[selector /]"),
            ("{% $ %}", "[selector $1]"),
            ("{% $. %}", "[selector $1]"),
            ("{% $$.foo %}", "[selector $2 foo]"),
            ("{% .a.b %}", "[selector $0 a b]"),
            ("{% /.a %}", "[selector / a]"),
        ] {
            let seq = parse(src).unwrap();
            assert_eq!(seq.nodes.len(), 1, "{src}");
            assert_eq!(seq.nodes[0].to_string(), exp, "{src}");
        }
    }

    #[test]
    fn parse_literals() {
        for (src, exp) in [
            ("{% 1 %}", "[int 1]"),
            ("{% -12 %}", "[int -12]"),
            ("{% +7 %}", "[int 7]"),
            ("{% 1.0 %}", "[float 1.000000]"),
            ("{% 3.14e2 %}", "[float 314.000000]"),
            ("{% 99999999999999999999 %}", "[float 100000000000000000000.000000]"),
            (r#"{% "foo" %}"#, r#"[constant "foo"]"#),
            (r#"{% "a\t\"b\"" %}"#, r#"[constant "a\t\"b\""]"#),
        ] {
            let seq = parse(src).unwrap();
            assert_eq!(seq.nodes[0].to_string(), exp, "{src}");
        }
    }

    #[test]
    fn parse_call() {
        let seq = parse(r#"{% call join .a, "-" 2 %}"#).unwrap();
        assert_eq!(
            seq.nodes[0].to_string(),
            r#"[call join [selector $0 a] [constant "-"] [int 2]]"#
        );
        let seq = parse("{% call now %}").unwrap();
        assert_eq!(seq.nodes[0].to_string(), "[call now]");
    }

    #[test]
    fn parse_if_else() {
        let seq = parse("{% if .x %}a{% else %}b{% end if %}").unwrap();
        assert_eq!(
            seq.to_string(),
            "[list\n\t[if [selector $0 x]\n\t\t[list\n\t\t\t[text \"a\"]\n\t\t]\n\t\t[list\n\t\t\t[text \"b\"]\n\t\t]\n\t]\n]"
        );
    }

    #[test]
    fn parse_range_key_value() {
        let seq = parse("{% range .m as k, v %}{% .k %}{% end range %}").unwrap();
        match &seq.nodes[0] {
            ast::Node::Range(range) => {
                assert_eq!(range.vars.to_string(), "k, v");
                assert_eq!(range.selector.to_string(), "[selector $0 m]");
            }
            node => panic!("unexpected node {node}"),
        }
    }

    #[test]
    fn parse_empty_block_body() {
        let seq = parse("{% block foo %}{% end block %}").unwrap();
        assert_eq!(seq.to_string(), "[list\n\t[block foo\n\t\t[list\n\t\t]\n\t]\n]");
    }

    #[test]
    fn parse_sibling_blocks() {
        parse("{% block a %}x{% end block %}{% block b %}y{% end block %}").unwrap();
    }

    #[test]
    fn parse_err_messages() {
        for (src, msg) in [
            ("{% if %}", "expected expression, found end directive"),
            ("{% range .foo %}", "expected keyword `as`, found end directive"),
            ("{% range .foo as %}", "expected identifier, found end directive"),
            ("{% if .x %}a", "unclosed `if` directive"),
            ("{% if .x %}{% end if %}", "empty `if` body"),
            ("{% with .x %}a{% end if %}", "expected `end with`, found `end if`"),
            ("{% end %}", "expected `if`, `range`, `with` or `block`, found end directive"),
            ("{% end block %}", "unexpected `end block` directive"),
            ("{% else %}", "unexpected `else` directive"),
            (
                "{% block a %}{% block b %}{% end block %}{% end block %}",
                "blocks may not be nested",
            ),
            ("{% .a. %}", "expected identifier, found selector"),
            ("{% /a %}", "expected `.`, found identifier"),
            ("{% 1.2.3 %}", "invalid number literal"),
            ("{% call %}", "expected identifier, found end directive"),
            ("{% call f .a, %}", "expected argument, found end directive"),
        ] {
            let err = parse(src).unwrap_err();
            assert_eq!(err.message(), msg, "{src}");
        }
    }

    fn parse(source: &str) -> Result<ast::Sequence> {
        let syntax = Syntax::default();
        Parser::new(&syntax, source).parse_template()
    }
}
