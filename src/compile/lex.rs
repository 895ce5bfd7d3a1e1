use crate::types::span::Span;
use crate::types::syntax::Syntax;

/// A lexer that tokenizes the template source into distinct chunks so that the
/// parser doesn't have to operate on raw text.
///
/// The lexer never fails. Malformed input produces a single
/// [`TokenKind::Error`] token after which only [`TokenKind::Eof`] is
/// produced.
#[cfg_attr(internal_debug, derive(Debug))]
pub struct Lexer<'syntax, 'source> {
    /// The delimiters to look for.
    syntax: &'syntax Syntax,

    /// The original template source.
    pub source: &'source str,

    /// A cursor over the template source.
    cursor: usize,

    /// The current state of the lexer.
    state: State,

    /// A buffer to store the next token.
    next: Option<Token>,

    /// Set once an error or the end of input has been emitted.
    done: bool,
}

/// The state of the lexer.
///
/// The lexer requires state because the tokenization is different within raw
/// text, between directive delimiters and within a selector.
#[derive(Clone, Copy)]
#[cfg_attr(internal_debug, derive(Debug))]
enum State {
    /// Within raw template.
    Template,

    /// Between directive delimiters.
    Directive {
        /// The span of the begin delimiter.
        open: Span,
    },

    /// Between directive delimiters and within a selector.
    Selector {
        /// The span of the begin delimiter.
        open: Span,
    },
}

/// The unit yielded by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Raw template text
    Text,
    /// Begin directive delimiter, e.g. `{%`
    Open,
    /// End directive delimiter, e.g. `%}`
    Close,
    /// Zero width marker before a selector
    StartSel,
    /// Zero width marker after a selector
    EndSel,
    /// `/`
    Root,
    /// `$`
    Pop,
    /// `.`
    Push,
    /// An identifier
    Ident,
    /// A string literal, e.g. `"Hello World!\n"`
    String,
    /// An integer or float literal, e.g. `19`, `-7` or `3.14e2`
    Number,
    /// `,`
    Comma,
    /// `call`
    Call,
    /// `if`
    If,
    /// `else`
    Else,
    /// `end`
    End,
    /// `range`
    Range,
    /// `as`
    As,
    /// `with`
    With,
    /// `block`
    Block,
    /// The end of the input
    Eof,
    /// Malformed input, with a description of the problem
    Error(String),
}

impl<'syntax, 'source> Lexer<'syntax, 'source> {
    /// Construct a new lexer.
    pub fn new(syntax: &'syntax Syntax, source: &'source str) -> Self {
        Self {
            syntax,
            source,
            cursor: 0,
            state: State::Template,
            next: None,
            done: false,
        }
    }

    /// Returns the next token.
    pub fn lex(&mut self) -> Token {
        if let Some(next) = self.next.take() {
            return next;
        }
        if self.done {
            let n = self.source.len();
            return Token::new(TokenKind::Eof, n..n);
        }
        let tk = match self.state {
            State::Template => self.lex_template(self.cursor),
            State::Directive { open } => self.lex_directive(open),
            State::Selector { open } => self.lex_selector(open),
        };
        if matches!(tk.kind, TokenKind::Eof | TokenKind::Error(_)) {
            self.done = true;
        }
        tk
    }

    fn lex_template(&mut self, mut i: usize) -> Token {
        // We are within raw template, so we find the next begin delimiter
        // from `i`. The following diagram helps describe the variable naming.
        //
        // xxxxxxx{%xxxxxxxxx
        //    ^   ^ ^
        //    i   j k
        let (begin, end) = self.syntax.delimiters();
        loop {
            if i == self.source.len() {
                self.cursor = i;
                return Token::new(TokenKind::Eof, i..i);
            }

            let Some(d) = self.source[i..].find(begin) else {
                let n = self.source.len();
                self.cursor = n;
                return Token::new(TokenKind::Text, i..n);
            };
            let j = i + d;
            let k = j + begin.len();

            // An empty directive is a splice point, it emits nothing.
            let rest = self.source[k..].trim_start_matches(is_whitespace);
            if rest.starts_with(end) {
                let after = self.source.len() - rest.len() + end.len();
                self.cursor = after;
                if i == j {
                    i = after;
                    continue;
                }
                return Token::new(TokenKind::Text, i..j);
            }

            let open = Span::from(j..k);
            self.state = State::Directive { open };
            self.cursor = k;
            let tk = Token::new(TokenKind::Open, open);
            if i == j {
                return tk;
            }
            // We must first emit the raw text, so we store the begin
            // delimiter in the `next` buffer.
            self.next = Some(tk);
            return Token::new(TokenKind::Text, i..j);
        }
    }

    fn lex_directive(&mut self, open: Span) -> Token {
        let (begin, end) = self.syntax.delimiters();

        let i = self.skip_whitespace(self.cursor);
        let rest = &self.source[i..];

        if rest.is_empty() || rest.starts_with(begin) {
            return self.err_unclosed(open);
        }
        if rest.starts_with(end) {
            let j = i + end.len();
            self.cursor = j;
            self.state = State::Template;
            return Token::new(TokenKind::Close, i..j);
        }

        let mut iter = rest.chars();
        // There is at least one character remaining.
        let c = iter.next().unwrap_or_default();
        let (kind, j) = match c {
            '/' | '$' | '.' => {
                self.cursor = i;
                self.state = State::Selector { open };
                return Token::new(TokenKind::StartSel, i..i);
            }
            ',' => (TokenKind::Comma, i + 1),
            '"' => match self.lex_string(i) {
                Ok(j) => (TokenKind::String, j),
                Err(tk) => return tk,
            },
            c if c.is_ascii_digit() => (TokenKind::Number, self.lex_while(i, is_number)),
            '+' | '-' if iter.next().map_or(false, |c| c.is_ascii_digit()) => {
                (TokenKind::Number, self.lex_while(i + 1, is_number))
            }
            c if is_ident_start(c) => {
                let j = self.lex_while(i, is_ident);
                (keyword(&self.source[i..j]), j)
            }
            c => return self.err_unexpected_character(i..i + c.len_utf8()),
        };

        self.cursor = j;
        Token::new(kind, i..j)
    }

    fn lex_selector(&mut self, open: Span) -> Token {
        let (_, end) = self.syntax.delimiters();

        let i = self.cursor;
        let rest = &self.source[i..];

        let (kind, j) = match rest.chars().next() {
            _ if rest.starts_with(end) => (TokenKind::EndSel, i),
            Some('/') => (TokenKind::Root, i + 1),
            Some('$') => (TokenKind::Pop, i + 1),
            Some('.') => (TokenKind::Push, i + 1),
            Some(c) if is_ident_start(c) => (TokenKind::Ident, self.lex_while(i, is_ident)),
            _ => (TokenKind::EndSel, i),
        };

        if kind == TokenKind::EndSel {
            self.state = State::Directive { open };
        }
        self.cursor = j;
        Token::new(kind, i..j)
    }

    /// Validates a string literal starting at `i` and returns the index just
    /// after the closing quote.
    fn lex_string(&self, i: usize) -> Result<usize, Token> {
        let mut iter = self.source[i + 1..]
            .char_indices()
            .map(|(d, c)| (i + 1 + d, c));
        loop {
            match iter.next() {
                None => {
                    return Err(self.err_undelimited_string(i..self.source.len()));
                }
                Some((j, '\r' | '\n')) => {
                    return Err(self.err_undelimited_string(i..j));
                }
                Some((j, '"')) => return Ok(j + 1),
                Some((j, '\\')) => match iter.next() {
                    Some((_, 'n' | 'r' | 't' | '\\' | '"')) => {}
                    Some((k, c)) => {
                        return Err(self.err_unknown_escape(j..k + c.len_utf8()));
                    }
                    None => {
                        return Err(self.err_undelimited_string(i..self.source.len()));
                    }
                },
                Some(_) => {}
            }
        }
    }

    fn skip_whitespace(&self, i: usize) -> usize {
        self.lex_while(i, is_whitespace)
    }

    fn lex_while<P>(&self, i: usize, pred: P) -> usize
    where
        P: Fn(char) -> bool,
    {
        match self.source[i..].char_indices().find(|&(_, c)| !pred(c)) {
            Some((d, _)) => i + d,
            None => self.source.len(),
        }
    }

    fn err_unclosed(&self, open: Span) -> Token {
        Token::error("unclosed directive", open)
    }

    fn err_unexpected_character(&self, span: impl Into<Span>) -> Token {
        Token::error("unexpected character", span)
    }

    fn err_undelimited_string(&self, span: impl Into<Span>) -> Token {
        Token::error("undelimited string", span)
    }

    fn err_unknown_escape(&self, span: impl Into<Span>) -> Token {
        Token::error("unknown escape character", span)
    }
}

impl Token {
    fn new(kind: TokenKind, span: impl Into<Span>) -> Self {
        Self {
            kind,
            span: span.into(),
        }
    }

    fn error(msg: &str, span: impl Into<Span>) -> Self {
        Self::new(TokenKind::Error(msg.to_owned()), span)
    }
}

impl TokenKind {
    pub fn human(&self) -> &'static str {
        match self {
            Self::Text => "raw template",
            Self::Open => "begin directive",
            Self::Close => "end directive",
            Self::StartSel | Self::EndSel => "selector",
            Self::Root => "root marker",
            Self::Pop => "pop marker",
            Self::Push => "member access operator",
            Self::Ident => "identifier",
            Self::String => "string",
            Self::Number => "number",
            Self::Comma => "comma",
            Self::Call => "keyword `call`",
            Self::If => "keyword `if`",
            Self::Else => "keyword `else`",
            Self::End => "keyword `end`",
            Self::Range => "keyword `range`",
            Self::As => "keyword `as`",
            Self::With => "keyword `with`",
            Self::Block => "keyword `block`",
            Self::Eof => "EOF",
            Self::Error(_) => "error",
        }
    }
}

/// A read cursor over the tokens of a template with one token of lookahead
/// and the ability to push back the last token.
#[cfg_attr(internal_debug, derive(Debug))]
pub struct TokenStream<'syntax, 'source> {
    lexer: Lexer<'syntax, 'source>,

    /// Tokens that have been lexed or backed up but not yet returned, the
    /// next one is last.
    ahead: Vec<Token>,

    /// The token most recently returned by `next`.
    prev: Option<Token>,
}

impl<'syntax, 'source> TokenStream<'syntax, 'source> {
    pub fn new(syntax: &'syntax Syntax, source: &'source str) -> Self {
        Self {
            lexer: Lexer::new(syntax, source),
            ahead: Vec::new(),
            prev: None,
        }
    }

    /// Advances the stream and returns the next token.
    pub fn next(&mut self) -> Token {
        let tk = match self.ahead.pop() {
            Some(tk) => tk,
            None => self.lexer.lex(),
        };
        self.prev = Some(tk.clone());
        tk
    }

    /// Returns the next token without advancing the stream.
    pub fn peek(&mut self) -> &Token {
        if self.ahead.is_empty() {
            let tk = self.lexer.lex();
            self.ahead.push(tk);
        }
        &self.ahead[self.ahead.len() - 1]
    }

    /// Rewinds the stream by exactly one token.
    ///
    /// # Panics
    ///
    /// If called twice without an intervening call to `next`.
    pub fn backup(&mut self) {
        match self.prev.take() {
            Some(tk) => self.ahead.push(tk),
            None => panic!("token stream bug: backed up twice"),
        }
    }

    pub fn source(&self) -> &'source str {
        self.lexer.source
    }
}

fn keyword(s: &str) -> TokenKind {
    match s {
        "call" => TokenKind::Call,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "end" => TokenKind::End,
        "range" => TokenKind::Range,
        "as" => TokenKind::As,
        "with" => TokenKind::With,
        "block" => TokenKind::Block,
        _ => TokenKind::Ident,
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

#[cfg(feature = "unicode")]
fn is_ident_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

#[cfg(feature = "unicode")]
fn is_ident(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}

#[cfg(not(feature = "unicode"))]
fn is_ident_start(c: char) -> bool {
    matches!(c, 'A'..='Z' | 'a'..='z' | '_')
}

#[cfg(not(feature = "unicode"))]
fn is_ident(c: char) -> bool {
    matches!(c, '0'..='9' | 'A'..='Z' | 'a'..='z' | '_')
}

fn is_number(c: char) -> bool {
    matches!(c, '0'..='9' | 'A'..='Z' | 'a'..='z' | '_' | '-' | '+' | '.')
}
