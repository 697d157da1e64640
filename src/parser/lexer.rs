//! Lexer (scanner) for nodelang source
//!
//! Converts raw source text into [`Token`]s on demand. Whitespace, newlines
//! and `#` comments are trivia: they are never handed to the parser, but
//! their spans are kept so that the token and trivia streams together cover
//! the input byte for byte.
//!
//! Two things make this scanner modal rather than a plain tokenizer:
//!
//! - After a `%`-directive keyword the rest of that line is a *directive
//!   line*: the line terminator comes back as [`Token::EndOfLine`] instead of
//!   being skipped.
//! - [`Lexer::rest_of_line`] returns everything up to the line terminator as
//!   one opaque token. The parser asks for it when a condition is free text
//!   (file paths, `%error` messages, expanding assignments).
//!
//! Lexical errors never stop the scan. They are collected and the scanner
//! resumes at the next plausible token boundary.

use super::ast::Span;
use std::fmt;
use thiserror::Error;

/// All token variants produced by the lexer.
///
/// Every variant carries a [`Span`] so that parse errors can report
/// an accurate location without a separate token→span table.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    IntLiteral(i64, Span),
    FloatLiteral(f64, Span),
    StringLiteral(String, Span),

    // Identifiers
    Ident(String, Span),
    QuotedIdent(String, Span),

    // Keywords
    Const(Span),
    Group(Span),
    If(Span),
    Else(Span),

    // Directives (only at the start of a line)
    DirIf(Span),
    DirIfdef(Span),
    DirIfndef(Span),
    DirIffile(Span),
    DirIfnofile(Span),
    DirElif(Span),
    DirElse(Span),
    DirEndif(Span),
    DirError(Span),
    DirWarning(Span),
    /// Any other `%` line, text after the `%` kept verbatim.
    OpaqueDirective(String, Span),

    /// Produced only by [`Lexer::rest_of_line`].
    RestOfLine(String, Span),

    // Operators
    EqEq(Span),   // ==
    AndAnd(Span), // &&
    OrOr(Span),   // ||
    Bang(Span),   // !
    Eq(Span),     // =
    Plus(Span),   // +
    PlusEq(Span), // +=
    Dot(Span),    // .

    // Punctuation
    Comma(Span),    // ,
    Colon(Span),    // :
    LParen(Span),   // (
    RParen(Span),   // )
    LBrace(Span),   // {
    RBrace(Span),   // }
    LBracket(Span), // [
    RBracket(Span), // ]

    /// Line terminator of a directive line.
    EndOfLine(Span),

    // End of file
    Eof(Span),
}

impl Token {
    /// Returns the span of source text this token covers.
    pub fn span(&self) -> Span {
        match self {
            Token::IntLiteral(_, span)
            | Token::FloatLiteral(_, span)
            | Token::StringLiteral(_, span)
            | Token::Ident(_, span)
            | Token::QuotedIdent(_, span)
            | Token::OpaqueDirective(_, span)
            | Token::RestOfLine(_, span)
            | Token::Const(span)
            | Token::Group(span)
            | Token::If(span)
            | Token::Else(span)
            | Token::DirIf(span)
            | Token::DirIfdef(span)
            | Token::DirIfndef(span)
            | Token::DirIffile(span)
            | Token::DirIfnofile(span)
            | Token::DirElif(span)
            | Token::DirElse(span)
            | Token::DirEndif(span)
            | Token::DirError(span)
            | Token::DirWarning(span)
            | Token::EqEq(span)
            | Token::AndAnd(span)
            | Token::OrOr(span)
            | Token::Bang(span)
            | Token::Eq(span)
            | Token::Plus(span)
            | Token::PlusEq(span)
            | Token::Dot(span)
            | Token::Comma(span)
            | Token::Colon(span)
            | Token::LParen(span)
            | Token::RParen(span)
            | Token::LBrace(span)
            | Token::RBrace(span)
            | Token::LBracket(span)
            | Token::RBracket(span)
            | Token::EndOfLine(span)
            | Token::Eof(span) => *span,
        }
    }

    /// Whether this token opens a `%if`-family block.
    pub fn opens_directive_block(&self) -> bool {
        matches!(
            self,
            Token::DirIf(_)
                | Token::DirIfdef(_)
                | Token::DirIfndef(_)
                | Token::DirIffile(_)
                | Token::DirIfnofile(_)
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::IntLiteral(n, _) => write!(f, "integer literal {}", n),
            Token::FloatLiteral(x, _) => write!(f, "float literal {}", x),
            Token::StringLiteral(s, _) => write!(f, "string literal \"{}\"", s),
            Token::Ident(s, _) => write!(f, "identifier '{}'", s),
            Token::QuotedIdent(s, _) => write!(f, "quoted identifier '{}'", s),
            Token::Const(_) => write!(f, "'const'"),
            Token::Group(_) => write!(f, "'group'"),
            Token::If(_) => write!(f, "'if'"),
            Token::Else(_) => write!(f, "'else'"),
            Token::DirIf(_) => write!(f, "'%if'"),
            Token::DirIfdef(_) => write!(f, "'%ifdef'"),
            Token::DirIfndef(_) => write!(f, "'%ifndef'"),
            Token::DirIffile(_) => write!(f, "'%iffile'"),
            Token::DirIfnofile(_) => write!(f, "'%ifnofile'"),
            Token::DirElif(_) => write!(f, "'%elif'"),
            Token::DirElse(_) => write!(f, "'%else'"),
            Token::DirEndif(_) => write!(f, "'%endif'"),
            Token::DirError(_) => write!(f, "'%error'"),
            Token::DirWarning(_) => write!(f, "'%warning'"),
            Token::OpaqueDirective(s, _) => write!(f, "directive '%{}'", s),
            Token::RestOfLine(s, _) => write!(f, "text '{}'", s),
            Token::EqEq(_) => write!(f, "'=='"),
            Token::AndAnd(_) => write!(f, "'&&'"),
            Token::OrOr(_) => write!(f, "'||'"),
            Token::Bang(_) => write!(f, "'!'"),
            Token::Eq(_) => write!(f, "'='"),
            Token::Plus(_) => write!(f, "'+'"),
            Token::PlusEq(_) => write!(f, "'+='"),
            Token::Dot(_) => write!(f, "'.'"),
            Token::Comma(_) => write!(f, "','"),
            Token::Colon(_) => write!(f, "':'"),
            Token::LParen(_) => write!(f, "'('"),
            Token::RParen(_) => write!(f, "')'"),
            Token::LBrace(_) => write!(f, "'{{'"),
            Token::RBrace(_) => write!(f, "'}}'"),
            Token::LBracket(_) => write!(f, "'['"),
            Token::RBracket(_) => write!(f, "']'"),
            Token::EndOfLine(_) => write!(f, "end of line"),
            Token::Eof(_) => write!(f, "end of file"),
        }
    }
}

/// Lexer error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Lexer error at {span}: {message}")]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriviaKind {
    Whitespace,
    Newline,
    Comment,
}

/// Source text skipped between tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub span: Span,
}

/// Lexer for nodelang source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    offset: usize,
    line: usize,
    column: usize,
    at_line_start: bool,
    directive_line: bool,
    errors: Vec<LexError>,
    trivia: Vec<Trivia>,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            offset: 0,
            line: 1,
            column: 1,
            at_line_start: true,
            directive_line: false,
            errors: Vec::new(),
            trivia: Vec::new(),
        }
    }

    /// Tokenize the entire input, up to and including [`Token::Eof`].
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = matches!(token, Token::Eof(_));
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    /// Tokenize the entire input and return the trivia seen along the way.
    pub fn tokenize_with_trivia(&mut self) -> (Vec<Token>, Vec<Trivia>) {
        let tokens = self.tokenize();
        (tokens, std::mem::take(&mut self.trivia))
    }

    /// Lexical errors recorded so far.
    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    /// Drain the recorded lexical errors.
    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    /// Trivia recorded so far.
    pub fn trivia(&self) -> &[Trivia] {
        &self.trivia
    }

    /// Scan the next significant token.
    ///
    /// Never fails: bad input is recorded in [`Lexer::errors`] and skipped.
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_trivia();

            let start = self.mark();
            let Some(ch) = self.peek() else {
                self.directive_line = false;
                return Token::Eof(start);
            };

            // skip_trivia only stops at a newline inside a directive line
            if ch == '\n' {
                self.advance();
                self.directive_line = false;
                return Token::EndOfLine(self.finish(start));
            }

            let line_start = self.at_line_start;
            if let Some(token) = self.scan_token(start, line_start) {
                return token;
            }
        }
    }

    /// Return the remaining text on the current line as one token.
    ///
    /// Leading and trailing horizontal whitespace is left as trivia; the line
    /// terminator itself is not consumed.
    pub fn rest_of_line(&mut self) -> Token {
        self.skip_horizontal_whitespace();
        let start = self.mark();
        let end = self.trimmed_line_end();
        let text = self.take_until(end);
        Token::RestOfLine(text, self.finish(start))
    }

    /// Scan one token starting at the current character.
    ///
    /// Returns `None` when the character was reported and skipped.
    fn scan_token(&mut self, start: Span, line_start: bool) -> Option<Token> {
        let ch = self.advance()?;

        let token = match ch {
            '\'' | '"' => self.quoted(ch, start),
            '0'..='9' => self.number_literal(ch, start),
            'a'..='z' | 'A'..='Z' | '_' => self.identifier_or_keyword(ch, start),
            '%' => {
                if line_start && !self.directive_line {
                    self.directive(start)
                } else {
                    self.error(
                        "Unexpected '%': directives must start a line",
                        self.finish(start),
                    );
                    return None;
                }
            }
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Token::EqEq(self.finish(start))
                } else {
                    Token::Eq(self.finish(start))
                }
            }
            '+' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Token::PlusEq(self.finish(start))
                } else {
                    Token::Plus(self.finish(start))
                }
            }
            '&' | '|' => {
                if self.peek() == Some(ch) {
                    self.advance();
                    if ch == '&' {
                        Token::AndAnd(self.finish(start))
                    } else {
                        Token::OrOr(self.finish(start))
                    }
                } else {
                    self.error(
                        format!("Unexpected character '{ch}', expected '{ch}{ch}'"),
                        self.finish(start),
                    );
                    return None;
                }
            }
            '!' => Token::Bang(self.finish(start)),
            '.' => Token::Dot(self.finish(start)),
            ',' => Token::Comma(self.finish(start)),
            ':' => Token::Colon(self.finish(start)),
            '(' => Token::LParen(self.finish(start)),
            ')' => Token::RParen(self.finish(start)),
            '{' => Token::LBrace(self.finish(start)),
            '}' => Token::RBrace(self.finish(start)),
            '[' => Token::LBracket(self.finish(start)),
            ']' => Token::RBracket(self.finish(start)),

            _ => {
                self.error(format!("Unexpected character: '{}'", ch), self.finish(start));
                return None;
            }
        };

        Some(token)
    }

    /// Quoted identifier (`'...'`) or string literal (`"..."`).
    ///
    /// Contents are verbatim except that a backslash before the delimiter
    /// yields the delimiter. An unterminated quote takes the rest of the line.
    fn quoted(&mut self, delimiter: char, start: Span) -> Token {
        let mut text = String::new();

        loop {
            match self.peek() {
                None | Some('\n') => {
                    let what = if delimiter == '"' {
                        "string literal"
                    } else {
                        "quoted identifier"
                    };
                    let opening = Span::new(start.start, start.start + 1, start.line, start.column);
                    self.error(format!("Unterminated {}", what), opening);
                    break;
                }
                Some('\\') if self.peek_ahead(1) == Some(delimiter) => {
                    self.advance();
                    self.advance();
                    text.push(delimiter);
                }
                Some(ch) if ch == delimiter => {
                    self.advance();
                    break;
                }
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
            }
        }

        let span = self.finish(start);
        if delimiter == '"' {
            Token::StringLiteral(text, span)
        } else {
            Token::QuotedIdent(text, span)
        }
    }

    /// Integer (`12`) or float (`1.5`) literal.
    ///
    /// A `.` is only part of the number when a digit follows it, so `3.foo`
    /// is `3`, `.`, `foo`.
    fn number_literal(&mut self, first_digit: char, start: Span) -> Token {
        let mut num_str = String::new();
        num_str.push(first_digit);
        self.take_digits(&mut num_str);

        let is_float = self.peek() == Some('.')
            && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit());
        if is_float {
            self.advance();
            num_str.push('.');
            self.take_digits(&mut num_str);
        }

        if matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            let mut tail = String::new();
            while let Some(ch) = self.peek() {
                if ch.is_ascii_alphanumeric() || ch == '_' {
                    tail.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
            self.error(
                format!("Malformed numeric literal: {}{}", num_str, tail),
                self.finish(start),
            );
        }

        let span = self.finish(start);
        if is_float {
            return Token::FloatLiteral(num_str.parse::<f64>().unwrap_or_default(), span);
        }

        match num_str.parse::<i64>() {
            Ok(value) => Token::IntLiteral(value, span),
            Err(_) => {
                self.error(format!("Integer literal out of range: {}", num_str), span);
                Token::IntLiteral(i64::MAX, span)
            }
        }
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, first_char: char, start: Span) -> Token {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let span = self.finish(start);
        match ident.as_str() {
            "const" => Token::Const(span),
            "group" => Token::Group(span),
            "if" => Token::If(span),
            "else" => Token::Else(span),
            _ => Token::Ident(ident, span),
        }
    }

    /// Directive keyword after a line-initial `%`.
    fn directive(&mut self, start: Span) -> Token {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let span = self.finish(start);
        let token = match name.as_str() {
            "if" => Token::DirIf(span),
            "ifdef" => Token::DirIfdef(span),
            "ifndef" => Token::DirIfndef(span),
            "iffile" => Token::DirIffile(span),
            "ifnofile" => Token::DirIfnofile(span),
            "elif" => Token::DirElif(span),
            "else" => Token::DirElse(span),
            "endif" => Token::DirEndif(span),
            "error" => Token::DirError(span),
            "warning" => Token::DirWarning(span),
            _ => {
                let end = self.trimmed_line_end();
                let rest = self.take_until(end);
                return Token::OpaqueDirective(format!("{}{}", name, rest), self.finish(start));
            }
        };

        self.directive_line = true;
        token
    }

    /// Skip whitespace, newlines and comments, recording them as trivia.
    fn skip_trivia(&mut self) {
        loop {
            let start = self.mark();
            match self.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.skip_horizontal_whitespace();
                }
                Some('\n') => {
                    if self.directive_line {
                        break;
                    }
                    self.advance();
                    self.push_trivia(TriviaKind::Newline, start);
                }
                Some('#') => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    self.push_trivia(TriviaKind::Comment, start);
                }
                _ => break,
            }
        }
    }

    fn skip_horizontal_whitespace(&mut self) {
        let start = self.mark();
        while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
            self.advance();
        }
        if self.offset > start.start {
            self.push_trivia(TriviaKind::Whitespace, start);
        }
    }

    fn push_trivia(&mut self, kind: TriviaKind, start: Span) {
        let span = self.finish(start);
        self.trivia.push(Trivia { kind, span });
    }

    fn take_digits(&mut self, out: &mut String) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                out.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Index just past the last non-whitespace character before the next
    /// line terminator.
    fn trimmed_line_end(&self) -> usize {
        let mut end = self.position;
        let mut scan = self.position;
        while let Some(&ch) = self.input.get(scan) {
            if ch == '\n' {
                break;
            }
            scan += 1;
            if !ch.is_whitespace() {
                end = scan;
            }
        }
        end
    }

    fn take_until(&mut self, end: usize) -> String {
        let mut text = String::new();
        while self.position < end {
            match self.advance() {
                Some(ch) => text.push(ch),
                None => break,
            }
        }
        text
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.errors.push(LexError {
            message: message.into(),
            span,
        });
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        self.offset += ch.len_utf8();

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
            self.at_line_start = true;
        } else {
            self.column += 1;
            if !ch.is_whitespace() {
                self.at_line_start = false;
            }
        }

        Some(ch)
    }

    /// Empty span at the current position.
    fn mark(&self) -> Span {
        Span::new(self.offset, self.offset, self.line, self.column)
    }

    /// Span from `start` up to the current position.
    fn finish(&self, start: Span) -> Span {
        Span::new(start.start, self.offset, start.line, start.column)
    }
}
