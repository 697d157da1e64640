//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, token helpers, error recovery and the public
//! parse entry points.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, recovery and coordination
//! - `statements`: assignments, `if`/`else`, brace-delimited blocks
//! - `declarations`: `const` and `group` declarations
//! - `directives`: `%if`-family blocks and other `%` lines
//! - `expressions`: expressions with precedence climbing
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.
//!
//! Tokens are pulled from the [`Lexer`] lazily, one at a time, because some
//! constructs switch the scanner into rest-of-line mode right after a given
//! token. Nothing past the current token is scanned unless the parser asks
//! to peek further.
//!
//! # Recovery
//!
//! A failed statement is reported and the parser skips to the next likely
//! statement boundary: a top-level keyword, an identifier starting a new
//! line, a `}` closing the enclosing block, or a `%elif`/`%else`/`%endif`
//! of the enclosing directive block.

use std::collections::hash_map::Entry;
use std::collections::VecDeque;

use log::{debug, trace};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::parser::ast::*;
use crate::parser::diagnostic::{Diagnostic, ErrorKind};
use crate::parser::lexer::{LexError, Lexer, Token};
use crate::parser::options::ParseOptions;

/// Placeholder span for tokens built only to compare variants.
pub(crate) const NO_SPAN: Span = Span {
    start: 0,
    end: 0,
    line: 0,
    column: 0,
};

/// Parser error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parse error at {span}: {message}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ErrorKind::Syntax,
            message: message.into(),
            span,
        }
    }

    pub fn structural(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ErrorKind::Structural,
            message: message.into(),
            span,
        }
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            kind: ErrorKind::Lexical,
            message: err.message,
            span: err.span,
        }
    }
}

impl From<ParseError> for Diagnostic {
    fn from(err: ParseError) -> Self {
        Diagnostic::error(err.kind, err.message, err.span)
    }
}

/// Failure that leaves nothing to parse at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalError {
    #[error("input is not valid UTF-8 at byte {offset}; no token could be read")]
    Encoding { offset: usize },
}

/// Returned by [`ParseOutput::into_result`] when any error was recorded.
///
/// `partial` holds whatever was parsed; it is not a complete program.
#[derive(Debug, Clone, Error)]
#[error("parsing failed with {} error(s)", .diagnostics.iter().filter(|d| d.is_error()).count())]
pub struct ParseFailure {
    pub partial: Program,
    pub diagnostics: Vec<Diagnostic>,
}

/// Program plus every diagnostic recorded while producing it.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub program: Program,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    /// The program if no error was recorded; warnings are dropped.
    pub fn into_result(self) -> Result<Program, ParseFailure> {
        if self.has_errors() {
            Err(ParseFailure {
                partial: self.program,
                diagnostics: self.diagnostics,
            })
        } else {
            Ok(self.program)
        }
    }
}

/// Parse a complete source file with default options.
pub fn parse(source: &str) -> ParseOutput {
    parse_with_options(source, ParseOptions::default())
}

pub fn parse_with_options(source: &str, options: ParseOptions) -> ParseOutput {
    let mut parser = Parser::with_options(source, options);
    let program = parser.parse_program();
    parser.finish(program)
}

/// Parse raw bytes.
///
/// Invalid UTF-8 after a valid prefix truncates the input there and is
/// reported as a lexical error. Invalid UTF-8 at the very first byte is
/// fatal.
pub fn parse_bytes(bytes: &[u8]) -> Result<ParseOutput, FatalError> {
    let err = match std::str::from_utf8(bytes) {
        Ok(source) => return Ok(parse(source)),
        Err(err) => err,
    };

    let offset = err.valid_up_to();
    if offset == 0 {
        return Err(FatalError::Encoding { offset });
    }
    let source =
        std::str::from_utf8(&bytes[..offset]).map_err(|_| FatalError::Encoding { offset })?;

    let mut output = parse(source);
    output.diagnostics.push(Diagnostic::error(
        ErrorKind::Lexical,
        format!("Invalid UTF-8 at byte {}; input truncated", offset),
        end_of_source(source),
    ));
    Ok(output)
}

fn end_of_source(source: &str) -> Span {
    let line = source.matches('\n').count() + 1;
    let last_line = source.rsplit('\n').next().unwrap_or_default();
    Span::new(source.len(), source.len(), line, last_line.chars().count() + 1)
}

/// Recursive descent parser for nodelang
pub struct Parser {
    pub(crate) lexer: Lexer,
    pub(crate) lookahead: VecDeque<Token>,
    pub(crate) previous_span: Span,
    /// Tokens consumed so far; recovery uses it to guarantee progress.
    pub(crate) consumed: usize,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) error_count: usize,
    pub(crate) aborted: bool,
    pub(crate) options: ParseOptions,
    pub(crate) depth: usize,
    pub(crate) brace_depth: usize,
    pub(crate) directive_depth: usize,
    pub(crate) in_directive_condition: bool,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Self::with_options(source, ParseOptions::default())
    }

    pub fn with_options(source: &str, options: ParseOptions) -> Self {
        Self {
            lexer: Lexer::new(source),
            lookahead: VecDeque::new(),
            previous_span: NO_SPAN,
            consumed: 0,
            diagnostics: Vec::new(),
            error_count: 0,
            aborted: false,
            options,
            depth: 0,
            brace_depth: 0,
            directive_depth: 0,
            in_directive_condition: false,
        }
    }

    /// Parse the entire program (top-level statements)
    pub fn parse_program(&mut self) -> Program {
        debug!("parsing program");
        let mut program = Program::new();

        while !self.is_at_end() && !self.aborted {
            self.parse_into(&mut program.statements);
        }

        self.warn_duplicate_declarations(&program.statements);
        program
    }

    /// Consume the parser, pairing `program` with the collected diagnostics.
    pub fn finish(mut self, program: Program) -> ParseOutput {
        self.drain_lex_errors();
        debug!(
            "parsed {} top-level statement(s) with {} diagnostic(s)",
            program.statements.len(),
            self.diagnostics.len()
        );
        ParseOutput {
            program,
            diagnostics: self.diagnostics,
        }
    }

    /// Diagnostics recorded so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Parse one statement into `out`, recovering from a syntax error.
    pub(crate) fn parse_into(&mut self, out: &mut Vec<Statement>) {
        let start = self.consumed;
        match self.parse_statement() {
            Ok(Some(stmt)) => out.push(stmt),
            Ok(None) => {}
            Err(err) => {
                self.report(err);
                self.synchronize(start);
            }
        }
    }

    // ===== Diagnostics =====

    pub(crate) fn report(&mut self, err: ParseError) {
        self.push_diagnostic(err.into());
    }

    pub(crate) fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        if self.aborted {
            return;
        }

        let is_error = diagnostic.is_error();
        self.diagnostics.push(diagnostic);
        if !is_error {
            return;
        }

        self.error_count += 1;
        if let Some(limit) = self.options.max_errors {
            if self.error_count >= limit {
                debug!("error limit of {} reached, stopping", limit);
                self.aborted = true;
                self.diagnostics.push(Diagnostic::error(
                    ErrorKind::Syntax,
                    format!("Too many errors ({}), parsing stopped", limit),
                    self.previous_span,
                ));
            }
        }
    }

    fn drain_lex_errors(&mut self) {
        for err in self.lexer.take_errors() {
            self.report(err.into());
        }
    }

    pub(crate) fn warn_duplicate_declarations(&mut self, statements: &[Statement]) {
        let mut seen: FxHashMap<&str, Span> = FxHashMap::default();
        for stmt in statements {
            let Some(name) = stmt.declared_name() else {
                continue;
            };
            match seen.entry(name.name.as_str()) {
                Entry::Occupied(first) => {
                    let message = format!(
                        "Duplicate declaration of '{}' (first declared at {})",
                        name.name,
                        first.get()
                    );
                    self.push_diagnostic(Diagnostic::warning(ErrorKind::Syntax, message, name.span));
                }
                Entry::Vacant(slot) => {
                    slot.insert(name.span);
                }
            }
        }
    }

    // ===== Recovery =====

    /// Skip to the next likely statement boundary.
    ///
    /// `start` is the token count when the failed statement began; if the
    /// statement consumed nothing, one token is skipped so the caller always
    /// makes progress.
    pub(crate) fn synchronize(&mut self, start: usize) {
        let mut forced = self.consumed == start;
        let mut braces = 0usize;
        let mut directives = 0usize;
        loop {
            if !std::mem::take(&mut forced) && self.at_recovery_boundary(braces, directives) {
                break;
            }

            let skipped = self.advance();
            trace!("recovery skipped {} at {}", skipped, skipped.span());
            match skipped {
                Token::Eof(_) => break,
                Token::LBrace(_) => braces += 1,
                Token::RBrace(_) => braces = braces.saturating_sub(1),
                Token::DirEndif(_) => directives = directives.saturating_sub(1),
                other if other.opens_directive_block() => directives += 1,
                _ => {}
            }
        }
    }

    /// Whether the next token can start over after an error, given the
    /// braces and directive blocks opened since recovery began.
    fn at_recovery_boundary(&mut self, braces: usize, directives: usize) -> bool {
        let previous_line = self.previous_span.line;
        let token = self.peek();
        let outermost = braces == 0 && directives == 0;
        match token {
            Token::Eof(_) => true,
            Token::RBrace(_) => braces == 0,
            Token::DirElif(_) | Token::DirElse(_) | Token::DirEndif(_) => directives == 0,
            Token::Const(_)
            | Token::Group(_)
            | Token::If(_)
            | Token::DirError(_)
            | Token::DirWarning(_)
            | Token::OpaqueDirective(..) => outermost,
            Token::Ident(_, span) | Token::QuotedIdent(_, span) => {
                outermost && span.line != previous_line
            }
            other => outermost && other.opens_directive_block(),
        }
    }

    /// Consume tokens through the end of the current directive line.
    pub(crate) fn skip_to_end_of_line(&mut self) {
        loop {
            match self.peek() {
                Token::Eof(_) => return,
                Token::EndOfLine(_) => {
                    self.advance();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ===== Nesting =====

    pub(crate) fn enter_nesting(&mut self) -> Result<(), ParseError> {
        if self.depth >= self.options.max_nesting_depth {
            return Err(ParseError::syntax(
                format!(
                    "Maximum nesting depth of {} exceeded",
                    self.options.max_nesting_depth
                ),
                self.current_span(),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn exit_nesting(&mut self) {
        self.depth -= 1;
    }

    // ===== Helper methods =====

    fn fill(&mut self, n: usize) {
        while self.lookahead.len() <= n {
            let token = self.lexer.next_token();
            self.lookahead.push_back(token);
            self.drain_lex_errors();
        }
    }

    pub(crate) fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&mut self, token: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    pub(crate) fn advance(&mut self) -> Token {
        self.fill(0);
        if self.is_at_end() {
            return self.peek_token();
        }

        let token = self
            .lookahead
            .pop_front()
            .unwrap_or(Token::Eof(self.previous_span));
        self.previous_span = token.span();
        self.consumed += 1;
        token
    }

    pub(crate) fn is_at_end(&mut self) -> bool {
        matches!(self.peek(), Token::Eof(_))
    }

    pub(crate) fn peek(&mut self) -> &Token {
        self.peek_ahead(0)
    }

    pub(crate) fn peek_token(&mut self) -> Token {
        self.peek().clone()
    }

    pub(crate) fn peek_ahead(&mut self, n: usize) -> &Token {
        self.fill(n);
        &self.lookahead[n]
    }

    pub(crate) fn current_span(&mut self) -> Span {
        self.peek().span()
    }

    /// Consume `token` or fail with `message` and the token actually found.
    pub(crate) fn expect_token(&mut self, token: &Token, message: &str) -> Result<Span, ParseError> {
        if self.check(token) {
            Ok(self.advance().span())
        } else {
            let found = self.peek_token();
            Err(ParseError::syntax(
                format!("{}, found {}", message, found),
                found.span(),
            ))
        }
    }

    /// Consume the closer matching an opener at `open`.
    ///
    /// The error is reported at the opener, which is what is left unmatched.
    pub(crate) fn expect_closing(
        &mut self,
        token: &Token,
        open: Span,
        opener: &str,
        closer: &str,
    ) -> Result<Span, ParseError> {
        if self.check(token) {
            Ok(self.advance().span())
        } else {
            Err(self.unclosed(open, opener, closer))
        }
    }

    pub(crate) fn unclosed(&mut self, open: Span, opener: &str, closer: &str) -> ParseError {
        let found = self.peek_token();
        ParseError::syntax(
            format!(
                "Expected '{}' to close '{}' opened at {}, found {}",
                closer, opener, open, found
            ),
            open,
        )
    }

    pub(crate) fn expect_identifier(&mut self, ctx: &str) -> Result<Identifier, ParseError> {
        match self.peek_token() {
            Token::Ident(name, span) => {
                self.advance();
                Ok(Identifier::new(name, false, span))
            }
            Token::QuotedIdent(name, span) => {
                self.advance();
                Ok(Identifier::new(name, true, span))
            }
            found => Err(ParseError::syntax(
                format!("Expected identifier {}, found {}", ctx, found),
                found.span(),
            )),
        }
    }

    /// Accept the end of a directive line (or of the input).
    pub(crate) fn expect_end_of_line(&mut self, ctx: &str) -> Result<(), ParseError> {
        match self.peek_token() {
            Token::EndOfLine(_) => {
                self.advance();
                Ok(())
            }
            Token::Eof(_) => Ok(()),
            found => Err(ParseError::syntax(
                format!("Expected end of line {}, found {}", ctx, found),
                found.span(),
            )),
        }
    }

    /// Read the rest of the current line as raw text.
    ///
    /// Must be called right after consuming a token, before anything further
    /// has been peeked.
    pub(crate) fn rest_of_line(&mut self) -> (String, Span) {
        debug_assert!(
            self.lookahead.is_empty(),
            "rest_of_line called with buffered tokens"
        );
        if !self.lookahead.is_empty() {
            let span = self.current_span();
            return (String::new(), Span::new(span.start, span.start, span.line, span.column));
        }

        let token = self.lexer.rest_of_line();
        self.drain_lex_errors();
        self.consumed += 1;
        self.previous_span = token.span();
        match token {
            Token::RestOfLine(text, span) => (text, span),
            other => (String::new(), other.span()),
        }
    }
}
