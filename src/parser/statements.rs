//! Statement parsing implementation
//!
//! This module dispatches on the first token of a statement and handles the
//! forms that are not declarations or directive blocks:
//!
//! - Assignments: `x = expr`, `x += expr`
//! - Expanding assignments inside directive bodies: `x + raw text`
//! - Conditionals: `if (expr) { ... } else { ... }`
//! - Brace-delimited blocks: `{ ... }`
//!
//! # Grammar
//!
//! ```text
//! statement ::= const_decl | group_decl | if_stmt | assignment
//!             | directive_block | diagnostic_directive | opaque_directive
//! assignment ::= identifier ( "=" expr | "+=" expr | "+" rest_of_line )
//! if_stmt    ::= "if" "(" expr ")" block [ "else" block ]
//! block      ::= "{" statement* "}"
//! ```
//!
//! Statements are not terminated: one ends where the next token cannot
//! continue it.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser, NO_SPAN};

impl Parser {
    /// Parse a statement
    ///
    /// `Ok(None)` means a construct was consumed but dropped because its
    /// problems were already reported, e.g. a directive block whose
    /// condition failed to parse.
    pub fn parse_statement(&mut self) -> Result<Option<Statement>, ParseError> {
        let token = self.peek_token();

        if token.opens_directive_block() {
            return self.parse_directive_block();
        }

        match token {
            Token::DirError(_) | Token::DirWarning(_) => self.parse_diagnostic_directive().map(Some),
            Token::OpaqueDirective(text, span) => {
                self.advance();
                Ok(Some(Statement::Directive { text, span }))
            }
            Token::DirElif(span) | Token::DirElse(span) | Token::DirEndif(span) => {
                Err(ParseError::syntax(
                    format!("{} without matching '%if'", token),
                    span,
                ))
            }
            Token::Const(_) => self.parse_const_declaration().map(Some),
            Token::Group(_) => self.parse_group_declaration().map(Some),
            Token::If(_) => self.parse_if_statement().map(Some),
            Token::Ident(..) | Token::QuotedIdent(..) => self.parse_assignment().map(Some),
            found => Err(ParseError::syntax(
                format!("Expected statement, found {}", found),
                found.span(),
            )),
        }
    }

    /// Parse `{ statement* }`
    pub(crate) fn parse_block(&mut self, ctx: &str) -> Result<Block, ParseError> {
        self.enter_nesting()?;
        let open = match self.expect_token(&Token::LBrace(NO_SPAN), &format!("Expected '{{' {}", ctx)) {
            Ok(span) => span,
            Err(err) => {
                self.exit_nesting();
                return Err(err);
            }
        };
        self.brace_depth += 1;

        let mut statements = Vec::new();
        while !self.check(&Token::RBrace(NO_SPAN)) && !self.is_at_end() && !self.aborted {
            self.parse_into(&mut statements);
        }

        self.brace_depth -= 1;
        self.exit_nesting();
        self.warn_duplicate_declarations(&statements);

        let close = self.expect_closing(&Token::RBrace(NO_SPAN), open, "{", "}")?;
        Ok(Block {
            statements,
            span: open.to(close),
        })
    }

    /// Parse if statement
    fn parse_if_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.advance().span();

        let open = self.expect_token(&Token::LParen(NO_SPAN), "Expected '(' after 'if'")?;
        let condition = self.parse_expression(LOWEST_PRECEDENCE)?;
        self.expect_closing(&Token::RParen(NO_SPAN), open, "(", ")")?;

        let then_body = self.parse_block("after if condition")?;

        let else_span = self.current_span();
        let else_body = if self.match_token(&Token::Else(else_span)) {
            Some(self.parse_block("after 'else'")?)
        } else {
            None
        };

        let end = else_body.as_ref().map_or(then_body.span, |body| body.span);
        Ok(Statement::If {
            condition,
            then_body,
            else_body,
            span: start.to(end),
        })
    }

    /// Parse `x = expr`, `x += expr` or, inside a directive body, `x + text`
    fn parse_assignment(&mut self) -> Result<Statement, ParseError> {
        let target = self.expect_identifier("at start of statement")?;

        match self.peek_token() {
            Token::Eq(_) => {
                self.advance();
                let value = self.parse_expression(LOWEST_PRECEDENCE)?;
                let span = target.span.to(value.span());
                Ok(Statement::Assign {
                    target,
                    value,
                    span,
                })
            }
            Token::PlusEq(_) => {
                self.advance();
                let value = self.parse_expression(LOWEST_PRECEDENCE)?;
                let span = target.span.to(value.span());
                Ok(Statement::AppendAssign {
                    target,
                    value,
                    span,
                })
            }
            Token::Plus(_) if self.directive_depth > 0 && self.options.expanding_assign => {
                self.advance();
                let (value, text_span) = self.rest_of_line();
                let span = target.span.to(text_span);
                Ok(Statement::ExpandingAssign {
                    target,
                    value,
                    span,
                })
            }
            found => Err(ParseError::syntax(
                format!("Expected '=' or '+=' after {}, found {}", target, found),
                found.span(),
            )),
        }
    }
}
