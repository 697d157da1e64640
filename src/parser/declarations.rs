//! Declaration parsing implementation
//!
//! This module handles the two named declarations:
//!
//! - Constants: `const name = expr`, optionally typed `const name: type = expr`
//! - Groups: `group name { ... }`
//!
//! # Grammar
//!
//! ```text
//! const_decl ::= "const" identifier [ ":" expr ] "=" expr
//! group_decl ::= "group" identifier block
//! ```
//!
//! The declared type is an ordinary expression; nothing here checks that it
//! names a type.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser, NO_SPAN};

impl Parser {
    /// Parse constant declaration: const name [: type] = value
    pub(crate) fn parse_const_declaration(&mut self) -> Result<Statement, ParseError> {
        let start = self.advance().span();
        let name = self.expect_identifier("after 'const'")?;

        let span = self.current_span();
        let declared_type = if self.match_token(&Token::Colon(span)) {
            Some(self.parse_expression(LOWEST_PRECEDENCE)?)
        } else {
            None
        };

        self.expect_token(
            &Token::Eq(NO_SPAN),
            &format!("Expected '=' in declaration of {}", name),
        )?;
        let value = self.parse_expression(LOWEST_PRECEDENCE)?;

        let span = start.to(value.span());
        Ok(Statement::ConstDecl {
            name,
            declared_type,
            value,
            span,
        })
    }

    /// Parse group declaration: group name { statements }
    pub(crate) fn parse_group_declaration(&mut self) -> Result<Statement, ParseError> {
        let start = self.advance().span();
        let name = self.expect_identifier("after 'group'")?;
        let body = self.parse_block(&format!("after group name {}", name))?;

        let span = start.to(body.span);
        Ok(Statement::GroupDecl { name, body, span })
    }
}
