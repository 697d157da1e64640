//! Expression parsing implementation
//!
//! This module handles parsing of nodelang expressions using precedence
//! climbing for binary operators and recursive descent for other forms.
//!
//! # Supported Expressions
//!
//! - Literals: integers, floats, strings, arrays (`[a, b,]`)
//! - Identifiers, bare or quoted (`'name with spaces'`)
//! - Binary operators: `==`, `||`, `&&` (left-associative)
//! - Unary `!`
//! - Postfix: member access `a.b`, calls `f(x, .name = y)`
//! - Parentheses, kept as [`Expression::Group`]
//! - `defined(name)`, inside `%if`/`%elif` conditions only
//!
//! # Precedence
//!
//! From loosest to tightest: `==`, `||`, `&&`, call, member access. Calls
//! and member access are applied in a postfix loop before any binary
//! operator is considered, so `a.b(c).d` chains left to right.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser, NO_SPAN};

impl Parser {
    /// Parse an expression whose binary operators bind at least as tightly
    /// as `min_precedence`.
    ///
    /// Pass [`LOWEST_PRECEDENCE`] for a complete expression.
    pub fn parse_expression(&mut self, min_precedence: u8) -> Result<Expression, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let Some(op) = self.peek_binary_op()? else {
                break;
            };
            if op.precedence() < min_precedence {
                break;
            }
            self.advance();

            // Left-associative: the right operand only takes tighter operators
            let right = self.parse_expression(op.precedence() + 1)?;
            let span = left.span().to(right.span());
            left = Expression::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    /// Binary operator at the current token, if any.
    ///
    /// `+` can never continue an expression, so it is rejected here rather
    /// than left to surface as a confusing statement error.
    fn peek_binary_op(&mut self) -> Result<Option<BinOp>, ParseError> {
        match self.peek() {
            Token::EqEq(_) => Ok(Some(BinOp::Eq)),
            Token::OrOr(_) => Ok(Some(BinOp::Or)),
            Token::AndAnd(_) => Ok(Some(BinOp::And)),
            Token::Plus(span) => Err(ParseError::syntax(
                "Unsupported operator '+' in expression",
                *span,
            )),
            _ => Ok(None),
        }
    }

    /// Parse unary `!`
    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        let span = self.current_span();
        if self.match_token(&Token::Bang(span)) {
            self.enter_nesting()?;
            let operand = self.parse_unary();
            self.exit_nesting();

            let operand = operand?;
            let full = span.to(operand.span());
            return Ok(Expression::Not {
                operand: Box::new(operand),
                span: full,
            });
        }

        self.parse_postfix()
    }

    /// Parse postfix (`.` and `()`)
    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            let span = self.current_span();

            if self.match_token(&Token::Dot(span)) {
                let member = self.expect_identifier("after '.'")?;
                let full = expr.span().to(member.span);
                expr = Expression::Deref {
                    object: Box::new(expr),
                    member,
                    span: full,
                };
            } else if self.match_token(&Token::LParen(span)) {
                self.enter_nesting()?;
                let args = self.parse_argument_list(span);
                self.exit_nesting();

                let (args, close) = args?;
                let full = expr.span().to(close);
                expr = Expression::Call {
                    callee: Box::new(expr),
                    args,
                    span: full,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse argument list after `(`: `(expr, .name = expr, ...)`
    fn parse_argument_list(&mut self, open: Span) -> Result<(Vec<Argument>, Span), ParseError> {
        self.parse_comma_list(open, &Token::RParen(NO_SPAN), ("(", ")"), |parser| {
            let span = parser.current_span();
            if parser.match_token(&Token::Dot(span)) {
                let label = parser.expect_identifier("after '.' in named argument")?;
                parser.expect_token(
                    &Token::Eq(NO_SPAN),
                    &format!("Expected '=' after argument name {}", label),
                )?;
                let value = parser.parse_expression(LOWEST_PRECEDENCE)?;
                return Ok(Argument {
                    label: Some(label),
                    value,
                });
            }

            let value = parser.parse_expression(LOWEST_PRECEDENCE)?;
            Ok(Argument { label: None, value })
        })
    }

    /// Parse the items of a comma-separated list up to and including `close`.
    ///
    /// A trailing comma is allowed. Repeated commas are reported as a
    /// structural error and skipped; the list keeps going.
    pub(crate) fn parse_comma_list<T>(
        &mut self,
        open: Span,
        close: &Token,
        delimiters: (&str, &str),
        mut item: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Result<(Vec<T>, Span), ParseError> {
        let (opener, closer) = delimiters;
        let mut items = Vec::new();

        loop {
            if self.check(close) {
                let end = self.advance().span();
                return Ok((items, end));
            }
            if matches!(self.peek(), Token::Eof(_) | Token::EndOfLine(_)) {
                return Err(self.unclosed(open, opener, closer));
            }

            items.push(item(self)?);

            let span = self.current_span();
            if self.match_token(&Token::Comma(span)) {
                while let Token::Comma(extra) = *self.peek() {
                    self.advance();
                    self.report(ParseError::structural(
                        format!("Unexpected ',' in '{}' list: empty element", opener),
                        extra,
                    ));
                }
            } else if !self.check(close) {
                return Err(self.unclosed(open, opener, closer));
            }
        }
    }

    /// Parse primary (literals, identifiers, arrays, parenthesized expressions)
    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        match self.peek_token() {
            Token::IntLiteral(n, span) => {
                self.advance();
                Ok(Expression::IntLiteral(n, span))
            }
            Token::FloatLiteral(x, span) => {
                self.advance();
                Ok(Expression::FloatLiteral(x, span))
            }
            Token::StringLiteral(s, span) => {
                self.advance();
                Ok(Expression::StringLiteral(s, span))
            }
            Token::Ident(name, span) => {
                if self.in_directive_condition
                    && name == "defined"
                    && matches!(self.peek_ahead(1), Token::LParen(_))
                {
                    return self.parse_defined();
                }
                self.advance();
                Ok(Expression::Identifier(Identifier::new(name, false, span)))
            }
            Token::QuotedIdent(name, span) => {
                self.advance();
                Ok(Expression::Identifier(Identifier::new(name, true, span)))
            }
            Token::LParen(open) => {
                self.advance();
                self.enter_nesting()?;
                let inner = self.parse_expression(LOWEST_PRECEDENCE);
                self.exit_nesting();

                let inner = inner?;
                let close = self.expect_closing(&Token::RParen(NO_SPAN), open, "(", ")")?;
                Ok(Expression::Group {
                    inner: Box::new(inner),
                    span: open.to(close),
                })
            }
            Token::LBracket(open) => {
                self.advance();
                self.enter_nesting()?;
                let elements =
                    self.parse_comma_list(open, &Token::RBracket(NO_SPAN), ("[", "]"), |parser| {
                        parser.parse_expression(LOWEST_PRECEDENCE)
                    });
                self.exit_nesting();

                let (elements, close) = elements?;
                Ok(Expression::ArrayLiteral {
                    elements,
                    span: open.to(close),
                })
            }
            found => Err(ParseError::syntax(
                format!("Expected expression, found {}", found),
                found.span(),
            )),
        }
    }

    /// Parse `defined(name)`
    fn parse_defined(&mut self) -> Result<Expression, ParseError> {
        let start = self.advance().span();
        let open = self.expect_token(&Token::LParen(NO_SPAN), "Expected '(' after 'defined'")?;
        let name = self.expect_identifier("in 'defined(...)'")?;
        let close = self.expect_closing(&Token::RParen(NO_SPAN), open, "(", ")")?;
        Ok(Expression::IsDefined {
            name,
            span: start.to(close),
        })
    }

    /// Parse a `%if`/`%elif` condition, where `defined(...)` is recognised.
    pub(crate) fn parse_directive_expression(&mut self) -> Result<Expression, ParseError> {
        self.in_directive_condition = true;
        let result = self.parse_expression(LOWEST_PRECEDENCE);
        self.in_directive_condition = false;
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::diagnostic::ErrorKind;
    use crate::parser::parse::Parser;

    fn parse_expr(source: &str) -> Expression {
        let mut parser = Parser::new(source);
        let expr = parser.parse_expression(LOWEST_PRECEDENCE).unwrap();
        assert!(parser.is_at_end(), "trailing input in {:?}", source);
        assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics());
        expr
    }

    fn ident(expr: &Expression) -> &str {
        match expr {
            Expression::Identifier(ident) => &ident.name,
            other => panic!("Expected identifier, got {:?}", other),
        }
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        match parse_expr("a || b && c") {
            Expression::BinaryOp {
                op: BinOp::Or,
                left,
                right,
                ..
            } => {
                assert_eq!(ident(&left), "a");
                assert!(matches!(*right, Expression::BinaryOp { op: BinOp::And, .. }));
            }
            other => panic!("Expected '||' at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_equality_binds_loosest() {
        match parse_expr("a == b || c") {
            Expression::BinaryOp {
                op: BinOp::Eq,
                left,
                right,
                ..
            } => {
                assert_eq!(ident(&left), "a");
                assert!(matches!(*right, Expression::BinaryOp { op: BinOp::Or, .. }));
            }
            other => panic!("Expected '==' at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_left_associative() {
        match parse_expr("a && b && c") {
            Expression::BinaryOp {
                op: BinOp::And,
                left,
                right,
                ..
            } => {
                assert!(matches!(*left, Expression::BinaryOp { op: BinOp::And, .. }));
                assert_eq!(ident(&right), "c");
            }
            other => panic!("Expected '&&' at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_postfix_chain() {
        // a.b(c).d == Deref(Call(Deref(a, b), [c]), d)
        match parse_expr("a.b(c).d") {
            Expression::Deref { object, member, .. } => {
                assert_eq!(member.name, "d");
                match *object {
                    Expression::Call { callee, args, .. } => {
                        assert_eq!(args.len(), 1);
                        assert_eq!(ident(&args[0].value), "c");
                        assert!(matches!(
                            *callee,
                            Expression::Deref { ref member, .. } if member.name == "b"
                        ));
                    }
                    other => panic!("Expected call, got {:?}", other),
                }
            }
            other => panic!("Expected member access, got {:?}", other),
        }
    }

    #[test]
    fn test_not_applies_to_postfix_expression() {
        match parse_expr("!a.b") {
            Expression::Not { operand, .. } => {
                assert!(matches!(*operand, Expression::Deref { .. }));
            }
            other => panic!("Expected '!', got {:?}", other),
        }
    }

    #[test]
    fn test_named_and_positional_arguments() {
        match parse_expr("f(1, .name = \"x\", [a, b,],)") {
            Expression::Call { args, .. } => {
                assert_eq!(args.len(), 3);
                assert!(args[0].is_positional());
                assert_eq!(args[1].label.as_ref().map(|l| l.name.as_str()), Some("name"));
                assert!(matches!(args[1].value, Expression::StringLiteral(ref s, _) if s == "x"));
                assert!(
                    matches!(args[2].value, Expression::ArrayLiteral { ref elements, .. } if elements.len() == 2)
                );
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_comma_is_ignored() {
        let with = parse_expr("[1, 2,]");
        let without = parse_expr("[1, 2]");
        match (with, without) {
            (
                Expression::ArrayLiteral { elements: a, .. },
                Expression::ArrayLiteral { elements: b, .. },
            ) => {
                assert_eq!(a.len(), b.len());
                assert!(a.iter().zip(&b).all(|(x, y)| match (x, y) {
                    (Expression::IntLiteral(m, _), Expression::IntLiteral(n, _)) => m == n,
                    _ => false,
                }));
            }
            other => panic!("Expected arrays, got {:?}", other),
        }
    }

    #[test]
    fn test_group_is_preserved() {
        let expr = parse_expr("(a || b) && c");
        match &expr {
            Expression::BinaryOp {
                op: BinOp::And,
                left,
                ..
            } => {
                assert!(matches!(**left, Expression::Group { .. }));
                assert!(matches!(
                    left.unparenthesized(),
                    Expression::BinaryOp { op: BinOp::Or, .. }
                ));
            }
            other => panic!("Expected '&&', got {:?}", other),
        }
        assert_eq!(expr.span().start, 0);
        assert_eq!(expr.span().end, 13);
    }

    #[test]
    fn test_defined_is_plain_identifier_outside_directives() {
        match parse_expr("defined(X)") {
            Expression::Call { callee, .. } => assert_eq!(ident(&callee), "defined"),
            other => panic!("Expected call, got {:?}", other),
        }

        let mut parser = Parser::new("defined(X) && Y");
        match parser.parse_directive_expression().unwrap() {
            Expression::BinaryOp { left, .. } => {
                assert!(matches!(*left, Expression::IsDefined { ref name, .. } if name.name == "X"));
            }
            other => panic!("Expected '&&', got {:?}", other),
        }
    }

    #[test]
    fn test_plus_is_rejected() {
        let mut parser = Parser::new("1 + 0");
        let err = parser.parse_expression(LOWEST_PRECEDENCE).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(err.span.column, 3);
    }

    #[test]
    fn test_repeated_comma_is_structural() {
        let mut parser = Parser::new("[1,,2]");
        let expr = parser.parse_expression(LOWEST_PRECEDENCE).unwrap();
        assert!(matches!(expr, Expression::ArrayLiteral { ref elements, .. } if elements.len() == 2));
        assert_eq!(parser.diagnostics().len(), 1);
        assert_eq!(parser.diagnostics()[0].kind, ErrorKind::Structural);
        assert_eq!(parser.diagnostics()[0].span.column, 4);
    }

    #[test]
    fn test_unclosed_call_names_opener() {
        let mut parser = Parser::new("f(a, b");
        let err = parser.parse_expression(LOWEST_PRECEDENCE).unwrap_err();
        assert_eq!(err.span.column, 2);
        assert!(err.message.contains("line 1, column 2"), "{}", err.message);
    }
}
