//! Directive parsing implementation
//!
//! Lines starting with `%` are directives. This module handles:
//!
//! - Conditional blocks: `%if`, `%ifdef`, `%ifndef`, `%iffile`, `%ifnofile`,
//!   continued by `%elif` / `%else` and closed by `%endif`
//! - Message directives: `%error text`, `%warning text`
//! - Any other `%` line, kept verbatim (see [`Parser::parse_statement`])
//!
//! # Grammar
//!
//! ```text
//! directive_block ::= opener EOL body ( "%elif" expr EOL body )*
//!                     [ "%else" EOL body ] "%endif" EOL
//! opener          ::= "%if" expr | "%ifdef" identifier | "%ifndef" identifier
//!                   | "%iffile" text | "%ifnofile" text
//! ```
//!
//! Conditions are parsed, never evaluated. A block is closed only by its own
//! `%endif`; reaching the end of input (or the `}` of an enclosing block)
//! first is an error reported at the opener.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use log::trace;

use crate::parser::ast::*;
use crate::parser::diagnostic::{Diagnostic, ErrorKind, Severity};
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

/// Everything between a directive opener and its `%endif`.
struct DirectiveChain {
    then_body: DirectiveBody,
    elif_clauses: Vec<ElifClause>,
    else_body: Option<DirectiveBody>,
    end: Span,
}

impl Parser {
    /// Parse a `%if`-family block through its `%endif`
    ///
    /// Returns `Ok(None)` when the opener's condition was malformed: the
    /// error is already reported and the block is consumed and dropped.
    pub fn parse_directive_block(&mut self) -> Result<Option<Statement>, ParseError> {
        if !self.peek().opens_directive_block() {
            let found = self.peek_token();
            return Err(ParseError::syntax(
                format!("Expected '%if' directive, found {}", found),
                found.span(),
            ));
        }

        self.enter_nesting()?;
        let opener = self.advance();
        let open = opener.span();
        trace!("entering {} block at {}", opener, open);

        let condition = match self.parse_directive_condition(&opener) {
            Ok(condition) => Some(condition),
            Err(err) => {
                self.report(err);
                self.skip_to_end_of_line();
                None
            }
        };

        self.directive_depth += 1;
        let chain = self.parse_directive_chain(&opener);
        self.directive_depth -= 1;
        self.exit_nesting();

        let chain = chain?;
        trace!("leaving {} block opened at {}", opener, open);

        let Some(condition) = condition else {
            return Ok(None);
        };
        Ok(Some(Statement::DirectiveIf {
            condition,
            then_body: chain.then_body,
            elif_clauses: chain.elif_clauses,
            else_body: chain.else_body,
            span: open.to(chain.end),
        }))
    }

    /// Parse the condition after an opener, through the end of its line
    fn parse_directive_condition(&mut self, opener: &Token) -> Result<DirectiveCondition, ParseError> {
        let ctx = format!("after {} condition", opener);
        let condition = match opener {
            Token::DirIf(_) => DirectiveCondition::Expr(self.parse_directive_expression()?),
            Token::DirIfdef(_) => DirectiveCondition::Defined(self.expect_identifier("after '%ifdef'")?),
            Token::DirIfndef(_) => {
                DirectiveCondition::NotDefined(self.expect_identifier("after '%ifndef'")?)
            }
            Token::DirIffile(_) => DirectiveCondition::FileExists(self.directive_path(opener)),
            _ => DirectiveCondition::FileNotExists(self.directive_path(opener)),
        };

        self.expect_end_of_line(&ctx)?;
        Ok(condition)
    }

    /// Rest of the line as a path. An empty path is kept but warned about.
    fn directive_path(&mut self, opener: &Token) -> String {
        let (path, span) = self.rest_of_line();
        if path.is_empty() {
            self.push_diagnostic(Diagnostic::warning(
                ErrorKind::Syntax,
                format!("Empty path after {}", opener),
                opener.span().to(span),
            ));
        }
        path
    }

    /// Parse bodies and continuation lines up to and including `%endif`
    fn parse_directive_chain(&mut self, opener: &Token) -> Result<DirectiveChain, ParseError> {
        let then_body = self.parse_directive_body();
        let mut elif_clauses = Vec::new();
        let mut else_body: Option<DirectiveBody> = None;

        loop {
            match self.peek_token() {
                Token::DirElif(start) => {
                    self.advance();
                    if else_body.is_some() {
                        self.report(ParseError::syntax("'%elif' after '%else'", start));
                    }

                    let condition = match self.parse_elif_condition() {
                        Ok(condition) => Some(condition),
                        Err(err) => {
                            self.report(err);
                            self.skip_to_end_of_line();
                            None
                        }
                    };
                    let body = self.parse_directive_body();

                    if let (Some(condition), None) = (condition, &else_body) {
                        elif_clauses.push(ElifClause {
                            condition,
                            span: start.to(body.span),
                            body,
                        });
                    }
                }
                Token::DirElse(start) => {
                    self.advance();
                    if else_body.is_some() {
                        self.report(ParseError::syntax("Duplicate '%else'", start));
                    }
                    self.end_directive_line("'%else'");

                    let body = self.parse_directive_body();
                    if else_body.is_none() {
                        else_body = Some(body);
                    }
                }
                Token::DirEndif(end) => {
                    self.advance();
                    self.end_directive_line("'%endif'");
                    return Ok(DirectiveChain {
                        then_body,
                        elif_clauses,
                        else_body,
                        end,
                    });
                }
                found => {
                    let open = opener.span();
                    return Err(ParseError::syntax(
                        format!(
                            "Missing '%endif' for {} opened at {}, found {}",
                            opener, open, found
                        ),
                        open,
                    ));
                }
            }
        }
    }

    fn parse_elif_condition(&mut self) -> Result<Expression, ParseError> {
        let condition = self.parse_directive_expression()?;
        self.expect_end_of_line("after '%elif' condition")?;
        Ok(condition)
    }

    /// Statements up to the next `%elif`, `%else` or `%endif`
    ///
    /// Also stops at the end of input and at a `}` closing an enclosing
    /// block; the chain reports those as a missing `%endif`.
    fn parse_directive_body(&mut self) -> DirectiveBody {
        let mut statements = Vec::new();

        let in_braces = self.brace_depth > 0;
        while !self.aborted {
            match self.peek() {
                Token::DirElif(_) | Token::DirElse(_) | Token::DirEndif(_) | Token::Eof(_) => break,
                Token::RBrace(_) if in_braces => break,
                _ => self.parse_into(&mut statements),
            }
        }

        self.warn_duplicate_declarations(&statements);

        let span = match (statements.first(), statements.last()) {
            (Some(first), Some(last)) => first.span().to(last.span()),
            _ => {
                let at = self.current_span();
                Span::new(at.start, at.start, at.line, at.column)
            }
        };
        DirectiveBody { statements, span }
    }

    /// Finish a `%else`/`%endif` line; anything else on it is ignored.
    fn end_directive_line(&mut self, directive: &str) {
        match self.peek_token() {
            Token::EndOfLine(_) => {
                self.advance();
            }
            Token::Eof(_) => {}
            extra => {
                self.push_diagnostic(Diagnostic::warning(
                    ErrorKind::Syntax,
                    format!("Extra tokens after {} ignored", directive),
                    extra.span(),
                ));
                self.skip_to_end_of_line();
            }
        }
    }

    /// Parse `%error text` / `%warning text`
    pub(crate) fn parse_diagnostic_directive(&mut self) -> Result<Statement, ParseError> {
        let token = self.advance();
        let severity = match token {
            Token::DirError(_) => Severity::Error,
            _ => Severity::Warning,
        };

        let (message, text_span) = self.rest_of_line();
        self.expect_end_of_line(&format!("after {} message", token))?;
        Ok(Statement::Diagnostic {
            severity,
            message,
            span: token.span().to(text_span),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::diagnostic::Severity;
    use crate::parser::parse::parse;

    fn directive_if(stmt: &Statement) -> (&DirectiveCondition, &DirectiveBody, &[ElifClause], Option<&DirectiveBody>) {
        match stmt {
            Statement::DirectiveIf {
                condition,
                then_body,
                elif_clauses,
                else_body,
                ..
            } => (condition, then_body, elif_clauses, else_body.as_ref()),
            other => panic!("Expected directive block, got {:?}", other),
        }
    }

    #[test]
    fn test_full_chain() {
        let source = "%if A && defined(B)\na = 1\n%elif C\nb = 2\n%else\nc = 3\n%endif\n";
        let output = parse(source);
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);

        let (condition, then_body, elifs, else_body) = directive_if(&output.program.statements[0]);
        match condition {
            DirectiveCondition::Expr(Expression::BinaryOp { right, .. }) => {
                assert!(matches!(**right, Expression::IsDefined { ref name, .. } if name.name == "B"));
            }
            other => panic!("Expected expression condition, got {:?}", other),
        }
        assert_eq!(then_body.statements.len(), 1);
        assert_eq!(elifs.len(), 1);
        assert!(matches!(elifs[0].condition, Expression::Identifier(ref i) if i.name == "C"));
        assert_eq!(else_body.map(|b| b.statements.len()), Some(1));
        assert_eq!(output.program.statements[0].span().end, source.len() - 1);
    }

    #[test]
    fn test_nested_blocks_pair_innermost_first() {
        let source = "%ifdef A\n%ifndef B\nx = 1\n%endif\ny = 2\n%endif";
        let output = parse(source);
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        assert_eq!(output.program.statements.len(), 1);

        let (condition, then_body, _, _) = directive_if(&output.program.statements[0]);
        assert!(matches!(condition, DirectiveCondition::Defined(ref i) if i.name == "A"));
        assert_eq!(then_body.statements.len(), 2);
        let (inner, inner_body, _, _) = directive_if(&then_body.statements[0]);
        assert!(matches!(inner, DirectiveCondition::NotDefined(ref i) if i.name == "B"));
        assert_eq!(inner_body.statements.len(), 1);
    }

    #[test]
    fn test_file_conditions_take_rest_of_line() {
        let output = parse("%iffile conf/a b.txt\n%endif\n%ifnofile x\n%endif");
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        let (condition, ..) = directive_if(&output.program.statements[0]);
        assert_eq!(condition, &DirectiveCondition::FileExists("conf/a b.txt".to_string()));
        let (condition, ..) = directive_if(&output.program.statements[1]);
        assert_eq!(condition, &DirectiveCondition::FileNotExists("x".to_string()));
    }

    #[test]
    fn test_empty_path_warns() {
        let output = parse("%iffile\n%endif");
        assert!(!output.has_errors());
        assert_eq!(output.warnings().count(), 1);
        assert_eq!(output.program.statements.len(), 1);
    }

    #[test]
    fn test_unterminated_block() {
        let output = parse("x = 1\n%if X\ny = 2\n");
        let errors: Vec<_> = output.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span.line, 2);
        assert_eq!(errors[0].span.column, 1);
        assert!(errors[0].message.contains("'%endif'"));
        assert_eq!(output.program.statements.len(), 1);
    }

    #[test]
    fn test_block_closed_by_brace_is_unterminated() {
        let output = parse("group g {\n%ifdef X\na = 1\n}\nb = 2");
        let errors: Vec<_> = output.errors().collect();
        assert_eq!(errors.len(), 1, "{:?}", errors);
        assert_eq!(errors[0].span.line, 2);
        match &output.program.statements[0] {
            Statement::GroupDecl { body, .. } => assert!(body.statements.is_empty()),
            other => panic!("Expected group, got {:?}", other),
        }
        assert_eq!(output.program.statements.len(), 2);
    }

    #[test]
    fn test_elif_after_else() {
        let output = parse("%if A\n%else\n%elif B\nx = 1\n%endif\ny = 2");
        let errors: Vec<_> = output.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span.line, 3);

        let (_, _, elifs, else_body) = directive_if(&output.program.statements[0]);
        assert!(elifs.is_empty());
        assert!(else_body.is_some());
        assert_eq!(output.program.statements.len(), 2);
    }

    #[test]
    fn test_duplicate_else() {
        let output = parse("%if A\nx = 1\n%else\ny = 2\n%else\nz = 3\n%endif\nw = 4");
        let errors: Vec<_> = output.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span.line, 5);
        assert!(errors[0].message.contains("Duplicate '%else'"));

        let (_, then_body, _, else_body) = directive_if(&output.program.statements[0]);
        assert_eq!(then_body.statements.len(), 1);
        let else_body = else_body.expect("first else branch kept");
        assert!(matches!(
            &else_body.statements[..],
            [Statement::Assign { target, .. }] if target.name == "y"
        ));
        assert_eq!(output.program.statements.len(), 2);
    }

    #[test]
    fn test_keyword_with_suffix_is_opaque() {
        let output = parse("%if2 X\n%endif\n");
        let errors: Vec<_> = output.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span.line, 2);
        assert!(errors[0].message.contains("without matching '%if'"));
        assert!(matches!(
            &output.program.statements[..],
            [Statement::Directive { text, .. }] if text == "if2 X"
        ));
    }

    #[test]
    fn test_stray_endif() {
        let output = parse("%endif\nx = 1");
        assert_eq!(output.errors().count(), 1);
        assert_eq!(output.program.statements.len(), 1);
    }

    #[test]
    fn test_extra_tokens_after_endif_warn() {
        let output = parse("%ifdef A\n%endif A\nx = 1");
        assert!(!output.has_errors());
        assert_eq!(output.warnings().count(), 1);
        assert_eq!(output.program.statements.len(), 2);
    }

    #[test]
    fn test_bad_condition_drops_block() {
        let output = parse("%if ==\nx = 1\n%endif\ny = 2");
        assert_eq!(output.errors().count(), 1);
        assert_eq!(output.program.statements.len(), 1);
        assert!(matches!(output.program.statements[0], Statement::Assign { ref target, .. } if target.name == "y"));
    }

    #[test]
    fn test_expanding_assign() {
        let output = parse("%ifdef A\npath + $(HOME)/bin # kept\n%endif");
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        let (_, then_body, _, _) = directive_if(&output.program.statements[0]);
        match &then_body.statements[0] {
            Statement::ExpandingAssign { target, value, .. } => {
                assert_eq!(target.name, "path");
                assert_eq!(value, "$(HOME)/bin # kept");
            }
            other => panic!("Expected expanding assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_message_and_opaque_directives() {
        let output = parse("%warning  deprecated  option\n%define X 1\n");
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        assert!(matches!(
            output.program.statements[0],
            Statement::Diagnostic { severity: Severity::Warning, ref message, .. } if message == "deprecated  option"
        ));
        assert!(matches!(
            output.program.statements[1],
            Statement::Directive { ref text, .. } if text == "define X 1"
        ));
    }
}
