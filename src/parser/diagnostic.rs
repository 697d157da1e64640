//! Diagnostics shared by the lexer and parser
//!
//! Every problem found while scanning or parsing ends up here as a
//! [`Diagnostic`]: a severity, the class of error, a message and the span it
//! refers to. Nothing is ever dropped silently; recovery only decides what
//! happens *after* a diagnostic has been recorded.

use std::fmt;

use super::ast::Span;

/// Severity level of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Which stage found the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unterminated quote, stray character, malformed number.
    Lexical,
    /// Unexpected token, unmatched delimiter, broken directive chain.
    Syntax,
    /// Well-tokenised but malformed list shape, such as `[1,,2]`.
    Structural,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Lexical => write!(f, "lexical"),
            ErrorKind::Syntax => write!(f, "syntax"),
            ErrorKind::Structural => write!(f, "structural"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn error(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message: message.into(),
            span,
        }
    }

    pub fn warning(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            message: message.into(),
            span,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} at {}: {}",
            self.kind, self.severity, self.span, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_location() {
        let diag = Diagnostic::error(
            ErrorKind::Syntax,
            "Unexpected token",
            Span::new(4, 5, 2, 3),
        );
        assert_eq!(
            diag.to_string(),
            "syntax error at line 2, column 3: Unexpected token"
        );
        assert!(diag.is_error());
    }

    #[test]
    fn test_warning_is_not_error() {
        let diag = Diagnostic::warning(ErrorKind::Syntax, "extra tokens", Span::default());
        assert!(!diag.is_error());
        assert_eq!(diag.severity, Severity::Warning);
    }
}
