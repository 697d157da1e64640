//! # Introduction
//!
//! nodelang is a small declarative configuration language. This crate turns
//! nodelang source into a typed syntax tree and reports every problem it finds
//! along the way instead of stopping at the first one.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST + Diagnostics
//! ```
//!
//! 1. [`parser::lexer`] scans tokens on demand. Lines starting with `%` are
//!    directives, and some of them take the rest of their line as raw text.
//! 2. [`parser::Parser`] builds the tree by recursive descent, recovering at
//!    statement boundaries after a syntax error.
//! 3. [`parser::ast`] holds the tree; `Display` on it renders source again.
//!
//! Conditions of `%if`-family blocks are parsed but never evaluated: symbol
//! and file lookups are up to the consumer of the tree.
//!
//! ## Example
//!
//! ```
//! let output = nodelang::parse("const answer: int = 42\n%ifdef DEBUG\nlevel = 3\n%endif\n");
//! assert!(!output.has_errors());
//! assert_eq!(output.program.statements.len(), 2);
//! assert!(output.program.declarations().contains_key("answer"));
//! ```

pub mod parser;

pub use parser::ast::Program;
pub use parser::{
    parse, parse_bytes, parse_with_options, Diagnostic, ErrorKind, FatalError, ParseFailure,
    ParseOptions, ParseOutput, Severity,
};
