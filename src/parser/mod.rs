//! nodelang source parser
//!
//! This module transforms nodelang source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens), including directive lines
//! - [`parse`]: Parsing (tokens → AST) with error recovery
//! - [`ast`]: AST node definitions
//! - [`diagnostic`]: Errors and warnings collected along the way
//! - [`options`]: Per-parse limits and switches
//!
//! # Language
//!
//! - Declarations: `const name [: type] = expr`, `group name { ... }`
//! - Statements: `x = expr`, `x += expr`, `if (expr) { ... } else { ... }`
//! - Expressions: literals, arrays, calls with named arguments, member access,
//!   `!`, `==`, `||`, `&&`
//! - Directives: `%if`/`%ifdef`/`%ifndef`/`%iffile`/`%ifnofile` blocks,
//!   `%error`, `%warning`, and opaque `%` lines passed through untouched
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with precedence climbing for binary operators.
//! No external parser generator dependencies.

pub mod ast;
mod declarations;
pub mod diagnostic;
mod directives;
mod expressions;
pub mod lexer;
pub mod options;
pub mod parse;
mod printer;
mod statements;

pub use diagnostic::{Diagnostic, ErrorKind, Severity};
pub use options::ParseOptions;
pub use parse::{
    parse, parse_bytes, parse_with_options, FatalError, ParseError, ParseFailure, ParseOutput,
    Parser,
};
