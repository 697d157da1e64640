// AST (Abstract Syntax Tree) definitions for nodelang

use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::diagnostic::Severity;

/// Byte range plus the line/column of its first character.
///
/// `start..end` is a half-open byte range into the source text; `line` and
/// `column` are 1-based and refer to `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Span covering `self` through `other`, keeping `self`'s line/column.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end.max(self.end),
            line: self.line,
            column: self.column,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A bare or quoted name.
///
/// Equality and hashing look only at the decoded `name`, so `'abc'` and
/// `abc` are the same identifier.
#[derive(Debug, Clone)]
pub struct Identifier {
    pub name: String,
    pub quoted: bool,
    pub span: Span,
}

impl Identifier {
    pub fn new(name: impl Into<String>, quoted: bool, span: Span) -> Self {
        Self {
            name: name.into(),
            quoted,
            span,
        }
    }

    /// Whether the name can be written without quotes.
    pub fn is_bare(&self) -> bool {
        is_bare_name(&self.name)
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Reserved words; an identifier with one of these names must be quoted.
pub const KEYWORDS: [&str; 4] = ["const", "group", "if", "else"];

pub(crate) fn is_bare_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    starts_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !KEYWORDS.contains(&name)
}

/// Binary operators, all left-associative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    Or,
    And,
}

impl BinOp {
    /// Binding strength used by the precedence climber.
    ///
    /// `==` sits below `||` and `&&`; postfix call (5) and member access (6)
    /// are handled outside the binary loop and bind tighter than all of these.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Eq => 2,
            BinOp::Or => 3,
            BinOp::And => 4,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Eq => "==",
            BinOp::Or => "||",
            BinOp::And => "&&",
        }
    }
}

/// Lowest binding strength; passing it to `parse_expression` accepts any
/// binary operator.
pub const LOWEST_PRECEDENCE: u8 = 0;

/// Call argument, optionally labelled with `.name = value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub label: Option<Identifier>,
    pub value: Expression,
}

impl Argument {
    pub fn is_positional(&self) -> bool {
        self.label.is_none()
    }
}

/// Expression nodes
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    IntLiteral(i64, Span),
    FloatLiteral(f64, Span),
    StringLiteral(String, Span),
    ArrayLiteral {
        elements: Vec<Expression>,
        span: Span,
    },
    Identifier(Identifier),
    Not {
        operand: Box<Expression>,
        span: Span,
    },
    /// Explicit parentheses. Carries no meaning beyond its inner node.
    Group {
        inner: Box<Expression>,
        span: Span,
    },
    BinaryOp {
        op: BinOp,
        left: Box<Expression>,
        right: Box<Expression>,
        span: Span,
    },
    Call {
        callee: Box<Expression>,
        args: Vec<Argument>,
        span: Span,
    },
    Deref {
        object: Box<Expression>,
        member: Identifier,
        span: Span,
    },
    /// `defined(name)`, only produced inside directive conditions.
    IsDefined {
        name: Identifier,
        span: Span,
    },
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::IntLiteral(_, span)
            | Expression::FloatLiteral(_, span)
            | Expression::StringLiteral(_, span) => *span,
            Expression::Identifier(ident) => ident.span,
            Expression::ArrayLiteral { span, .. }
            | Expression::Not { span, .. }
            | Expression::Group { span, .. }
            | Expression::BinaryOp { span, .. }
            | Expression::Call { span, .. }
            | Expression::Deref { span, .. }
            | Expression::IsDefined { span, .. } => *span,
        }
    }

    /// Strips any number of `Group` layers.
    pub fn unparenthesized(&self) -> &Expression {
        let mut expr = self;
        while let Expression::Group { inner, .. } = expr {
            expr = inner;
        }
        expr
    }
}

/// Which `%if`-family directive opened a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    Expr,
    Defined,
    NotDefined,
    FileExists,
    FileNotExists,
}

impl ConditionKind {
    pub fn directive(self) -> &'static str {
        match self {
            ConditionKind::Expr => "%if",
            ConditionKind::Defined => "%ifdef",
            ConditionKind::NotDefined => "%ifndef",
            ConditionKind::FileExists => "%iffile",
            ConditionKind::FileNotExists => "%ifnofile",
        }
    }
}

/// Condition payload of a directive block. Never evaluated here: symbol
/// and file lookups belong to whoever walks the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectiveCondition {
    Expr(Expression),
    Defined(Identifier),
    NotDefined(Identifier),
    FileExists(String),
    FileNotExists(String),
}

impl DirectiveCondition {
    pub fn kind(&self) -> ConditionKind {
        match self {
            DirectiveCondition::Expr(_) => ConditionKind::Expr,
            DirectiveCondition::Defined(_) => ConditionKind::Defined,
            DirectiveCondition::NotDefined(_) => ConditionKind::NotDefined,
            DirectiveCondition::FileExists(_) => ConditionKind::FileExists,
            DirectiveCondition::FileNotExists(_) => ConditionKind::FileNotExists,
        }
    }
}

/// Brace-delimited statement list (`{ ... }`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl Block {
    pub fn declarations(&self) -> FxHashMap<&str, &Statement> {
        index_declarations(&self.statements)
    }
}

/// Statement list of a directive branch, closed by `%elif`, `%else` or
/// `%endif` rather than by braces.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DirectiveBody {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElifClause {
    pub condition: Expression,
    pub body: DirectiveBody,
    pub span: Span,
}

/// Statement and declaration nodes
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    ConstDecl {
        name: Identifier,
        declared_type: Option<Expression>,
        value: Expression,
        span: Span,
    },
    GroupDecl {
        name: Identifier,
        body: Block,
        span: Span,
    },
    Assign {
        target: Identifier,
        value: Expression,
        span: Span,
    },
    AppendAssign {
        target: Identifier,
        value: Expression,
        span: Span,
    },
    /// `name + text`: the right-hand side is kept as unexpanded raw text.
    ExpandingAssign {
        target: Identifier,
        value: String,
        span: Span,
    },
    If {
        condition: Expression,
        then_body: Block,
        else_body: Option<Block>,
        span: Span,
    },
    DirectiveIf {
        condition: DirectiveCondition,
        then_body: DirectiveBody,
        elif_clauses: Vec<ElifClause>,
        else_body: Option<DirectiveBody>,
        span: Span,
    },
    /// `%error` / `%warning` line, recorded but not emitted.
    Diagnostic {
        severity: Severity,
        message: String,
        span: Span,
    },
    /// Unrecognised `%` line, passed through verbatim (without the `%`).
    Directive { text: String, span: Span },
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::ConstDecl { span, .. }
            | Statement::GroupDecl { span, .. }
            | Statement::Assign { span, .. }
            | Statement::AppendAssign { span, .. }
            | Statement::ExpandingAssign { span, .. }
            | Statement::If { span, .. }
            | Statement::DirectiveIf { span, .. }
            | Statement::Diagnostic { span, .. }
            | Statement::Directive { span, .. } => *span,
        }
    }

    /// Name introduced by a `const` or `group` declaration.
    pub fn declared_name(&self) -> Option<&Identifier> {
        match self {
            Statement::ConstDecl { name, .. } | Statement::GroupDecl { name, .. } => Some(name),
            _ => None,
        }
    }
}

fn index_declarations(statements: &[Statement]) -> FxHashMap<&str, &Statement> {
    let mut index = FxHashMap::default();
    for stmt in statements {
        if let Some(name) = stmt.declared_name() {
            index.insert(name.name.as_str(), stmt);
        }
    }
    index
}

/// Top-level program structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    /// Top-level `const` and `group` declarations by decoded name.
    pub fn declarations(&self) -> FxHashMap<&str, &Statement> {
        index_declarations(&self.statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_equality_ignores_quoting() {
        let bare = Identifier::new("abc", false, Span::new(0, 3, 1, 1));
        let quoted = Identifier::new("abc", true, Span::new(10, 15, 2, 1));
        assert_eq!(bare, quoted);

        let other = Identifier::new("it's", true, Span::default());
        assert_ne!(bare, other);
    }

    #[test]
    fn test_bare_names() {
        assert!(is_bare_name("value_2"));
        assert!(is_bare_name("_x"));
        assert!(!is_bare_name("2x"));
        assert!(!is_bare_name("it's"));
        assert!(!is_bare_name(""));
        assert!(!is_bare_name("group"));
    }

    #[test]
    fn test_unparenthesized_strips_groups() {
        let inner = Expression::IntLiteral(1, Span::new(2, 3, 1, 3));
        let expr = Expression::Group {
            inner: Box::new(Expression::Group {
                inner: Box::new(inner.clone()),
                span: Span::new(1, 4, 1, 2),
            }),
            span: Span::new(0, 5, 1, 1),
        };
        assert_eq!(expr.unparenthesized(), &inner);
    }

    #[test]
    fn test_precedence_order() {
        assert!(BinOp::Eq.precedence() < BinOp::Or.precedence());
        assert!(BinOp::Or.precedence() < BinOp::And.precedence());
    }
}
