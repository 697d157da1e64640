//! Source rendering for AST nodes
//!
//! `Display` for [`Expression`], [`Statement`] and [`Program`] writes
//! nodelang source that parses back to an equivalent tree. Binary operations
//! are always fully parenthesized, so explicit groups are printed as their
//! inner expression. Bodies are indented by four spaces.

use std::fmt;

use super::ast::*;
use super::diagnostic::Severity;

const INDENT: &str = "    ";

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bare() {
            f.write_str(&self.name)
        } else {
            write!(f, "'{}'", self.name.replace('\'', "\\'"))
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, ".{} = {}", label, self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::IntLiteral(n, _) => write!(f, "{}", n),
            Expression::FloatLiteral(x, _) => {
                let text = x.to_string();
                if text.contains('.') {
                    f.write_str(&text)
                } else {
                    write!(f, "{}.0", text)
                }
            }
            Expression::StringLiteral(s, _) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Expression::ArrayLiteral { elements, .. } => {
                f.write_str("[")?;
                write_list(f, elements)?;
                f.write_str("]")
            }
            Expression::Identifier(ident) => write!(f, "{}", ident),
            Expression::Not { operand, .. } => write!(f, "!{}", operand),
            Expression::Group { inner, .. } => write!(f, "{}", inner),
            Expression::BinaryOp {
                op, left, right, ..
            } => write!(f, "({} {} {})", left, op.symbol(), right),
            Expression::Call { callee, args, .. } => {
                write_postfix_operand(f, callee)?;
                f.write_str("(")?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Expression::Deref { object, member, .. } => {
                write_postfix_operand(f, object)?;
                write!(f, ".{}", member)
            }
            Expression::IsDefined { name, .. } => write!(f, "defined({})", name),
        }
    }
}

/// `!` binds looser than `.` and `()`, so a negated callee or object needs
/// its parentheses back. A callee named `defined` stays quoted so that a
/// directive condition does not read it back as `defined(name)`.
fn write_postfix_operand(f: &mut fmt::Formatter<'_>, expr: &Expression) -> fmt::Result {
    match expr.unparenthesized() {
        inner @ Expression::Not { .. } => write!(f, "({})", inner),
        Expression::Identifier(ident) if ident.name == "defined" => f.write_str("'defined'"),
        inner => write!(f, "{}", inner),
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for DirectiveCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let directive = self.kind().directive();
        match self {
            DirectiveCondition::Expr(expr) => write!(f, "{} {}", directive, expr),
            DirectiveCondition::Defined(name) | DirectiveCondition::NotDefined(name) => {
                write!(f, "{} {}", directive, name)
            }
            DirectiveCondition::FileExists(path) | DirectiveCondition::FileNotExists(path) => {
                write!(f, "{} {}", directive, path)
            }
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_statement(f, self, 0)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_statements(f, &self.statements, 0)
    }
}

fn write_statements(f: &mut fmt::Formatter<'_>, statements: &[Statement], depth: usize) -> fmt::Result {
    for stmt in statements {
        write_statement(f, stmt, depth)?;
    }
    Ok(())
}

/// Write one statement and its trailing newline.
fn write_statement(f: &mut fmt::Formatter<'_>, stmt: &Statement, depth: usize) -> fmt::Result {
    let pad = INDENT.repeat(depth);

    match stmt {
        Statement::ConstDecl {
            name,
            declared_type,
            value,
            ..
        } => {
            write!(f, "{}const {}", pad, name)?;
            if let Some(declared_type) = declared_type {
                write!(f, ": {}", declared_type)?;
            }
            writeln!(f, " = {}", value)
        }
        Statement::GroupDecl { name, body, .. } => {
            writeln!(f, "{}group {} {{", pad, name)?;
            write_statements(f, &body.statements, depth + 1)?;
            writeln!(f, "{}}}", pad)
        }
        Statement::Assign { target, value, .. } => writeln!(f, "{}{} = {}", pad, target, value),
        Statement::AppendAssign { target, value, .. } => {
            writeln!(f, "{}{} += {}", pad, target, value)
        }
        Statement::ExpandingAssign { target, value, .. } => {
            writeln!(f, "{}{} + {}", pad, target, value)
        }
        Statement::If {
            condition,
            then_body,
            else_body,
            ..
        } => {
            writeln!(f, "{}if ({}) {{", pad, condition)?;
            write_statements(f, &then_body.statements, depth + 1)?;
            write!(f, "{}}}", pad)?;
            if let Some(else_body) = else_body {
                writeln!(f, " else {{")?;
                write_statements(f, &else_body.statements, depth + 1)?;
                write!(f, "{}}}", pad)?;
            }
            writeln!(f)
        }
        Statement::DirectiveIf {
            condition,
            then_body,
            elif_clauses,
            else_body,
            ..
        } => {
            writeln!(f, "{}{}", pad, condition)?;
            write_statements(f, &then_body.statements, depth + 1)?;
            for clause in elif_clauses {
                writeln!(f, "{}%elif {}", pad, clause.condition)?;
                write_statements(f, &clause.body.statements, depth + 1)?;
            }
            if let Some(else_body) = else_body {
                writeln!(f, "{}%else", pad)?;
                write_statements(f, &else_body.statements, depth + 1)?;
            }
            writeln!(f, "{}%endif", pad)
        }
        Statement::Diagnostic {
            severity, message, ..
        } => match severity {
            Severity::Error => writeln!(f, "{}%error {}", pad, message),
            Severity::Warning => writeln!(f, "{}%warning {}", pad, message),
        },
        Statement::Directive { text, .. } => writeln!(f, "{}%{}", pad, text),
    }
}
