// Integration tests for whole nodelang documents

use nodelang::parser::ast::{DirectiveCondition, Expression, Statement};
use nodelang::{parse, parse_bytes, parse_with_options, ErrorKind, ParseOptions, Severity};

const CONFIG: &str = r#"
# Build configuration
const version: string = "1.4"
const 'release name' = "it's \"final\""

group compiler {
    flags = ["-O2", "-Wall",]
    target = platform.triple(.os = host.os, .arch = "x86_64")

    if (opt.lto && !debug) {
        flags += ["-flto"]
    } else {
        flags += []
    }
}

%if defined(CI) || env.name == "ci"
    jobs = 16
    %ifndef LOCAL_CACHE
        cache + /var/cache/build
    %endif
%elif defined(LAPTOP)
    jobs = 2
%else
    %warning building with default job count
    jobs = 4
%endif

%iffile extra/overrides.nl
    %include extra/overrides.nl
%endif
"#;

#[test]
fn test_full_document() {
    let output = parse(CONFIG);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);

    let program = &output.program;
    assert_eq!(program.statements.len(), 5);

    let decls = program.declarations();
    assert_eq!(decls.len(), 3);
    match decls.get("release name") {
        Some(Statement::ConstDecl { value, .. }) => {
            assert!(matches!(value, Expression::StringLiteral(s, _) if s == "it's \"final\""));
        }
        other => panic!("Expected const declaration, got {:?}", other),
    }

    match decls.get("compiler") {
        Some(Statement::GroupDecl { body, .. }) => {
            assert_eq!(body.statements.len(), 3);
            match &body.statements[1] {
                Statement::Assign {
                    value: Expression::Call { args, .. },
                    ..
                } => {
                    assert_eq!(args.len(), 2);
                    assert!(args.iter().all(|arg| arg.label.is_some()));
                }
                other => panic!("Expected call assignment, got {:?}", other),
            }
        }
        other => panic!("Expected group, got {:?}", other),
    }

    match &program.statements[3] {
        Statement::DirectiveIf {
            condition: DirectiveCondition::Expr(_),
            then_body,
            elif_clauses,
            else_body,
            ..
        } => {
            assert_eq!(then_body.statements.len(), 2);
            assert!(matches!(
                then_body.statements[1],
                Statement::DirectiveIf {
                    condition: DirectiveCondition::NotDefined(_),
                    ..
                }
            ));
            assert_eq!(elif_clauses.len(), 1);
            let else_body = else_body.as_ref().expect("else branch");
            assert!(matches!(
                else_body.statements[0],
                Statement::Diagnostic {
                    severity: Severity::Warning,
                    ..
                }
            ));
        }
        other => panic!("Expected directive block, got {:?}", other),
    }

    match &program.statements[4] {
        Statement::DirectiveIf {
            condition: DirectiveCondition::FileExists(path),
            then_body,
            ..
        } => {
            assert_eq!(path, "extra/overrides.nl");
            assert!(matches!(
                then_body.statements[0],
                Statement::Directive { ref text, .. } if text == "include extra/overrides.nl"
            ));
        }
        other => panic!("Expected %iffile block, got {:?}", other),
    }
}

#[test]
fn test_printed_program_reparses_to_same_text() {
    let first = parse(CONFIG).program.to_string();
    let reparsed = parse(&first);
    assert!(reparsed.diagnostics.is_empty(), "{:?}\n{}", reparsed.diagnostics, first);
    assert_eq!(reparsed.program.to_string(), first);
}

#[test]
fn test_expanding_assign_can_be_disabled() {
    let source = "%ifdef A\nx + raw\n%endif";
    let output = parse_with_options(source, ParseOptions::default().with_expanding_assign(false));
    assert!(output.has_errors());
    assert_eq!(output.errors().next().map(|d| d.kind), Some(ErrorKind::Syntax));
}

#[test]
fn test_parse_bytes_matches_parse() {
    let output = parse_bytes(CONFIG.as_bytes()).expect("valid UTF-8");
    assert_eq!(output.program, parse(CONFIG).program);
}

#[test]
fn test_into_result() {
    assert!(parse(CONFIG).into_result().is_ok());

    let failure = parse("a = [1, 2\nb = 3").into_result().unwrap_err();
    assert!(failure
        .diagnostics
        .iter()
        .any(|d| d.is_error() && d.span.line == 1 && d.span.column == 5));
}
