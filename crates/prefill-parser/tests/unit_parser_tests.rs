//! Rewrite + parse tests over authored rule text

use prefill_core::ast::{Expression, Operator, RewriteDeclaration, Statement};
use prefill_core::Value;
use prefill_parser::{apply_rewrites, apply_token_table, substitute_placeholders, RuleParser};

fn rewrite(rule: &str, rewrites: &[RewriteDeclaration]) -> String {
    apply_token_table(&apply_rewrites(rule, rewrites))
}

#[test]
fn test_authored_rule_to_program() {
    let rewrites = vec![RewriteDeclaration::new(
        "$A CONTAINS ValueSet (X)",
        "${aCount} > 0",
    )];
    let text = rewrite("IF ($A CONTAINS ValueSet (X)) THEN 'Z' SHALL = 'Y' ELSE 'N'", &rewrites);
    let text = substitute_placeholders(&text, |name| (name == "aCount").then(|| "0".to_string()));
    assert_eq!(text, "if (0 > 0) { 'Z'  = 'Y' } else { 'N'");

    let program = RuleParser::parse(&text).unwrap();
    match &program.statements[0] {
        Statement::If {
            condition,
            else_branch,
            ..
        } => {
            assert!(matches!(condition, Expression::Binary { op: Operator::Gt, .. }));
            assert_eq!(
                else_branch.as_deref(),
                Some(&[Statement::Expression(Expression::Literal(Value::String(
                    "N".to_string()
                )))][..])
            );
        }
        other => panic!("Expected if statement, got {:?}", other),
    }
}

#[test]
fn test_compound_condition() {
    let text = rewrite(
        "IF (${a} == 'Y' AND NOT (${b} == 'Y') OR ${c} > 2) THEN 'Y' ELSE 'N'",
        &[],
    );
    let text = substitute_placeholders(&text, |name| match name {
        "a" => Some("'Y'".to_string()),
        "b" => Some("'N'".to_string()),
        "c" => Some("1".to_string()),
        _ => None,
    });

    let program = RuleParser::parse(&text).unwrap();
    match &program.statements[0] {
        Statement::If { condition, .. } => match condition {
            Expression::Binary { op, left, .. } => {
                assert_eq!(*op, Operator::Or);
                assert!(matches!(**left, Expression::Binary { op: Operator::And, .. }));
            }
            other => panic!("Unexpected condition {:?}", other),
        },
        other => panic!("Expected if statement, got {:?}", other),
    }
}

#[test]
fn test_upstream_rewrite_can_disable_downstream_rewrite() {
    // Literal rewrites chain: the first one consumes the text the second expects
    let rewrites = vec![
        RewriteDeclaration::new("$A", "${x}"),
        RewriteDeclaration::new("$A CONTAINS", "${y} >"),
    ];
    assert_eq!(apply_rewrites("$A CONTAINS 1", &rewrites), "${x} CONTAINS 1");
}

#[test]
fn test_mismatched_parentheses_fail_to_parse() {
    let text = rewrite("IF ((${a} > 0) THEN 'Y' ELSE 'N'", &[]);
    let text = substitute_placeholders(&text, |_| Some("1".to_string()));
    assert!(RuleParser::parse(&text).is_err());
}
