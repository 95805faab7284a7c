//! Integration tests for the lint rules.

use std::path::PathBuf;

use acornlint::config::{self, Config};
use acornlint::{check, Linter, Rule, Severity};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(testdata_path().join(name)).expect("fixture should exist")
}

#[test]
fn test_problems_fixture() {
    let text = read_fixture("problems.ac");
    let diagnostics = check(&text).expect("should check");

    let found: Vec<(usize, Rule, Severity)> = diagnostics
        .iter()
        .map(|d| (d.line, d.rule, d.severity))
        .collect();
    assert_eq!(
        found,
        vec![
            (1, Rule::ModuleNameCase, Severity::Error),
            (2, Rule::MissingTypeAnnotation, Severity::Error),
            (3, Rule::TypeNameCase, Severity::Warning),
            (4, Rule::MissingTypeAnnotation, Severity::Error),
            (4, Rule::NoActiveNumerals, Severity::Error),
        ]
    );
}

#[test]
fn test_unproved_theorem_is_clean() {
    let diagnostics = check("theorem Foo(n: Nat) { n + 0 = n }\n").unwrap();
    assert!(
        diagnostics.iter().all(|d| d.rule != Rule::MissingTypeAnnotation),
        "unexpected: {:?}",
        diagnostics
    );
    assert!(diagnostics.iter().all(|d| !d.is_structural()));
}

#[test]
fn test_square_without_annotation() {
    let diagnostics = check("define square(n) -> Nat { n * n }\n").unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].rule, Rule::MissingTypeAnnotation);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert!(diagnostics[0].message.contains("'n'"));
}

#[test]
fn test_check_is_idempotent() {
    let text = read_fixture("problems.ac");
    assert_eq!(check(&text).unwrap(), check(&text).unwrap());
}

#[test]
fn test_missing_return_type() {
    let diagnostics = check("define id(x: Nat) { x }\n").unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].rule, Rule::MissingReturnType);
}

#[test]
fn test_quantifier_binders() {
    let diagnostics = check("theorem AllSelf {\n    forall(x) { x = x }\n}\n").unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].rule, Rule::MissingTypeAnnotation);
    assert_eq!(diagnostics[0].line, 2);
}

#[test]
fn test_undeclared_reference() {
    let text = "\
import nat
theorem UsesNat(a: nat.Nat) { a = a }
theorem UsesInt(b: int.Int) { b = b }
";
    let diagnostics = check(text).unwrap();
    assert_eq!(diagnostics.len(), 1, "unexpected: {:?}", diagnostics);
    assert_eq!(diagnostics[0].rule, Rule::UndeclaredReference);
    assert_eq!(diagnostics[0].line, 3);
    assert_eq!(diagnostics[0].severity, Severity::Warning);
}

#[test]
fn test_duplicate_and_structural_errors() {
    let text = "\
define f(x: Nat) -> Nat { x }
define f(y: Nat) -> Nat { y }
}
";
    let diagnostics = check(text).unwrap();
    let rules: Vec<Rule> = diagnostics.iter().map(|d| d.rule).collect();
    assert_eq!(rules, vec![Rule::DuplicateDeclaration, Rule::UnmatchedDelimiter]);
    assert_eq!(diagnostics[0].line, 2);
    assert_eq!(diagnostics[1].line, 3);
}

#[test]
fn test_suppressions() {
    let text = "\
// acornlint:ignore-file latex_syntax - Docs pasted from a paper
let a: Nat = \\alpha
theorem lower_case { true } // acornlint:ignore type_name_case
";
    let report = Linter::new().lint("t.ac", text).unwrap();
    assert!(report.diagnostics.is_empty(), "unexpected: {:?}", report.diagnostics);
    assert_eq!(report.suppressed_count(), 2);
}

#[test]
fn test_config_fixture_drives_linter() {
    let config = Config::parse_file(testdata_path().join("acornlint.yaml")).unwrap();
    config::validate(&config).unwrap();

    let text = read_fixture("problems.ac");
    let report = Linter::from_config(&config).lint("problems.ac", &text).unwrap();

    assert!(report.diagnostics.iter().all(|d| d.rule != Rule::NoActiveNumerals));
    let naming = report
        .diagnostics
        .iter()
        .find(|d| d.rule == Rule::TypeNameCase)
        .unwrap();
    assert_eq!(naming.severity, Severity::Error);
    assert_eq!(report.error_count(), 4);
    assert_eq!(report.warning_count(), 0);
}

#[test]
fn test_empty_snippet_is_error() {
    assert!(check("").is_err());
    assert!(check("   \n").is_err());
}
