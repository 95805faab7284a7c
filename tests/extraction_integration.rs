//! Integration tests for declaration extraction.
//!
//! These run the structural pipeline over the fixtures in testdata/.

use std::path::PathBuf;

use acornlint::extract::{Detail, Directive, TheoremForm};
use acornlint::{check, extract, DeclarationKind, Rule, Span, UnitError};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(testdata_path().join(name)).expect("fixture should exist")
}

#[test]
fn test_clean_fixture_declarations_in_order() {
    let text = read_fixture("clean.ac");
    let out = extract("clean.ac", &text).expect("should extract");

    let top: Vec<(&str, DeclarationKind, usize)> = out
        .declarations
        .iter()
        .map(|d| (d.name.as_str(), d.kind(), d.line()))
        .collect();
    assert_eq!(
        top,
        vec![
            ("nat", DeclarationKind::Directive, 2),
            ("Nat", DeclarationKind::Directive, 3),
            ("double", DeclarationKind::Definition, 5),
            ("DoubleZero", DeclarationKind::Theorem, 9),
            ("DoubleIsSum", DeclarationKind::Theorem, 13),
            ("Pair", DeclarationKind::Structure, 19),
            ("Color", DeclarationKind::Inductive, 24),
            ("Magma", DeclarationKind::Typeclass, 29),
            ("origin", DeclarationKind::Definition, 37),
        ]
    );
    assert!(out.diagnostics.is_empty(), "unexpected: {:?}", out.diagnostics);
}

#[test]
fn test_clean_fixture_has_no_diagnostics() {
    let text = read_fixture("clean.ac");
    let diagnostics = check(&text).expect("should check");
    assert!(diagnostics.is_empty(), "unexpected: {:?}", diagnostics);
}

#[test]
fn test_directives_carry_modules() {
    let text = read_fixture("clean.ac");
    let out = extract("clean.ac", &text).unwrap();

    match &out.declarations[0].detail {
        Detail::Directive(Directive::FromImport { module, items }) => {
            assert_eq!(module, "nat");
            assert_eq!(items, &vec!["Nat".to_string()]);
        }
        other => panic!("expected from-import, got {:?}", other),
    }
    match &out.declarations[1].detail {
        Detail::Directive(Directive::Numerals { type_name }) => assert_eq!(type_name, "Nat"),
        other => panic!("expected numerals, got {:?}", other),
    }
}

#[test]
fn test_theorem_with_proof_splits_spans() {
    let text = read_fixture("clean.ac");
    let out = extract("clean.ac", &text).unwrap();
    let theorem = out
        .declarations
        .iter()
        .find(|d| d.name == "DoubleIsSum")
        .unwrap();

    assert_eq!(theorem.header_span, Span::new(13, 15));
    assert_eq!(theorem.body_span, Some(Span::new(16, 17)));
    match &theorem.detail {
        Detail::Theorem {
            statement_text,
            proof_text,
            form,
        } => {
            assert_eq!(*form, TheoremForm::Theorem);
            assert!(statement_text.starts_with("theorem DoubleIsSum(a: Nat) {"));
            assert!(statement_text.ends_with('}'));
            assert_eq!(proof_text.as_deref(), Some("trivial"));
        }
        other => panic!("expected theorem, got {:?}", other),
    }

    let unproved = out.declarations.iter().find(|d| d.name == "DoubleZero").unwrap();
    assert_eq!(unproved.body_span, None);
    assert_eq!(unproved.span(), Span::new(9, 11));
}

#[test]
fn test_typeclass_children() {
    let text = read_fixture("clean.ac");
    let out = extract("clean.ac", &text).unwrap();
    let magma = out.declarations.iter().find(|d| d.name == "Magma").unwrap();

    assert_eq!(magma.span(), Span::new(29, 35));
    let children: Vec<(&str, DeclarationKind, usize)> = magma
        .children
        .iter()
        .map(|d| (d.name.as_str(), d.kind(), d.line()))
        .collect();
    assert_eq!(
        children,
        vec![
            ("mul", DeclarationKind::Definition, 30),
            ("mul_self", DeclarationKind::Theorem, 32),
        ]
    );
    for child in &magma.children {
        assert!(magma.span().contains(child.line()));
        assert!(magma.span().contains(child.end_line()));
    }
}

#[test]
fn test_structure_and_inductive_items() {
    let text = read_fixture("clean.ac");
    let out = extract("clean.ac", &text).unwrap();

    let pair = out.declarations.iter().find(|d| d.name == "Pair").unwrap();
    match &pair.detail {
        Detail::Structure { fields, .. } => {
            assert_eq!(fields, &vec!["first: Nat".to_string(), "second: Nat".to_string()]);
        }
        other => panic!("expected structure, got {:?}", other),
    }

    let color = out.declarations.iter().find(|d| d.name == "Color").unwrap();
    match &color.detail {
        Detail::Inductive { constructors, .. } => {
            assert_eq!(constructors, &vec!["red".to_string(), "green".to_string()]);
        }
        other => panic!("expected inductive, got {:?}", other),
    }
}

#[test]
fn test_top_level_spans_cover_their_text() {
    let text = read_fixture("clean.ac");
    let lines: Vec<&str> = text.lines().collect();
    let out = extract("clean.ac", &text).unwrap();

    let mut previous_end = 0;
    for decl in &out.declarations {
        let span = decl.span();
        assert!(span.start > previous_end, "{} overlaps its predecessor", decl.name);
        previous_end = span.end;

        let first = lines[span.start - 1].trim_start();
        let keyword = decl.signature.split_whitespace().next().unwrap();
        assert!(first.starts_with(keyword), "{:?} vs {:?}", first, keyword);
        if !decl.name.is_empty() {
            assert!(lines[span.start - 1].contains(&decl.name));
        }
    }
}

#[test]
fn test_unterminated_comment_fixture() {
    let text = read_fixture("unterminated_comment.ac");
    let out = extract("unterminated_comment.ac", &text).unwrap();

    assert_eq!(out.declarations.len(), 1);
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].rule, Rule::UnterminatedComment);
    assert_eq!(out.diagnostics[0].line, 2);
    assert!(out.has_errors());
}

#[test]
fn test_whitespace_unit_is_rejected() {
    match extract("blank", " \n\t\n") {
        Err(UnitError::EmptyUnit { unit }) => assert_eq!(unit, "blank"),
        other => panic!("expected EmptyUnit, got {:?}", other),
    }
}

#[test]
fn test_extraction_serializes() {
    let text = read_fixture("clean.ac");
    let out = extract("clean.ac", &text).unwrap();
    let value = serde_json::to_value(&out).unwrap();

    assert_eq!(value["unit"], "clean.ac");
    assert_eq!(value["declarations"][2]["detail"]["kind"], "definition");
    assert_eq!(value["declarations"][2]["detail"]["form"], "define");
    assert_eq!(value["declarations"][7]["children"][0]["name"], "mul");
}
