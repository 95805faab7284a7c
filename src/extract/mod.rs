//! Declaration extraction.
//!
//! [`analyze`] runs the scanner, the block tracker and the extractor over a
//! unit and never fails; [`extract`] wraps it for callers that want the
//! declarations of a named unit and treats an empty unit as an error.

pub mod declaration;
pub(crate) mod extent;
mod extractor;

pub use declaration::{
    Declaration, DeclarationKind, DefinitionForm, Detail, Directive, Span, TheoremForm,
};

use serde::Serialize;

use crate::blocks::{BlockMap, StructuralIssue};
use crate::error::UnitError;
use crate::lint::{sort_diagnostics, Diagnostic, Rule};
use crate::scanner::{scan, ScannedUnit};
use extractor::Extractor;

/// Everything the pipeline knows about one unit.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub scanned: ScannedUnit,
    pub blocks: BlockMap,
    pub declarations: Vec<Declaration>,
    /// Structural diagnostics, sorted.
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    /// Iterate every declaration, nested ones included, in source order.
    pub fn all_declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter().flat_map(Declaration::walk)
    }
}

/// Declarations and structural diagnostics of a named unit.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub unit: String,
    pub declarations: Vec<Declaration>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Run the structural pipeline over `text`.
pub fn analyze(text: &str) -> Analysis {
    let scanned = scan(text);
    let blocks = BlockMap::build(&scanned.lines);
    let (declarations, mut diagnostics) = Extractor::new(&scanned.lines, &blocks).run();

    let unterminated: Vec<Span> = declarations
        .iter()
        .flat_map(Declaration::walk)
        .filter(|d| d.unterminated)
        .map(Declaration::span)
        .collect();

    for issue in &blocks.issues {
        let rule = match issue {
            StructuralIssue::UnmatchedClose { .. } => Rule::UnmatchedDelimiter,
            StructuralIssue::Mismatched { .. } => Rule::MismatchedDelimiter,
            StructuralIssue::Unclosed { line, .. } => {
                if unterminated.iter().any(|span| span.contains(*line)) {
                    continue;
                }
                Rule::UnclosedDelimiter
            }
        };
        diagnostics.push(Diagnostic::new(rule, issue.line(), issue.message()));
    }

    if let Some(line) = scanned.unterminated_comment {
        diagnostics.push(Diagnostic::new(
            Rule::UnterminatedComment,
            line,
            "unterminated block comment",
        ));
    }

    sort_diagnostics(&mut diagnostics);

    Analysis {
        scanned,
        blocks,
        declarations,
        diagnostics,
    }
}

/// Extract the declarations of a unit.
pub fn extract(unit: &str, text: &str) -> Result<Extraction, UnitError> {
    if text.trim().is_empty() {
        return Err(UnitError::empty(unit));
    }
    let analysis = analyze(text);
    Ok(Extraction {
        unit: unit.to_string(),
        declarations: analysis.declarations,
        diagnostics: analysis.diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(extraction: &Extraction) -> Vec<&str> {
        extraction
            .declarations
            .iter()
            .map(|d| d.name.as_str())
            .collect()
    }

    #[test]
    fn test_unproved_theorem() {
        let out = extract("t", "theorem Foo(n: Nat) { n + 0 = n }\n").unwrap();
        assert!(out.diagnostics.is_empty());
        assert_eq!(out.declarations.len(), 1);

        let decl = &out.declarations[0];
        assert_eq!(decl.name, "Foo");
        assert_eq!(decl.header_span, Span::new(1, 1));
        assert_eq!(decl.body_span, None);
        assert_eq!(decl.signature, "theorem Foo(n: Nat)");
        match &decl.detail {
            Detail::Theorem {
                statement_text,
                proof_text,
                form,
            } => {
                assert_eq!(statement_text, "theorem Foo(n: Nat) { n + 0 = n }");
                assert_eq!(proof_text, &None);
                assert_eq!(*form, TheoremForm::Theorem);
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_proof_on_following_line() {
        let text = "theorem Foo(n: Nat) { n = n }\nby {\n    reflexivity(n)\n}\n";
        let out = extract("t", text).unwrap();
        assert_eq!(out.declarations.len(), 1);
        let decl = &out.declarations[0];
        assert_eq!(decl.header_span, Span::new(1, 2));
        assert_eq!(decl.body_span, Some(Span::new(3, 4)));
        match &decl.detail {
            Detail::Theorem { proof_text, .. } => {
                assert_eq!(proof_text.as_deref(), Some("reflexivity(n)"));
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_declarations_in_order() {
        let text = "\
from nat import Nat
numerals Nat

define double(n: Nat) -> Nat {
    n + n
}

let zero: Nat = 0

axiom Ext(a: Nat) { a = a }
";
        let out = extract("t", text).unwrap();
        let kinds: Vec<DeclarationKind> = out.declarations.iter().map(|d| d.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                DeclarationKind::Directive,
                DeclarationKind::Directive,
                DeclarationKind::Definition,
                DeclarationKind::Definition,
                DeclarationKind::Theorem,
            ]
        );
        assert_eq!(names(&out), vec!["nat", "Nat", "double", "zero", "Ext"]);

        let double = &out.declarations[2];
        assert_eq!(double.header_span, Span::new(4, 4));
        assert_eq!(double.body_span, Some(Span::new(5, 6)));
        assert_eq!(double.signature, "define double(n: Nat) -> Nat");

        match &out.declarations[0].detail {
            Detail::Directive(Directive::FromImport { module, items }) => {
                assert_eq!(module, "nat");
                assert_eq!(items, &vec!["Nat".to_string()]);
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_let_satisfy() {
        let text = "let (q: Nat, r: Nat) satisfy {\n    a = q * b + r\n}\n";
        let out = extract("t", text).unwrap();
        let decl = &out.declarations[0];
        assert_eq!(decl.name, "");
        match &decl.detail {
            Detail::Definition {
                definition_text,
                form,
            } => {
                assert_eq!(*form, DefinitionForm::Satisfy);
                assert_eq!(definition_text, "a = q * b + r");
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_typeclass_members_become_children() {
        let text = "\
typeclass M: Monoid extends Semigroup {
    one: M

    identity_left(a: M) {
        M.one * a = a
    }
}
";
        let out = extract("t", text).unwrap();
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let class = &out.declarations[0];
        assert_eq!(class.name, "Monoid");
        assert_eq!(
            class.detail,
            Detail::Typeclass {
                type_param: Some("M".to_string()),
                extends: vec!["Semigroup".to_string()],
            }
        );
        let children: Vec<(&str, DeclarationKind)> = class
            .children
            .iter()
            .map(|c| (c.name.as_str(), c.kind()))
            .collect();
        assert_eq!(
            children,
            vec![
                ("one", DeclarationKind::Definition),
                ("identity_left", DeclarationKind::Theorem),
            ]
        );
        assert_eq!(class.children[1].header_span, Span::new(4, 6));
    }

    #[test]
    fn test_law_claim_on_following_line() {
        let text = "\
typeclass M: Magma {
    ident(a: M)
    { a = a }
}
";
        let out = extract("t", text).unwrap();
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let law = &out.declarations[0].children[0];
        assert_eq!(law.name, "ident");
        assert_eq!(law.kind(), DeclarationKind::Theorem);
        assert_eq!(law.span(), Span::new(2, 3));
        match &law.detail {
            Detail::Theorem { statement_text, .. } => assert!(statement_text.contains("a = a")),
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_keyword_followed_by_brace() {
        let text = "theorem{ true }\ntheorem {\n    true\n}\ndefine(x: Nat) -> Nat { x }\n";
        let out = extract("t", text).unwrap();
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let found: Vec<(usize, DeclarationKind, &str)> = out
            .declarations
            .iter()
            .map(|d| (d.line(), d.kind(), d.name.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                (1, DeclarationKind::Theorem, ""),
                (2, DeclarationKind::Theorem, ""),
                (5, DeclarationKind::Definition, ""),
            ]
        );
    }

    #[test]
    fn test_let_needs_whitespace_follower() {
        let out = extract("t", "let(x) = 1\n").unwrap();
        assert!(out.declarations.is_empty());
    }

    #[test]
    fn test_attributes_children() {
        let text = "\
attributes Nat {
    define succ(self) -> Nat {
        self + 1
    }

    let one: Nat = Nat.zero.succ
}
";
        let out = extract("t", text).unwrap();
        let attrs = &out.declarations[0];
        assert_eq!(attrs.kind(), DeclarationKind::Attributes);
        assert_eq!(attrs.name, "Nat");
        let names: Vec<&str> = attrs.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["succ", "one"]);
    }

    #[test]
    fn test_structure_with_constraint() {
        let text = "\
structure Interval {
    low: Nat
    high: Nat
} constraint {
    low <= high
}
";
        let out = extract("t", text).unwrap();
        let decl = &out.declarations[0];
        assert_eq!(decl.header_span, Span::new(1, 1));
        assert_eq!(decl.body_span, Some(Span::new(2, 6)));
        assert_eq!(
            decl.detail,
            Detail::Structure {
                type_params: Vec::new(),
                fields: vec!["low: Nat".to_string(), "high: Nat".to_string()],
                constraint: Some("low <= high".to_string()),
            }
        );
    }

    #[test]
    fn test_inductive_and_instance() {
        let text = "\
inductive List[T] {
    nil
    cons(T, List[T])
}

instance Nat: Monoid {
    let one: Nat = Nat.one
}
";
        let out = extract("t", text).unwrap();
        assert_eq!(
            out.declarations[0].detail,
            Detail::Inductive {
                type_params: vec!["T".to_string()],
                constructors: vec!["nil".to_string(), "cons(T, List[T])".to_string()],
            }
        );
        let instance = &out.declarations[1];
        assert_eq!(instance.name, "Nat");
        assert_eq!(
            instance.detail,
            Detail::Instance {
                typeclass: Some("Monoid".to_string())
            }
        );
        assert!(instance.children.is_empty());
    }

    #[test]
    fn test_brace_on_next_line() {
        let text = "define f(x: Nat) -> Nat\n{\n    x\n}\nlet y: Nat = f(x)\n";
        let out = extract("t", text).unwrap();
        assert_eq!(out.declarations.len(), 2);
        assert_eq!(out.declarations[0].header_span, Span::new(1, 2));
        assert_eq!(out.declarations[0].body_span, Some(Span::new(3, 4)));
        assert_eq!(out.declarations[1].line(), 5);
    }

    #[test]
    fn test_operator_continuation_joins_lines() {
        let text = "let x: Nat = a +\n    b\nlet y: Nat = c\n";
        let out = extract("t", text).unwrap();
        assert_eq!(out.declarations.len(), 2);
        assert_eq!(out.declarations[0].header_span, Span::new(1, 2));
    }

    #[test]
    fn test_unterminated_declaration() {
        let text = "define ok(x: Nat) -> Nat { x }\ntheorem Broken {\n    true\n";
        let out = extract("t", text).unwrap();
        assert_eq!(out.declarations.len(), 2);
        let broken = &out.declarations[1];
        assert!(broken.unterminated);
        assert_eq!(broken.span(), Span::new(2, 3));

        let rules: Vec<(usize, Rule)> = out.diagnostics.iter().map(|d| (d.line, d.rule)).collect();
        assert_eq!(rules, vec![(2, Rule::UnterminatedDeclaration)]);
    }

    #[test]
    fn test_duplicate_within_unit() {
        let text = "theorem Dup { true }\ntheorem Dup { true }\n";
        let out = extract("t", text).unwrap();
        assert_eq!(out.declarations.len(), 2);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].rule, Rule::DuplicateDeclaration);
        assert_eq!(out.diagnostics[0].line, 2);
    }

    #[test]
    fn test_unterminated_comment_is_single_error() {
        let out = extract("t", "theorem Foo { true }\n/* never closed\n").unwrap();
        assert_eq!(out.declarations.len(), 1);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].rule, Rule::UnterminatedComment);
        assert_eq!(out.diagnostics[0].line, 2);
    }

    #[test]
    fn test_stray_closer_reported() {
        let out = extract("t", "}\nlet x: Nat = y\n").unwrap();
        assert_eq!(out.declarations.len(), 1);
        assert_eq!(out.diagnostics[0].rule, Rule::UnmatchedDelimiter);
    }

    #[test]
    fn test_empty_unit_is_error() {
        assert!(matches!(
            extract("blank", "  \n\t\n"),
            Err(UnitError::EmptyUnit { .. })
        ));
    }

    #[test]
    fn test_spans_do_not_overlap() {
        let text = "theorem A { true } by {\n    done\n}\ndefine b(x: Nat) -> Nat {\n    x\n}\n";
        let out = extract("t", text).unwrap();
        for decl in &out.declarations {
            if let Some(body) = decl.body_span {
                assert!(decl.header_span.end < body.start);
            }
        }
        assert!(out.declarations[0].span().end < out.declarations[1].span().start);
    }
}
