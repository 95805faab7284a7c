//! Qualified references to modules that were never imported.
//!
//! This is a heuristic. A lowercase prefix in `prefix.Type` is taken to be a
//! module unless the declaration binds it as a name (`prefix: T`).

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Diagnostic, Rule};
use crate::extract::{Analysis, Detail, Directive};

static QUALIFIED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([a-z_][a-z0-9_]*)\.([A-Z][A-Za-z0-9_]*)").unwrap());

static BOUND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([a-z_][A-Za-z0-9_]*)\s*:").unwrap());

/// Names a module directive makes available: the full path and its last
/// segment.
fn imported_names(module: &str) -> impl Iterator<Item = &str> {
    let last = module.rsplit(['.', '/']).next();
    std::iter::once(module).chain(last)
}

/// Flag `module.Type` references in top-level declarations whose module was
/// not imported above the declaration.
pub fn check_references(analysis: &Analysis) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut imported: HashSet<&str> = HashSet::new();
    let lines = &analysis.scanned.lines;

    for decl in &analysis.declarations {
        if let Detail::Directive(directive) = &decl.detail {
            match directive {
                Directive::Import { module } | Directive::FromImport { module, .. } => {
                    imported.extend(imported_names(module));
                }
                Directive::Numerals { .. } => {}
            }
            continue;
        }

        let span = decl.span();
        let decl_lines = lines
            .iter()
            .skip(span.start.saturating_sub(1))
            .take(span.len());

        let mut bound: HashSet<&str> = HashSet::from(["self"]);
        for line in decl_lines.clone() {
            bound.extend(BOUND_RE.captures_iter(&line.code).filter_map(|c| c.get(1)).map(|m| m.as_str()));
        }

        let mut reported: HashSet<&str> = HashSet::new();
        for line in decl_lines {
            for caps in QUALIFIED_RE.captures_iter(&line.code) {
                let (Some(module), Some(whole)) = (caps.get(1), caps.get(0)) else {
                    continue;
                };
                let module = module.as_str();
                if imported.contains(module) || bound.contains(module) || !reported.insert(module) {
                    continue;
                }
                diagnostics.push(Diagnostic::new(
                    Rule::UndeclaredReference,
                    line.number,
                    format!(
                        "reference '{}' uses module '{}', which is not imported above this declaration",
                        whole.as_str(),
                        module
                    ),
                ));
            }
        }
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::analyze;

    #[test]
    fn test_unimported_module() {
        let text = "\
define f(x: Nat) -> Bool {
    real.Real.is_zero(x) or real.Real.is_one(x)
}
";
        let diagnostics = check_references(&analyze(text));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 2);
        assert!(diagnostics[0].message.contains("'real'"));
    }

    #[test]
    fn test_import_must_precede_use() {
        let text = "\
let a: Nat = nat.Nat.zero
import nat
let b: Nat = nat.Nat.zero
from util.list import List
let c: Nat = list.List.len(xs)
";
        let lines: Vec<usize> = check_references(&analyze(text))
            .iter()
            .map(|d| d.line)
            .collect();
        assert_eq!(lines, vec![1]);
    }

    #[test]
    fn test_bound_names_are_not_modules() {
        let text = "define get(p: Pair) -> Nat {\n    p.First\n}\n";
        assert!(check_references(&analyze(text)).is_empty());
    }
}
