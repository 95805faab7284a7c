//! Naming-convention rules.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Diagnostic, Rule};
use crate::extract::{Analysis, Declaration, DefinitionForm, Detail, Directive, TheoremForm};

static MODULE_SEGMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9_]+$").unwrap());

pub(crate) fn starts_uppercase(name: &str) -> bool {
    name.chars().next().map_or(false, char::is_uppercase)
}

pub(crate) fn starts_lowercase(name: &str) -> bool {
    name.chars().next().map_or(false, char::is_lowercase)
}

/// Last segment of a possibly qualified name.
fn local_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

fn type_case(line: usize, what: &str, name: &str) -> Diagnostic {
    Diagnostic::new(
        Rule::TypeNameCase,
        line,
        format!("{} '{}' should start with an uppercase letter", what, name),
    )
}

/// Whether a `let` binds a function value.
fn is_function_let(decl: &Declaration) -> bool {
    let Some(colon) = decl.signature.find(':') else {
        return false;
    };
    let rest = &decl.signature[colon + 1..];
    let (ty, value) = match rest.find(" = ") {
        Some(eq) => (&rest[..eq], &rest[eq + 3..]),
        None => (rest, ""),
    };
    ty.contains("->") || value.trim_start().starts_with("function")
}

/// Apply naming rules to every declaration of the unit.
pub fn check_naming(analysis: &Analysis) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for decl in analysis.all_declarations() {
        let line = decl.line();
        match &decl.detail {
            Detail::Theorem { form, .. } => {
                if *form != TheoremForm::Law
                    && !decl.name.is_empty()
                    && !starts_uppercase(&decl.name)
                {
                    let what = if *form == TheoremForm::Axiom {
                        "axiom name"
                    } else {
                        "theorem name"
                    };
                    diagnostics.push(type_case(line, what, &decl.name));
                }
            }
            Detail::Definition { form, .. } => {
                let function_like = match form {
                    DefinitionForm::Define => true,
                    DefinitionForm::Let => is_function_let(decl),
                    DefinitionForm::Satisfy | DefinitionForm::Member => false,
                };
                let local = local_name(&decl.name);
                if function_like && !local.is_empty() && !starts_lowercase(local) {
                    diagnostics.push(Diagnostic::new(
                        Rule::FunctionNameCase,
                        line,
                        format!(
                            "function name '{}' should start with a lowercase letter",
                            decl.name
                        ),
                    ));
                }
            }
            Detail::Structure { .. } | Detail::Inductive { .. } | Detail::Typeclass { .. } => {
                if !decl.name.is_empty() && !starts_uppercase(&decl.name) {
                    let what = format!("{} name", decl.kind());
                    diagnostics.push(type_case(line, &what, &decl.name));
                }
            }
            Detail::Attributes { .. } => {
                if !decl.name.is_empty() && !starts_uppercase(&decl.name) {
                    diagnostics.push(type_case(line, "attributes target", &decl.name));
                }
            }
            Detail::Instance { typeclass } => {
                if !decl.name.is_empty() && !starts_uppercase(&decl.name) {
                    diagnostics.push(type_case(line, "instance type", &decl.name));
                }
                if let Some(class) = typeclass {
                    if !starts_uppercase(class) {
                        diagnostics.push(type_case(line, "typeclass name", class));
                    }
                }
            }
            Detail::Directive(Directive::Numerals { type_name }) => {
                if !type_name.is_empty() && !starts_uppercase(type_name) {
                    diagnostics.push(type_case(line, "numerals type", type_name));
                }
            }
            Detail::Directive(Directive::Import { module })
            | Detail::Directive(Directive::FromImport { module, .. }) => {
                let valid = !module.is_empty()
                    && module
                        .split(['.', '/'])
                        .all(|segment| MODULE_SEGMENT_RE.is_match(segment));
                if !valid {
                    diagnostics.push(Diagnostic::new(
                        Rule::ModuleNameCase,
                        line,
                        format!(
                            "module name '{}' must be lowercase alphanumeric with underscores",
                            module
                        ),
                    ));
                }
            }
        }
    }

    diagnostics
}
