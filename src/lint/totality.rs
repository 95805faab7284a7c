//! Annotation and numeral rules.
//!
//! Parameters, binders and `let` bindings must carry explicit types, every
//! `define` must declare its return type, and numeral literals need an
//! active `numerals` directive earlier in the unit.

use once_cell::sync::Lazy;
use regex::Regex;

use super::naming::starts_uppercase;
use super::{Diagnostic, Rule};
use crate::extract::extent::split_top_level;
use crate::extract::{Analysis, DefinitionForm, Detail, TheoremForm};

static BINDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(forall|exists|function)\s*\(([^)]*)\)").unwrap());

static LET_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*let\s+(.*)$").unwrap());

static NUMERAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|[^.\w])([0-9]+)\b").unwrap());

static NUMERAL_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:let\s+)?[0-9]+\s*:").unwrap());

static NUMERALS_DIRECTIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*numerals\s+([A-Za-z0-9_.]+)").unwrap());

static IMPORT_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:import|from)\s").unwrap());

/// Contents of the parameter list of a header, if it has one.
///
/// Type parameters in `[...]` are skipped; the list must open before any
/// top-level `:`, `=`, `->` or `{`.
pub(crate) fn parameter_list(signature: &str) -> Option<(&str, &str)> {
    let mut bracket: usize = 0;
    let mut open = None;
    let mut prev = ' ';

    for (i, ch) in signature.char_indices() {
        if let Some(start) = open {
            // Scanning for the matching ')'.
            match ch {
                '(' | '[' | '{' => bracket += 1,
                ')' | ']' | '}' if bracket > 0 => bracket -= 1,
                ')' => return Some((&signature[start + 1..i], &signature[i + 1..])),
                _ => {}
            }
            continue;
        }

        match ch {
            '[' => bracket += 1,
            ']' => bracket = bracket.saturating_sub(1),
            '(' if bracket == 0 => open = Some(i),
            ':' | '=' | '{' if bracket == 0 => return None,
            '>' if bracket == 0 && prev == '-' => return None,
            _ => {}
        }
        prev = ch;
    }

    None
}

/// Index of the first `=` that is an assignment, not part of an operator.
fn assignment_index(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth: usize = 0;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'=' if depth == 0 => {
                let before = i.checked_sub(1).map(|j| bytes[j]);
                let after = bytes.get(i + 1).copied();
                let joined_before = matches!(before, Some(b'=' | b'!' | b'<' | b'>'));
                let joined_after = matches!(after, Some(b'=' | b'>'));
                if !joined_before && !joined_after {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// A plain or module-qualified type name whose own name is lowercase.
fn is_lowercase_type(ty: &str) -> bool {
    if !ty.starts_with(char::is_alphabetic) {
        return false;
    }
    let head = ty.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.')).next().unwrap_or(ty);
    let local = head.rsplit('.').next().unwrap_or(head);
    !starts_uppercase(local)
}

fn missing_annotation(line: usize, message: String) -> Diagnostic {
    Diagnostic::new(Rule::MissingTypeAnnotation, line, message)
}

fn check_parameters(params: &str, line: usize, diagnostics: &mut Vec<Diagnostic>) {
    for param in split_top_level(params) {
        if param == "self" {
            continue;
        }
        match param.split_once(':') {
            None => diagnostics.push(missing_annotation(
                line,
                format!("parameter '{}' is missing a type annotation", param),
            )),
            Some((_, ty)) => {
                let ty = ty.trim();
                if is_lowercase_type(ty) {
                    diagnostics.push(Diagnostic::new(
                        Rule::TypeNameCase,
                        line,
                        format!("type '{}' should start with an uppercase letter", ty),
                    ));
                }
            }
        }
    }
}

/// Parameter, return type and binding annotation rules.
pub fn check_annotations(analysis: &Analysis) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for decl in analysis.all_declarations() {
        let line = decl.line();
        match &decl.detail {
            Detail::Theorem { form, .. } => {
                let signature = match form {
                    TheoremForm::Law => decl.signature.as_str(),
                    _ => decl
                        .signature
                        .split_once(' ')
                        .map_or("", |(_, rest)| rest),
                };
                if let Some((params, _)) = parameter_list(signature) {
                    check_parameters(params, line, &mut diagnostics);
                }
            }
            Detail::Definition {
                form: DefinitionForm::Define,
                ..
            } => {
                let signature = decl
                    .signature
                    .split_once(' ')
                    .map_or("", |(_, rest)| rest);
                let rest = match parameter_list(signature) {
                    Some((params, rest)) => {
                        check_parameters(params, line, &mut diagnostics);
                        rest
                    }
                    None => signature,
                };
                match rest.split_once("->") {
                    None => diagnostics.push(Diagnostic::new(
                        Rule::MissingReturnType,
                        line,
                        format!(
                            "define '{}' requires an explicit return type ('-> ReturnType')",
                            decl.name
                        ),
                    )),
                    Some((_, ret)) => {
                        let ret = ret.trim();
                        if is_lowercase_type(ret) {
                            diagnostics.push(Diagnostic::new(
                                Rule::TypeNameCase,
                                line,
                                format!("return type '{}' should start with an uppercase letter", ret),
                            ));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    for line in &analysis.scanned.lines {
        let code = &line.code;

        if let Some(caps) = LET_LINE_RE.captures(code) {
            let binding = caps.get(1).map_or("", |m| m.as_str());
            let prefix = match (binding.find("satisfy"), assignment_index(binding)) {
                (Some(s), Some(e)) => Some(&binding[..s.min(e)]),
                (Some(s), None) => Some(&binding[..s]),
                (None, Some(e)) => Some(&binding[..e]),
                (None, None) => None,
            };
            if let Some(prefix) = prefix {
                check_binding(prefix.trim(), line.number, &mut diagnostics);
            }
        }

        for caps in BINDER_RE.captures_iter(code) {
            let keyword = &caps[1];
            for binder in split_top_level(&caps[2]) {
                if !binder.contains(':') {
                    diagnostics.push(missing_annotation(
                        line.number,
                        format!(
                            "{} binder '{}' is missing a type annotation (use name: Type)",
                            keyword, binder
                        ),
                    ));
                }
            }
        }
    }

    diagnostics
}

fn check_binding(prefix: &str, line: usize, diagnostics: &mut Vec<Diagnostic>) {
    if let Some(inner) = prefix.strip_prefix('(') {
        let inner = inner.strip_suffix(')').unwrap_or(inner);
        for part in split_top_level(inner) {
            if !part.contains(':') {
                diagnostics.push(missing_annotation(
                    line,
                    format!("let binding '{}' requires a type annotation", part),
                ));
            }
        }
    } else if !prefix.contains(':') {
        diagnostics.push(missing_annotation(
            line,
            format!("let binding '{}' requires a type annotation before '='", prefix),
        ));
    }
}

/// Numeral literals before the unit's first `numerals` directive.
pub fn check_numerals(analysis: &Analysis) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut active: Option<&str> = None;

    for line in &analysis.scanned.lines {
        let code = line.code.as_str();

        if let Some(caps) = NUMERALS_DIRECTIVE_RE.captures(code) {
            active = caps.get(1).map(|m| m.as_str());
            continue;
        }
        if active.is_some() || IMPORT_LINE_RE.is_match(code) || NUMERAL_NAME_RE.is_match(code) {
            continue;
        }

        if let Some(caps) = NUMERAL_RE.captures(code) {
            diagnostics.push(Diagnostic::new(
                Rule::NoActiveNumerals,
                line.number,
                format!(
                    "numeral '{}' used before any numerals directive",
                    &caps[1]
                ),
            ));
        }
    }

    diagnostics
}
