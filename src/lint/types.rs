//! Core types for lint results.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use super::SuppressedDiagnostic;

/// Severity levels for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    /// Ordering weight; errors sort ahead of warnings on the same line.
    fn rank(&self) -> u8 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 0,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// Broad family a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Delimiters, comments, unterminated or duplicated declarations.
    Structural,
    /// Naming conventions.
    Naming,
    /// Missing annotations and numeral context.
    Totality,
    /// Advisory style and heuristics.
    Style,
}

/// Stable rule identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    // Structural rules
    UnmatchedDelimiter,
    MismatchedDelimiter,
    UnclosedDelimiter,
    UnterminatedComment,
    UnterminatedDeclaration,
    DuplicateDeclaration,
    // Naming rules
    TypeNameCase,
    FunctionNameCase,
    ModuleNameCase,
    // Totality rules
    MissingTypeAnnotation,
    MissingReturnType,
    NoActiveNumerals,
    // Style rules
    UndeclaredReference,
    LatexSyntax,
    UnlistedContinuation,
}

impl Rule {
    /// Every rule, in documentation order.
    pub const ALL: &'static [Rule] = &[
        Rule::UnmatchedDelimiter,
        Rule::MismatchedDelimiter,
        Rule::UnclosedDelimiter,
        Rule::UnterminatedComment,
        Rule::UnterminatedDeclaration,
        Rule::DuplicateDeclaration,
        Rule::TypeNameCase,
        Rule::FunctionNameCase,
        Rule::ModuleNameCase,
        Rule::MissingTypeAnnotation,
        Rule::MissingReturnType,
        Rule::NoActiveNumerals,
        Rule::UndeclaredReference,
        Rule::LatexSyntax,
        Rule::UnlistedContinuation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::UnmatchedDelimiter => "unmatched_delimiter",
            Rule::MismatchedDelimiter => "mismatched_delimiter",
            Rule::UnclosedDelimiter => "unclosed_delimiter",
            Rule::UnterminatedComment => "unterminated_comment",
            Rule::UnterminatedDeclaration => "unterminated_declaration",
            Rule::DuplicateDeclaration => "duplicate_declaration",
            Rule::TypeNameCase => "type_name_case",
            Rule::FunctionNameCase => "function_name_case",
            Rule::ModuleNameCase => "module_name_case",
            Rule::MissingTypeAnnotation => "missing_type_annotation",
            Rule::MissingReturnType => "missing_return_type",
            Rule::NoActiveNumerals => "no_active_numerals",
            Rule::UndeclaredReference => "undeclared_reference",
            Rule::LatexSyntax => "latex_syntax",
            Rule::UnlistedContinuation => "unlisted_continuation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Rule::ALL.iter().copied().find(|r| r.as_str() == s)
    }

    pub fn category(&self) -> Category {
        match self {
            Rule::UnmatchedDelimiter
            | Rule::MismatchedDelimiter
            | Rule::UnclosedDelimiter
            | Rule::UnterminatedComment
            | Rule::UnterminatedDeclaration
            | Rule::DuplicateDeclaration => Category::Structural,
            Rule::TypeNameCase | Rule::FunctionNameCase | Rule::ModuleNameCase => {
                Category::Naming
            }
            Rule::MissingTypeAnnotation | Rule::MissingReturnType | Rule::NoActiveNumerals => {
                Category::Totality
            }
            Rule::UndeclaredReference | Rule::LatexSyntax | Rule::UnlistedContinuation => {
                Category::Style
            }
        }
    }

    /// Severity used unless configuration overrides it.
    pub fn default_severity(&self) -> Severity {
        match self {
            Rule::TypeNameCase
            | Rule::FunctionNameCase
            | Rule::UndeclaredReference
            | Rule::LatexSyntax
            | Rule::UnlistedContinuation => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// One-line description used in reports.
    pub fn description(&self) -> &'static str {
        match self {
            Rule::UnmatchedDelimiter => "Closing delimiter with nothing to close",
            Rule::MismatchedDelimiter => "Closing delimiter of the wrong kind",
            Rule::UnclosedDelimiter => "Delimiter left open at end of input",
            Rule::UnterminatedComment => "Block comment left open at end of input",
            Rule::UnterminatedDeclaration => "Declaration body never closes",
            Rule::DuplicateDeclaration => "Name declared twice in one unit",
            Rule::TypeNameCase => "Type-like names start with an uppercase letter",
            Rule::FunctionNameCase => "Function names start with a lowercase letter",
            Rule::ModuleNameCase => "Module names are lowercase with underscores",
            Rule::MissingTypeAnnotation => "Parameters and binders carry explicit types",
            Rule::MissingReturnType => "define statements declare '-> ReturnType'",
            Rule::NoActiveNumerals => "Numeral literals need an active numerals directive",
            Rule::UndeclaredReference => "Qualified reference to a module that is not imported",
            Rule::LatexSyntax => "LaTeX markup in source",
            Rule::UnlistedContinuation => "Trailing operator that does not continue the line",
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single line-addressable finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub line: usize,
    pub message: String,
    pub rule: Rule,
}

impl Diagnostic {
    /// Create a diagnostic with the rule's default severity.
    pub fn new(rule: Rule, line: usize, message: impl Into<String>) -> Self {
        Self {
            severity: rule.default_severity(),
            line,
            message: message.into(),
            rule,
        }
    }

    pub fn rule_id(&self) -> &'static str {
        self.rule.as_str()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_structural(&self) -> bool {
        self.rule.category() == Category::Structural
    }
}

/// Sort diagnostics by line, then errors before warnings, then rule id, and
/// drop exact repeats.
pub fn sort_diagnostics(diagnostics: &mut Vec<Diagnostic>) {
    diagnostics.sort_by(|a, b| {
        (a.line, Reverse(a.severity.rank()), a.rule.as_str(), &a.message).cmp(&(
            b.line,
            Reverse(b.severity.rank()),
            b.rule.as_str(),
            &b.message,
        ))
    });
    diagnostics.dedup();
}

/// Results of linting one unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LintReport {
    pub unit: String,
    pub diagnostics: Vec<Diagnostic>,
    /// Diagnostics silenced by inline comments
    #[serde(default)]
    pub suppressed: Vec<SuppressedDiagnostic>,
}

impl LintReport {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            ..Default::default()
        }
    }

    /// Check if there are any error-severity diagnostics.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }

    /// Number of suppressed diagnostics.
    pub fn suppressed_count(&self) -> usize {
        self.suppressed.len()
    }
}
