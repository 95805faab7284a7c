//! Lint runner that orchestrates all rule passes.

use std::collections::{HashMap, HashSet};

use crate::config::Config;
use crate::error::UnitError;
use crate::extract::{analyze, Analysis};

use super::{
    check_annotations, check_continuations, check_latex, check_naming, check_numerals,
    check_references, filter_suppressed, parse_suppressions, sort_diagnostics, LintReport, Rule,
    Severity,
};

/// Executes every rule against a unit.
#[derive(Debug, Clone, Default)]
pub struct Linter {
    disabled: HashSet<Rule>,
    severity: HashMap<Rule, Severity>,
    ignore_suppressions: bool,
}

impl Linter {
    /// Create a linter with every rule enabled at its default severity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a linter honoring the rule settings of `config`.
    pub fn from_config(config: &Config) -> Self {
        Self {
            disabled: config.disabled_rules().collect(),
            severity: config.severity_overrides().collect(),
            ignore_suppressions: false,
        }
    }

    /// Never report `rule`.
    pub fn disable(mut self, rule: Rule) -> Self {
        self.disabled.insert(rule);
        self
    }

    /// Report `rule` at `severity`.
    pub fn with_severity(mut self, rule: Rule, severity: Severity) -> Self {
        self.severity.insert(rule, severity);
        self
    }

    /// Set whether inline suppression comments are ignored.
    pub fn ignore_suppressions(mut self, ignore: bool) -> Self {
        self.ignore_suppressions = ignore;
        self
    }

    /// Lint a unit of source text.
    pub fn lint(&self, unit: &str, text: &str) -> Result<LintReport, UnitError> {
        if text.trim().is_empty() {
            return Err(UnitError::empty(unit));
        }
        let analysis = analyze(text);
        Ok(self.lint_analysis(unit, text, &analysis))
    }

    /// Lint a unit that has already been through the structural pipeline.
    pub fn lint_analysis(&self, unit: &str, text: &str, analysis: &Analysis) -> LintReport {
        let mut diagnostics = analysis.diagnostics.clone();
        diagnostics.extend(check_naming(analysis));
        diagnostics.extend(check_annotations(analysis));
        diagnostics.extend(check_numerals(analysis));
        diagnostics.extend(check_references(analysis));
        diagnostics.extend(check_latex(analysis));
        diagnostics.extend(check_continuations(analysis));

        diagnostics.retain(|d| !self.disabled.contains(&d.rule));
        for diagnostic in &mut diagnostics {
            if let Some(severity) = self.severity.get(&diagnostic.rule) {
                diagnostic.severity = *severity;
            }
        }
        sort_diagnostics(&mut diagnostics);

        let mut report = LintReport::new(unit);
        if self.ignore_suppressions {
            report.diagnostics = diagnostics;
            return report;
        }

        let suppressions = parse_suppressions(text);
        if suppressions.is_empty() {
            report.diagnostics = diagnostics;
        } else {
            let (active, suppressed) = filter_suppressed(diagnostics, &suppressions);
            report.diagnostics = active;
            report.suppressed = suppressed;
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_basic() {
        let report = Linter::new()
            .lint("square", "define square(n) -> Nat { n * n }\n")
            .unwrap();
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].rule, Rule::MissingTypeAnnotation);
        assert!(report.has_errors());
    }

    #[test]
    fn test_runner_with_suppression() {
        let text = "\
// acornlint:ignore-next-line no_active_numerals - Bootstrapping
let zero: Nat = 0
";
        let report = Linter::new().lint("t", text).unwrap();
        assert!(report.diagnostics.is_empty());
        assert_eq!(report.suppressed_count(), 1);

        let report = Linter::new().ignore_suppressions(true).lint("t", text).unwrap();
        assert_eq!(report.diagnostics.len(), 1);
    }

    #[test]
    fn test_disabled_and_overridden_rules() {
        let text = "define Id(x: Nat) -> Nat { x }\nlet y: Nat = \\x\n";
        let linter = Linter::new()
            .disable(Rule::LatexSyntax)
            .with_severity(Rule::FunctionNameCase, Severity::Error);
        let report = linter.lint("t", text).unwrap();
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].rule, Rule::FunctionNameCase);
        assert_eq!(report.diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn test_empty_unit() {
        assert!(Linter::new().lint("blank", "\n\n").is_err());
    }
}
