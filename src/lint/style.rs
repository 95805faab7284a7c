//! Advisory style rules over the scanned line stream.

use super::{Diagnostic, Rule};
use crate::extract::Analysis;
use crate::scanner::TrailingOperator;

/// `$` or `\` in code usually means pasted LaTeX.
pub fn check_latex(analysis: &Analysis) -> Vec<Diagnostic> {
    analysis
        .scanned
        .lines
        .iter()
        .filter(|line| line.code.contains(['$', '\\']))
        .map(|line| {
            Diagnostic::new(
                Rule::LatexSyntax,
                line.number,
                "possible LaTeX syntax; Acorn uses its own keywords and operators",
            )
        })
        .collect()
}

/// Lines ending in an operator that does not carry the statement on.
pub fn check_continuations(analysis: &Analysis) -> Vec<Diagnostic> {
    analysis
        .scanned
        .lines
        .iter()
        .filter_map(|line| match &line.trailing {
            TrailingOperator::Unlisted(op) => Some(Diagnostic::new(
                Rule::UnlistedContinuation,
                line.number,
                format!(
                    "trailing operator '{}' does not continue the statement onto the next line",
                    op
                ),
            )),
            _ => None,
        })
        .collect()
}
