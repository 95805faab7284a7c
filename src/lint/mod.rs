//! Naming, totality and style rules.
//!
//! Structural diagnostics come from the extraction pipeline; the passes here
//! add the convention checks on top and the [`Linter`] merges, filters and
//! orders the result.

mod naming;
mod references;
mod runner;
mod style;
mod suppress;
mod totality;
mod types;

pub use naming::check_naming;
pub use references::check_references;
pub use runner::Linter;
pub use style::{check_continuations, check_latex};
pub use suppress::{
    filter_suppressed, matches_suppression, parse_suppressions, SuppressedDiagnostic, Suppression,
    SuppressionType,
};
pub use totality::{check_annotations, check_numerals};
pub use types::{sort_diagnostics, Category, Diagnostic, LintReport, Rule, Severity};
