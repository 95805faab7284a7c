//! acornlint - structural checker, linter and corpus importer for the Acorn
//! theorem-proving language.
//!
//! # Architecture
//!
//! Every unit of Acorn source goes through the same pure pipeline:
//!
//! - `scanner`: strips comments and tracks per-line depth and trailing
//!   operators
//! - `blocks`: matches delimiters and records structural problems
//! - `extract`: recognizes top-level and nested declarations with their spans
//! - `lint`: naming, totality and style rules on top of the extraction
//! - `import`: flattens declarations across a corpus, rejects cross-unit
//!   duplicates and hands records to a `RecordSink`
//!
//! `config`, `report` and `cli` make up the command-line tool.

pub mod blocks;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod import;
pub mod lint;
pub mod report;
pub mod scanner;

use std::path::PathBuf;

pub use config::Config;
pub use error::UnitError;
pub use extract::{analyze, extract, Declaration, DeclarationKind, Extraction, Span};
pub use import::{ImportRecord, ImportSummary, Importer, MemoryStore, RecordSink, StoreError};
pub use lint::{Diagnostic, LintReport, Linter, Rule, Severity};

/// Unit name given to snippets passed to [`check`].
pub const SNIPPET_UNIT: &str = "<snippet>";

/// Check a snippet with every rule at its default severity.
///
/// Returns the unsuppressed diagnostics, sorted by line. Fails only when the
/// snippet is empty.
pub fn check(snippet: &str) -> Result<Vec<Diagnostic>, UnitError> {
    Linter::new()
        .lint(SNIPPET_UNIT, snippet)
        .map(|report| report.diagnostics)
}

/// Import every unit under `paths` into `sink` with the default
/// configuration.
pub fn import_corpus<S: RecordSink>(paths: &[PathBuf], sink: &mut S) -> anyhow::Result<ImportSummary> {
    Importer::new().run(paths, sink)
}
