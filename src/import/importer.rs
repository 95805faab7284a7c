//! Bulk import of a corpus of Acorn units.
//!
//! Units are read and extracted in parallel. Cross-unit duplicate detection
//! then runs serially over the results in sorted path order, so the first
//! occurrence of a name always wins regardless of scheduling.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::UnitError;
use crate::extract::{extract, DeclarationKind, Extraction};
use crate::lint::Diagnostic;

use super::record::{flatten, module_name, ImportRecord, Table};
use super::store::{RecordSink, StoreError};

/// A unit selected for import.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceFile {
    pub path: PathBuf,
    pub module_name: String,
}

/// Where a record was first seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Origin {
    pub path: PathBuf,
    pub line: usize,
}

/// A record withheld because its name was already taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateConflict {
    pub name: String,
    pub kind: DeclarationKind,
    pub path: PathBuf,
    pub line: usize,
    /// First occurrence in this run. `None` when the sink already held the
    /// name before the run started.
    pub first: Option<Origin>,
}

/// Error-severity structural diagnostic of one unit.
#[derive(Debug, Clone, Serialize)]
pub struct UnitDiagnostic {
    pub path: PathBuf,
    pub diagnostic: Diagnostic,
}

/// A unit that could not be processed at all.
#[derive(Debug, Clone, Serialize)]
pub struct FailedUnit {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitSummary {
    pub path: PathBuf,
    pub module_name: String,
    pub declarations: usize,
    pub kinds: BTreeMap<DeclarationKind, usize>,
}

/// Outcome of an import run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub dry_run: bool,
    pub accepted: Vec<ImportRecord>,
    pub duplicates: Vec<DuplicateConflict>,
    pub errors: Vec<UnitDiagnostic>,
    pub failed: Vec<FailedUnit>,
    pub units: Vec<UnitSummary>,
}

impl ImportSummary {
    /// Declarations found across all units, nested ones included.
    pub fn declaration_count(&self) -> usize {
        self.units.iter().map(|u| u.declarations).sum()
    }

    /// Declarations found per kind, across all units.
    pub fn kind_breakdown(&self) -> BTreeMap<DeclarationKind, usize> {
        let mut kinds = BTreeMap::new();
        for unit in &self.units {
            for (kind, count) in &unit.kinds {
                *kinds.entry(*kind).or_insert(0) += count;
            }
        }
        kinds
    }

    /// Accepted records per table.
    pub fn table_counts(&self) -> BTreeMap<Table, usize> {
        let mut tables = BTreeMap::new();
        for table in self.accepted.iter().filter_map(ImportRecord::table) {
            *tables.entry(table).or_insert(0) += 1;
        }
        tables
    }

    /// Whether the run should be reported as failing.
    pub fn has_findings(&self) -> bool {
        !self.duplicates.is_empty() || !self.errors.is_empty() || !self.failed.is_empty()
    }
}

/// Imports units into a [`RecordSink`].
#[derive(Debug, Clone, Default)]
pub struct Importer {
    config: Config,
    dry_run: bool,
    show_progress: bool,
}

impl Importer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Run the full pipeline without touching the sink.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Draw a progress bar on stderr while units are processed.
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Resolve `paths` into the sorted list of units to import.
    pub fn collect(&self, paths: &[PathBuf]) -> anyhow::Result<Vec<SourceFile>> {
        collect_sources(&self.config, paths)
    }

    /// Collect and import `paths`.
    pub fn run<S: RecordSink>(&self, paths: &[PathBuf], sink: &mut S) -> anyhow::Result<ImportSummary> {
        let files = self.collect(paths)?;
        Ok(self.import_files(&files, sink))
    }

    /// Import already-collected units. `files` must be sorted by path.
    pub fn import_files<S: RecordSink>(&self, files: &[SourceFile], sink: &mut S) -> ImportSummary {
        let progress = if self.show_progress {
            let bar = ProgressBar::new(files.len() as u64);
            bar.set_style(
                ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
            bar.set_message("extracting");
            bar
        } else {
            ProgressBar::hidden()
        };

        let results: Vec<(&SourceFile, Result<Extraction, UnitError>)> = files
            .par_iter()
            .map(|file| {
                let result = read_unit(file);
                progress.inc(1);
                (file, result)
            })
            .collect();
        progress.finish_and_clear();

        let mut summary = ImportSummary {
            dry_run: self.dry_run,
            ..ImportSummary::default()
        };
        let mut seen: HashMap<(Table, String), Origin> = HashMap::new();

        for (file, result) in results {
            let extraction = match result {
                Ok(extraction) => extraction,
                Err(e) => {
                    log::warn!(path:? = file.path, error:% = e; "skipping unit");
                    summary.failed.push(FailedUnit {
                        path: file.path.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let records = flatten(&extraction.declarations, &file.path, &file.module_name);
            let mut kinds = BTreeMap::new();
            for record in &records {
                *kinds.entry(record.kind).or_insert(0) += 1;
            }
            log::debug!(
                path:? = file.path,
                module = file.module_name.as_str(),
                declarations = records.len();
                "extracted unit"
            );

            summary.errors.extend(
                extraction
                    .diagnostics
                    .iter()
                    .filter(|d| d.is_error())
                    .map(|d| UnitDiagnostic {
                        path: file.path.clone(),
                        diagnostic: d.clone(),
                    }),
            );
            summary.units.push(UnitSummary {
                path: file.path.clone(),
                module_name: file.module_name.clone(),
                declarations: records.len(),
                kinds,
            });

            for record in records {
                let key = record.table().map(|table| (table, record.name.clone()));
                if let Some(first) = key.as_ref().and_then(|k| seen.get(k)) {
                    summary.duplicates.push(DuplicateConflict {
                        name: record.name.clone(),
                        kind: record.kind,
                        path: record.source_file.clone(),
                        line: record.line,
                        first: Some(first.clone()),
                    });
                    continue;
                }

                if !self.dry_run {
                    if let Err(StoreError::Conflict { .. }) = sink.insert(&record) {
                        summary.duplicates.push(DuplicateConflict {
                            name: record.name.clone(),
                            kind: record.kind,
                            path: record.source_file.clone(),
                            line: record.line,
                            first: None,
                        });
                        continue;
                    }
                }

                // Only accepted records become the origin of later duplicates.
                if let Some(key) = key {
                    seen.insert(
                        key,
                        Origin {
                            path: record.source_file.clone(),
                            line: record.line,
                        },
                    );
                }
                summary.accepted.push(record);
            }
        }

        log::info!(
            units = summary.units.len(),
            accepted = summary.accepted.len(),
            duplicates = summary.duplicates.len(),
            errors = summary.errors.len(),
            failed = summary.failed.len(),
            dry_run = self.dry_run;
            "import finished"
        );
        summary
    }
}

fn read_unit(file: &SourceFile) -> Result<Extraction, UnitError> {
    let text = fs::read_to_string(&file.path).map_err(|source| UnitError::Io {
        path: file.path.clone(),
        source,
    })?;
    extract(&file.path.to_string_lossy(), &text)
}

/// Resolve files and directories into sorted source units.
///
/// Directories are walked recursively, skipping hidden directories and
/// anything matching `excluded_paths`; module names are relative to the
/// directory. Files given explicitly are always taken and named by stem.
pub fn collect_sources(config: &Config, paths: &[PathBuf]) -> anyhow::Result<Vec<SourceFile>> {
    let mut files = Vec::new();

    for root in paths {
        if root.is_file() {
            files.push(SourceFile {
                path: root.clone(),
                module_name: module_name(None, root),
            });
            continue;
        }
        if !root.is_dir() {
            anyhow::bail!("path not found: {}", root.display());
        }

        for entry in WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| {
                let name = e.file_name().to_string_lossy();
                // Skip hidden directories below the root
                !(e.depth() > 0 && e.file_type().is_dir() && name.starts_with('.'))
            })
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !config.is_source_file(path) || config.is_path_excluded(path) {
                continue;
            }
            files.push(SourceFile {
                path: path.to_path_buf(),
                module_name: module_name(Some(root), path),
            });
        }
    }

    files.sort();
    files.dedup_by(|a, b| a.path == b.path);
    Ok(files)
}

/// Paths of the source units under `paths`, sorted.
pub fn collect_files(config: &Config, paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    Ok(collect_sources(config, paths)?
        .into_iter()
        .map(|f| f.path)
        .collect())
}
