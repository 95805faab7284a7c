//! Output formatting for acornlint results.
//!
//! Lint results render as:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI integration
//!
//! Import summaries render as pretty or JSON.

use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::import::{DuplicateConflict, ImportSummary};
use crate::lint::{Diagnostic, LintReport, Rule, Severity, SuppressedDiagnostic, SuppressionType};

// =============================================================================
// JSON Format
// =============================================================================

/// JSON report for a `check` run.
#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub units_checked: usize,
    pub passed: bool,
    pub error_count: usize,
    pub warning_count: usize,
    pub diagnostics: Vec<JsonDiagnostic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<JsonSuppressedDiagnostic>,
    pub suppressed_count: usize,
}

#[derive(Serialize, Deserialize)]
pub struct JsonDiagnostic {
    pub rule: String,
    pub severity: String,
    pub file: String,
    pub line: usize,
    pub message: String,
}

/// Suppressed diagnostic with suppression info.
#[derive(Serialize, Deserialize)]
pub struct JsonSuppressedDiagnostic {
    pub diagnostic: JsonDiagnostic,
    pub suppression: JsonSuppression,
}

#[derive(Serialize, Deserialize)]
pub struct JsonSuppression {
    pub rule: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    pub file: String,
    pub line: usize,
    #[serde(rename = "type")]
    pub suppression_type: String,
}

fn diagnostic_to_json(file: &str, d: &Diagnostic) -> JsonDiagnostic {
    JsonDiagnostic {
        rule: d.rule_id().to_string(),
        severity: d.severity.to_string(),
        file: file.to_string(),
        line: d.line,
        message: d.message.clone(),
    }
}

fn suppression_type_str(t: SuppressionType) -> &'static str {
    match t {
        SuppressionType::Line => "line",
        SuppressionType::NextLine => "nextline",
        SuppressionType::File => "file",
    }
}

/// Build the JSON report for a set of lint results.
pub fn json_report(path: &str, reports: &[LintReport]) -> JsonReport {
    let diagnostics: Vec<JsonDiagnostic> = reports
        .iter()
        .flat_map(|r| r.diagnostics.iter().map(move |d| diagnostic_to_json(&r.unit, d)))
        .collect();

    let suppressed: Vec<JsonSuppressedDiagnostic> = reports
        .iter()
        .flat_map(|r| {
            r.suppressed.iter().map(move |sd| JsonSuppressedDiagnostic {
                diagnostic: diagnostic_to_json(&r.unit, &sd.diagnostic),
                suppression: JsonSuppression {
                    rule: sd.suppression.rule.clone(),
                    reason: sd.suppression.reason.clone(),
                    file: r.unit.clone(),
                    line: sd.suppression.line,
                    suppression_type: suppression_type_str(sd.suppression.suppression_type)
                        .to_string(),
                },
            })
        })
        .collect();

    let error_count: usize = reports.iter().map(LintReport::error_count).sum();

    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        units_checked: reports.len(),
        passed: error_count == 0,
        error_count,
        warning_count: reports.iter().map(LintReport::warning_count).sum(),
        diagnostics,
        suppressed_count: suppressed.len(),
        suppressed,
    }
}

/// Write lint results in JSON format.
pub fn write_json(path: &str, reports: &[LintReport]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&json_report(path, reports))?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// SARIF Format
// =============================================================================

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str = "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const TOOL_NAME: &str = "acornlint";

#[derive(Serialize, Deserialize)]
pub struct SarifReport {
    pub version: String,
    #[serde(rename = "$schema")]
    pub schema: String,
    pub runs: Vec<SarifRun>,
}

#[derive(Serialize, Deserialize)]
pub struct SarifRun {
    pub tool: SarifTool,
    pub results: Vec<SarifResult>,
}

#[derive(Serialize, Deserialize)]
pub struct SarifTool {
    pub driver: SarifDriver,
}

#[derive(Serialize, Deserialize)]
pub struct SarifDriver {
    pub name: String,
    pub version: String,
    pub rules: Vec<SarifRule>,
}

#[derive(Serialize, Deserialize)]
pub struct SarifRule {
    pub id: String,
    pub name: String,
    #[serde(rename = "shortDescription")]
    pub short_description: SarifMessage,
    #[serde(rename = "defaultConfiguration")]
    pub default_config: SarifRuleConfig,
    pub properties: SarifRuleProperties,
}

#[derive(Serialize, Deserialize)]
pub struct SarifRuleConfig {
    pub level: String,
}

#[derive(Serialize, Deserialize)]
pub struct SarifRuleProperties {
    pub category: String,
}

#[derive(Serialize, Deserialize)]
pub struct SarifResult {
    #[serde(rename = "ruleId")]
    pub rule_id: String,
    pub level: String,
    pub message: SarifMessage,
    pub locations: Vec<SarifLocation>,
}

#[derive(Serialize, Deserialize)]
pub struct SarifMessage {
    pub text: String,
}

#[derive(Serialize, Deserialize)]
pub struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    pub physical_location: SarifPhysicalLocation,
}

#[derive(Serialize, Deserialize)]
pub struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    pub artifact_location: SarifArtifact,
    pub region: SarifRegion,
}

#[derive(Serialize, Deserialize)]
pub struct SarifArtifact {
    pub uri: String,
}

#[derive(Serialize, Deserialize)]
pub struct SarifRegion {
    #[serde(rename = "startLine")]
    pub start_line: usize,
}

fn map_severity_to_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    }
}

/// `unmatched_delimiter` -> `UnmatchedDelimiter`
fn pascal_case(id: &str) -> String {
    id.split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

fn make_relative_path(file_path: &str, base_path: &Path) -> String {
    if base_path.to_string_lossy().is_empty() {
        return file_path.to_string();
    }

    let file = Path::new(file_path);

    // Single-file check: report just the file name
    if file == base_path {
        return file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.to_string());
    }

    file.strip_prefix(base_path)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| file_path.to_string())
}

/// Build the SARIF log for a set of lint results.
pub fn sarif_report(base_path: &Path, reports: &[LintReport]) -> SarifReport {
    // Only rules that fired, in a stable order
    let rule_set: BTreeSet<&'static str> = reports
        .iter()
        .flat_map(|r| r.diagnostics.iter().map(Diagnostic::rule_id))
        .collect();

    let rules: Vec<SarifRule> = rule_set
        .into_iter()
        .filter_map(Rule::parse)
        .map(|rule| SarifRule {
            id: rule.as_str().to_string(),
            name: pascal_case(rule.as_str()),
            short_description: SarifMessage {
                text: rule.description().to_string(),
            },
            default_config: SarifRuleConfig {
                level: map_severity_to_level(rule.default_severity()).to_string(),
            },
            properties: SarifRuleProperties {
                category: format!("{:?}", rule.category()).to_lowercase(),
            },
        })
        .collect();

    let results: Vec<SarifResult> = reports
        .iter()
        .flat_map(|r| {
            r.diagnostics.iter().map(move |d| SarifResult {
                rule_id: d.rule_id().to_string(),
                level: map_severity_to_level(d.severity).to_string(),
                message: SarifMessage {
                    text: d.message.clone(),
                },
                locations: vec![SarifLocation {
                    physical_location: SarifPhysicalLocation {
                        artifact_location: SarifArtifact {
                            uri: make_relative_path(&r.unit, base_path),
                        },
                        region: SarifRegion {
                            start_line: d.line.max(1),
                        },
                    },
                }],
            })
        })
        .collect();

    SarifReport {
        version: SARIF_VERSION.to_string(),
        schema: SARIF_SCHEMA.to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: TOOL_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    rules,
                },
            },
            results,
        }],
    }
}

/// Write lint results in SARIF format.
pub fn write_sarif(base_path: &Path, reports: &[LintReport]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&sarif_report(base_path, reports))?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

fn write_header(label: &str, path: &str) {
    println!();
    print!("  ");
    print!("{}", "acornlint".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();
    print!("  {}", format!("{:<10}", label).dimmed());
    println!("{}", path);
    println!();
}

/// Write lint results in pretty (human-readable) format.
pub fn write_pretty(path: &str, reports: &[LintReport], show_suppressed: bool) {
    write_header("Checking:", path);

    let errors: usize = reports.iter().map(LintReport::error_count).sum();
    let warnings: usize = reports.iter().map(LintReport::warning_count).sum();
    let suppressed: Vec<(&str, &SuppressedDiagnostic)> = reports
        .iter()
        .flat_map(|r| r.suppressed.iter().map(move |s| (r.unit.as_str(), s)))
        .collect();

    for report in reports.iter().filter(|r| !r.diagnostics.is_empty()) {
        write_diagnostics(&report.unit, &report.diagnostics);
    }

    if !suppressed.is_empty() {
        write_suppressed_summary(&suppressed, show_suppressed);
        println!();
    }

    if errors == 0 {
        print!("  {}", "✓ PASS".green());
    } else {
        print!("  {}", "✗ FAIL".red());
    }
    print!(
        "  {} unit{}",
        reports.len(),
        if reports.len() != 1 { "s" } else { "" }
    );
    print!("  {}", format!("{} errors", errors).red());
    print!("  {}", format!("{} warnings", warnings).yellow());
    if !suppressed.is_empty() {
        print!("  {}", format!("({} suppressed)", suppressed.len()).dimmed());
    }
    println!();
    println!();
}

fn write_diagnostics(file: &str, diagnostics: &[Diagnostic]) {
    println!("  {} ({}):", file.blue().bold(), diagnostics.len());
    println!();

    for d in diagnostics {
        write_severity_tag(d.severity);
        print!("   ");
        print!("{:<26}", d.rule_id().dimmed());
        println!("{}", format!("line {}", d.line).dimmed());
        println!("            {}", d.message);
        println!();
    }
}

fn write_severity_tag(severity: Severity) {
    match severity {
        Severity::Error => print!("    {} ", "ERROR".red()),
        Severity::Warning => print!("    {} ", "WARN ".yellow()),
    }
}

fn write_suppressed_summary(suppressed: &[(&str, &SuppressedDiagnostic)], show_details: bool) {
    println!("  {} ({}):", "Suppressed".dimmed(), suppressed.len());

    if !show_details {
        println!("    {}", "(use --show-suppressed to see details)".dimmed());
        return;
    }

    println!();
    for (file, sd) in suppressed {
        let d = &sd.diagnostic;
        let s = &sd.suppression;

        print!("    {:<26}", d.rule_id().dimmed());
        print!("{}", file.blue());
        if s.suppression_type == SuppressionType::File {
            print!("{}", ":* (file)".dimmed());
        } else {
            print!("{}", format!(":{}", d.line).dimmed());
        }
        println!();

        if !s.reason.is_empty() {
            println!("            {}", format!("reason: {:?}", s.reason).dimmed());
        }
    }
}

// =============================================================================
// Import summaries
// =============================================================================

/// JSON report for an `import` run.
#[derive(Serialize)]
pub struct JsonImportReport<'a> {
    pub version: String,
    pub path: String,
    pub dry_run: bool,
    pub units: usize,
    pub declarations: usize,
    pub accepted: usize,
    pub kinds: BTreeMap<String, usize>,
    pub tables: BTreeMap<String, usize>,
    pub duplicates: &'a [DuplicateConflict],
    pub errors: Vec<JsonDiagnostic>,
    pub failed: &'a [crate::import::FailedUnit],
}

pub fn json_import_report<'a>(path: &str, summary: &'a ImportSummary) -> JsonImportReport<'a> {
    JsonImportReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        dry_run: summary.dry_run,
        units: summary.units.len(),
        declarations: summary.declaration_count(),
        accepted: summary.accepted.len(),
        kinds: summary
            .kind_breakdown()
            .into_iter()
            .map(|(kind, n)| (kind.as_str().to_string(), n))
            .collect(),
        tables: summary
            .table_counts()
            .into_iter()
            .map(|(table, n)| (table.as_str().to_string(), n))
            .collect(),
        duplicates: &summary.duplicates,
        errors: summary
            .errors
            .iter()
            .map(|e| diagnostic_to_json(&e.path.to_string_lossy(), &e.diagnostic))
            .collect(),
        failed: &summary.failed,
    }
}

/// Write an import summary in JSON format.
pub fn write_import_json(path: &str, summary: &ImportSummary) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&json_import_report(path, summary))?;
    println!("{}", json);
    Ok(())
}

/// Write an import summary in pretty format.
pub fn write_import_pretty(path: &str, summary: &ImportSummary) {
    write_header(if summary.dry_run { "Dry run:" } else { "Importing:" }, path);

    println!(
        "  {} units, {} declarations",
        summary.units.len(),
        summary.declaration_count()
    );
    for (kind, count) in summary.kind_breakdown() {
        println!("    {:<14} {:>5}", kind.as_str(), count);
    }
    println!();

    if !summary.duplicates.is_empty() {
        println!("  {} ({}):", "Duplicates".bold(), summary.duplicates.len());
        for dup in &summary.duplicates {
            print!("    {} ", "SKIP ".yellow());
            print!("{:<24}", dup.name);
            print!("{}", dup.path.display().to_string().blue());
            print!("{}", format!(":{}", dup.line).dimmed());
            match &dup.first {
                Some(first) => println!(
                    "  {}",
                    format!("first at {}:{}", first.path.display(), first.line).dimmed()
                ),
                None => println!("  {}", "already stored".dimmed()),
            }
        }
        println!();
    }

    if !summary.errors.is_empty() {
        println!("  {} ({}):", "Structural errors".bold(), summary.errors.len());
        for e in &summary.errors {
            write_severity_tag(e.diagnostic.severity);
            print!("{}", e.path.display().to_string().blue());
            println!("{}", format!(":{}", e.diagnostic.line).dimmed());
            println!("            {}", e.diagnostic.message);
        }
        println!();
    }

    if !summary.failed.is_empty() {
        println!("  {} ({}):", "Failed".bold(), summary.failed.len());
        for f in &summary.failed {
            println!("    {} {}", "FAIL ".red(), f.error);
        }
        println!();
    }

    let verb = if summary.dry_run { "would import" } else { "imported" };
    let status = format!("{} {} records", verb, summary.accepted.len());
    if summary.has_findings() {
        println!("  {}  {}", "✗".red(), status);
    } else {
        println!("  {}  {}", "✓".green(), status);
    }
    println!();
}
