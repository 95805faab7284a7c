//! Tests for the JSON and SARIF report shapes.

use std::path::PathBuf;

use acornlint::import::DuplicateConflict;
use acornlint::report::{json_import_report, json_report, sarif_report, JsonReport, SarifReport};
use acornlint::{Importer, LintReport, Linter, MemoryStore};
use tempfile::TempDir;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn lint_fixtures(names: &[&str]) -> Vec<LintReport> {
    let linter = Linter::new();
    names
        .iter()
        .map(|name| {
            let path = testdata_path().join(name);
            let text = std::fs::read_to_string(&path).expect("fixture should exist");
            linter
                .lint(&path.to_string_lossy(), &text)
                .expect("fixture should lint")
        })
        .collect()
}

#[test]
fn test_json_report_fields() {
    let reports = lint_fixtures(&["clean.ac", "problems.ac"]);
    let report = json_report("testdata", &reports);

    assert_eq!(report.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(report.units_checked, 2);
    assert!(!report.passed);
    assert_eq!(report.error_count, 4);
    assert_eq!(report.warning_count, 1);
    assert_eq!(report.diagnostics.len(), 5);
    assert_eq!(report.suppressed_count, 0);

    let first = &report.diagnostics[0];
    assert_eq!(first.rule, "module_name_case");
    assert_eq!(first.severity, "error");
    assert_eq!(first.line, 1);
    assert!(first.file.ends_with("problems.ac"));
}

#[test]
fn test_json_report_round_trips() {
    let reports = lint_fixtures(&["problems.ac"]);
    let json = serde_json::to_string_pretty(&json_report("problems.ac", &reports)).unwrap();

    let parsed: JsonReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.diagnostics.len(), 5);

    // Empty suppressed list is omitted
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value.get("suppressed").is_none());
    assert_eq!(value["suppressed_count"], 0);
}

#[test]
fn test_sarif_structure() {
    let reports = lint_fixtures(&["problems.ac"]);
    let sarif = sarif_report(&testdata_path(), &reports);
    let json = serde_json::to_string(&sarif).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["version"], "2.1.0");
    assert!(value["$schema"].as_str().unwrap().contains("sarif-schema-2.1.0"));

    let run = &value["runs"][0];
    assert_eq!(run["tool"]["driver"]["name"], "acornlint");

    let rules: Vec<&str> = run["tool"]["driver"]["rules"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        rules,
        vec![
            "missing_type_annotation",
            "module_name_case",
            "no_active_numerals",
            "type_name_case"
        ]
    );

    let results = run["results"].as_array().unwrap();
    assert_eq!(results.len(), 5);
    assert_eq!(
        results[0]["locations"][0]["physicalLocation"]["artifactLocation"]["uri"],
        "problems.ac"
    );
    assert_eq!(
        results[0]["locations"][0]["physicalLocation"]["region"]["startLine"],
        1
    );
    assert_eq!(results[2]["level"], "warning");

    let parsed: SarifReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.runs[0].results.len(), 5);
}

#[test]
fn test_sarif_rule_metadata() {
    let reports = lint_fixtures(&["unterminated_comment.ac"]);
    let sarif = sarif_report(&testdata_path(), &reports);
    let rule = &sarif.runs[0].tool.driver.rules[0];

    assert_eq!(rule.id, "unterminated_comment");
    assert_eq!(rule.name, "UnterminatedComment");
    assert_eq!(rule.default_config.level, "error");
    assert_eq!(rule.properties.category, "structural");
}

#[test]
fn test_import_report_shape() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.ac"), "theorem Dup { true }\n").unwrap();
    std::fs::write(dir.path().join("b.ac"), "theorem Dup { true }\n").unwrap();

    let summary = Importer::new()
        .run(&[dir.path().to_path_buf()], &mut MemoryStore::new())
        .unwrap();
    let report = json_import_report("corpus", &summary);
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["units"], 2);
    assert_eq!(value["declarations"], 2);
    assert_eq!(value["accepted"], 1);
    assert_eq!(value["kinds"]["theorem"], 2);
    assert_eq!(value["tables"]["theorems"], 1);
    assert_eq!(value["duplicates"][0]["name"], "Dup");
    assert_eq!(value["duplicates"][0]["kind"], "theorem");
    assert_eq!(value["duplicates"][0]["first"]["line"], 1);

    let dup: &DuplicateConflict = &summary.duplicates[0];
    assert_eq!(dup.line, 1);
}
