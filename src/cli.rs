//! Command-line interface for acornlint.

use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::UnitError;
use crate::extract;
use crate::import::{collect_files, Importer, MemoryStore};
use crate::lint::{LintReport, Linter};
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Unit name used when checking standard input.
const STDIN_UNIT: &str = "<stdin>";

const CONFIG_TEMPLATE: &str = include_str!("templates/acornlint.yaml");

/// Structural checker, linter and corpus importer for Acorn sources.
#[derive(Parser)]
#[command(name = "acornlint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log level: error, warn, info, debug or trace (RUST_LOG overrides)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check Acorn sources for structural, naming and totality problems
    #[command(visible_alias = "lint")]
    Check(CheckArgs),
    /// Print the declarations of one unit as JSON
    Extract(ExtractArgs),
    /// Import declarations from a corpus of Acorn sources
    Import(ImportArgs),
    /// Write a starter acornlint.yaml
    Init(InitArgs),
}

/// Arguments for the check command.
#[derive(Parser)]
pub struct CheckArgs {
    /// File or directory to check, or `-` for standard input
    pub path: PathBuf,

    /// Path to a config file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty, json, or sarif
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Show suppressed diagnostics in output
    #[arg(long)]
    pub show_suppressed: bool,
}

/// Arguments for the extract command.
#[derive(Parser)]
pub struct ExtractArgs {
    /// Acorn source file
    pub file: PathBuf,
}

/// Arguments for the import command.
#[derive(Parser)]
pub struct ImportArgs {
    /// Files or directories to import
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Path to a config file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Run the full pipeline and report counts without storing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Write the stored tables to this JSON file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "acornlint.yaml")]
    pub output: PathBuf,
}

fn load_config(explicit: Option<&Path>) -> Result<Config, i32> {
    Config::load(explicit).map_err(|e| {
        eprintln!("Error: invalid configuration: {}", e);
        EXIT_ERROR
    })
}

/// Run the check command.
pub fn run_check(args: &CheckArgs) -> anyhow::Result<i32> {
    if args.format != "pretty" && args.format != "json" && args.format != "sarif" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty', 'json', or 'sarif'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(code) => return Ok(code),
    };
    let linter = Linter::from_config(&config);

    let (base_path, results): (PathBuf, Vec<Result<LintReport, UnitError>>) =
        if args.path == Path::new("-") {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            (PathBuf::new(), vec![linter.lint(STDIN_UNIT, &text)])
        } else {
            let abs_path = match args.path.canonicalize() {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Error: cannot access path {:?}: {}", args.path, e);
                    return Ok(EXIT_ERROR);
                }
            };
            let files = collect_files(&config, &[abs_path.clone()])?;
            if files.is_empty() {
                eprintln!("Warning: no files to check");
                return Ok(EXIT_SUCCESS);
            }
            let results = files.par_iter().map(|path| lint_file(&linter, path)).collect();
            (abs_path, results)
        };

    let mut reports = Vec::new();
    let mut failed = false;
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                eprintln!("Error: {}", e);
                failed = true;
            }
        }
    }

    let path_str = args.path.to_string_lossy().to_string();
    match args.format.as_str() {
        "json" => report::write_json(&path_str, &reports)?,
        "sarif" => report::write_sarif(&base_path, &reports)?,
        _ => report::write_pretty(&path_str, &reports, args.show_suppressed),
    }

    if failed {
        Ok(EXIT_ERROR)
    } else if reports.iter().any(LintReport::has_errors) {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

fn lint_file(linter: &Linter, path: &Path) -> Result<LintReport, UnitError> {
    let text = std::fs::read_to_string(path).map_err(|source| UnitError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    linter.lint(&path.to_string_lossy(), &text)
}

/// Run the extract command.
pub fn run_extract(args: &ExtractArgs) -> anyhow::Result<i32> {
    let text = match std::fs::read_to_string(&args.file) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: cannot read {}: {}", args.file.display(), e);
            return Ok(EXIT_ERROR);
        }
    };

    let extraction = match extract::extract(&args.file.to_string_lossy(), &text) {
        Ok(x) => x,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    println!("{}", serde_json::to_string_pretty(&extraction)?);

    if extraction.has_errors() {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the import command.
pub fn run_import(args: &ImportArgs) -> anyhow::Result<i32> {
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(code) => return Ok(code),
    };

    let importer = Importer::from_config(config)
        .dry_run(args.dry_run)
        .show_progress(args.format == "pretty" && std::io::stderr().is_terminal());

    let files = match importer.collect(&args.paths) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    if files.is_empty() {
        eprintln!("Warning: no files to import");
        return Ok(EXIT_SUCCESS);
    }

    let mut store = MemoryStore::new();
    let summary = importer.import_files(&files, &mut store);

    let path_str = args
        .paths
        .iter()
        .map(|p| p.to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    match args.format.as_str() {
        "json" => report::write_import_json(&path_str, &summary)?,
        _ => report::write_import_pretty(&path_str, &summary),
    }

    if let Some(output) = &args.output {
        if args.dry_run {
            eprintln!("Warning: --output ignored in dry-run mode");
        } else if let Err(e) = std::fs::write(output, store.to_json()?) {
            eprintln!("Error: failed to write {}: {}", output.display(), e);
            return Ok(EXIT_ERROR);
        }
    }

    if summary.has_findings() {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, CONFIG_TEMPLATE) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to customize for your library", args.output.display());
    println!("  2. Run: acornlint check . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parses_global_log_level() {
        let cli = Cli::try_parse_from(["acornlint", "check", "lib", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Commands::Check(_)));
    }

    #[test]
    fn test_import_requires_path() {
        assert!(Cli::try_parse_from(["acornlint", "import"]).is_err());
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("acornlint.yaml");

        let args = InitArgs {
            output: output.clone(),
        };
        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), CONFIG_TEMPLATE);
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_check_rejects_unknown_format() {
        let args = CheckArgs {
            path: PathBuf::from("."),
            config: None,
            format: "xml".to_string(),
            show_suppressed: false,
        };
        assert_eq!(run_check(&args).unwrap(), EXIT_ERROR);
    }
}
