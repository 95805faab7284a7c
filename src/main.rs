//! acornlint CLI entry point.

use std::str::FromStr;

use acornlint::cli::{self, Cli, Commands, EXIT_ERROR};
use clap::Parser;
use env_logger::Env;
use log::LevelFilter;

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(LevelFilter::from_str(&cli.log_level).unwrap_or(LevelFilter::Warn))
        .parse_env(Env::default())
        .init();

    let result = match &cli.command {
        Commands::Check(args) => cli::run_check(args),
        Commands::Extract(args) => cli::run_extract(args),
        Commands::Import(args) => cli::run_import(args),
        Commands::Init(args) => cli::run_init(args),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
