//! Unrecoverable per-unit failures.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a unit from being processed at all.
///
/// Everything else (malformed delimiters, bad names, missing annotations) is
/// reported as a diagnostic and never surfaces here.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("unit '{unit}' is empty")]
    EmptyUnit { unit: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl UnitError {
    pub fn empty(unit: impl Into<String>) -> Self {
        UnitError::EmptyUnit { unit: unit.into() }
    }
}
