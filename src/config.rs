//! Configuration schema for acornlint.
//!
//! Configuration lives in `acornlint.yaml` (or `.acornlint.yaml`), looked up
//! in the working directory and then in the user configuration directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::lint::{Rule, Severity};

/// File names probed during discovery, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["acornlint.yaml", ".acornlint.yaml"];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub version: String,
    /// File extensions treated as Acorn source (without the dot)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Glob patterns for paths to skip (e.g., "**/scratch/**")
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    #[serde(default)]
    pub rules: RulesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: String::new(),
            extensions: default_extensions(),
            excluded_paths: Vec::new(),
            rules: RulesConfig::default(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["ac".to_string()]
}

/// Per-rule switches.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RulesConfig {
    /// Rule ids that are never reported
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Severity overrides keyed by rule id
    #[serde(default)]
    pub severity: BTreeMap<String, Severity>,
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load `explicit` if given, else the first discovered file, else the
    /// defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => discover(&std::env::current_dir()?),
        };
        let config = match path {
            Some(path) => {
                log::debug!(path:? = path; "loading configuration");
                Self::parse_file(&path)
                    .map_err(|e| anyhow::anyhow!("failed to load {}: {}", path.display(), e))?
            }
            None => Self::default(),
        };
        validate(&config)?;
        Ok(config)
    }

    /// Whether `path` has one of the configured extensions.
    pub fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(false, |ext| self.extensions.iter().any(|e| e == ext))
    }

    /// Check if a path should be excluded based on excluded_paths patterns.
    /// Uses globset for matching, which supports `**` for recursive directory matching.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }

        let path_str = path.to_string_lossy();

        for pattern in &self.excluded_paths {
            if let Ok(glob) = globset::Glob::new(pattern) {
                let matcher = glob.compile_matcher();
                if matcher.is_match(&*path_str) {
                    return true;
                }
            }
        }
        false
    }

    /// Disabled rules, parsed. Unknown ids are skipped; [`validate`] rejects
    /// them up front.
    pub fn disabled_rules(&self) -> impl Iterator<Item = Rule> + '_ {
        self.rules.disabled.iter().filter_map(|id| Rule::parse(id))
    }

    /// Severity overrides, parsed.
    pub fn severity_overrides(&self) -> impl Iterator<Item = (Rule, Severity)> + '_ {
        self.rules
            .severity
            .iter()
            .filter_map(|(id, severity)| Rule::parse(id).map(|rule| (rule, *severity)))
    }
}

/// First config file in `dir`, then in the user configuration directory.
pub fn discover(dir: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = CONFIG_FILE_NAMES.iter().map(|name| dir.join(name)).collect();
    if let Some(dirs) = ProjectDirs::from("", "", "acornlint") {
        candidates.extend(CONFIG_FILE_NAMES.iter().map(|name| dirs.config_dir().join(name)));
    }
    candidates.into_iter().find(|p| p.is_file())
}

/// Validate a configuration for correctness.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if config.extensions.is_empty() {
        anyhow::bail!("extensions must list at least one file extension");
    }

    for id in config.rules.disabled.iter().chain(config.rules.severity.keys()) {
        if Rule::parse(id).is_none() {
            anyhow::bail!("unknown rule id {:?}", id);
        }
    }

    for pattern in &config.excluded_paths {
        globset::Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e))?;
    }

    Ok(())
}
