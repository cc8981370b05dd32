//! Configuration module
//!
//! Handles loading and managing configuration. Values come from a config
//! file, then `APISUITE_*` environment variables, then command line flags.

mod env;

pub use env::{print_env_help, EnvConfig};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Files looked up in the working directory when no config path is given
const DEFAULT_FILES: [&str; 3] = ["api-suite.yaml", "api-suite.yml", "api-suite.json"];

/// Application configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory persisted snapshots are written to
    pub output_dir: String,

    /// Persist a snapshot after every run
    pub persist: bool,

    /// Echo every suite log entry
    pub verbose: bool,

    /// Report format
    pub format: String,

    /// Diagnostic log level
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: ".".to_string(),
            persist: false,
            verbose: false,
            format: "table".to_string(),
            log_level: "info".to_string(),
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = if is_yaml(path) {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON config")?
        };

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// First default config file present in `dir`
    pub fn find(dir: impl AsRef<Path>) -> Option<PathBuf> {
        DEFAULT_FILES
            .iter()
            .map(|name| dir.as_ref().join(name))
            .find(|path| path.is_file())
    }

    /// Resolve the file and environment layers.
    ///
    /// An explicit path (argument first, then `APISUITE_CONFIG`) must exist;
    /// the default files are optional.
    pub fn resolve(explicit: Option<&Path>, env: &EnvConfig) -> Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| env.config_file.as_ref().map(PathBuf::from));

        let config = match explicit {
            Some(path) => Self::load(path)?,
            None => match Self::find(".") {
                Some(path) => Self::load(path)?,
                None => Self::default(),
            },
        };

        Ok(env.apply(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.output_dir, ".");
        assert_eq!(config.format, "table");
        assert!(!config.persist);
    }

    #[test]
    fn test_partial_files_keep_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("api-suite.yaml");
        std::fs::write(&path, "persist: true\noutput_dir: out\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert!(config.persist);
        assert_eq!(config.output_dir, "out");
        assert_eq!(config.log_level, "info");

        let json_path = dir.path().join("api-suite.json");
        std::fs::write(&json_path, r#"{"persist": true, "output_dir": "out"}"#).unwrap();
        assert_eq!(AppConfig::load(&json_path).unwrap(), config);
    }

    #[test]
    fn test_find_prefers_yaml() {
        let dir = tempdir().unwrap();
        assert!(AppConfig::find(dir.path()).is_none());

        std::fs::write(dir.path().join("api-suite.json"), "{}").unwrap();
        std::fs::write(dir.path().join("api-suite.yml"), "verbose: true\n").unwrap();

        let found = AppConfig::find(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "api-suite.yml");
    }

    #[test]
    fn test_resolve_explicit_missing_file() {
        let env = EnvConfig::default();
        assert!(AppConfig::resolve(Some(Path::new("/no/such/config.yaml")), &env).is_err());
    }

    #[test]
    fn test_resolve_applies_env() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.json");
        std::fs::write(&path, r#"{"format": "summary"}"#).unwrap();

        let env = EnvConfig {
            format: Some("json".into()),
            verbose: Some(true),
            ..Default::default()
        };
        let config = AppConfig::resolve(Some(&path), &env).unwrap();
        assert_eq!(config.format, "json");
        assert!(config.verbose);
    }
}
