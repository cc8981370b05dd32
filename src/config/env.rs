//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

use super::AppConfig;

/// Environment variable prefix
const ENV_PREFIX: &str = "APISUITE";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Results directory from APISUITE_OUTPUT
    pub output_dir: Option<String>,
    /// Persist from APISUITE_PERSIST
    pub persist: Option<bool>,
    /// Verbose from APISUITE_VERBOSE
    pub verbose: Option<bool>,
    /// Output format from APISUITE_FORMAT
    pub format: Option<String>,
    /// Log level from APISUITE_LOG
    pub log_level: Option<String>,
    /// Config file from APISUITE_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            output_dir: get_env("OUTPUT"),
            persist: get_env_bool("PERSIST"),
            verbose: get_env_bool("VERBOSE"),
            format: get_env("FORMAT"),
            log_level: get_env("LOG"),
            config_file: get_env("CONFIG"),
        }
    }

    /// Overlay the variables that are set onto a file configuration
    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(persist) = self.persist {
            config.persist = persist;
        }
        if let Some(verbose) = self.verbose {
            config.verbose = verbose;
        }
        if let Some(format) = &self.format {
            config.format = format.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        config
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Builder for setting environment variables (useful for testing)
#[cfg(test)]
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

#[cfg(test)]
impl EnvBuilder {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    pub fn output_dir(mut self, dir: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_OUTPUT"), dir.into()));
        self
    }

    pub fn persist(mut self, persist: bool) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_PERSIST"), persist.to_string()));
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_FORMAT"), format.into()));
        self
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        for (key, value) in self.vars {
            env::set_var(key, value);
        }

        EnvGuard { previous }
    }
}

/// Guard that restores environment variables on drop
#[cfg(test)]
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

#[cfg(test)]
impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print all APISUITE environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_OUTPUT    Directory for persisted results");
    println!("  {ENV_PREFIX}_PERSIST   Persist the suite snapshot (true/false)");
    println!("  {ENV_PREFIX}_VERBOSE   Echo every suite log entry (true/false)");
    println!("  {ENV_PREFIX}_FORMAT    Report format (table, json, json-pretty, summary)");
    println!("  {ENV_PREFIX}_LOG       Diagnostic log level (trace, debug, info, warn, error)");
    println!("  {ENV_PREFIX}_CONFIG    Path to configuration file");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_config_default() {
        let env = EnvConfig::default();
        assert!(env.output_dir.is_none());
        assert_eq!(env.apply(AppConfig::default()), AppConfig::default());
    }

    #[test]
    fn test_apply_overrides_only_set_values() {
        let env = EnvConfig {
            persist: Some(true),
            format: Some("json".into()),
            ..Default::default()
        };

        let config = env.apply(AppConfig::default());
        assert!(config.persist);
        assert_eq!(config.format, "json");
        assert_eq!(config.output_dir, ".");
        assert!(!config.verbose);
    }

    #[test]
    fn test_env_builder() {
        let _guard = EnvBuilder::new()
            .output_dir("/tmp/results")
            .persist(true)
            .format("summary")
            .apply_scoped();

        let config = EnvConfig::load();
        assert_eq!(config.output_dir.as_deref(), Some("/tmp/results"));
        assert_eq!(config.persist, Some(true));
        assert_eq!(config.format.as_deref(), Some("summary"));
    }
}
