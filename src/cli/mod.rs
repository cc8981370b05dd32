//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Declarative HTTP API test suite runner
#[derive(Parser, Debug)]
#[command(name = "api-suite")]
#[command(version)]
#[command(about = "Run a JSON-described suite of HTTP API tests")]
#[command(long_about = None)]
#[command(group(ArgGroup::new("source").args(["file", "remote"])))]
pub struct Args {
    /// Suite document on disk
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// URL to download the suite document from
    #[arg(short, long)]
    pub remote: Option<String>,

    /// Directory persisted results are written to
    #[arg(short, long)]
    pub output: Option<String>,

    /// Persist a snapshot of the finished suite
    #[arg(short, long)]
    pub persist: bool,

    /// Echo every suite log entry
    #[arg(long)]
    pub verbose: bool,

    /// Report format (table, json, json-pretty, summary)
    #[arg(long)]
    pub format: Option<String>,

    /// Configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Describe the supported environment variables and exit
    #[arg(long)]
    pub env_help: bool,
}

/// Where the suite document comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SuiteSource {
    File(PathBuf),
    Remote(String),
}

impl Args {
    pub fn source(&self) -> Option<SuiteSource> {
        match (&self.file, &self.remote) {
            (Some(path), _) => Some(SuiteSource::File(path.clone())),
            (None, Some(url)) => Some(SuiteSource::Remote(url.clone())),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_source() {
        let args = Args::try_parse_from(["api-suite", "-f", "suite.json", "-p"]).unwrap();
        assert_eq!(args.source(), Some(SuiteSource::File("suite.json".into())));
        assert!(args.persist);
        assert!(args.format.is_none());
    }

    #[test]
    fn test_remote_source() {
        let args = Args::try_parse_from([
            "api-suite",
            "--remote",
            "https://example.com/suite.json",
            "--format",
            "json",
            "-o",
            "results",
        ])
        .unwrap();
        assert_eq!(
            args.source(),
            Some(SuiteSource::Remote("https://example.com/suite.json".into()))
        );
        assert_eq!(args.format.as_deref(), Some("json"));
        assert_eq!(args.output.as_deref(), Some("results"));
    }

    #[test]
    fn test_file_and_remote_conflict() {
        assert!(Args::try_parse_from(["api-suite", "-f", "a.json", "-r", "http://x"]).is_err());
    }

    #[test]
    fn test_no_source() {
        let args = Args::try_parse_from(["api-suite", "--env-help"]).unwrap();
        assert!(args.env_help);
        assert_eq!(args.source(), None);
    }
}
