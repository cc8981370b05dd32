//! API Suite - declarative HTTP API test runner
//!
//! Reads a JSON suite document describing entities and their HTTP routines,
//! runs them against the target server and reports per-entity coverage.
//!
//! ## Features
//!
//! - Parent entities run first, the rest run concurrently
//! - Turbo routines run concurrently inside each loop iteration
//! - Response values chained into later requests through `{{name}}` templates
//! - Table, JSON and summary reports
//! - Optional JSON snapshot of the finished run
//!
//! ## Usage
//!
//! ```bash
//! # Run a local suite
//! api-suite --file suite.json
//!
//! # Run a remote suite and persist the results
//! api-suite --remote https://example.com/suite.json --persist --output results
//!
//! # Machine readable report
//! api-suite -f suite.json --format json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};

mod cli;
mod config;
mod executor;
mod http;
mod logs;
mod models;
mod output;
mod results;
mod utils;
mod variables;

use cli::{Args, SuiteSource};
use config::{print_env_help, AppConfig, EnvConfig};
use executor::{Suite, SuiteExecutor, SuiteOutcome};
use logs::{Level, Logger};
use models::SuiteDocument;
use output::{OutputFormat, ResultFormatter};
use results::{ResultsStorage, SuiteSnapshot};
use utils::logger::{init_logger, parse_level};

/// Exit code when the run finished but its snapshot could not be written
const PERSIST_FAILURE_EXIT: u8 = 3;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    if args.env_help {
        print_env_help();
        return Ok(ExitCode::SUCCESS);
    }

    let config = merge_args(
        AppConfig::resolve(args.config.as_deref(), &EnvConfig::load())?,
        &args,
    );
    init_logger(parse_level(&config.log_level).unwrap_or(LevelFilter::INFO));

    let format = OutputFormat::from_str(&config.format)
        .with_context(|| format!("Unknown output format: {}", config.format))?;
    let source = args
        .source()
        .context("A suite document is required (--file or --remote)")?;

    let document = match source {
        SuiteSource::File(path) => SuiteDocument::load(&path)?,
        SuiteSource::Remote(url) => SuiteDocument::fetch(&url).await?,
    };

    let logger = Logger::new(config.verbose);
    let suite = Arc::new(Suite::from_document(document, logger.clone())?);
    suite.ping().await?;

    let executor = SuiteExecutor::new(suite.clone());
    let mut finished = executor.finished();
    let run = tokio::spawn(async move { executor.run().await });
    finished
        .wait_for(|done| *done)
        .await
        .context("Suite executor stopped before finishing")?;
    let outcome = run.await.context("Suite executor aborted")?;

    let mut formatter = ResultFormatter::new(format);
    if !std::io::stdout().is_terminal() {
        formatter = formatter.no_color();
    }
    println!("{}", formatter.format_outcome(&outcome));

    let mut exit_code = outcome.severity.exit_code();
    if config.persist {
        match persist(&suite, &outcome, Path::new(&config.output_dir)).await {
            Ok(path) => info!("Results written to {}", path.display()),
            Err(e) => {
                logger.suite(
                    "Failed to persist results",
                    Level::Error,
                    Some(json!({"error": format!("{e:#}"), "output": config.output_dir})),
                );
                exit_code = PERSIST_FAILURE_EXIT;
            }
        }
    }

    logger.flush().await;
    Ok(ExitCode::from(exit_code))
}

/// Command line flags take precedence over file and environment
fn merge_args(mut config: AppConfig, args: &Args) -> AppConfig {
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if let Some(format) = &args.format {
        config.format = format.clone();
    }
    config.persist |= args.persist;
    config.verbose |= args.verbose;
    config
}

async fn persist(suite: &Suite, outcome: &SuiteOutcome, dir: &Path) -> Result<PathBuf> {
    let snapshot = SuiteSnapshot::capture(suite, outcome).await;
    ResultsStorage::new(dir).save(&snapshot)
}
