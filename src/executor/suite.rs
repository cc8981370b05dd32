//! Suite execution
//!
//! Holds the state shared by every entity of a run and schedules the
//! entities: parents first, one after another, then all the others at once.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;

use super::entity::{EntityReport, EntityScheduler};
use super::reducer::{EntityOutcome, SeverityReducer};
use crate::http::HttpClient;
use crate::logs::{Level, Logger};
use crate::models::{Entity, ServerInfo, Severity, SuiteDocument, SuiteError, UserInfo};
use crate::utils::Timer;
use crate::variables::VariableStore;

/// Shared state of one suite run
#[derive(Debug)]
pub struct Suite {
    pub server: ServerInfo,
    pub user: Option<UserInfo>,
    pub entities: Vec<Arc<Entity>>,
    pub variables: VariableStore,
    pub logger: Logger,
    client: HttpClient,
    base_url: String,
}

impl Suite {
    /// Build a suite from a parsed document.
    ///
    /// The HTTP client follows `server_info.check_tls` for every request,
    /// the reachability check included.
    pub fn from_document(document: SuiteDocument, logger: Logger) -> Result<Self, SuiteError> {
        let server = document.server_info.ok_or(SuiteError::MissingServerInfo)?;
        let entities = document.tests.ok_or(SuiteError::MissingTests)?;
        let client = HttpClient::new(server.check_tls)?;

        Ok(Self {
            base_url: server.base_url(),
            user: document.user,
            entities: entities.into_iter().map(Arc::new).collect(),
            variables: VariableStore::new(document.variables),
            logger,
            client,
            server,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Check that the server answers at `base_url + test_path`
    pub async fn ping(&self) -> Result<(), SuiteError> {
        let url = self.server.ping_url();
        self.logger.suite(
            "Starting Ping",
            Level::Info,
            Some(json!({"url": url, "check_tls": self.client.verify_tls()})),
        );

        match self.client.ping(&url).await {
            Ok(response) => {
                self.logger.suite(
                    "Successful Ping",
                    Level::Info,
                    Some(json!({"status": response.status_code, "duration_ms": response.duration_ms})),
                );
                Ok(())
            }
            Err(e) => {
                self.logger.suite(
                    "Ping failed",
                    Level::Error,
                    Some(json!({"url": url, "error": e.to_string()})),
                );
                Err(SuiteError::Unreachable {
                    url,
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// Result of a whole suite run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SuiteOutcome {
    pub severity: Severity,
    pub entities: Vec<EntityReport>,
    pub duration_ms: u64,
}

/// Runs every entity of a suite and reduces their outcomes
pub struct SuiteExecutor {
    suite: Arc<Suite>,
    finished: watch::Sender<bool>,
}

impl SuiteExecutor {
    pub fn new(suite: Arc<Suite>) -> Self {
        let (finished, _) = watch::channel(false);
        Self { suite, finished }
    }

    /// Flips to `true` once [`SuiteExecutor::run`] has returned its outcome
    pub fn finished(&self) -> watch::Receiver<bool> {
        self.finished.subscribe()
    }

    /// Run all entities to completion
    pub async fn run(&self) -> SuiteOutcome {
        let timer = Timer::start("suite");
        let logger = &self.suite.logger;
        logger.suite(
            "Start test suite",
            Level::Info,
            Some(json!({"base_url": self.suite.base_url(), "entities": self.suite.entities.len()})),
        );

        let reducer = SeverityReducer::spawn();
        let mut reports = Vec::with_capacity(self.suite.entities.len());

        let (parents, others): (Vec<_>, Vec<_>) =
            self.suite.entities.iter().cloned().partition(|e| e.parent);

        for entity in parents {
            let scheduler = EntityScheduler::new(self.suite.clone(), entity, reducer.sender());
            reports.push(scheduler.run().await);
        }

        let handles: Vec<_> = others
            .into_iter()
            .map(|entity| {
                let title = entity.title.clone();
                let scheduler = EntityScheduler::new(self.suite.clone(), entity, reducer.sender());
                (title, tokio::spawn(scheduler.run()))
            })
            .collect();

        let (titles, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        for (title, joined) in titles.into_iter().zip(join_all(handles).await) {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => {
                    logger.log(
                        Some(title.as_str()),
                        None,
                        "Entity aborted",
                        Level::Error,
                        Some(json!({"error": e.to_string()})),
                        true,
                    );
                    reducer.sender().emit(EntityOutcome {
                        entity: title,
                        severity: Severity::Fail,
                    });
                }
            }
        }

        let severity = reducer.finish().await;
        let duration_ms = timer.stop_ms();
        logger.suite(
            format!("All tests finished in {duration_ms}ms"),
            Level::Info,
            Some(json!({"duration_ms": duration_ms, "result": severity})),
        );

        let _ = self.finished.send_replace(true);

        SuiteOutcome {
            severity,
            entities: reports,
            duration_ms,
        }
    }
}
