//! Entity scheduling and coverage

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::reducer::{EntityOutcome, SeveritySignal};
use super::routine::RoutineExecutor;
use super::suite::Suite;
use crate::logs::Level;
use crate::models::{Entity, Severity};

/// Passed routine executions out of all attempts of an entity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Coverage {
    pub passed: usize,
    pub total: usize,
}

impl Coverage {
    /// Percentage of passed executions. An entity without cases is fully covered.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.passed as f64 / self.total as f64 * 100.0
    }

    /// Percentage rounded down to a whole number, as logged
    pub fn whole_percent(&self) -> usize {
        if self.total == 0 {
            return 100;
        }
        self.passed * 100 / self.total
    }

    /// Suite-level signal for this coverage. Full coverage emits nothing.
    pub fn signal(&self) -> Option<Severity> {
        if self.passed >= self.total {
            None
        } else if self.passed == 0 {
            Some(Severity::Fail)
        } else {
            Some(Severity::Warning)
        }
    }
}

/// Per-entity summary surfaced in reports and snapshots
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityReport {
    pub title: String,
    pub passed: usize,
    pub total: usize,
    pub coverage: f64,
    pub severity: Severity,
}

/// Runs every routine of one entity `loop_times` times
pub struct EntityScheduler {
    suite: Arc<Suite>,
    entity: Arc<Entity>,
    signal: SeveritySignal,
}

impl EntityScheduler {
    pub fn new(suite: Arc<Suite>, entity: Arc<Entity>, signal: SeveritySignal) -> Self {
        Self {
            suite,
            entity,
            signal,
        }
    }

    /// Run all iterations, then emit the coverage signal.
    ///
    /// Turbo routines of an iteration run concurrently with their siblings;
    /// the next iteration starts only once all of them have finished.
    pub async fn run(self) -> EntityReport {
        let title = self.entity.title.as_str();
        let logger = &self.suite.logger;
        logger.log(Some(title), None, "Start entity tests", Level::Info, None, true);

        let mut passed = 0;
        for iteration in 0..self.entity.iterations() {
            let mut turbo = Vec::new();

            for (index, routine) in self.entity.cases.iter().enumerate() {
                let executor =
                    RoutineExecutor::new(self.suite.clone(), self.entity.clone(), index);
                if routine.turbo {
                    turbo.push(tokio::spawn(async move {
                        executor.execute(iteration).await.passed
                    }));
                } else if executor.execute(iteration).await.passed {
                    passed += 1;
                }
            }

            for joined in join_all(turbo).await {
                match joined {
                    Ok(true) => passed += 1,
                    Ok(false) => {}
                    Err(e) => logger.log(
                        Some(title),
                        None,
                        "Turbo routine aborted",
                        Level::Error,
                        Some(json!({"error": e.to_string(), "iteration": iteration})),
                        false,
                    ),
                }
            }
        }

        let coverage = Coverage {
            passed,
            total: self.entity.attempts(),
        };
        let signal = coverage.signal();
        if let Some(severity) = signal {
            self.signal.emit(EntityOutcome {
                entity: title.to_string(),
                severity,
            });
        }

        logger.log(
            Some(title),
            None,
            "Finish entity tests",
            Level::Info,
            Some(json!({"cover": {
                "passed_tests": coverage.passed,
                "test_amount": coverage.total,
                "percent": coverage.whole_percent(),
            }})),
            true,
        );

        EntityReport {
            title: title.to_string(),
            passed: coverage.passed,
            total: coverage.total,
            coverage: coverage.percent(),
            severity: signal.unwrap_or_default(),
        }
    }
}
