//! Suite severity reducer
//!
//! A single task folds the outcomes emitted by entity schedulers into the
//! suite severity. Events are consumed in the order they were sent.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::models::Severity;

/// Non-success outcome of one entity
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityOutcome {
    pub entity: String,
    pub severity: Severity,
}

#[derive(Debug)]
enum ReducerEvent {
    Outcome(EntityOutcome),
    Stop,
}

/// Sending half handed to every entity scheduler
#[derive(Clone, Debug)]
pub struct SeveritySignal {
    tx: mpsc::UnboundedSender<ReducerEvent>,
}

impl SeveritySignal {
    pub fn emit(&self, outcome: EntityOutcome) {
        if self.tx.send(ReducerEvent::Outcome(outcome)).is_err() {
            error!("Severity reducer stopped before all outcomes were emitted");
        }
    }
}

/// Owns the reducer task
pub struct SeverityReducer {
    tx: mpsc::UnboundedSender<ReducerEvent>,
    handle: JoinHandle<Severity>,
}

impl SeverityReducer {
    /// Start the reducer. Must be called inside a tokio runtime.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(reduce(rx));
        Self { tx, handle }
    }

    pub fn sender(&self) -> SeveritySignal {
        SeveritySignal {
            tx: self.tx.clone(),
        }
    }

    /// Stop the reducer once everything sent so far is folded and return the
    /// final severity
    pub async fn finish(self) -> Severity {
        let _ = self.tx.send(ReducerEvent::Stop);
        match self.handle.await {
            Ok(severity) => severity,
            Err(e) => {
                error!("Severity reducer failed: {}", e);
                Severity::Fail
            }
        }
    }
}

async fn reduce(mut rx: mpsc::UnboundedReceiver<ReducerEvent>) -> Severity {
    let mut severity = Severity::Success;
    while let Some(event) = rx.recv().await {
        match event {
            ReducerEvent::Outcome(outcome) => {
                debug!("Entity {} reported {}", outcome.entity, outcome.severity);
                severity = severity.escalate(outcome.severity);
            }
            ReducerEvent::Stop => break,
        }
    }
    severity
}
