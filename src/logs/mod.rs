//! Suite log pipeline
//!
//! Every component records what it does through a [`Logger`]. Entries are
//! queued to a single dispatcher task that owns the append to the history,
//! so producers never wait on bookkeeping. Entries flagged for the screen (or
//! all of them in verbose mode) are also echoed through `tracing` before
//! `log` returns, under [`CONSOLE_TARGET`] so the process log level never
//! hides them.

mod detail;

pub use detail::{Level, LogDetail};

use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// `tracing` target of the console echo
pub const CONSOLE_TARGET: &str = "api_suite::console";

enum Command {
    Append(LogDetail),
    Flush(oneshot::Sender<()>),
}

/// Handle to the suite log pipeline. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Logger {
    tx: mpsc::UnboundedSender<Command>,
    history: Arc<Mutex<Vec<LogDetail>>>,
    verbose: bool,
}

impl Logger {
    /// Start the dispatcher. Must be called inside a tokio runtime.
    pub fn new(verbose: bool) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let history = Arc::new(Mutex::new(Vec::new()));

        tokio::spawn(dispatch(rx, history.clone()));

        Self {
            tx,
            history,
            verbose,
        }
    }

    /// Record an entry.
    ///
    /// `Panic` and `Fatal` entries are always echoed and then end the process.
    pub fn log(
        &self,
        entity: Option<&str>,
        routine: Option<&str>,
        message: impl Into<String>,
        level: Level,
        details: Option<Value>,
        force_screen: bool,
    ) {
        let detail = LogDetail::new(level, message)
            .with_entity(entity)
            .with_routine(routine)
            .with_details(details);

        let echo = self.verbose || force_screen || level.is_terminal();
        let line = echo.then(|| detail.to_string());

        if self.tx.send(Command::Append(detail)).is_err() {
            debug!("Log dispatcher stopped, entry dropped from history");
        }

        if let Some(line) = line {
            write_screen(level, &line);
        }
    }

    /// Suite-wide entry with no entity or routine, always echoed
    pub fn suite(&self, message: impl Into<String>, level: Level, details: Option<Value>) {
        self.log(None, None, message, level, details, true);
    }

    /// Wait until every entry queued before this call is in the history
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Copy of the history as appended so far
    pub fn history(&self) -> Vec<LogDetail> {
        self.history.lock().clone()
    }
}

async fn dispatch(mut rx: mpsc::UnboundedReceiver<Command>, history: Arc<Mutex<Vec<LogDetail>>>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Append(detail) => history.lock().push(detail),
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}

fn write_screen(level: Level, line: &str) {
    match level {
        Level::Info => info!(target: CONSOLE_TARGET, "{}", line),
        Level::Notice => info!(target: CONSOLE_TARGET, "[NOTICE] {}", line),
        Level::Warning => warn!(target: CONSOLE_TARGET, "{}", line),
        Level::Error => error!(target: CONSOLE_TARGET, "{}", line),
        Level::Panic => {
            error!(target: CONSOLE_TARGET, "[PANIC] {}", line);
            panic!("{}", line);
        }
        Level::Fatal => {
            error!(target: CONSOLE_TARGET, "[FATAL] {}", line);
            std::process::exit(1);
        }
    }
}
