//! Wall-clock timing for exchanges and whole runs

use std::time::Instant;
use tracing::debug;

/// Measures one HTTP exchange or one suite run
#[derive(Debug)]
pub struct Timer {
    started: Instant,
    label: String,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            started: Instant::now(),
            label: label.into(),
        }
    }

    /// Stop the timer and return the elapsed whole milliseconds
    pub fn stop_ms(self) -> u64 {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        debug!(timer = %self.label, elapsed_ms, "Timer stopped");
        elapsed_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_stop_reports_elapsed_millis() {
        let timer = Timer::start("exchange");
        tokio::time::sleep(Duration::from_millis(15)).await;
        assert!(timer.stop_ms() >= 15);
    }
}
