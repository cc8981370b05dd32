//! Results storage module
//!
//! Captures finished suites and persists them as JSON documents.

mod storage;

pub use storage::{ResultsStorage, SuiteSnapshot};
