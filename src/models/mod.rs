//! Data models for API test suites
//!
//! This module contains the suite document structures and the outcome types
//! shared across the execution engine.

mod severity;
mod suite;

pub use severity::Severity;
pub use suite::{Entity, Routine, ServerInfo, SuiteDocument, SuiteError, UserInfo};
