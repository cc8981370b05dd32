//! Test execution engine
//!
//! Runs suite entities with mixed sequential and concurrent semantics,
//! validates every response and reduces entity coverage into one severity.

mod entity;
mod reducer;
mod routine;
mod suite;
mod validator;

pub use entity::EntityReport;
pub use suite::{Suite, SuiteExecutor, SuiteOutcome};
