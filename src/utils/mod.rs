//! Shared utilities
//!
//! Process logging setup and timing helpers.

pub mod logger;
mod timer;

pub use timer::Timer;
