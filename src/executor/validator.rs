//! Response validation
//!
//! Decides whether a routine passed and copies matching response fields into
//! the variable store.

use serde_json::json;
use thiserror::Error;

use super::routine::RoutineResult;
use crate::logs::{Level, Logger};
use crate::variables::VariableStore;

/// A field the routine expected but the response lacked
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Key {key} not found in response (available: {available:?})")]
    MissingKey { key: String, available: Vec<String> },
}

/// Outcome of validating one routine execution
#[derive(Debug, Clone, Default)]
pub struct Validation {
    pub passed: bool,
    pub extraction_errors: Vec<ExtractionError>,
}

/// Validates a [`RoutineResult`] against its expectations
pub struct ResponseValidator<'a> {
    store: &'a VariableStore,
    logger: &'a Logger,
}

impl<'a> ResponseValidator<'a> {
    pub fn new(store: &'a VariableStore, logger: &'a Logger) -> Self {
        Self { store, logger }
    }

    /// Check status code and expected keys.
    ///
    /// The status code is compared for every expected key, so a routine that
    /// expects no keys always passes. Save directives fire for every expected
    /// key that is present, even when the routine fails on another check.
    pub fn validate(&self, result: &RoutineResult) -> Validation {
        let entity = Some(result.entity.as_str());
        let routine = Some(result.routine.as_str());
        let mut validation = Validation {
            passed: true,
            extraction_errors: Vec::new(),
        };

        for key in &result.expected.keys {
            if result.code != result.expected.code {
                self.logger.log(
                    entity,
                    routine,
                    "Return code expected",
                    Level::Warning,
                    Some(json!({"expected": result.expected.code, "returned": result.code})),
                    false,
                );
                validation.passed = false;
            }

            let Some(content) = result.body.get(key) else {
                self.logger.log(
                    entity,
                    routine,
                    "Key not found",
                    Level::Warning,
                    Some(json!({"expected": key})),
                    false,
                );
                validation.passed = false;
                validation.extraction_errors.push(ExtractionError::MissingKey {
                    key: key.clone(),
                    available: result.body.keys().cloned().collect(),
                });
                continue;
            };

            for directive in &result.directives {
                if let Some(destination) = directive.target_for(key) {
                    self.store.save(destination, content.clone());
                }
            }
        }

        validation
    }
}
