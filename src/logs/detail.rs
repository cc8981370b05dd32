//! Log records kept in the suite history

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Severity of a suite log entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[serde(rename = "information")]
    Info,
    Notice,
    Warning,
    Error,
    Panic,
    Fatal,
}

impl Level {
    pub fn label(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Notice => "NOTICE",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Panic => "PANIC",
            Level::Fatal => "FATAL",
        }
    }

    /// Levels that end the process once written
    pub fn is_terminal(&self) -> bool {
        matches!(self, Level::Panic | Level::Fatal)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One immutable entry of the log history
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogDetail {
    /// Unix timestamp in nanoseconds
    pub date: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine: Option<String>,

    pub message: String,

    pub level: Level,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl LogDetail {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            date: Utc::now().timestamp_nanos_opt().unwrap_or_default(),
            entity: None,
            routine: None,
            message: message.into(),
            level,
            details: None,
        }
    }

    pub fn with_entity(mut self, entity: Option<&str>) -> Self {
        self.entity = entity.filter(|e| !e.is_empty()).map(str::to_string);
        self
    }

    pub fn with_routine(mut self, routine: Option<&str>) -> Self {
        self.routine = routine.filter(|r| !r.is_empty()).map(str::to_string);
        self
    }

    pub fn with_details(mut self, details: Option<Value>) -> Self {
        self.details = details;
        self
    }
}

impl fmt::Display for LogDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(4);
        if let Some(entity) = &self.entity {
            parts.push(format!("[Entity: {entity}]"));
        }
        if let Some(routine) = &self.routine {
            parts.push(format!("[Routine: {routine}]"));
        }
        if !self.message.is_empty() {
            parts.push(format!("[Message: {}]", self.message));
        }
        if let Some(details) = &self.details {
            parts.push(format!("[Details: {details}]"));
        }
        write!(f, "{}", parts.join(" "))
    }
}
