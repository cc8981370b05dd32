//! Suite document models
//!
//! Defines the JSON test suite document: server information, entities and
//! their routines.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

use crate::http::HttpError;
use crate::variables::SaveDirective;

/// Errors that prevent a suite from starting
#[derive(Error, Debug)]
pub enum SuiteError {
    #[error("Failed to read suite file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse suite document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to fetch suite from {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Server information is required")]
    MissingServerInfo,

    #[error("Test entities are required")]
    MissingTests,

    #[error("Server {url} is unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    #[error(transparent)]
    Http(#[from] HttpError),
}

/// Target server connection metadata
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerInfo {
    pub name: String,
    pub scheme: String,
    pub dns_address: String,
    pub access_port: String,
    pub api_version: String,
    /// Overrides the URL assembled from the other parts when non-empty
    #[serde(skip_serializing_if = "String::is_empty")]
    pub full_url: String,
    pub test_path: String,
    pub check_tls: bool,
    pub default_content_type: String,
    pub authorization_mode: String,
}

impl ServerInfo {
    /// Base URL every routine endpoint is appended to
    pub fn base_url(&self) -> String {
        if !self.full_url.is_empty() {
            return self.full_url.clone();
        }
        format!(
            "{}{}{}{}",
            self.scheme, self.dns_address, self.access_port, self.api_version
        )
    }

    /// URL used by the reachability check
    pub fn ping_url(&self) -> String {
        format!("{}{}", self.base_url(), self.test_path)
    }
}

/// Informational metadata about who owns the suite
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub name: String,
    pub email: String,
}

/// A named group of routines sharing a path prefix
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub path: String,

    /// Must finish before any non-parent entity starts
    #[serde(default)]
    pub parent: bool,

    #[serde(default)]
    pub loop_times: u32,

    #[serde(default)]
    pub cases: Vec<Routine>,
}

impl Entity {
    /// Number of times the case list runs. Zero means once.
    pub fn iterations(&self) -> u32 {
        self.loop_times.max(1)
    }

    /// Total routine executions across all iterations
    pub fn attempts(&self) -> usize {
        self.cases.len() * self.iterations() as usize
    }
}

/// A single HTTP test case
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Routine {
    #[serde(default)]
    pub description: String,

    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub headers: Option<Map<String, Value>>,

    #[serde(default, rename = "body")]
    pub request_body: Option<Value>,

    #[serde(default)]
    pub code_expected: u16,

    #[serde(default)]
    pub return_expected: Vec<String>,

    #[serde(default)]
    pub variables_to_save: Vec<String>,

    /// Runs concurrently with its siblings inside one iteration
    #[serde(default, rename = "turbo_test")]
    pub turbo: bool,

    /// Response body carries a bare quoted identifier instead of JSON
    #[serde(default)]
    pub creation: bool,

    #[serde(skip)]
    resolved_endpoint: OnceLock<String>,

    #[serde(skip)]
    last_result: Mutex<Option<Map<String, Value>>>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl Routine {
    /// Endpoint with the entity prefix applied. The prefix is applied on the
    /// first call only; later calls return the same string.
    pub fn endpoint_for(&self, prefix: &str) -> &str {
        self.resolved_endpoint
            .get_or_init(|| format!("{prefix}{}", self.endpoint))
    }

    pub fn resolved_endpoint(&self) -> Option<&str> {
        self.resolved_endpoint.get().map(String::as_str)
    }

    pub fn save_directives(&self) -> Vec<SaveDirective> {
        self.variables_to_save
            .iter()
            .filter_map(|raw| SaveDirective::parse(raw))
            .collect()
    }

    /// Record the decoded body of the latest execution
    pub fn record_result(&self, body: Map<String, Value>) {
        *self.last_result.lock() = Some(body);
    }

    pub fn last_result(&self) -> Option<Map<String, Value>> {
        self.last_result.lock().clone()
    }
}

#[cfg(test)]
impl Routine {
    pub fn new(method: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn expect(mut self, code: u16, keys: &[&str]) -> Self {
        self.code_expected = code;
        self.return_expected = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn save(mut self, directive: impl Into<String>) -> Self {
        self.variables_to_save.push(directive.into());
        self
    }

    pub fn turbo(mut self) -> Self {
        self.turbo = true;
        self
    }
}

/// The suite document as read from disk or a remote URL
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SuiteDocument {
    #[serde(default)]
    pub server_info: Option<ServerInfo>,

    #[serde(default)]
    pub user: Option<UserInfo>,

    #[serde(default)]
    pub tests: Option<Vec<Entity>>,

    /// Names the templating engine is allowed to substitute
    #[serde(default)]
    pub variables: Vec<String>,
}

impl SuiteDocument {
    pub fn from_json(content: &str) -> Result<Self, SuiteError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a suite document from a local file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SuiteError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SuiteError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Download a suite document
    pub async fn fetch(url: &str) -> Result<Self, SuiteError> {
        let fetch_error = |e: reqwest::Error| SuiteError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = reqwest::get(url).await.map_err(fetch_error)?;
        let content = response.text().await.map_err(fetch_error)?;
        Self::from_json(&content)
    }
}
