//! Results storage and retrieval
//!
//! Persists suite snapshots as pretty-printed JSON documents.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;

use crate::executor::{EntityReport, Suite, SuiteOutcome};
use crate::logs::LogDetail;
use crate::models::{Entity, Routine, ServerInfo, Severity, UserInfo};

const FILE_PREFIX: &str = "api-suite_";

/// Serializable picture of a finished suite run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SuiteSnapshot {
    /// Unique run ID
    pub id: String,

    pub captured_at: DateTime<Utc>,

    /// Overall severity
    pub result: Severity,

    pub duration_ms: u64,

    pub server_info: ServerInfo,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,

    /// Names the suite declared as substitutable
    pub variables: Vec<String>,

    /// Values accumulated during the run
    pub variables_saved: Map<String, Value>,

    pub tests: Vec<StoredEntity>,

    pub coverage: Vec<EntityReport>,

    pub logs: StoredLogs,
}

/// Stored entity with its routines
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredEntity {
    pub title: String,
    pub path: String,
    pub parent: bool,
    pub loop_times: u32,
    pub cases: Vec<StoredRoutine>,
}

/// Stored routine with the body of its latest execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredRoutine {
    pub description: String,
    pub method: String,

    /// Endpoint with the entity prefix applied once the routine ran
    pub endpoint: String,

    pub code_expected: u16,
    pub return_expected: Vec<String>,
    pub variables_to_save: Vec<String>,
    pub turbo_test: bool,
    pub creation: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_result: Option<Map<String, Value>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StoredLogs {
    pub history: Vec<LogDetail>,
}

impl SuiteSnapshot {
    /// Capture the suite after a run. Waits for the log history to catch up.
    pub async fn capture(suite: &Suite, outcome: &SuiteOutcome) -> Self {
        suite.logger.flush().await;
        let captured_at = Utc::now();

        Self {
            id: captured_at.format("%Y%m%d_%H%M%S").to_string(),
            captured_at,
            result: outcome.severity,
            duration_ms: outcome.duration_ms,
            server_info: suite.server.clone(),
            user: suite.user.clone(),
            variables: suite.variables.known_keys().to_vec(),
            variables_saved: suite.variables.snapshot(),
            tests: suite
                .entities
                .iter()
                .map(|e| StoredEntity::from_entity(e))
                .collect(),
            coverage: outcome.entities.clone(),
            logs: StoredLogs {
                history: suite.logger.history(),
            },
        }
    }

    /// File name the snapshot is stored under
    pub fn file_name(&self) -> String {
        format!("{FILE_PREFIX}{}.json", self.captured_at.timestamp())
    }
}

impl StoredEntity {
    pub fn from_entity(entity: &Entity) -> Self {
        Self {
            title: entity.title.clone(),
            path: entity.path.clone(),
            parent: entity.parent,
            loop_times: entity.loop_times,
            cases: entity.cases.iter().map(StoredRoutine::from_routine).collect(),
        }
    }
}

impl StoredRoutine {
    pub fn from_routine(routine: &Routine) -> Self {
        Self {
            description: routine.description.clone(),
            method: routine.method.clone(),
            endpoint: routine
                .resolved_endpoint()
                .unwrap_or(routine.endpoint.as_str())
                .to_string(),
            code_expected: routine.code_expected,
            return_expected: routine.return_expected.clone(),
            variables_to_save: routine.variables_to_save.clone(),
            turbo_test: routine.turbo,
            creation: routine.creation,
            last_result: routine.last_result(),
        }
    }
}

/// Results storage manager
pub struct ResultsStorage {
    /// Base directory for results
    base_dir: PathBuf,
}

impl ResultsStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Ensure storage directory exists
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.base_dir)
            .with_context(|| format!("Failed to create {}", self.base_dir.display()))
    }

    /// Save a snapshot
    pub fn save(&self, snapshot: &SuiteSnapshot) -> Result<PathBuf> {
        self.ensure_dir()?;

        let path = self.base_dir.join(snapshot.file_name());
        let file = File::create(&path).context("Failed to create results file")?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, snapshot).context("Failed to write results")?;

        info!("Saved suite results to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
impl ResultsStorage {
    fn load_from_path(&self, path: &std::path::Path) -> Result<SuiteSnapshot> {
        let file = File::open(path).context("Failed to open results file")?;
        serde_json::from_reader(std::io::BufReader::new(file)).context("Failed to parse results")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::SuiteExecutor;
    use crate::logs::{Level, Logger};
    use crate::models::SuiteDocument;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::tempdir;
    use tokio_test::{assert_err, assert_ok};

    async fn finished_suite() -> (Arc<Suite>, SuiteOutcome) {
        let document = SuiteDocument::from_json(
            r#"{
                "server_info": {"full_url": "http://127.0.0.1:1"},
                "variables": ["token"],
                "tests": [{
                    "title": "users",
                    "path": "/users",
                    "cases": [{
                        "description": "list",
                        "endpoint": "/all",
                        "code_expected": 200,
                        "return_expected": ["id"]
                    }]
                }]
            }"#,
        )
        .unwrap();
        let suite = Arc::new(Suite::from_document(document, Logger::new(false)).unwrap());
        suite.variables.save("token", json!("abc"));
        suite.logger.suite("marker", Level::Notice, None);

        let outcome = SuiteExecutor::new(suite.clone()).run().await;
        (suite, outcome)
    }

    #[tokio::test]
    async fn test_capture_snapshot() {
        let (suite, outcome) = finished_suite().await;
        let snapshot = SuiteSnapshot::capture(&suite, &outcome).await;

        assert_eq!(snapshot.result, Severity::Fail);
        assert_eq!(snapshot.variables, vec!["token".to_string()]);
        assert_eq!(snapshot.variables_saved["token"], "abc");
        assert_eq!(snapshot.tests[0].cases[0].endpoint, "/users/all");
        assert_eq!(snapshot.tests[0].cases[0].last_result, Some(Map::new()));
        assert_eq!(snapshot.coverage.len(), 1);
        assert!(snapshot.logs.history.iter().any(|d| d.message == "marker"));
        assert!(snapshot.file_name().starts_with("api-suite_"));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path().join("results"));

        let (suite, outcome) = finished_suite().await;
        let snapshot = SuiteSnapshot::capture(&suite, &outcome).await;

        let path = assert_ok!(storage.save(&snapshot));
        assert!(path.exists());
        assert_eq!(path.parent(), Some(dir.path().join("results").as_path()));

        let loaded = storage.load_from_path(&path).unwrap();
        assert_eq!(loaded.id, snapshot.id);
        assert_eq!(loaded.result, snapshot.result);
        assert_eq!(loaded.logs.history.len(), snapshot.logs.history.len());
        assert_eq!(loaded.coverage, snapshot.coverage);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("api-suite_1.json");
        fs::write(&path, "not json").unwrap();

        let storage = ResultsStorage::new(dir.path());
        assert_err!(storage.load_from_path(&path));
    }
}
