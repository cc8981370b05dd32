//! Routine execution
//!
//! Builds, sends and validates the HTTP exchange of a single routine.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::suite::Suite;
use super::validator::{ResponseValidator, Validation};
use crate::http::{HttpRequest, HttpResponse};
use crate::logs::Level;
use crate::models::{Entity, Routine};
use crate::variables::{placeholder, SaveDirective, TOKEN_VARIABLE};

/// Status recorded when the exchange never produced a response
pub const TRANSPORT_FAILURE_STATUS: u16 = 500;

const HEADER_VALUE_SEPARATOR: &str = ", ";

/// Expected status code and response keys
#[derive(Clone, Debug, Default, Serialize)]
pub struct Expected {
    pub code: u16,
    pub keys: Vec<String>,
}

/// Outcome of one HTTP exchange, before validation
#[derive(Clone, Debug, Default, Serialize)]
pub struct RoutineResult {
    pub code: u16,
    pub body: Map<String, Value>,
    pub expected: Expected,
    #[serde(skip)]
    pub directives: Vec<SaveDirective>,
    pub entity: String,
    pub routine: String,
    pub request_headers: BTreeMap<String, Vec<String>>,
    pub response_headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Executes routine `index` of an entity
pub struct RoutineExecutor {
    suite: Arc<Suite>,
    entity: Arc<Entity>,
    index: usize,
}

impl RoutineExecutor {
    pub fn new(suite: Arc<Suite>, entity: Arc<Entity>, index: usize) -> Self {
        Self {
            suite,
            entity,
            index,
        }
    }

    fn routine(&self) -> &Routine {
        &self.entity.cases[self.index]
    }

    fn log(&self, message: &str, level: Level, details: Option<Value>) {
        self.suite.logger.log(
            Some(self.entity.title.as_str()),
            Some(self.routine().description.as_str()),
            message,
            level,
            details,
            false,
        );
    }

    /// Build the request with every template rendered
    pub fn build_request(&self) -> HttpRequest {
        let routine = self.routine();
        let store = &self.suite.variables;
        let server = &self.suite.server;

        let endpoint = routine.endpoint_for(&self.entity.path);
        let url = store.render(&format!("{}{}", self.suite.base_url(), endpoint), true);
        let mut request = HttpRequest::new(routine.method.to_uppercase(), url);

        if let Some(body) = &routine.request_body {
            match serde_json::to_string(body) {
                Ok(raw) => request = request.body(store.render(&raw, true)),
                Err(e) => self.log(
                    "Error parsing body",
                    Level::Error,
                    Some(json!({"error_message": e.to_string()})),
                ),
            }
        }

        if !server.authorization_mode.is_empty() && store.is_substitutable(TOKEN_VARIABLE) {
            request.set_header(
                "authorization",
                vec![format!("{} {}", server.authorization_mode, placeholder(TOKEN_VARIABLE))],
            );
        }

        for (name, value) in routine.headers.iter().flatten() {
            match header_values(value) {
                Some(values) => request.set_header(name, values),
                None => self.log(
                    "Unsupported header value",
                    Level::Warning,
                    Some(json!({"header": name, "value": value})),
                ),
            }
        }

        if !server.default_content_type.is_empty() {
            request.set_header("content-type", vec![server.default_content_type.clone()]);
        }

        request.map_header_values(|value| store.render(value, true));
        request
    }

    /// Perform exactly one HTTP exchange
    pub async fn request(&self) -> RoutineResult {
        let routine = self.routine();
        let request = self.build_request();

        self.log(
            "Sending request",
            Level::Info,
            Some(json!({"method": request.method, "url": request.url})),
        );

        let mut result = RoutineResult {
            code: TRANSPORT_FAILURE_STATUS,
            expected: Expected {
                code: routine.code_expected,
                keys: routine.return_expected.clone(),
            },
            directives: routine.save_directives(),
            entity: self.entity.title.clone(),
            routine: routine.description.clone(),
            request_headers: request.headers.clone(),
            ..Default::default()
        };

        match self.suite.client().send(&request).await {
            Err(e) => {
                self.log(
                    "Response with error",
                    Level::Error,
                    Some(json!({"error": e.to_string(), "url": request.url})),
                );
                result.error = Some(e.to_string());
            }
            Ok(response) => {
                self.log(
                    "Response received",
                    Level::Info,
                    Some(json!({
                        "method": request.method,
                        "url": request.url,
                        "status": response.status_code,
                        "duration_ms": response.duration_ms,
                    })),
                );
                result.code = response.status_code;
                result.duration_ms = response.duration_ms;
                match decode_body(&response, routine.creation) {
                    Ok(body) => result.body = body,
                    Err(reason) => {
                        self.log(
                            "Undecodable response body",
                            Level::Warning,
                            Some(json!({"error": reason, "status": response.status_code})),
                        );
                        result.error = Some(reason);
                    }
                }
                result.response_headers = response.headers;
            }
        }

        routine.record_result(result.body.clone());
        result
    }

    /// Run the exchange, validate it and record the outcome
    pub async fn execute(&self, iteration: u32) -> Validation {
        let result = self.request().await;
        let validation =
            ResponseValidator::new(&self.suite.variables, &self.suite.logger).validate(&result);

        self.log(
            "Test routine finished",
            Level::Notice,
            Some(json!({
                "case_index": self.index,
                "iteration": iteration,
                "pass": validation.passed,
                "result": serde_json::to_value(&result).unwrap_or(Value::Null),
            })),
        );

        for error in &validation.extraction_errors {
            self.log(
                "Test routine fail",
                Level::Error,
                Some(json!({
                    "case_index": self.index,
                    "pass": validation.passed,
                    "error_message": error.to_string(),
                })),
            );
        }

        validation
    }
}

/// Header values from a document entry. Strings are split on `", "`.
fn header_values(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(s.split(HEADER_VALUE_SEPARATOR).map(str::to_string).collect()),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

/// Decode a response body into a key/value mapping.
///
/// Creation routines answer with a quoted identifier, which is stored under
/// `data`.
fn decode_body(response: &HttpResponse, creation: bool) -> Result<Map<String, Value>, String> {
    if creation {
        let id = response
            .body
            .split('"')
            .nth(1)
            .ok_or_else(|| "no quoted identifier in creation response".to_string())?;
        let mut body = Map::new();
        body.insert("data".to_string(), Value::String(id.to_string()));
        return Ok(body);
    }

    if response.body.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(&response.body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, got {}", json_kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::suite::tests::suite_for;
    use crate::models::ServerInfo;
    use serde_json::json;

    fn response(body: &str) -> HttpResponse {
        HttpResponse {
            status_code: 200,
            headers: BTreeMap::new(),
            body: body.to_string(),
            duration_ms: 1,
        }
    }

    #[test]
    fn test_header_values() {
        assert_eq!(
            header_values(&json!("a, b")),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(
            header_values(&json!(["x", "y"])),
            Some(vec!["x".to_string(), "y".to_string()])
        );
        assert_eq!(header_values(&json!(5)), None);
        assert_eq!(header_values(&json!(["x", 1])), None);
    }

    #[test]
    fn test_decode_creation_body() {
        let body = decode_body(&response(r#""5f2a""#), true).unwrap();
        assert_eq!(body["data"], "5f2a");
        assert!(decode_body(&response("no quotes"), true).is_err());
    }

    #[test]
    fn test_decode_json_body() {
        assert_eq!(decode_body(&response(r#"{"id": 1}"#), false).unwrap()["id"], 1);
        assert!(decode_body(&response("   "), false).unwrap().is_empty());
        assert!(decode_body(&response("[1, 2]"), false).is_err());
        assert!(decode_body(&response("<html>"), false).is_err());
    }

    #[tokio::test]
    async fn test_build_request_renders_templates() {
        let server = ServerInfo {
            full_url: "http://api.local/v1".into(),
            authorization_mode: "Bearer".into(),
            default_content_type: "application/json".into(),
            ..Default::default()
        };
        let mut routine = Routine::new("post", "/{{user_id}}/items");
        routine.request_body = Some(json!({"owner": "{{user_id}}"}));
        routine.headers = Some(
            json!({"X-Trace": "{{user_id}}, static", "Content-Type": "text/plain"})
                .as_object()
                .cloned()
                .unwrap(),
        );

        let suite = suite_for(server, "/users", vec![routine], &["token", "user_id"]);
        suite.variables.save("token", json!("abc"));
        suite.variables.save("user_id", json!("42"));

        let executor = RoutineExecutor::new(suite.clone(), suite.entities[0].clone(), 0);
        let request = executor.build_request();

        assert_eq!(request.method, "POST");
        assert_eq!(request.url, "http://api.local/v1/users/42/items");
        assert_eq!(request.body.as_deref(), Some(r#"{"owner":"42"}"#));
        assert_eq!(
            request.header_values("authorization"),
            Some(&["Bearer abc".to_string()][..])
        );
        assert_eq!(
            request.header_values("x-trace"),
            Some(&["42".to_string(), "static".to_string()][..])
        );
        assert_eq!(
            request.header_values("content-type"),
            Some(&["application/json".to_string()][..])
        );
    }

    #[tokio::test]
    async fn test_no_authorization_without_token() {
        let server = ServerInfo {
            full_url: "http://api.local".into(),
            authorization_mode: "Bearer".into(),
            ..Default::default()
        };
        let suite = suite_for(server, "", vec![Routine::new("GET", "/me")], &["token"]);
        let executor = RoutineExecutor::new(suite.clone(), suite.entities[0].clone(), 0);

        assert!(executor.build_request().header_values("authorization").is_none());

        // Non-string tokens are not substitutable
        suite.variables.save("token", json!(12));
        assert!(executor.build_request().header_values("authorization").is_none());
    }

    #[tokio::test]
    async fn test_no_authorization_for_undeclared_token() {
        let server = ServerInfo {
            full_url: "http://api.local".into(),
            authorization_mode: "Bearer".into(),
            ..Default::default()
        };
        let suite = suite_for(server, "", vec![Routine::new("GET", "/me")], &[]);
        suite.variables.save("token", json!("abc"));

        let executor = RoutineExecutor::new(suite.clone(), suite.entities[0].clone(), 0);
        assert!(executor.build_request().header_values("authorization").is_none());
    }

    #[tokio::test]
    async fn test_endpoint_resolved_once_across_builds() {
        let server = ServerInfo {
            full_url: "http://api.local".into(),
            ..Default::default()
        };
        let suite = suite_for(server, "/orders", vec![Routine::new("GET", "/1")], &[]);
        let executor = RoutineExecutor::new(suite.clone(), suite.entities[0].clone(), 0);

        let first = executor.build_request().url;
        let second = executor.build_request().url;
        assert_eq!(first, "http://api.local/orders/1");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_transport_failure_synthesizes_server_error() {
        let server = ServerInfo {
            full_url: "http://127.0.0.1:1".into(),
            ..Default::default()
        };
        let suite = suite_for(server, "", vec![Routine::new("GET", "/down")], &[]);
        let executor = RoutineExecutor::new(suite.clone(), suite.entities[0].clone(), 0);

        let result = executor.request().await;
        assert_eq!(result.code, TRANSPORT_FAILURE_STATUS);
        assert!(result.error.is_some());
        assert!(result.body.is_empty());
        assert_eq!(suite.entities[0].cases[0].last_result(), Some(Map::new()));
    }

    #[tokio::test]
    async fn test_creation_routine_extracts_identifier() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/items")
            .with_status(201)
            .with_body(r#""a1b2""#)
            .create_async()
            .await;

        let info = ServerInfo {
            full_url: server.url(),
            ..Default::default()
        };
        let mut routine = Routine::new("POST", "/items")
            .expect(201, &["data"])
            .save("data->item_id");
        routine.creation = true;

        let suite = suite_for(info, "", vec![routine], &["item_id"]);
        let executor = RoutineExecutor::new(suite.clone(), suite.entities[0].clone(), 0);

        let validation = executor.execute(0).await;
        mock.assert_async().await;

        assert!(validation.passed);
        assert_eq!(suite.variables.get("item_id"), Some(json!("a1b2")));
    }
}
