//! HTTP client for suite routines
//!
//! Provides request/response types decoupled from reqwest so the executor can
//! record what was sent and received.

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client, Method,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::utils::Timer;

/// HTTP client errors
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Connection refused to {0}")]
    ConnectionRefused(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Failed to create HTTP client: {0}")]
    Build(String),
}

/// HTTP client shared by every routine of a suite
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    verify_tls: bool,
}

impl HttpClient {
    /// Create a client. Certificate verification is skipped when
    /// `verify_tls` is false.
    pub fn new(verify_tls: bool) -> Result<Self, HttpError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        Ok(Self { client, verify_tls })
    }

    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    /// Send HTTP request
    pub async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        debug!("Sending {} request to {}", request.method, request.url);

        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| HttpError::InvalidMethod(request.method.clone()))?;
        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| HttpError::InvalidUrl(format!("{} ({e})", request.url)))?;

        let mut req_builder = self.client.request(method, url).headers(request.header_map()?);

        if let Some(body) = &request.body {
            req_builder = req_builder.body(body.clone());
        }

        let timer = Timer::start(format!("{} {}", request.method, request.url));

        let response = req_builder.send().await.map_err(|e| {
            if e.is_connect() {
                HttpError::ConnectionRefused(request.url.clone())
            } else {
                HttpError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();

        let mut headers = BTreeMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.to_string(), v.to_string());
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| HttpError::Body(e.to_string()))?;

        let duration_ms = timer.stop_ms();

        debug!(
            "Response: {} {} in {}ms",
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            duration_ms
        );

        Ok(HttpResponse {
            status_code: status.as_u16(),
            headers,
            body,
            duration_ms,
        })
    }

    /// Reachability check. Any HTTP response counts as reachable.
    pub async fn ping(&self, url: &str) -> Result<HttpResponse, HttpError> {
        self.send(&HttpRequest::get(url)).await
    }
}

/// HTTP request description
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    /// Header values keyed by lowercase header name
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Replace every value of a header
    pub fn set_header(&mut self, key: impl AsRef<str>, values: Vec<String>) {
        self.headers.insert(key.as_ref().to_lowercase(), values);
    }

    /// Rewrite every header value in place
    pub fn map_header_values(&mut self, mut f: impl FnMut(&str) -> String) {
        for values in self.headers.values_mut() {
            for value in values.iter_mut() {
                *value = f(value);
            }
        }
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    fn header_map(&self) -> Result<HeaderMap, HttpError> {
        let mut map = HeaderMap::new();
        for (key, values) in &self.headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                HttpError::InvalidHeader {
                    name: key.clone(),
                    reason: e.to_string(),
                }
            })?;
            for value in values {
                let value = HeaderValue::from_str(value).map_err(|e| HttpError::InvalidHeader {
                    name: key.clone(),
                    reason: e.to_string(),
                })?;
                map.append(name.clone(), value);
            }
        }
        Ok(map)
    }
}

#[cfg(test)]
impl HttpRequest {
    pub fn post(url: impl Into<String>) -> Self {
        Self::new("POST", url)
    }

    /// Append a value to a header
    pub fn header(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .entry(key.as_ref().to_lowercase())
            .or_default()
            .push(value.into());
        self
    }

    pub fn header_values(&self, key: &str) -> Option<&[String]> {
        self.headers.get(&key.to_lowercase()).map(Vec::as_slice)
    }
}

/// HTTP response
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub duration_ms: u64,
}
