//! HTTP client module
//!
//! Thin wrapper over reqwest used for routine exchanges and the preflight ping.

mod client;

pub use client::{HttpClient, HttpError, HttpRequest, HttpResponse};
