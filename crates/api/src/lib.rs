//! HTTP client utilities for remote listing endpoints.
//!
//! This module provides a lightweight client bound to one API base URL.
//! It focuses on:
//!
//! - Constructing an HTTP client with default headers and a request timeout
//! - Validating the base URL for safety
//! - Building requests with a consistent User-Agent
//!
//! The primary entry point is [`ApiClient`]. Create an instance via
//! [`ApiClient::new`], and then build requests with [`ApiClient::request`].
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use indexmap::IndexMap;
//! use specsource_api::ApiClient;
//!
//! async fn run() -> anyhow::Result<()> {
//!     let client = ApiClient::new("https://api.example.com", &IndexMap::new(), Duration::from_secs(30))?;
//!     let res = client.request(reqwest::Method::GET, "/v1/cdns").send().await?;
//!     println!("status: {}", res.status());
//!     Ok(())
//! }
//! ```

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use indexmap::IndexMap;
use reqwest::{Client, RequestBuilder, header};
use specsource_util::redact_sensitive;
use tracing::debug;
use url::Url;

/// Default request timeout applied when no override is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Hostnames allowed for local development regardless of scheme.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

#[derive(Debug, Clone)]
/// Thin wrapper around a configured `reqwest::Client`.
///
/// The client pre-configures default headers and builds requests against a
/// validated base URL.
pub struct ApiClient {
    pub base_url: String,
    pub http: Client,
    pub user_agent: String,
}

impl ApiClient {
    /// Construct an [`ApiClient`] for `base_url`.
    ///
    /// Every entry of `headers` is sent with each request. Header names and
    /// values must be valid HTTP tokens. Non-localhost hosts must use HTTPS.
    pub fn new(base_url: &str, headers: &IndexMap<String, String>, timeout: Duration) -> Result<Self> {
        validate_base_url(base_url)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        for (name, value) in headers {
            let header_name = header::HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("invalid header name '{}'", name))?;
            let header_value = header::HeaderValue::from_str(value)
                .with_context(|| redact_sensitive(&format!("invalid value for header '{}: {}'", name, value)))?;
            default_headers.insert(header_name, header_value);
        }

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()
            .context("build http client")?;

        debug!(base_url = %base_url, header_count = headers.len(), timeout_secs = timeout.as_secs(), "configured api client");
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            user_agent: format!("specsource/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
        })
    }

    /// Build a `reqwest::RequestBuilder` for a method and API-relative path.
    ///
    /// The resulting request includes the configured User-Agent and base
    /// headers, and is resolved relative to `self.base_url`.
    pub fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = self.url_for(path);
        debug!(%url, "building request");

        self.http.request(method, url).header(header::USER_AGENT, &self.user_agent)
    }

    /// Absolute URL for an API-relative path.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS
pub fn validate_base_url(base: &str) -> Result<()> {
    let parsed_base_url = Url::parse(base).map_err(|e| anyhow!("Invalid base URL '{}': {}", base, e))?;

    let host_name = parsed_base_url
        .host_str()
        .ok_or_else(|| anyhow!("base URL '{}' must include a host", base))?;

    if LOCALHOST_DOMAINS
        .iter()
        .any(|&allowed| host_name.eq_ignore_ascii_case(allowed))
    {
        return Ok(());
    }

    if parsed_base_url.scheme() != "https" {
        return Err(anyhow!(
            "base URL must use https for non-localhost hosts; got '{}://'",
            parsed_base_url.scheme()
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_base_url_allows_plain_http_on_localhost_only() {
        assert!(validate_base_url("http://localhost:8080").is_ok());
        assert!(validate_base_url("http://127.0.0.1").is_ok());
        assert!(validate_base_url("https://api.example.com").is_ok());

        let error = validate_base_url("http://api.example.com").unwrap_err();
        assert!(error.to_string().contains("https"));
    }

    #[test]
    fn validate_base_url_rejects_unparseable_input() {
        let error = validate_base_url("not a url").unwrap_err();
        assert!(error.to_string().contains("Invalid base URL"));
    }

    #[test]
    fn request_joins_base_url_and_path() {
        let client = ApiClient::new("https://api.example.com/", &IndexMap::new(), DEFAULT_TIMEOUT).unwrap();
        let request = client.request(reqwest::Method::GET, "/v1/cdns").build().unwrap();

        assert_eq!(request.url().as_str(), "https://api.example.com/v1/cdns");
        assert!(request.headers().get(header::USER_AGENT).is_some());
        assert_eq!(client.url_for("v1/cdns"), "https://api.example.com/v1/cdns");
    }

    #[test]
    fn new_rejects_invalid_header_names_and_redacts_values() {
        let mut headers = IndexMap::new();
        headers.insert("Authorization".to_string(), "Bearer abc\ndef".to_string());

        let error = ApiClient::new("https://api.example.com", &headers, DEFAULT_TIMEOUT).unwrap_err();
        let message = format!("{error:#}");
        assert!(!message.contains("abc"), "message: {message}");

        let mut bad_name = IndexMap::new();
        bad_name.insert("bad header".to_string(), "x".to_string());
        assert!(ApiClient::new("https://api.example.com", &bad_name, DEFAULT_TIMEOUT).is_err());
    }
}
