//! Vendor transport
//!
//! Adapters build a [`VendorRequest`]; a [`VendorClient`] sends it and returns
//! the decoded JSON body. [`HttpVendorClient`] is the reqwest implementation;
//! hosts can inject their own client (for OAuth, proxies, recording).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::error::{LlmError, Result};

/// Default request timeout for [`HttpVendorClient`]
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// A fully built vendor call (always a JSON POST)
#[derive(Debug, Clone, PartialEq)]
pub struct VendorRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl VendorRequest {
    pub fn new(url: impl Into<String>, body: Value) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header with this name, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Transport-level failure
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct VendorError {
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    pub message: String,
    pub timed_out: bool,
}

impl VendorError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            timed_out: true,
        }
    }
}

/// Sends vendor requests
#[async_trait]
pub trait VendorClient: Send + Sync {
    async fn send(&self, request: VendorRequest) -> std::result::Result<Value, VendorError>;
}

/// Map a transport failure onto the shared taxonomy
///
/// 401 is an authentication failure and 429 a rate limit; everything else is
/// an API error carrying the vendor's message.
pub(crate) fn map_vendor_error(provider: &str, err: VendorError) -> LlmError {
    if err.timed_out {
        return LlmError::Timeout {
            provider: provider.to_string(),
            message: err.message,
        };
    }
    match err.status {
        Some(401) => LlmError::Authentication {
            provider: provider.to_string(),
            message: err.message,
        },
        Some(429) => LlmError::RateLimit {
            provider: provider.to_string(),
            message: err.message,
        },
        status => LlmError::api(provider, status, err.message),
    }
}

/// reqwest-backed client
#[derive(Debug, Clone)]
pub struct HttpVendorClient {
    client: reqwest::Client,
    extra_headers: Vec<(String, String)>,
}

impl HttpVendorClient {
    /// Client with the default 60 second timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::configuration(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            extra_headers: Vec::new(),
        })
    }

    /// Add a header to every request, e.g. a bearer token for Vertex AI
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }
}

#[async_trait]
impl VendorClient for HttpVendorClient {
    async fn send(&self, request: VendorRequest) -> std::result::Result<Value, VendorError> {
        let mut builder = self.client.post(&request.url).json(&request.body);
        for (name, value) in self.extra_headers.iter().chain(request.headers.iter()) {
            builder = builder.header(name, value);
        }

        let response = builder.send().await.map_err(from_reqwest)?;
        let status = response.status();
        let text = response.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            return Err(VendorError::status(status.as_u16(), error_message(&text, status)));
        }

        serde_json::from_str(&text).map_err(|e| {
            VendorError::status(status.as_u16(), format!("invalid JSON in response: {}", e))
        })
    }
}

fn from_reqwest(err: reqwest::Error) -> VendorError {
    if err.is_timeout() {
        VendorError::timeout(err.to_string())
    } else {
        VendorError {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
            timed_out: false,
        }
    }
}

/// Best human-readable message from an error body
///
/// OpenAI, Azure, Anthropic and Google all nest it under `error.message`.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        v.pointer("/error/message")
            .or_else(|| v.get("message"))
            .or_else(|| v.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    match message {
        Some(m) => m,
        None if body.trim().is_empty() => status.to_string(),
        None => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (VendorError::status(401, "bad key"), ErrorKind::Authentication),
            (VendorError::status(429, "slow down"), ErrorKind::RateLimit),
            (VendorError::status(500, "oops"), ErrorKind::Api),
            (VendorError::status(400, "bad request"), ErrorKind::Api),
            (VendorError::transport("connection refused"), ErrorKind::Api),
            (VendorError::timeout("deadline"), ErrorKind::Timeout),
        ];
        for (err, kind) in cases {
            assert_eq!(map_vendor_error("openai", err).kind(), kind);
        }
    }

    #[test]
    fn test_api_error_keeps_vendor_message() {
        let err = map_vendor_error("anthropic", VendorError::status(529, "Overloaded"));
        assert_eq!(err.to_string(), "anthropic API error (529): Overloaded");
    }

    #[test]
    fn test_error_message_extraction() {
        let status = reqwest::StatusCode::BAD_REQUEST;
        let openai = json!({ "error": { "message": "Invalid model", "type": "invalid_request_error" } });
        assert_eq!(error_message(&openai.to_string(), status), "Invalid model");
        assert_eq!(error_message("plain failure", status), "plain failure");
        assert_eq!(error_message("", status), "400 Bad Request");
    }

    #[test]
    fn test_request_header_lookup() {
        let req = VendorRequest::new("https://x", json!({})).with_header("X-Api-Key", "k");
        assert_eq!(req.header("x-api-key"), Some("k"));
        assert_eq!(req.header("authorization"), None);
    }
}
