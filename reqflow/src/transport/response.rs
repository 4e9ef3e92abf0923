//! Transport response.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::ReqflowError;

/// A response produced by a transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, lowercased names.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Response body as text.
    #[serde(default)]
    pub text: String,
    /// Final URL after redirects.
    #[serde(default)]
    pub url: String,
    /// Time taken by the call in milliseconds.
    #[serde(default)]
    pub duration_ms: f64,
}

impl Response {
    /// Creates an empty response with a status code.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Sets the body text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn with_json(mut self, body: &serde_json::Value) -> Self {
        self.text = body.to_string();
        self.headers
            .insert("content-type".to_string(), "application/json".to_string());
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Sets the final URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Looks up a header case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Content type from headers.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ReqflowError> {
        Ok(serde_json::from_str(&self.text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(Response::new(200).is_success());
        assert!(Response::new(299).is_success());
        assert!(!Response::new(304).is_success());
        assert!(!Response::new(500).is_success());
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let response = Response::new(200).with_header("X-Trace", "abc");
        assert_eq!(response.header("x-trace"), Some("abc"));
        assert_eq!(response.header("X-TRACE"), Some("abc"));
    }

    #[test]
    fn test_json_body() {
        let response = Response::new(200).with_json(&serde_json::json!({ "ok": true }));
        assert_eq!(response.content_type(), Some("application/json"));
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["ok"], serde_json::json!(true));
    }

    #[test]
    fn test_json_body_error() {
        let response = Response::new(200).with_text("not json");
        let result: Result<serde_json::Value, _> = response.json();
        assert!(matches!(result, Err(ReqflowError::Serialization(_))));
    }
}
