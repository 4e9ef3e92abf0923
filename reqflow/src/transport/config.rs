//! Per-call configuration handed to a transport.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ReqflowError;

/// HTTP method of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
}

impl Method {
    /// Returns the canonical uppercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ReqflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(ReqflowError::InvalidMethod(s.to_string())),
        }
    }
}

/// Everything a transport needs to issue one call.
///
/// `options` is forwarded untouched for transports that understand extra
/// settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallConfig {
    /// HTTP method.
    #[serde(default)]
    pub method: Method,
    /// Target URL.
    pub url: String,
    /// Query parameters.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    /// Request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// JSON body.
    #[serde(default)]
    pub body: Option<serde_json::Value>,
    /// Call timeout, enforced by the transport.
    #[serde(default)]
    pub timeout: Option<Duration>,
    /// Opaque transport options.
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl CallConfig {
    /// Creates a configuration for a method and URL.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Self::default()
        }
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds an opaque transport option.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse_is_case_insensitive() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("Patch".parse::<Method>().unwrap(), Method::Patch);
        assert!(matches!(
            "FETCH".parse::<Method>(),
            Err(ReqflowError::InvalidMethod(m)) if m == "FETCH"
        ));
    }

    #[test]
    fn test_method_serde() {
        assert_eq!(serde_json::to_string(&Method::Delete).unwrap(), "\"DELETE\"");
        let method: Method = serde_json::from_str("\"POST\"").unwrap();
        assert_eq!(method, Method::Post);
    }

    #[test]
    fn test_call_config_builder() {
        let config = CallConfig::new(Method::Post, "https://api.test/items")
            .with_param("page", "2")
            .with_header("X-Id", "1")
            .with_body(serde_json::json!({ "name": "x" }))
            .with_timeout(Duration::from_secs(5))
            .with_option("follow_redirects", serde_json::json!(false));

        assert_eq!(config.params.get("page").map(String::as_str), Some("2"));
        assert_eq!(config.headers.get("X-Id").map(String::as_str), Some("1"));
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.options["follow_redirects"], serde_json::json!(false));
    }

    #[test]
    fn test_call_config_from_json() {
        let config: CallConfig =
            serde_json::from_str(r#"{"method": "PUT", "url": "/a", "params": {"q": "1"}}"#).unwrap();
        assert_eq!(config.method, Method::Put);
        assert_eq!(config.url, "/a");
        assert!(config.body.is_none());
    }
}
