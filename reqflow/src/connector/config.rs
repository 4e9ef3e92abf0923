//! Connector configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ReqflowError;
use crate::transport::CallConfig;

/// Defaults shared by every request a connector builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Base URL relative request URLs are joined onto.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Default headers; request headers win.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Default query parameters; request parameters win.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    /// Default call timeout in seconds.
    #[serde(default)]
    pub timeout_seconds: Option<f64>,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_user_agent() -> String {
    "reqflow/0.1".to_string()
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            headers: BTreeMap::new(),
            params: BTreeMap::new(),
            timeout_seconds: None,
            user_agent: default_user_agent(),
        }
    }
}

impl ConnectorConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ReqflowError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Adds a default header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds a default query parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Sets the default timeout.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Checks the base URL scheme and the timeout range.
    pub fn validate(&self) -> Result<(), ReqflowError> {
        if let Some(ref base) = self.base_url {
            if !is_absolute(base) {
                return Err(ReqflowError::invalid_url(
                    base.clone(),
                    "base URL must start with http:// or https://",
                ));
            }
        }
        if let Some(seconds) = self.timeout_seconds {
            if !seconds.is_finite() || seconds <= 0.0 {
                return Err(ReqflowError::InvalidConfig(format!(
                    "timeout_seconds must be positive, got {seconds}"
                )));
            }
            if Duration::try_from_secs_f64(seconds).is_err() {
                return Err(ReqflowError::InvalidConfig(format!(
                    "timeout_seconds is too large, got {seconds}"
                )));
            }
        }
        Ok(())
    }

    /// Gets the default timeout as a `Duration`.
    ///
    /// Values that are not a positive, representable duration yield `None`.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
            .filter(|d| !d.is_zero())
    }

    /// Applies these defaults to a call configuration.
    #[must_use]
    pub fn merge(&self, mut call: CallConfig) -> CallConfig {
        if let Some(ref base) = self.base_url {
            if !is_absolute(&call.url) {
                call.url = join_url(base, &call.url);
            }
        }
        for (name, value) in &self.headers {
            call.headers
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
        for (key, value) in &self.params {
            call.params.entry(key.clone()).or_insert_with(|| value.clone());
        }
        if call.timeout.is_none() {
            call.timeout = self.timeout();
        }
        call
    }
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Method;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = ConnectorConfig::from_json("{}").unwrap();
        assert_eq!(config, ConnectorConfig::default());
        assert_eq!(config.user_agent, "reqflow/0.1");
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        let err = ConnectorConfig::from_json(r#"{"base_url": "ftp://files"}"#).unwrap_err();
        assert!(matches!(err, ReqflowError::InvalidUrl { .. }));

        let err = ConnectorConfig::from_json(r#"{"timeout_seconds": 0}"#).unwrap_err();
        assert!(matches!(err, ReqflowError::InvalidConfig(_)));

        let err = ConnectorConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, ReqflowError::Serialization(_)));
    }

    #[test]
    fn test_oversized_timeout() {
        let err = ConnectorConfig::from_json(r#"{"timeout_seconds": 1e30}"#).unwrap_err();
        assert!(matches!(err, ReqflowError::InvalidConfig(_)));

        // Fields are public, so merging must cope without validation too.
        let config = ConnectorConfig::new().with_timeout(1e30);
        assert_eq!(config.timeout(), None);
        let merged = config.merge(CallConfig::new(Method::Get, "/x"));
        assert_eq!(merged.timeout, None);

        let config = ConnectorConfig::new().with_timeout(-2.0);
        assert_eq!(config.timeout(), None);
        assert_eq!(ConnectorConfig::new().with_timeout(1.5).timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_merge_joins_relative_urls() {
        let config = ConnectorConfig::new().with_base_url("https://api.test/v1/");

        let merged = config.merge(CallConfig::new(Method::Get, "/users"));
        assert_eq!(merged.url, "https://api.test/v1/users");

        let merged = config.merge(CallConfig::new(Method::Get, "http://other.test/x"));
        assert_eq!(merged.url, "http://other.test/x");

        let merged = config.merge(CallConfig::new(Method::Get, ""));
        assert_eq!(merged.url, "https://api.test/v1");
    }

    #[test]
    fn test_merge_request_values_win() {
        let config = ConnectorConfig::new()
            .with_header("accept", "application/json")
            .with_header("x-team", "core")
            .with_param("lang", "en")
            .with_timeout(5.0);

        let call = CallConfig::new(Method::Post, "/x")
            .with_header("x-team", "edge")
            .with_param("page", "2")
            .with_timeout(Duration::from_secs(1));
        let merged = config.merge(call);

        assert_eq!(merged.headers.get("accept").map(String::as_str), Some("application/json"));
        assert_eq!(merged.headers.get("x-team").map(String::as_str), Some("edge"));
        assert_eq!(merged.params.len(), 2);
        assert_eq!(merged.timeout, Some(Duration::from_secs(1)));

        let merged = config.merge(CallConfig::new(Method::Get, "/y"));
        assert_eq!(merged.timeout, Some(Duration::from_secs(5)));
    }
}
