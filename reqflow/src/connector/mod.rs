//! Request factory.
//!
//! A [`Connector`] holds what every request it builds shares: the transport,
//! the default configuration, the validator, the pending registry and the
//! event sink.
//!
//! ```rust,ignore
//! use reqflow::prelude::*;
//!
//! let config = ConnectorConfig::new().with_base_url("https://api.example.com");
//! let connector = Connector::http(config)?.with_validator(validators::success_status());
//!
//! let search = connector.get("/search");
//! search.on_ok(|p| p.as_response().map(|r| r.text.clone()).unwrap_or_default());
//! let body = search.start_single("search-box").await?;
//! ```

mod config;
pub mod validators;

pub use config::ConnectorConfig;
pub use validators::Validator;

use std::sync::Arc;

use crate::cancellation::PendingRegistry;
#[cfg(feature = "http-client")]
use crate::errors::ReqflowError;
use crate::events::{EventSink, NoOpEventSink};
use crate::request::Request;
use crate::transport::{CallConfig, Method, Transport};

/// Builds requests sharing a transport, registry and configuration.
///
/// Cloning is cheap and clones share the registry.
#[derive(Clone)]
pub struct Connector {
    transport: Arc<dyn Transport>,
    registry: Arc<PendingRegistry>,
    validator: Option<Validator>,
    sink: Arc<dyn EventSink>,
    config: ConnectorConfig,
}

impl Connector {
    /// Creates a connector over a transport with default configuration.
    #[must_use]
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    /// Creates a connector over a shared transport.
    #[must_use]
    pub fn from_shared(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            registry: Arc::new(PendingRegistry::new()),
            validator: None,
            sink: Arc::new(NoOpEventSink),
            config: ConnectorConfig::default(),
        }
    }

    /// Creates a connector issuing real HTTP calls.
    #[cfg(feature = "http-client")]
    pub fn http(config: ConnectorConfig) -> Result<Self, ReqflowError> {
        config.validate()?;
        let transport = crate::transport::ReqwestTransport::new(&config.user_agent)?;
        Ok(Self::new(transport).with_config(config))
    }

    /// Replaces the default configuration.
    #[must_use]
    pub fn with_config(mut self, config: ConnectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the validator deciding between `Ok` and `Fail`.
    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Shares a pending registry, so single-flight starts supersede calls
    /// made through other connectors too.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<PendingRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the sink receiving request lifecycle events.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The pending registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<PendingRegistry> {
        &self.registry
    }

    /// The default configuration.
    #[must_use]
    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Builds a request from a full call configuration.
    #[must_use]
    pub fn call(&self, call: CallConfig) -> Request {
        Request::from_parts(
            Arc::clone(&self.transport),
            Arc::clone(&self.registry),
            self.validator.clone(),
            Arc::clone(&self.sink),
            self.config.merge(call),
        )
    }

    /// Builds a request for a method and URL.
    #[must_use]
    pub fn request(&self, method: Method, url: impl Into<String>) -> Request {
        self.call(CallConfig::new(method, url))
    }

    /// Builds a GET request.
    #[must_use]
    pub fn get(&self, url: impl Into<String>) -> Request {
        self.request(Method::Get, url)
    }

    /// Builds a POST request with a JSON body.
    #[must_use]
    pub fn post(&self, url: impl Into<String>, body: serde_json::Value) -> Request {
        self.call(CallConfig::new(Method::Post, url).with_body(body))
    }

    /// Builds a PUT request with a JSON body.
    #[must_use]
    pub fn put(&self, url: impl Into<String>, body: serde_json::Value) -> Request {
        self.call(CallConfig::new(Method::Put, url).with_body(body))
    }

    /// Builds a PATCH request with a JSON body.
    #[must_use]
    pub fn patch(&self, url: impl Into<String>, body: serde_json::Value) -> Request {
        self.call(CallConfig::new(Method::Patch, url).with_body(body))
    }

    /// Builds a DELETE request.
    #[must_use]
    pub fn delete(&self, url: impl Into<String>) -> Request {
        self.request(Method::Delete, url)
    }

    /// Builds a HEAD request.
    #[must_use]
    pub fn head(&self, url: impl Into<String>) -> Request {
        self.request(Method::Head, url)
    }
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("config", &self.config)
            .field("has_validator", &self.validator.is_some())
            .field("pending", &self.registry.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_requests_get_merged_config() {
        let connector = Connector::new(MockTransport::new()).with_config(
            ConnectorConfig::new()
                .with_base_url("https://api.test")
                .with_header("accept", "application/json"),
        );

        let request = connector.post("/items", serde_json::json!({"name": "x"}));
        let config = request.config();
        assert_eq!(config.method, Method::Post);
        assert_eq!(config.url, "https://api.test/items");
        assert_eq!(config.body, Some(serde_json::json!({"name": "x"})));
        assert_eq!(config.headers.get("accept").map(String::as_str), Some("application/json"));
    }

    #[test]
    fn test_requests_share_registry() {
        let connector = Connector::new(MockTransport::new());
        let a = connector.get("/a");
        let b = connector.delete("/b");
        assert!(Arc::ptr_eq(a.registry(), b.registry()));
        assert!(Arc::ptr_eq(a.registry(), connector.registry()));

        let shared = Arc::new(PendingRegistry::new());
        let other = Connector::new(MockTransport::new()).with_registry(Arc::clone(&shared));
        assert!(Arc::ptr_eq(other.head("/c").registry(), &shared));
    }

    #[test]
    fn test_oversized_timeout_does_not_break_requests() {
        let connector = Connector::new(MockTransport::new())
            .with_config(ConnectorConfig::new().with_timeout(1e30));
        let request = connector.get("/x");
        assert_eq!(request.config().timeout, None);
    }

    #[cfg(feature = "http-client")]
    #[test]
    fn test_http_rejects_bad_config() {
        let err = Connector::http(ConnectorConfig::new().with_base_url("api.test")).unwrap_err();
        assert!(matches!(err, ReqflowError::InvalidUrl { .. }));
    }
}
