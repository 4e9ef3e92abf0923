//! # Reqflow
//!
//! Chainable request pipelines with outcome dispatch and single-flight
//! cancellation.
//!
//! Reqflow wraps one HTTP call in a [`request::Request`] that provides:
//!
//! - **Handler pipes**: callbacks per outcome that feed each other in attach order
//! - **Outcome classification**: ok, fail, cancel and error, decided by a validator
//! - **Status dispatch**: side-effect handlers keyed by status code
//! - **Single-flight starts**: a new call cancels older ones with the same key
//! - **Pluggable transports**: reqwest by default, scripted mocks for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reqflow::prelude::*;
//!
//! let connector = Connector::http(ConnectorConfig::new().with_base_url("https://api.example.com"))?
//!     .with_validator(validators::success_status());
//!
//! let request = connector.get("/search");
//! request
//!     .on_ok(|p| p.as_response().map(|r| r.text.clone()).unwrap_or_default())
//!     .on_any_error(|e| format!("search failed: {e}"));
//!
//! // Typing fast only keeps the latest search alive.
//! let results = request.start_single("search-box").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod connector;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod request;
pub mod testing;
pub mod transport;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::{CancellationToken, PendingGuard, PendingRegistry};
    pub use crate::connector::{validators, Connector, ConnectorConfig, Validator};
    pub use crate::core::{dedup_key, key_hash, DedupKey, Event, Handler, Payload, Pipe};
    pub use crate::errors::{ReqflowError, Rejection, TransportError};
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::request::{Call, Outcome, Request, RequestState};
    #[cfg(feature = "http-client")]
    pub use crate::transport::ReqwestTransport;
    pub use crate::transport::{CallConfig, Method, Response, Transport};
}
