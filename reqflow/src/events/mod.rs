//! Lifecycle events for observability.
//!
//! Requests report what they do to an [`EventSink`] held by their
//! connector. There is no process-wide sink; each connector owns one.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// Emitted when a call is handed to the transport.
pub const REQUEST_STARTED: &str = "request.started";

/// Emitted when a single-flight start cancels older calls.
pub const REQUEST_SUPERSEDED: &str = "request.superseded";

/// Emitted after the terminal pipe of a call has run.
pub const REQUEST_SETTLED: &str = "request.settled";
