//! The request state machine.
//!
//! A [`Request`] wraps one logical HTTP call. Handlers are attached per
//! [`Event`] with a fluent API; [`Request::start`] and
//! [`Request::start_single`] issue the call on the current tokio runtime
//! and return a [`Call`] that settles with the output of the matching
//! handler chain.
//!
//! ```rust,ignore
//! let request = connector.get("/users/42");
//! request
//!     .on_ok(|payload| payload.decode::<User>().map(|u| u.name).unwrap_or_default())
//!     .on_fail(|payload| format!("unexpected {}", payload))
//!     .on_status(|p| { metrics::count_created(); p }, &[201]);
//!
//! let name = request.start_single("profile").await?;
//! ```

mod call;
mod handlers;

pub use call::Call;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use self::call::CALLER_CANCEL_REASON;
use self::handlers::HandlerTable;
use crate::cancellation::{CancellationToken, PendingGuard, PendingRegistry};
use crate::connector::Validator;
use crate::core::{dedup_key, DedupKey, Event, Handler, Payload, Pipe};
use crate::errors::{Rejection, ReqflowError, TransportError};
use crate::events::{EventSink, NoOpEventSink, REQUEST_SETTLED, REQUEST_STARTED, REQUEST_SUPERSEDED};
use crate::observability::SpanTimer;
use crate::transport::{CallConfig, Response, Transport};

const SUPERSEDED_REASON: &str = "superseded by a newer request";

/// How a call settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The response passed validation.
    Ok,
    /// The response failed validation.
    Fail,
    /// The call was cancelled.
    Cancelled,
    /// The transport failed.
    Errored,
}

impl Outcome {
    fn of(result: &Result<Payload, Rejection>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(Rejection::Fail { .. }) => Self::Fail,
            Err(Rejection::Cancel { .. }) => Self::Cancelled,
            Err(Rejection::Error(_)) => Self::Errored,
        }
    }

    /// Returns the snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Fail => "fail",
            Self::Cancelled => "cancelled",
            Self::Errored => "errored",
        }
    }
}

/// Lifecycle state of a request.
///
/// A settled request may be started again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    /// Never started.
    #[default]
    Idle,
    /// At least one call is in flight.
    InFlight,
    /// Every call has settled; holds the last outcome.
    Settled(Outcome),
}

#[derive(Debug, Default)]
struct Lifecycle {
    in_flight: usize,
    last: Option<Outcome>,
}

/// A chainable, restartable HTTP call.
///
/// Cloning is cheap; clones share handlers and state.
#[derive(Clone)]
pub struct Request {
    inner: Arc<RequestInner>,
}

struct RequestInner {
    transport: Arc<dyn Transport>,
    registry: Arc<PendingRegistry>,
    validator: Option<Validator>,
    sink: Arc<dyn EventSink>,
    config: CallConfig,
    handlers: Mutex<HandlerTable>,
    current: Mutex<Option<CancellationToken>>,
    lifecycle: Mutex<Lifecycle>,
}

impl Request {
    /// Creates a standalone request with its own registry and no validator.
    ///
    /// Requests built through a [`crate::connector::Connector`] share the
    /// connector's registry, validator and event sink instead.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, config: CallConfig) -> Self {
        Self::from_parts(
            transport,
            Arc::new(PendingRegistry::new()),
            None,
            Arc::new(NoOpEventSink),
            config,
        )
    }

    pub(crate) fn from_parts(
        transport: Arc<dyn Transport>,
        registry: Arc<PendingRegistry>,
        validator: Option<Validator>,
        sink: Arc<dyn EventSink>,
        config: CallConfig,
    ) -> Self {
        Self {
            inner: Arc::new(RequestInner {
                transport,
                registry,
                validator,
                sink,
                config,
                handlers: Mutex::new(HandlerTable::default()),
                current: Mutex::new(None),
                lifecycle: Mutex::new(Lifecycle::default()),
            }),
        }
    }

    /// Attaches a handler to every listed event.
    ///
    /// Within one event, handlers run in attach order and each receives the
    /// previous one's return value. A handler attached after the event
    /// already settled runs right away against the settled value.
    pub fn on_any<F, R>(&self, handler: F, events: &[Event]) -> &Self
    where
        F: Fn(Payload) -> R + Send + Sync + 'static,
        R: Into<Payload>,
    {
        let handler: Handler = Arc::new(move |payload| handler(payload).into());
        for &event in events {
            self.inner.attach(event, Arc::clone(&handler));
        }
        self
    }

    /// Attaches a handler by event names such as `"onOk"` or
    /// `"onStatus=[401,403]"`.
    ///
    /// Unsupported or malformed names are skipped.
    pub fn on_any_named<F, R>(&self, handler: F, names: &[&str]) -> &Self
    where
        F: Fn(Payload) -> R + Send + Sync + 'static,
        R: Into<Payload>,
    {
        let events: Vec<Event> = names
            .iter()
            .filter_map(|name| match Event::parse(name) {
                Ok(events) => Some(events),
                Err(e) => {
                    debug!(name, error = %e, "Ignoring event name");
                    None
                }
            })
            .flatten()
            .collect();
        self.on_any(handler, &events)
    }

    /// Like [`Request::on_any_named`], but fails on the first unsupported or
    /// malformed name and attaches nothing in that case.
    pub fn try_on_any_named<F, R>(&self, handler: F, names: &[&str]) -> Result<&Self, ReqflowError>
    where
        F: Fn(Payload) -> R + Send + Sync + 'static,
        R: Into<Payload>,
    {
        let mut events = Vec::new();
        for name in names {
            events.extend(Event::parse(name)?);
        }
        Ok(self.on_any(handler, &events))
    }

    /// Attaches a handler for validated responses.
    pub fn on_ok<F, R>(&self, handler: F) -> &Self
    where
        F: Fn(Payload) -> R + Send + Sync + 'static,
        R: Into<Payload>,
    {
        self.on_any(handler, &[Event::Ok])
    }

    /// Attaches a handler for responses that failed validation.
    pub fn on_fail<F, R>(&self, handler: F) -> &Self
    where
        F: Fn(Payload) -> R + Send + Sync + 'static,
        R: Into<Payload>,
    {
        self.on_any(handler, &[Event::Fail])
    }

    /// Attaches a handler for every response, valid or not.
    pub fn on_response<F, R>(&self, handler: F) -> &Self
    where
        F: Fn(Payload) -> R + Send + Sync + 'static,
        R: Into<Payload>,
    {
        self.on_any(handler, &Event::RESPONSE)
    }

    /// Attaches a handler for cancelled calls.
    pub fn on_cancel<F, R>(&self, handler: F) -> &Self
    where
        F: Fn(Payload) -> R + Send + Sync + 'static,
        R: Into<Payload>,
    {
        self.on_any(handler, &[Event::Cancel])
    }

    /// Attaches a handler for transport errors.
    pub fn on_error<F, R>(&self, handler: F) -> &Self
    where
        F: Fn(Payload) -> R + Send + Sync + 'static,
        R: Into<Payload>,
    {
        self.on_any(handler, &[Event::Error])
    }

    /// Attaches a handler to all four settlement events.
    pub fn then<F, R>(&self, handler: F) -> &Self
    where
        F: Fn(Payload) -> R + Send + Sync + 'static,
        R: Into<Payload>,
    {
        self.on_any(handler, &Event::TERMINAL)
    }

    /// Attaches a handler to fail, error and cancel.
    pub fn on_any_error<F, R>(&self, handler: F) -> &Self
    where
        F: Fn(Payload) -> R + Send + Sync + 'static,
        R: Into<Payload>,
    {
        self.on_any(handler, &Event::ANY_ERROR)
    }

    /// Attaches a handler for responses with one of the status codes.
    ///
    /// Status handlers run before validation and never affect the outcome.
    pub fn on_status<F, R>(&self, handler: F, codes: &[u16]) -> &Self
    where
        F: Fn(Payload) -> R + Send + Sync + 'static,
        R: Into<Payload>,
    {
        let events: Vec<Event> = codes.iter().copied().map(Event::Status).collect();
        self.on_any(handler, &events)
    }

    /// Cancels the most recent outstanding call, if any.
    pub fn cancel(&self) -> &Self {
        let current = self.inner.current.lock().clone();
        if let Some(token) = current {
            debug!(method = %self.inner.config.method, url = %self.inner.config.url, "Cancelling call");
            token.cancel(CALLER_CANCEL_REASON);
        }
        self
    }

    /// Issues the call.
    ///
    /// `identifier` is only used by [`Request::start_single`]; pass `""`
    /// when there is none. Must be called within a tokio runtime.
    pub fn start(&self, identifier: &str) -> Call {
        self.launch(identifier, false)
    }

    /// Issues the call after cancelling every pending call with the same
    /// method, URL and identifier.
    ///
    /// Must be called within a tokio runtime.
    pub fn start_single(&self, identifier: &str) -> Call {
        self.launch(identifier, true)
    }

    fn launch(&self, identifier: &str, single: bool) -> Call {
        let inner = Arc::clone(&self.inner);
        let token = inner.transport.create_cancellation();
        let guard = single.then(|| inner.supersede(identifier, &token));
        let flight = inner.begin(&token);

        let task_token = token.clone();
        let task = tokio::spawn(async move { inner.execute(task_token, guard, flight).await });
        Call::new(token, task)
    }

    /// The call configuration.
    #[must_use]
    pub fn config(&self) -> &CallConfig {
        &self.inner.config
    }

    /// The registry single-flight starts go through.
    #[must_use]
    pub fn registry(&self) -> &Arc<PendingRegistry> {
        &self.inner.registry
    }

    /// The dedup key [`Request::start_single`] would use.
    #[must_use]
    pub fn dedup_key(&self, identifier: &str) -> DedupKey {
        dedup_key(self.inner.config.method, &self.inner.config.url, identifier)
    }

    /// Number of handlers attached to an event.
    #[must_use]
    pub fn handler_count(&self, event: Event) -> usize {
        self.inner.handlers.lock().count(event)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RequestState {
        let lifecycle = self.inner.lifecycle.lock();
        if lifecycle.in_flight > 0 {
            RequestState::InFlight
        } else {
            lifecycle.last.map_or(RequestState::Idle, RequestState::Settled)
        }
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.inner.config.method)
            .field("url", &self.inner.config.url)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl RequestInner {
    fn attach(&self, event: Event, handler: Handler) {
        let settled = self.handlers.lock().attach(event, handler);
        if let Some(pipe) = settled {
            debug!(event = %event, "Running late handler against settled value");
            let before = pipe.clone();
            if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| self.drive(event, pipe))) {
                self.restore_settled(event, before);
                panic::resume_unwind(panic);
            }
        }
    }

    /// Puts the settled pipe back after a late handler panicked.
    ///
    /// The handlers that were pending are skipped, so the settled value stays
    /// what it was and later attachments run against it.
    fn restore_settled(&self, event: Event, mut pipe: Pipe<Payload>) {
        let mut table = self.handlers.lock();
        for handler in table.handlers_from(event, pipe.len()) {
            pipe.join_shared(handler);
        }
        let skipped = pipe.skip_pending();
        warn!(event = %event, skipped, "Late handler panicked; skipping it");
        table.restore_settled(event, pipe);
    }

    fn supersede(&self, identifier: &str, token: &CancellationToken) -> PendingGuard {
        let key = dedup_key(self.config.method, &self.config.url, identifier);
        let (cancelled, guard) = self.registry.supersede(key, token.clone(), SUPERSEDED_REASON);
        if cancelled > 0 {
            info!(
                method = %self.config.method,
                url = %self.config.url,
                key,
                cancelled,
                "Cancelled superseded calls"
            );
            self.sink.emit(
                REQUEST_SUPERSEDED,
                Some(serde_json::json!({
                    "method": self.config.method,
                    "url": self.config.url,
                    "key": key,
                    "cancelled": cancelled,
                })),
            );
        }
        guard
    }

    fn begin(self: &Arc<Self>, token: &CancellationToken) -> FlightGuard {
        self.handlers.lock().clear_settled();
        *self.current.lock() = Some(token.clone());
        self.lifecycle.lock().in_flight += 1;

        debug!(method = %self.config.method, url = %self.config.url, "Starting call");
        self.sink.emit(
            REQUEST_STARTED,
            Some(serde_json::json!({
                "method": self.config.method,
                "url": self.config.url,
            })),
        );

        FlightGuard {
            inner: Arc::clone(self),
            token: token.clone(),
        }
    }

    async fn execute(
        self: Arc<Self>,
        token: CancellationToken,
        guard: Option<PendingGuard>,
        flight: FlightGuard,
    ) -> Result<Payload, Rejection> {
        let timer = SpanTimer::start(format!("{} {}", self.config.method, self.config.url));
        let outcome = self.transport.issue(&self.config, token).await;
        let result = self.settle(outcome);

        if let Some(guard) = guard {
            guard.release();
        }
        self.finish(&result, timer.elapsed_ms());
        drop(flight);
        result
    }

    fn settle(&self, outcome: Result<Response, TransportError>) -> Result<Payload, Rejection> {
        match outcome {
            Ok(response) => {
                let status = Event::Status(response.status);
                let has_status_handlers = self.handlers.lock().has_handlers(status);
                if has_status_handlers {
                    self.run(status, Payload::Response(response.clone()));
                }

                let valid = self
                    .validator
                    .as_ref()
                    .map_or(true, |validate| validate(&response));
                if valid {
                    Ok(self.run(Event::Ok, response.into()))
                } else {
                    Err(Rejection::Fail {
                        data: self.run(Event::Fail, response.into()),
                    })
                }
            }
            Err(error) if self.transport.is_cancellation(&error) => Err(Rejection::Cancel {
                data: self.run(Event::Cancel, error.into()),
            }),
            Err(error) => Err(Rejection::Error(self.run(Event::Error, error.into()))),
        }
    }

    fn run(&self, event: Event, input: Payload) -> Payload {
        let mut pipe = Pipe::new();
        pipe.process(Some(input));
        self.drive(event, pipe)
    }

    /// Runs the handlers of `event` the pipe has not seen yet, then stores it.
    ///
    /// Loops because handlers may attach more handlers while running; the
    /// pipe is only stored once no handler is left behind.
    fn drive(&self, event: Event, mut pipe: Pipe<Payload>) -> Payload {
        loop {
            let pending = {
                let mut table = self.handlers.lock();
                let pending = table.handlers_from(event, pipe.len());
                if pending.is_empty() {
                    let value = pipe.value().cloned().unwrap_or_default();
                    table.store_settled(event, pipe);
                    return value;
                }
                pending
            };

            for handler in pending {
                pipe.join_shared(handler);
            }
            pipe.process(None);
        }
    }

    fn finish(&self, result: &Result<Payload, Rejection>, elapsed_ms: f64) {
        let outcome = Outcome::of(result);
        self.lifecycle.lock().last = Some(outcome);

        if let Err(Rejection::Error(data)) = result {
            warn!(
                method = %self.config.method,
                url = %self.config.url,
                error = %data,
                "Call errored"
            );
        } else {
            debug!(
                method = %self.config.method,
                url = %self.config.url,
                outcome = outcome.as_str(),
                elapsed_ms,
                "Call settled"
            );
        }

        self.sink.emit(
            REQUEST_SETTLED,
            Some(serde_json::json!({
                "method": self.config.method,
                "url": self.config.url,
                "outcome": outcome,
                "duration_ms": elapsed_ms,
            })),
        );
    }
}

/// Marks one call as in flight until dropped, even if a handler panics.
struct FlightGuard {
    inner: Arc<RequestInner>,
    token: CancellationToken,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        {
            let mut lifecycle = self.inner.lifecycle.lock();
            lifecycle.in_flight = lifecycle.in_flight.saturating_sub(1);
        }
        let mut current = self.inner.current.lock();
        if current.as_ref().is_some_and(|t| t.same_as(&self.token)) {
            *current = None;
        }
    }
}
