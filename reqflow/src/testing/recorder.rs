//! Handler recorder for tests.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::Payload;

/// Records every payload passed through its handlers.
///
/// Clones share the same log, so a clone can be moved into a handler while
/// the original is inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<Payload>>>,
}

impl Recorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a pass-through handler that records its input.
    pub fn handler(&self) -> impl Fn(Payload) -> Payload + Send + Sync + 'static {
        let seen = Arc::clone(&self.seen);
        move |payload| {
            seen.lock().push(payload.clone());
            payload
        }
    }

    /// Returns a handler that records its input and replaces it with `value`.
    pub fn replacing(
        &self,
        value: impl Into<Payload>,
    ) -> impl Fn(Payload) -> Payload + Send + Sync + 'static {
        let seen = Arc::clone(&self.seen);
        let value = value.into();
        move |payload| {
            seen.lock().push(payload);
            value.clone()
        }
    }

    /// Returns every recorded payload in order.
    #[must_use]
    pub fn payloads(&self) -> Vec<Payload> {
        self.seen.lock().clone()
    }

    /// Returns the number of recorded payloads.
    #[must_use]
    pub fn count(&self) -> usize {
        self.seen.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.lock().is_empty()
    }
}
