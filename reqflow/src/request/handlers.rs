//! Handler lists and the pipes of the last settlement.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{Event, Handler, Payload, Pipe};

/// Handlers per event plus the pipes the last settlement ran.
///
/// Settled pipes are kept so handlers attached afterwards can run against
/// the value that settlement produced.
#[derive(Default)]
pub(crate) struct HandlerTable {
    handlers: HashMap<Event, Vec<Handler>>,
    settled: HashMap<Event, Pipe<Payload>>,
}

impl HandlerTable {
    /// Appends a handler and hands back the settled pipe of that event, if any.
    pub(crate) fn attach(&mut self, event: Event, handler: Handler) -> Option<Pipe<Payload>> {
        self.handlers.entry(event).or_default().push(handler);
        self.settled.remove(&event)
    }

    pub(crate) fn has_handlers(&self, event: Event) -> bool {
        self.handlers.get(&event).is_some_and(|list| !list.is_empty())
    }

    pub(crate) fn count(&self, event: Event) -> usize {
        self.handlers.get(&event).map_or(0, Vec::len)
    }

    /// Handlers of `event` from position `from` on.
    pub(crate) fn handlers_from(&self, event: Event, from: usize) -> Vec<Handler> {
        self.handlers
            .get(&event)
            .and_then(|list| list.get(from..))
            .map(|rest| rest.iter().map(Arc::clone).collect())
            .unwrap_or_default()
    }

    pub(crate) fn store_settled(&mut self, event: Event, pipe: Pipe<Payload>) {
        self.settled.insert(event, pipe);
    }

    /// Stores a settled pipe unless a newer settlement already did.
    pub(crate) fn restore_settled(&mut self, event: Event, pipe: Pipe<Payload>) {
        self.settled.entry(event).or_insert(pipe);
    }

    /// Forgets every settled pipe; a new call is on its way.
    pub(crate) fn clear_settled(&mut self) {
        self.settled.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(tag: &'static str) -> Handler {
        Arc::new(move |_| Payload::from(tag))
    }

    #[test]
    fn test_handlers_from_offset() {
        let mut table = HandlerTable::default();
        table.attach(Event::Ok, handler("a"));
        table.attach(Event::Ok, handler("b"));
        table.attach(Event::Fail, handler("c"));

        assert_eq!(table.count(Event::Ok), 2);
        assert_eq!(table.handlers_from(Event::Ok, 1).len(), 1);
        assert!(table.handlers_from(Event::Ok, 2).is_empty());
        assert!(table.handlers_from(Event::Ok, 5).is_empty());
        assert!(table.handlers_from(Event::Cancel, 0).is_empty());
    }

    #[test]
    fn test_attach_returns_settled_pipe() {
        let mut table = HandlerTable::default();
        assert!(table.attach(Event::Ok, handler("a")).is_none());

        table.store_settled(Event::Ok, Pipe::new());
        assert!(table.attach(Event::Ok, handler("b")).is_some());
        // Taken out until stored again.
        assert!(table.attach(Event::Ok, handler("c")).is_none());
    }

    #[test]
    fn test_status_handlers_are_separate() {
        let mut table = HandlerTable::default();
        table.attach(Event::Status(201), handler("s"));
        assert!(table.has_handlers(Event::Status(201)));
        assert!(!table.has_handlers(Event::Status(200)));
        assert!(!table.has_handlers(Event::Ok));

        table.store_settled(Event::Status(201), Pipe::new());
        table.clear_settled();
        assert!(table.attach(Event::Status(201), handler("t")).is_none());
    }
}
