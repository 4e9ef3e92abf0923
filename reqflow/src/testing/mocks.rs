//! Mock transports for testing.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::cancellation::CancellationToken;
use crate::errors::TransportError;
use crate::transport::{CallConfig, Response, Transport};

/// One scripted transport outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Resolve with this response.
    Respond(Response),
    /// Reject with this error.
    Fail(TransportError),
}

/// A transport that replays scripted outcomes and records every call.
///
/// Scripted replies are consumed in order; once the script runs dry the
/// fallback reply is used. Every call waits `latency` first and settles
/// with a cancellation error as soon as its token is cancelled.
#[derive(Debug)]
pub struct MockTransport {
    script: Mutex<VecDeque<MockReply>>,
    fallback: MockReply,
    latency: Duration,
    calls: Mutex<Vec<CallConfig>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Creates a transport answering `200` with no latency.
    #[must_use]
    pub fn new() -> Self {
        Self::responding(200)
    }

    /// Creates a transport answering `status` by default.
    #[must_use]
    pub fn responding(status: u16) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: MockReply::Respond(Response::new(status)),
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Creates a transport failing every call with `error`.
    #[must_use]
    pub fn failing(error: TransportError) -> Self {
        Self {
            fallback: MockReply::Fail(error),
            ..Self::new()
        }
    }

    /// Sets how long each call takes.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queues a response for the next unscripted call.
    pub fn push_response(&self, response: Response) {
        self.script.lock().push_back(MockReply::Respond(response));
    }

    /// Queues an error for the next unscripted call.
    pub fn push_error(&self, error: TransportError) {
        self.script.lock().push_back(MockReply::Fail(error));
    }

    /// Returns the number of calls issued so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the configurations of every call issued so far.
    #[must_use]
    pub fn calls(&self) -> Vec<CallConfig> {
        self.calls.lock().clone()
    }

    fn next_reply(&self) -> MockReply {
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn issue(
        &self,
        config: &CallConfig,
        token: CancellationToken,
    ) -> Result<Response, TransportError> {
        self.calls.lock().push(config.clone());
        let reply = self.next_reply();

        if !self.latency.is_zero() {
            tokio::select! {
                biased;
                () = token.cancelled() => {}
                () = tokio::time::sleep(self.latency) => {}
            }
        }
        if token.is_cancelled() {
            return Err(TransportError::cancelled(token.reason().unwrap_or_default()));
        }

        match reply {
            MockReply::Respond(mut response) => {
                if response.url.is_empty() {
                    response.url.clone_from(&config.url);
                }
                Ok(response)
            }
            MockReply::Fail(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Method;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_script_then_fallback() {
        let transport = MockTransport::responding(204);
        transport.push_response(Response::new(500));
        transport.push_error(TransportError::network("refused"));

        let config = CallConfig::new(Method::Get, "/a");
        let first = transport.issue(&config, CancellationToken::new()).await;
        let second = transport.issue(&config, CancellationToken::new()).await;
        let third = transport.issue(&config, CancellationToken::new()).await;

        assert_eq!(first.map(|r| r.status), Ok(500));
        assert_eq!(second, Err(TransportError::network("refused")));
        assert_eq!(third.map(|r| (r.status, r.url)), Ok((204, "/a".to_string())));
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_latency() {
        let transport = MockTransport::new().with_latency(Duration::from_secs(30));
        let token = CancellationToken::new();
        let config = CallConfig::new(Method::Post, "/slow");

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel("stop");
        });

        let result = tokio::time::timeout(Duration::from_secs(5), transport.issue(&config, token))
            .await
            .expect("cancellation should interrupt the latency");
        assert_eq!(result, Err(TransportError::cancelled("stop")));
        assert_eq!(transport.calls()[0].method, Method::Post);
    }

    #[tokio::test]
    async fn test_failing_transport() {
        let transport = MockTransport::failing(TransportError::other("down"));
        let config = CallConfig::new(Method::Get, "/x");
        let result = transport.issue(&config, CancellationToken::new()).await;
        assert_eq!(result, Err(TransportError::other("down")));
    }
}
