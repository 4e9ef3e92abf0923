//! The transport seam.
//!
//! A [`Transport`] performs the actual network call. Requests only need it to
//! issue a call for a [`CallConfig`] under a [`CancellationToken`] and to
//! resolve with a [`Response`] or reject with a [`TransportError`].

mod config;
#[cfg(feature = "http-client")]
mod http;
mod response;

pub use config::{CallConfig, Method};
#[cfg(feature = "http-client")]
pub use http::ReqwestTransport;
pub use response::Response;

use async_trait::async_trait;

use crate::cancellation::CancellationToken;
use crate::errors::TransportError;

/// Performs network calls on behalf of requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a call.
    ///
    /// Implementations should settle with a cancellation error (see
    /// [`Transport::is_cancellation`]) once `token` is cancelled.
    async fn issue(
        &self,
        config: &CallConfig,
        token: CancellationToken,
    ) -> Result<Response, TransportError>;

    /// Creates the cancellation token for one call.
    fn create_cancellation(&self) -> CancellationToken {
        CancellationToken::new()
    }

    /// Returns true if `error` is the cancellation marker.
    fn is_cancellation(&self, error: &TransportError) -> bool {
        error.is_cancelled()
    }
}
