//! Error types for the reqflow crate.
//!
//! Three families live here:
//! - [`ReqflowError`] for configuration and decoding problems raised while
//!   building things, never through a request's handler pipes.
//! - [`TransportError`] for whatever the transport rejects a call with.
//! - [`Rejection`] for the rejected side of a [`crate::request::Call`].

use std::time::Duration;

use thiserror::Error;

use crate::core::{EventParseError, Payload};

/// The main error type for reqflow configuration and decoding.
#[derive(Debug, Error)]
pub enum ReqflowError {
    /// A URL in the configuration is not usable.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An HTTP method string could not be parsed.
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// A configuration value is out of range or inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An event name could not be parsed.
    #[error("{0}")]
    Event(#[from] EventParseError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReqflowError {
    /// Creates an invalid URL error.
    #[must_use]
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Errors a transport rejects a call with.
///
/// Cloneable so it can travel through handler pipes as part of a
/// [`Payload`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// The call was cancelled through its cancellation token.
    #[error("Request cancelled: {reason}")]
    Cancelled {
        /// The reason passed to the token.
        reason: String,
    },

    /// The call did not complete in time.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Connecting, sending or reading failed.
    #[error("Network error: {0}")]
    Network(String),

    /// The call configuration could not be turned into a request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Creates a cancellation error.
    #[must_use]
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled {
            reason: reason.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Creates a generic error.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Returns true for the cancellation marker.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// How a call was rejected.
///
/// `Fail` and `Cancel` are tagged so callers can discriminate without looking
/// at messages. `Error` carries the last error-pipe value untouched.
#[derive(Debug, Clone, Error)]
pub enum Rejection {
    /// The transport succeeded but the response failed validation.
    #[error("Response failed validation: {data}")]
    Fail {
        /// Last value of the fail pipe.
        data: Payload,
    },

    /// The transport rejected the call through cancellation.
    #[error("Request cancelled: {data}")]
    Cancel {
        /// Last value of the cancel pipe.
        data: Payload,
    },

    /// The transport rejected the call for any other reason.
    #[error("{0}")]
    Error(Payload),
}

impl Rejection {
    /// Returns true for [`Rejection::Fail`].
    #[must_use]
    pub const fn is_fail(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }

    /// Returns true for [`Rejection::Cancel`].
    #[must_use]
    pub const fn is_cancel(&self) -> bool {
        matches!(self, Self::Cancel { .. })
    }

    /// Returns true for [`Rejection::Error`].
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Returns the carried value regardless of the variant.
    #[must_use]
    pub const fn data(&self) -> &Payload {
        match self {
            Self::Fail { data } | Self::Cancel { data } | Self::Error(data) => data,
        }
    }

    /// Consumes the rejection and returns the carried value.
    #[must_use]
    pub fn into_data(self) -> Payload {
        match self {
            Self::Fail { data } | Self::Cancel { data } | Self::Error(data) => data,
        }
    }
}
