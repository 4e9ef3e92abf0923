//! The value flowing through handler pipes.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::errors::{ReqflowError, TransportError};
use crate::transport::Response;

/// A handler attached to a request event.
pub type Handler = Arc<dyn Fn(Payload) -> Payload + Send + Sync>;

/// A value passed between handlers.
///
/// The first handler of a category receives the raw settlement value
/// (a [`Response`] for ok/fail/status, a [`TransportError`] for cancel/error).
/// Handlers may return anything convertible into a payload, so later handlers
/// often see a [`Payload::Value`].
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A transport response.
    Response(Response),
    /// A transport failure.
    Error(TransportError),
    /// An arbitrary JSON value produced by a handler.
    Value(serde_json::Value),
}

impl Payload {
    /// Returns the response, if this payload carries one.
    #[must_use]
    pub const fn as_response(&self) -> Option<&Response> {
        match self {
            Self::Response(response) => Some(response),
            _ => None,
        }
    }

    /// Returns the transport error, if this payload carries one.
    #[must_use]
    pub const fn as_error(&self) -> Option<&TransportError> {
        match self {
            Self::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Returns the JSON value, if this payload carries one.
    #[must_use]
    pub const fn as_value(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the string, if this payload is a JSON string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(serde_json::Value::as_str)
    }

    /// Returns the integer, if this payload is a JSON integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(serde_json::Value::as_i64)
    }

    /// Returns the boolean, if this payload is a JSON boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(serde_json::Value::as_bool)
    }

    /// Returns the response status code, if this payload is a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.as_response().map(|response| response.status)
    }

    /// Returns true for a JSON null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Value(serde_json::Value::Null))
    }

    /// Converts the payload into a JSON value.
    ///
    /// Responses become `{status, url, headers, text}` and errors become
    /// `{error, cancelled}`.
    #[must_use]
    pub fn into_value(self) -> serde_json::Value {
        match self {
            Self::Value(value) => value,
            Self::Response(response) => serde_json::json!({
                "status": response.status,
                "url": response.url,
                "headers": response.headers,
                "text": response.text,
            }),
            Self::Error(error) => serde_json::json!({
                "error": error.to_string(),
                "cancelled": error.is_cancelled(),
            }),
        }
    }

    /// Deserializes the payload.
    ///
    /// Responses are decoded from their body text, values directly.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ReqflowError> {
        match self {
            Self::Response(response) => response.json(),
            Self::Value(value) => Ok(serde_json::from_value(value.clone())?),
            Self::Error(_) => Ok(serde_json::from_value(self.clone().into_value())?),
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::Value(serde_json::Value::Null)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Response(response) => write!(f, "HTTP {} from {}", response.status, response.url),
            Self::Error(error) => write!(f, "{error}"),
            Self::Value(serde_json::Value::String(s)) => f.write_str(s),
            Self::Value(value) => write!(f, "{value}"),
        }
    }
}

impl From<Response> for Payload {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

impl From<TransportError> for Payload {
    fn from(error: TransportError) -> Self {
        Self::Error(error)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Self::Value(serde_json::Value::String(value.to_string()))
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Self::Value(serde_json::Value::String(value))
    }
}

impl From<bool> for Payload {
    fn from(value: bool) -> Self {
        Self::Value(serde_json::Value::Bool(value))
    }
}

impl From<i64> for Payload {
    fn from(value: i64) -> Self {
        Self::Value(serde_json::Value::from(value))
    }
}

impl From<u16> for Payload {
    fn from(value: u16) -> Self {
        Self::Value(serde_json::Value::from(value))
    }
}

impl From<f64> for Payload {
    fn from(value: f64) -> Self {
        Self::Value(serde_json::Value::from(value))
    }
}

impl From<()> for Payload {
    fn from((): ()) -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_is_null() {
        assert!(Payload::default().is_null());
        assert!(Payload::from(()).is_null());
    }

    #[test]
    fn test_accessors() {
        let response = Response::new(201).with_text("{}");
        let payload = Payload::from(response.clone());
        assert_eq!(payload.as_response(), Some(&response));
        assert_eq!(payload.status(), Some(201));
        assert!(payload.as_value().is_none());

        let payload = Payload::from("text");
        assert_eq!(payload.as_str(), Some("text"));
        assert!(payload.status().is_none());

        let payload = Payload::from(TransportError::network("down"));
        assert!(payload.as_error().is_some());
    }

    #[test]
    fn test_display_strings_are_raw() {
        assert_eq!(Payload::from("AB").to_string(), "AB");
        assert_eq!(Payload::from(3_i64).to_string(), "3");
        assert_eq!(
            Payload::from(Response::new(404).with_url("http://x/")).to_string(),
            "HTTP 404 from http://x/"
        );
    }

    #[test]
    fn test_into_value_of_response() {
        let payload = Payload::from(Response::new(200).with_text("ok"));
        let value = payload.into_value();
        assert_eq!(value["status"], serde_json::json!(200));
        assert_eq!(value["text"], serde_json::json!("ok"));
    }

    #[test]
    fn test_decode_response_body() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct User {
            id: u32,
        }

        let payload = Payload::from(Response::new(200).with_text(r#"{"id": 7}"#));
        let user: User = payload.decode().unwrap();
        assert_eq!(user, User { id: 7 });

        let payload = Payload::from(serde_json::json!({ "id": 9 }));
        let user: User = payload.decode().unwrap();
        assert_eq!(user, User { id: 9 });
    }
}
