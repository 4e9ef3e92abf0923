//! Event categories a handler can be attached to.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

const STATUS_PREFIX: &str = "onStatus=";

/// A dispatch category of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// The response passed validation.
    Ok,
    /// The response failed validation.
    Fail,
    /// The call was cancelled.
    Cancel,
    /// The transport failed for any other reason.
    Error,
    /// A response with this status code arrived, before classification.
    Status(u16),
}

impl Event {
    /// The four settlement categories.
    pub const TERMINAL: [Self; 4] = [Self::Ok, Self::Fail, Self::Cancel, Self::Error];

    /// Categories that receive a response.
    pub const RESPONSE: [Self; 2] = [Self::Ok, Self::Fail];

    /// Categories that reject the call.
    pub const ANY_ERROR: [Self; 3] = [Self::Fail, Self::Error, Self::Cancel];

    /// Returns true for the four settlement categories.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Status(_))
    }

    /// Parses an event name into the events it designates.
    ///
    /// Accepts `onOk`, `onFail`, `onCancel`, `onError`, `onStatus=<code>` and
    /// `onStatus=<JSON array of codes>`.
    pub fn parse(name: &str) -> Result<Vec<Self>, EventParseError> {
        match name {
            "onOk" => Ok(vec![Self::Ok]),
            "onFail" => Ok(vec![Self::Fail]),
            "onCancel" => Ok(vec![Self::Cancel]),
            "onError" => Ok(vec![Self::Error]),
            _ => {
                let spec = name
                    .strip_prefix(STATUS_PREFIX)
                    .ok_or_else(|| EventParseError::Unsupported(name.to_string()))?;
                let codes = match serde_json::from_str::<StatusSpec>(spec) {
                    Ok(StatusSpec::One(code)) => vec![code],
                    Ok(StatusSpec::Many(codes)) => codes,
                    Err(e) => {
                        return Err(EventParseError::MalformedStatus {
                            spec: spec.to_string(),
                            reason: e.to_string(),
                        })
                    }
                };
                Ok(codes.into_iter().map(Self::Status).collect())
            }
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "onOk"),
            Self::Fail => write!(f, "onFail"),
            Self::Cancel => write!(f, "onCancel"),
            Self::Error => write!(f, "onError"),
            Self::Status(code) => write!(f, "{STATUS_PREFIX}{code}"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StatusSpec {
    One(u16),
    Many(Vec<u16>),
}

/// Error raised when an event name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventParseError {
    /// The name is not a known event.
    #[error("Unsupported event name: {0}")]
    Unsupported(String),

    /// The status specification is neither a code nor an array of codes.
    #[error("Malformed status specification '{spec}': {reason}")]
    MalformedStatus {
        /// The text after `onStatus=`.
        spec: String,
        /// Why it could not be parsed.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_events() {
        assert_eq!(Event::parse("onOk").unwrap(), vec![Event::Ok]);
        assert_eq!(Event::parse("onFail").unwrap(), vec![Event::Fail]);
        assert_eq!(Event::parse("onCancel").unwrap(), vec![Event::Cancel]);
        assert_eq!(Event::parse("onError").unwrap(), vec![Event::Error]);
    }

    #[test]
    fn test_parse_single_status() {
        assert_eq!(Event::parse("onStatus=201").unwrap(), vec![Event::Status(201)]);
    }

    #[test]
    fn test_parse_status_array() {
        assert_eq!(
            Event::parse("onStatus=[401, 403]").unwrap(),
            vec![Event::Status(401), Event::Status(403)]
        );
        assert!(Event::parse("onStatus=[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed_status() {
        for spec in ["onStatus=", "onStatus=abc", "onStatus=[1,", "onStatus=70000", "onStatus=\"200\""] {
            assert!(
                matches!(Event::parse(spec), Err(EventParseError::MalformedStatus { .. })),
                "{spec} should be malformed"
            );
        }
    }

    #[test]
    fn test_parse_unsupported() {
        assert_eq!(
            Event::parse("onSuccess"),
            Err(EventParseError::Unsupported("onSuccess".to_string()))
        );
        assert!(Event::parse("onok").is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for event in [Event::Ok, Event::Fail, Event::Cancel, Event::Error, Event::Status(204)] {
            assert_eq!(Event::parse(&event.to_string()).unwrap(), vec![event]);
        }
    }

    #[test]
    fn test_terminal() {
        assert!(Event::TERMINAL.iter().all(|e| e.is_terminal()));
        assert!(!Event::Status(200).is_terminal());
    }
}
