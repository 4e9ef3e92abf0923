//! Testing utilities for reqflow requests.
//!
//! This module provides:
//! - [`MockTransport`], a scripted transport that records calls
//! - [`Recorder`], pass-through handlers that log what they see

mod mocks;
mod recorder;

pub use mocks::{MockReply, MockTransport};
pub use recorder::Recorder;
