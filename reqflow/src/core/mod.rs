//! Core building blocks for request pipelines.
//!
//! This module contains the pieces every request is made of:
//! - [`Pipe`], a resumable chain of unary transforms
//! - [`key_hash`] and [`dedup_key`] for single-flight grouping
//! - [`Payload`], the value flowing through handler pipes
//! - [`Event`], the closed set of dispatch categories

mod event;
mod hasher;
mod payload;
mod pipe;

pub use event::{Event, EventParseError};
pub use hasher::{dedup_key, key_hash, DedupKey};
pub use payload::{Handler, Payload};
pub use pipe::{Pipe, Stage};
