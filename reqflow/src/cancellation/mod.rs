//! Cooperative cancellation and single-flight bookkeeping.
//!
//! This module provides:
//! - [`CancellationToken`], the per-call cancellation handle
//! - [`PendingRegistry`], the table of live calls grouped by dedup key
//! - [`PendingGuard`], which removes a registration exactly once

mod registry;
mod token;

pub use registry::{PendingGuard, PendingRegistry};
pub use token::{CancelCallback, CancellationToken};
