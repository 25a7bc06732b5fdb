// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit it at its fixed level with its fields attached.
//!
//! * `registry` - activation, schema registration and validation events
//! * `compiler` - compiled plans and plan warnings
//! * `engine` - run lifecycle, step lifecycle, cancellation and abort
//! * `metrics` - metric results, skipped metrics and profile scores

use tracing::Span;

pub mod compiler;
pub mod engine;
pub mod metrics;
pub mod registry;

/// A message that knows its own log level and structured fields.
pub trait StructuredLog {
    /// Emits the message through `tracing` at its level.
    fn log(&self);

    /// Opens a span carrying the message fields.
    fn span(&self, name: &str) -> Span;
}
