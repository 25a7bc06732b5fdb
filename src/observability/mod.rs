// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic and operational log line emitted by the registry, the
//! compiler, the engine and the metric evaluator is a typed message struct
//! with a `Display` implementation, so no log text is scattered through the
//! call sites.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::registry` - version, schema and profile lifecycle events
//! * `messages::compiler` - plan compilation results and warnings
//! * `messages::engine` - pipeline run and step run lifecycle events
//! * `messages::metrics` - metric evaluation and profile scoring events
//!
//! # Usage
//!
//! ```rust
//! use pipeline_registry::observability::messages::engine::StepFailed;
//! use pipeline_registry::observability::messages::StructuredLog;
//!
//! StepFailed {
//!     node_key: "ocr",
//!     duration_ms: 12,
//!     error: "engine offline",
//! }
//! .log();
//! ```

pub mod messages;
