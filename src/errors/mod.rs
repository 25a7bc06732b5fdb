// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for every subsystem.
//!
//! Each error enum exposes [`ErrorCode`] through a `code()` method so that a
//! calling layer can render a specific message ("cannot delete active version")
//! instead of a generic failure.

mod compile;
mod config;
mod execution;
mod metrics;
mod registry;

use serde::Serialize;
use std::fmt;

pub use compile::CompileError;
pub use config::ConfigError;
pub use execution::{EngineError, FailurePolicy, StepError};
pub use metrics::MetricSourceError;
pub use registry::RegistryError;

/// Stable classification shared by all error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Uniqueness or activation invariant violated.
    Conflict,
    /// Missing definition, version, schema or profile.
    NotFound,
    /// Cycle, duplicate node key or unresolved step reference.
    InvalidGraph,
    /// A schema document that cannot be compiled.
    InvalidSchema,
    /// IR does not match its schema.
    ValidationFailure,
    /// The step executor reported an error.
    ExecutionFailure,
    /// Engine configuration or request overrides are unusable.
    InvalidConfig,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Conflict => "conflict",
            ErrorCode::NotFound => "not_found",
            ErrorCode::InvalidGraph => "invalid_graph",
            ErrorCode::InvalidSchema => "invalid_schema",
            ErrorCode::ValidationFailure => "validation_failure",
            ErrorCode::ExecutionFailure => "execution_failure",
            ErrorCode::InvalidConfig => "invalid_config",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
