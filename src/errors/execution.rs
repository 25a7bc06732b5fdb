// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::{CompileError, ErrorCode, RegistryError};

/// What the engine does after a step fails.
///
/// The policy travels with every execution request. `Continue` keeps going so
/// one run yields as much signal as possible and ends `partial`; `Abort` stops
/// scheduling and ends the run `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    #[default]
    Continue,
    Abort,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Continue => "continue",
            FailurePolicy::Abort => "abort",
        }
    }
}

/// Error reported by a step executor. Recorded on the StepRun, never thrown
/// out of the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepError {
    #[error("{0}")]
    Failed(String),

    #[error("step timed out after {0:?}")]
    TimedOut(Duration),

    #[error("invalid step configuration: {0}")]
    InvalidConfig(String),
}

impl StepError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::ExecutionFailure
    }
}

/// Errors that stop an execution request before any run state is written.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("no executor registered for step '{step}' used by node '{node_key}'")]
    ExecutorNotFound { node_key: String, step: String },

    #[error("node '{node_key}' pins schema '{schema_version}' which does not exist")]
    PinnedSchemaNotFound {
        node_key: String,
        schema_version: String,
    },

    #[error("request targets node '{node_key}' which is not part of the plan")]
    UnknownNode { node_key: String },
}

impl EngineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Registry(e) => e.code(),
            EngineError::Compile(e) => e.code(),
            EngineError::ExecutorNotFound { .. } | EngineError::PinnedSchemaNotFound { .. } => {
                ErrorCode::NotFound
            }
            EngineError::UnknownNode { .. } => ErrorCode::InvalidConfig,
        }
    }
}
