// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use super::ErrorCode;

/// Compile-time errors raised while turning a persisted DAG payload into a plan.
///
/// Every variant maps to [`ErrorCode::InvalidGraph`]: nothing is persisted when
/// one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("malformed DAG payload: {reason}")]
    MalformedDag { reason: String },

    #[error("duplicate node key: '{key}'")]
    DuplicateNodeKey { key: String },

    #[error("node '{node_key}' references unknown step version '{step_version_id}'")]
    UnresolvedStep {
        node_key: String,
        step_version_id: String,
    },

    #[error("edge '{from}' -> '{to}' references undeclared node '{missing}'")]
    UnknownEdgeNode {
        from: String,
        to: String,
        missing: String,
    },

    #[error("cyclic dependency detected: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("params of node '{node_key}' must be a JSON object")]
    InvalidParams { node_key: String },
}

impl CompileError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::InvalidGraph
    }
}
