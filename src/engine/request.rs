// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::errors::FailurePolicy;
use crate::model::ConfigMap;

/// Caller options for one execution.
///
/// Config layers, lowest precedence first: step version default config, node
/// params, `overrides` (every node), `node_overrides` (one node).
#[derive(Debug, Clone, Default)]
pub struct ExecutionRequest {
    pub dry_run: bool,
    pub failure_policy: FailurePolicy,
    pub schema_violation_fatal: bool,
    pub overrides: ConfigMap,
    pub node_overrides: BTreeMap<String, ConfigMap>,
    /// Schema version to validate a node's IR against instead of the active one.
    pub pinned_schemas: BTreeMap<String, String>,
    pub cancellation: Option<CancellationToken>,
}

impl ExecutionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the failure policy and schema strictness from the engine config.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            failure_policy: config.failure_policy,
            schema_violation_fatal: config.schema.violation_fatal,
            ..Self::default()
        }
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_schema_violation_fatal(mut self, fatal: bool) -> Self {
        self.schema_violation_fatal = fatal;
        self
    }

    pub fn with_overrides(mut self, overrides: ConfigMap) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_node_override(mut self, node_key: impl Into<String>, overrides: ConfigMap) -> Self {
        self.node_overrides.insert(node_key.into(), overrides);
        self
    }

    pub fn pin_schema(mut self, node_key: impl Into<String>, schema_version: impl Into<String>) -> Self {
        self.pinned_schemas.insert(node_key.into(), schema_version.into());
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}
