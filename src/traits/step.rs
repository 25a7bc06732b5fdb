// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::errors::StepError;
use crate::model::ConfigMap;

/// Everything a step executor receives for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct StepInvocation {
    pub step_version_id: Uuid,
    pub node_key: String,
    /// Default config, node params and request overrides, already merged.
    pub config: ConfigMap,
    /// IR of completed predecessors, keyed by node key.
    pub upstream: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub ir: Value,
}

impl StepOutput {
    pub fn new(ir: Value) -> Self {
        Self { ir }
    }
}

/// One implementation per step kind, selected by step definition name.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn run(&self, invocation: &StepInvocation) -> Result<StepOutput, StepError>;

    fn name(&self) -> &'static str;
}
