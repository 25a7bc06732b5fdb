// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use serde_json::Number;
use std::fmt;
use uuid::Uuid;

use crate::model::ConfigMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanMode {
    Linear,
    Graph,
}

impl PlanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanMode::Linear => "linear",
            PlanMode::Graph => "graph",
        }
    }
}

/// Non-fatal findings attached to a compiled plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanWarning {
    /// The node pins a step version that is not the active one.
    InactiveStepVersion {
        node_key: String,
        step_name: String,
        label: String,
    },
}

impl fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanWarning::InactiveStepVersion {
                node_key,
                step_name,
                label,
            } => write!(
                f,
                "node '{node_key}' uses inactive step version {step_name}@{label}"
            ),
        }
    }
}

/// A node with its step version resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedNode {
    pub key: String,
    pub step_version_id: Uuid,
    pub step_definition_id: Uuid,
    pub step_name: String,
    pub step_version_label: String,
    pub order: Number,
    pub params: ConfigMap,
    pub default_config: ConfigMap,
    pub depends_on: Vec<String>,
}

/// Output of compilation. `nodes` is in execution order, which is `levels`
/// flattened; nodes sharing a level have no path between them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlan {
    pub mode: PlanMode,
    pub pipeline_version_id: Option<Uuid>,
    pub nodes: Vec<PlannedNode>,
    pub levels: Vec<Vec<String>>,
    pub warnings: Vec<PlanWarning>,
}

impl ExecutionPlan {
    /// Node keys in execution order.
    pub fn order(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.key.as_str()).collect()
    }

    pub fn node(&self, key: &str) -> Option<&PlannedNode> {
        self.nodes.iter().find(|n| n.key == key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
