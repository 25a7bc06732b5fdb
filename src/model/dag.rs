// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::cmp::Ordering;

use crate::errors::CompileError;

/// The persisted DAG of a pipeline version.
///
/// ```json
/// { "nodes": [{ "key": "ocr", "stepVersionId": "…", "order": 0 }],
///   "edges": [{ "from": "ocr", "to": "classify" }] }
/// ```
///
/// `edges` and per-node `params` are optional and are omitted on output when
/// absent, so a stored payload serializes back to the same document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DagPayload {
    pub nodes: Vec<DagNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges: Option<Vec<DagEdge>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DagNode {
    pub key: String,
    pub step_version_id: String,
    /// Any JSON number; kept as written so the payload round-trips.
    pub order: Number,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagEdge {
    pub from: String,
    pub to: String,
}

impl DagNode {
    pub fn order_key(&self) -> OrderKey {
        OrderKey(self.order.as_f64().unwrap_or(0.0))
    }
}

/// Total order over node `order` values.
#[derive(Debug, Clone, Copy)]
pub struct OrderKey(pub f64);

impl PartialEq for OrderKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderKey {}

impl PartialOrd for OrderKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl DagPayload {
    /// Reads a payload out of a stored JSON blob.
    pub fn from_value(value: &Value) -> Result<Self, CompileError> {
        serde_json::from_value(value.clone()).map_err(|e| CompileError::MalformedDag {
            reason: e.to_string(),
        })
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// The two graph shapes the compiler understands.
#[derive(Debug, Clone, PartialEq)]
pub enum DagShape {
    /// No edges: nodes run in ascending `order`.
    Linear { nodes: Vec<DagNode> },
    /// Explicit edges: nodes run in topological order.
    Graph {
        nodes: Vec<DagNode>,
        edges: Vec<DagEdge>,
    },
}

impl DagShape {
    pub fn nodes(&self) -> &[DagNode] {
        match self {
            DagShape::Linear { nodes } | DagShape::Graph { nodes, .. } => nodes,
        }
    }
}

impl From<DagPayload> for DagShape {
    fn from(payload: DagPayload) -> Self {
        match payload.edges {
            None => DagShape::Linear {
                nodes: payload.nodes,
            },
            Some(edges) => DagShape::Graph {
                nodes: payload.nodes,
                edges,
            },
        }
    }
}
