// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// How repeated samples of a metric are combined into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Avg,
    Sum,
    Min,
    Max,
    Latest,
    /// Share of samples that are non-zero.
    Ratio,
}

/// Which kind of run a metric or profile scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricScope {
    Step,
    Pipeline,
}

impl fmt::Display for MetricScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricScope::Step => f.write_str("step"),
            MetricScope::Pipeline => f.write_str("pipeline"),
        }
    }
}

/// Direction of the threshold comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    #[default]
    AtLeast,
    AtMost,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDefinition {
    pub id: Uuid,
    pub key: String,
    pub aggregation: Aggregation,
    pub target: Option<f64>,
    pub scope: MetricScope,
    pub comparison: Comparison,
    pub description: Option<String>,
}

/// Input for [`crate::registry::MetricRegistry::create_definition`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewMetricDefinition {
    pub key: String,
    pub aggregation: Aggregation,
    #[serde(default)]
    pub target: Option<f64>,
    pub scope: MetricScope,
    #[serde(default)]
    pub comparison: Comparison,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricProfile {
    pub id: Uuid,
    pub name: String,
    pub scope: MetricScope,
    pub is_active: bool,
    pub items: Vec<MetricProfileItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricProfileItem {
    pub id: Uuid,
    pub metric_key: String,
    pub weight: f64,
    /// Overrides the definition target when set.
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Numeric(f64),
    Text(String),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Numeric(n) => Some(*n),
            MetricValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Numeric(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Text(value.to_string())
    }
}

/// The run a metric result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum MetricSubject {
    StepRun(Uuid),
    PipelineRun(Uuid),
}

impl MetricSubject {
    pub fn id(&self) -> Uuid {
        match self {
            MetricSubject::StepRun(id) | MetricSubject::PipelineRun(id) => *id,
        }
    }
}

impl fmt::Display for MetricSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricSubject::StepRun(id) => write!(f, "step_run:{id}"),
            MetricSubject::PipelineRun(id) => write!(f, "pipeline_run:{id}"),
        }
    }
}

/// One recorded metric per `(subject, metric_key)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResult {
    pub id: Uuid,
    pub subject: MetricSubject,
    pub metric_key: String,
    pub value: MetricValue,
    pub passed: bool,
    pub details: Value,
    pub recorded_at: DateTime<Utc>,
}

/// Weighted outcome of evaluating one profile against one subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileScore {
    pub profile_id: Uuid,
    pub profile_name: String,
    /// Weighted share of evaluated metrics that passed, in `0.0..=1.0`.
    pub score: f64,
    pub evaluated: usize,
    pub passed: usize,
    pub skipped: Vec<String>,
}

impl ProfileScore {
    pub fn all_passed(&self) -> bool {
        self.evaluated == self.passed
    }
}
