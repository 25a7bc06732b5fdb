// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Registry entities, DAG payloads, run records and metric records.

mod config_map;
mod dag;
mod entities;
mod metrics;
mod runs;

pub use config_map::{config_map_from_value, merge_config, merge_layers, ConfigMap};
pub use dag::{DagEdge, DagNode, DagPayload, DagShape, OrderKey};
pub use entities::{
    Definition, IrSchema, PipelinePayload, PipelineVersion, StepPayload, StepVersion, Version,
};
pub use metrics::{
    Aggregation, Comparison, MetricDefinition, MetricProfile, MetricProfileItem, MetricResult,
    MetricScope, MetricSubject, MetricValue, NewMetricDefinition, ProfileScore,
};
pub use runs::{IrArtifact, PipelineRun, PipelineRunStatus, RunSummary, StepRun, StepRunStatus};
