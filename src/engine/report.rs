// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use std::collections::BTreeMap;

use crate::compiler::ExecutionPlan;
use crate::model::{ConfigMap, IrArtifact, MetricResult, PipelineRun, StepRun};

/// What a dry run resolves: the plan plus each node's effective config.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunReport {
    pub plan: ExecutionPlan,
    pub resolved_config: BTreeMap<String, ConfigMap>,
}

/// Everything recorded for one finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run: PipelineRun,
    pub plan: ExecutionPlan,
    pub step_runs: Vec<StepRun>,
    pub artifacts: Vec<IrArtifact>,
    pub metric_results: Vec<MetricResult>,
}

impl RunReport {
    pub fn step_run(&self, node_key: &str) -> Option<&StepRun> {
        self.step_runs.iter().find(|s| s.node_key == node_key)
    }

    pub fn artifact(&self, node_key: &str) -> Option<&IrArtifact> {
        let step_run = self.step_run(node_key)?;
        self.artifacts.iter().find(|a| a.step_run_id == step_run.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Planned(DryRunReport),
    Finished(RunReport),
}

impl ExecutionOutcome {
    pub fn plan(&self) -> &ExecutionPlan {
        match self {
            ExecutionOutcome::Planned(report) => &report.plan,
            ExecutionOutcome::Finished(report) => &report.plan,
        }
    }

    pub fn into_run_report(self) -> Option<RunReport> {
        match self {
            ExecutionOutcome::Finished(report) => Some(report),
            ExecutionOutcome::Planned(_) => None,
        }
    }
}
