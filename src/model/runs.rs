// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use super::{ConfigMap, ProfileScore};
use crate::errors::FailurePolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineRunStatus {
    Running,
    Completed,
    Partial,
    Failed,
    Cancelled,
}

impl PipelineRunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PipelineRunStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineRunStatus::Running => "running",
            PipelineRunStatus::Completed => "completed",
            PipelineRunStatus::Partial => "partial",
            PipelineRunStatus::Failed => "failed",
            PipelineRunStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PipelineRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepRunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl StepRunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepRunStatus::Completed | StepRunStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepRunStatus::Pending => "pending",
            StepRunStatus::Running => "running",
            StepRunStatus::Completed => "completed",
            StepRunStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for StepRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate numbers written when a pipeline run reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub failure_policy: FailurePolicy,
    pub total_nodes: usize,
    pub completed: usize,
    pub failed: usize,
    pub not_started: usize,
    pub invalid_artifacts: usize,
    pub cancelled: bool,
    pub aborted_at: Option<String>,
    pub profile_score: Option<ProfileScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub id: Uuid,
    pub pipeline_version_id: Uuid,
    pub status: PipelineRunStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub summary: RunSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRun {
    pub id: Uuid,
    pub pipeline_run_id: Uuid,
    pub step_version_id: Uuid,
    pub node_key: String,
    pub params: ConfigMap,
    pub status: StepRunStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// Output of a step, recorded whether or not it matched its schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrArtifact {
    pub id: Uuid,
    pub step_run_id: Uuid,
    pub payload: Value,
    pub is_valid: bool,
    pub validation_errors: Vec<String>,
    pub schema_version: Option<String>,
    pub warning: Option<String>,
    pub created_at: DateTime<Utc>,
}
