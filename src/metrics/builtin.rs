// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Metric source reading samples straight from the run store.
//!
//! | key                        | scope    | samples                                  |
//! |----------------------------|----------|------------------------------------------|
//! | `ir_valid`                 | step     | `1` if the artifact passed its schema    |
//! | `validation_error_count`   | step     | number of schema errors                  |
//! | `ir_bytes`                 | step     | serialized size of the IR                |
//! | `step_success`             | pipeline | `1`/`0` per finished step run            |
//! | `invalid_artifacts`        | pipeline | `1`/`0` per artifact that failed schema  |
//! | `step_count`               | pipeline | number of step runs created              |

use async_trait::async_trait;
use std::sync::Arc;

use crate::engine::RunStore;
use crate::errors::MetricSourceError;
use crate::model::{MetricSubject, MetricValue, StepRunStatus};
use crate::traits::MetricSource;

pub const STEP_KEYS: &[&str] = &["ir_valid", "validation_error_count", "ir_bytes"];
pub const PIPELINE_KEYS: &[&str] = &["step_success", "invalid_artifacts", "step_count"];

pub struct RunMetrics {
    store: Arc<RunStore>,
}

impl RunMetrics {
    pub fn new(store: Arc<RunStore>) -> Self {
        Self { store }
    }

    fn step_samples(&self, step_run_id: uuid::Uuid, key: &str) -> Result<Vec<MetricValue>, MetricSourceError> {
        let artifact = self
            .store
            .artifact_for(step_run_id)
            .ok_or_else(|| MetricSourceError::Unavailable {
                subject: MetricSubject::StepRun(step_run_id).to_string(),
                reason: "no IR artifact recorded".to_string(),
            })?;

        let sample = match key {
            "ir_valid" => bool_sample(artifact.is_valid),
            "validation_error_count" => artifact.validation_errors.len() as f64,
            "ir_bytes" => serde_json::to_vec(&artifact.payload)
                .map(|bytes| bytes.len() as f64)
                .map_err(|e| MetricSourceError::Unavailable {
                    subject: MetricSubject::StepRun(step_run_id).to_string(),
                    reason: e.to_string(),
                })?,
            _ => return Err(unsupported(key)),
        };
        Ok(vec![MetricValue::Numeric(sample)])
    }

    fn pipeline_samples(&self, run_id: uuid::Uuid, key: &str) -> Result<Vec<MetricValue>, MetricSourceError> {
        let samples: Vec<MetricValue> = match key {
            "step_success" => self
                .store
                .step_runs_for(run_id)
                .iter()
                .filter(|s| s.status.is_terminal())
                .map(|s| bool_sample(s.status == StepRunStatus::Completed).into())
                .collect(),
            "invalid_artifacts" => self
                .store
                .artifacts_for(run_id)
                .iter()
                .map(|a| bool_sample(!a.is_valid).into())
                .collect(),
            "step_count" => vec![(self.store.step_runs_for(run_id).len() as f64).into()],
            _ => return Err(unsupported(key)),
        };
        Ok(samples)
    }
}

fn bool_sample(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

fn unsupported(key: &str) -> MetricSourceError {
    MetricSourceError::Unsupported {
        metric_key: key.to_string(),
    }
}

#[async_trait]
impl MetricSource for RunMetrics {
    async fn samples(
        &self,
        subject: MetricSubject,
        metric_key: &str,
    ) -> Result<Vec<MetricValue>, MetricSourceError> {
        match subject {
            MetricSubject::StepRun(id) => self.step_samples(id, metric_key),
            MetricSubject::PipelineRun(id) => self.pipeline_samples(id, metric_key),
        }
    }
}
