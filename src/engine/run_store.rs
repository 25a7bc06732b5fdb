// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! In-memory store for pipeline runs, step runs, IR artifacts and metric
//! results.
//!
//! Rows are only ever appended. Runs and step runs are updated in place as
//! they move through their states; artifacts are immutable; a metric result is
//! replaced when the same `(subject, metric_key)` is recorded again.

use parking_lot::RwLock;
use uuid::Uuid;

use crate::model::{IrArtifact, MetricResult, MetricSubject, PipelineRun, StepRun};

/// Row counts, mostly useful to assert that a dry run wrote nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub runs: usize,
    pub step_runs: usize,
    pub artifacts: usize,
    pub metric_results: usize,
}

#[derive(Default)]
pub struct RunStore {
    runs: RwLock<Vec<PipelineRun>>,
    step_runs: RwLock<Vec<StepRun>>,
    artifacts: RwLock<Vec<IrArtifact>>,
    metric_results: RwLock<Vec<MetricResult>>,
}

impl RunStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_run(&self, run: PipelineRun) {
        self.runs.write().push(run);
    }

    /// Applies `update` to the run with `id`. Returns `false` if there is none.
    pub fn update_run(&self, id: Uuid, update: impl FnOnce(&mut PipelineRun)) -> bool {
        match self.runs.write().iter_mut().find(|r| r.id == id) {
            Some(run) => {
                update(run);
                true
            }
            None => false,
        }
    }

    pub fn run(&self, id: Uuid) -> Option<PipelineRun> {
        self.runs.read().iter().find(|r| r.id == id).cloned()
    }

    pub fn runs_for_version(&self, pipeline_version_id: Uuid) -> Vec<PipelineRun> {
        self.runs
            .read()
            .iter()
            .filter(|r| r.pipeline_version_id == pipeline_version_id)
            .cloned()
            .collect()
    }

    pub fn list_runs(&self) -> Vec<PipelineRun> {
        self.runs.read().clone()
    }

    pub fn insert_step_run(&self, step_run: StepRun) {
        self.step_runs.write().push(step_run);
    }

    pub fn update_step_run(&self, id: Uuid, update: impl FnOnce(&mut StepRun)) -> bool {
        match self.step_runs.write().iter_mut().find(|s| s.id == id) {
            Some(step_run) => {
                update(step_run);
                true
            }
            None => false,
        }
    }

    pub fn step_run(&self, id: Uuid) -> Option<StepRun> {
        self.step_runs.read().iter().find(|s| s.id == id).cloned()
    }

    /// Step runs of a pipeline run, in creation order.
    pub fn step_runs_for(&self, pipeline_run_id: Uuid) -> Vec<StepRun> {
        self.step_runs
            .read()
            .iter()
            .filter(|s| s.pipeline_run_id == pipeline_run_id)
            .cloned()
            .collect()
    }

    pub fn insert_artifact(&self, artifact: IrArtifact) {
        self.artifacts.write().push(artifact);
    }

    pub fn artifact_for(&self, step_run_id: Uuid) -> Option<IrArtifact> {
        self.artifacts
            .read()
            .iter()
            .find(|a| a.step_run_id == step_run_id)
            .cloned()
    }

    pub fn artifacts_for(&self, pipeline_run_id: Uuid) -> Vec<IrArtifact> {
        let step_run_ids: Vec<Uuid> = self
            .step_runs_for(pipeline_run_id)
            .into_iter()
            .map(|s| s.id)
            .collect();
        self.artifacts
            .read()
            .iter()
            .filter(|a| step_run_ids.contains(&a.step_run_id))
            .cloned()
            .collect()
    }

    /// Stores a metric result, replacing an earlier one for the same subject and key.
    pub fn record_metric(&self, result: MetricResult) {
        let mut results = self.metric_results.write();
        match results
            .iter_mut()
            .find(|r| r.subject == result.subject && r.metric_key == result.metric_key)
        {
            Some(existing) => *existing = result,
            None => results.push(result),
        }
    }

    pub fn metric_results_for(&self, subject: MetricSubject) -> Vec<MetricResult> {
        self.metric_results
            .read()
            .iter()
            .filter(|r| r.subject == subject)
            .cloned()
            .collect()
    }

    /// Metric results of a pipeline run and all of its step runs.
    pub fn metric_results_for_run(&self, pipeline_run_id: Uuid) -> Vec<MetricResult> {
        let mut subjects = vec![MetricSubject::PipelineRun(pipeline_run_id)];
        subjects.extend(
            self.step_runs_for(pipeline_run_id)
                .into_iter()
                .map(|s| MetricSubject::StepRun(s.id)),
        );
        self.metric_results
            .read()
            .iter()
            .filter(|r| subjects.contains(&r.subject))
            .cloned()
            .collect()
    }

    pub fn counts(&self) -> StoreCounts {
        StoreCounts {
            runs: self.runs.read().len(),
            step_runs: self.step_runs.read().len(),
            artifacts: self.artifacts.read().len(),
            metric_results: self.metric_results.read().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MetricValue;
    use chrono::Utc;
    use serde_json::json;

    fn result(subject: MetricSubject, key: &str, value: f64) -> MetricResult {
        MetricResult {
            id: Uuid::new_v4(),
            subject,
            metric_key: key.to_string(),
            value: MetricValue::Numeric(value),
            passed: true,
            details: json!({}),
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn metric_results_are_unique_per_subject_and_key() {
        let store = RunStore::new();
        let subject = MetricSubject::StepRun(Uuid::new_v4());

        store.record_metric(result(subject, "ir_valid", 0.0));
        store.record_metric(result(subject, "ir_valid", 1.0));
        store.record_metric(result(subject, "ir_bytes", 42.0));

        let results = store.metric_results_for(subject);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].value, MetricValue::Numeric(1.0));
    }

    #[test]
    fn updating_a_missing_run_reports_false() {
        let store = RunStore::new();

        assert!(!store.update_run(Uuid::new_v4(), |_| {}));
        assert!(!store.update_step_run(Uuid::new_v4(), |_| {}));
        assert_eq!(store.counts(), StoreCounts::default());
    }
}
