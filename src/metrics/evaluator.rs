// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Scores a run against the active metric profile of its scope.
//!
//! For each profile item the evaluator fetches samples from the
//! [`MetricSource`], aggregates them with the definition's aggregation, judges
//! the value against the item threshold (falling back to the definition
//! target) and records one [`MetricResult`]. Items that cannot be scored are
//! logged and left out; they never fail the run.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::aggregation::{aggregate, judge};
use crate::engine::RunStore;
use crate::model::{
    MetricProfileItem, MetricResult, MetricScope, MetricSubject, MetricValue, ProfileScore,
};
use crate::observability::messages::metrics::{MetricRecorded, MetricSkipped, ProfileScored};
use crate::observability::messages::StructuredLog;
use crate::registry::Registry;
use crate::traits::MetricSource;

pub struct MetricEvaluator {
    registry: Arc<Registry>,
    source: Arc<dyn MetricSource>,
    store: Arc<RunStore>,
}

impl MetricEvaluator {
    pub fn new(registry: Arc<Registry>, source: Arc<dyn MetricSource>, store: Arc<RunStore>) -> Self {
        Self {
            registry,
            source,
            store,
        }
    }

    /// Returns `None` when the scope has no active profile.
    pub async fn evaluate(&self, subject: MetricSubject, scope: MetricScope) -> Option<ProfileScore> {
        let profile = self.registry.metrics().active_profile(scope)?;
        let subject_label = subject.to_string();

        let mut skipped = Vec::new();
        let mut evaluated = 0;
        let mut passed = 0;
        let mut total_weight = 0.0;
        let mut passed_weight = 0.0;

        for item in &profile.items {
            match self.score_item(subject, scope, item).await {
                Ok(result) => {
                    MetricRecorded {
                        subject: &subject_label,
                        metric_key: &result.metric_key,
                        value: &value_label(&result.value),
                        passed: result.passed,
                    }
                    .log();

                    evaluated += 1;
                    total_weight += item.weight;
                    if result.passed {
                        passed += 1;
                        passed_weight += item.weight;
                    }
                    self.store.record_metric(result);
                }
                Err(reason) => {
                    MetricSkipped {
                        subject: &subject_label,
                        metric_key: &item.metric_key,
                        reason: &reason,
                    }
                    .log();
                    skipped.push(item.metric_key.clone());
                }
            }
        }

        let score = if total_weight > 0.0 {
            passed_weight / total_weight
        } else {
            0.0
        };

        ProfileScored {
            subject: &subject_label,
            profile: &profile.name,
            score,
            evaluated,
            passed,
        }
        .log();

        Some(ProfileScore {
            profile_id: profile.id,
            profile_name: profile.name,
            score,
            evaluated,
            passed,
            skipped,
        })
    }

    /// Produces the result for one item, or the reason it was skipped.
    async fn score_item(
        &self,
        subject: MetricSubject,
        scope: MetricScope,
        item: &MetricProfileItem,
    ) -> Result<MetricResult, String> {
        let definition = self
            .registry
            .metrics()
            .definition(&item.metric_key)
            .map_err(|e| e.to_string())?;

        if definition.scope != scope {
            return Err(format!(
                "metric is defined for {} scope, profile scores {} scope",
                definition.scope, scope
            ));
        }

        let samples = self
            .source
            .samples(subject, &item.metric_key)
            .await
            .map_err(|e| e.to_string())?;

        let value = aggregate(definition.aggregation, &samples)
            .ok_or_else(|| format!("no usable samples ({} received)", samples.len()))?;

        let threshold = item.threshold.or(definition.target);
        let passed = judge(&value, threshold, definition.comparison);

        Ok(MetricResult {
            id: Uuid::new_v4(),
            subject,
            metric_key: definition.key,
            value,
            passed,
            details: json!({
                "aggregation": definition.aggregation,
                "comparison": definition.comparison,
                "threshold": threshold,
                "weight": item.weight,
                "sampleCount": samples.len(),
            }),
            recorded_at: Utc::now(),
        })
    }
}

fn value_label(value: &MetricValue) -> String {
    match value {
        MetricValue::Numeric(n) => n.to_string(),
        MetricValue::Text(s) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MetricSourceError;
    use crate::model::{Aggregation, Comparison, NewMetricDefinition};
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Serves canned samples per key; keys missing from the map error out.
    struct CannedSource(HashMap<&'static str, Vec<MetricValue>>);

    #[async_trait]
    impl MetricSource for CannedSource {
        async fn samples(
            &self,
            _subject: MetricSubject,
            metric_key: &str,
        ) -> Result<Vec<MetricValue>, MetricSourceError> {
            self.0
                .get(metric_key)
                .cloned()
                .ok_or_else(|| MetricSourceError::Unavailable {
                    subject: "test".into(),
                    reason: "offline".into(),
                })
        }
    }

    fn define(registry: &Registry, key: &str, aggregation: Aggregation, target: f64, comparison: Comparison) {
        registry
            .metrics()
            .create_definition(NewMetricDefinition {
                key: key.to_string(),
                aggregation,
                target: Some(target),
                scope: MetricScope::Step,
                comparison,
                description: None,
            })
            .unwrap();
    }

    fn evaluator(registry: Arc<Registry>, samples: HashMap<&'static str, Vec<MetricValue>>) -> (MetricEvaluator, Arc<RunStore>) {
        let store = Arc::new(RunStore::new());
        let evaluator = MetricEvaluator::new(registry, Arc::new(CannedSource(samples)), Arc::clone(&store));
        (evaluator, store)
    }

    #[tokio::test]
    async fn no_active_profile_means_no_score() {
        let registry = Arc::new(Registry::default());
        let (evaluator, store) = evaluator(registry, HashMap::new());

        let score = evaluator
            .evaluate(MetricSubject::StepRun(Uuid::new_v4()), MetricScope::Step)
            .await;

        assert!(score.is_none());
        assert_eq!(store.counts().metric_results, 0);
    }

    #[tokio::test]
    async fn weighted_score_and_thresholds() {
        let registry = Arc::new(Registry::default());
        define(&registry, "confidence", Aggregation::Avg, 0.9, Comparison::AtLeast);
        define(&registry, "latency_ms", Aggregation::Max, 500.0, Comparison::AtMost);
        let metrics = registry.metrics();
        metrics.create_profile("default", MetricScope::Step).unwrap();
        metrics
            .add_profile_item(MetricScope::Step, "default", "confidence", 3.0, Some(0.5))
            .unwrap();
        metrics
            .add_profile_item(MetricScope::Step, "default", "latency_ms", 1.0, None)
            .unwrap();
        metrics.activate_profile(MetricScope::Step, "default").unwrap();

        let (evaluator, store) = evaluator(
            Arc::clone(&registry),
            HashMap::from([
                ("confidence", vec![0.6.into(), 0.8.into()]),
                ("latency_ms", vec![120.0.into(), 900.0.into()]),
            ]),
        );
        let subject = MetricSubject::StepRun(Uuid::new_v4());

        let score = evaluator.evaluate(subject, MetricScope::Step).await.unwrap();

        assert_eq!(score.evaluated, 2);
        assert_eq!(score.passed, 1);
        assert!((score.score - 0.75).abs() < 1e-9);
        let results = store.metric_results_for(subject);
        let confidence = results.iter().find(|r| r.metric_key == "confidence").unwrap();
        assert!(confidence.passed);
        assert_eq!(confidence.details["threshold"], json!(0.5));
        let latency = results.iter().find(|r| r.metric_key == "latency_ms").unwrap();
        assert!(!latency.passed);
    }

    #[tokio::test]
    async fn undefined_keys_and_source_errors_are_skipped() {
        let registry = Arc::new(Registry::default());
        define(&registry, "confidence", Aggregation::Avg, 0.5, Comparison::AtLeast);
        define(&registry, "coverage", Aggregation::Avg, 0.5, Comparison::AtLeast);
        let metrics = registry.metrics();
        metrics.create_profile("default", MetricScope::Step).unwrap();
        for key in ["confidence", "coverage", "ghost"] {
            metrics
                .add_profile_item(MetricScope::Step, "default", key, 1.0, None)
                .unwrap();
        }
        metrics.activate_profile(MetricScope::Step, "default").unwrap();

        let (evaluator, store) = evaluator(
            Arc::clone(&registry),
            HashMap::from([("confidence", vec![0.9.into()])]),
        );
        let subject = MetricSubject::StepRun(Uuid::new_v4());

        let score = evaluator.evaluate(subject, MetricScope::Step).await.unwrap();

        assert_eq!(score.evaluated, 1);
        assert_eq!(score.skipped, vec!["coverage".to_string(), "ghost".to_string()]);
        assert_eq!(store.metric_results_for(subject).len(), 1);
    }
}
