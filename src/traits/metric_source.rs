// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::errors::MetricSourceError;
use crate::model::{MetricSubject, MetricValue};

/// Supplies raw samples for a metric key. The evaluator aggregates them.
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn samples(
        &self,
        subject: MetricSubject,
        metric_key: &str,
    ) -> Result<Vec<MetricValue>, MetricSourceError>;
}
