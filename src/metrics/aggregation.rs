// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::model::{Aggregation, Comparison, MetricValue};

/// Combines raw samples into one value.
///
/// `Latest` returns the last sample untouched, text included. Every other
/// aggregation works on the samples that read as numbers and returns `None`
/// when there are none.
pub fn aggregate(aggregation: Aggregation, samples: &[MetricValue]) -> Option<MetricValue> {
    if aggregation == Aggregation::Latest {
        return samples.last().cloned();
    }

    let numbers: Vec<f64> = samples.iter().filter_map(MetricValue::as_f64).collect();
    if numbers.is_empty() {
        return None;
    }

    let count = numbers.len() as f64;
    let value = match aggregation {
        Aggregation::Avg => numbers.iter().sum::<f64>() / count,
        Aggregation::Sum => numbers.iter().sum(),
        Aggregation::Min => numbers.iter().copied().fold(f64::INFINITY, f64::min),
        Aggregation::Max => numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Aggregation::Ratio => numbers.iter().filter(|n| **n != 0.0).count() as f64 / count,
        Aggregation::Latest => return None,
    };
    Some(MetricValue::Numeric(value))
}

/// Decides whether `value` meets `threshold`. Without a threshold every value
/// passes; a value that is not a number never meets one.
pub fn judge(value: &MetricValue, threshold: Option<f64>, comparison: Comparison) -> bool {
    let Some(threshold) = threshold else {
        return true;
    };
    match value.as_f64() {
        Some(v) => match comparison {
            Comparison::AtLeast => v >= threshold,
            Comparison::AtMost => v <= threshold,
        },
        None => false,
    }
}
