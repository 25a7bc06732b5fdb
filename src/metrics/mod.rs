// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod aggregation;
pub mod builtin;
pub mod evaluator;

pub use aggregation::{aggregate, judge};
pub use builtin::RunMetrics;
pub use evaluator::MetricEvaluator;
