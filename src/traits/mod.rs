// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod executor;
pub mod metric_source;
pub mod step;

pub use executor::ExecutorMap;
pub use metric_source::MetricSource;
pub use step::{StepExecutor, StepInvocation, StepOutput};
