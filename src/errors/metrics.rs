// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use super::ErrorCode;

/// Errors a metric source reports while fetching samples.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricSourceError {
    #[error("metric source does not provide '{metric_key}'")]
    Unsupported { metric_key: String },

    #[error("samples for {subject} are unavailable: {reason}")]
    Unavailable { subject: String, reason: String },
}

impl MetricSourceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            MetricSourceError::Unsupported { .. } => ErrorCode::NotFound,
            MetricSourceError::Unavailable { .. } => ErrorCode::ExecutionFailure,
        }
    }
}
