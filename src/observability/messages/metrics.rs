// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for metric evaluation.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

pub struct MetricRecorded<'a> {
    pub subject: &'a str,
    pub metric_key: &'a str,
    pub value: &'a str,
    pub passed: bool,
}

impl Display for MetricRecorded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Metric '{}' for {} = {} (passed={})",
            self.metric_key, self.subject, self.value, self.passed
        )
    }
}

impl StructuredLog for MetricRecorded<'_> {
    fn log(&self) {
        tracing::debug!(
            subject = self.subject,
            metric_key = self.metric_key,
            value = self.value,
            passed = self.passed,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "metric_recorded",
            span_name = name,
            subject = self.subject,
            metric_key = self.metric_key,
        )
    }
}

/// A profile item could not be scored and was left out of the profile score.
pub struct MetricSkipped<'a> {
    pub subject: &'a str,
    pub metric_key: &'a str,
    pub reason: &'a str,
}

impl Display for MetricSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Skipping metric '{}' for {}: {}",
            self.metric_key, self.subject, self.reason
        )
    }
}

impl StructuredLog for MetricSkipped<'_> {
    fn log(&self) {
        tracing::warn!(
            subject = self.subject,
            metric_key = self.metric_key,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "metric_skipped",
            span_name = name,
            subject = self.subject,
            metric_key = self.metric_key,
        )
    }
}

pub struct ProfileScored<'a> {
    pub subject: &'a str,
    pub profile: &'a str,
    pub score: f64,
    pub evaluated: usize,
    pub passed: usize,
}

impl Display for ProfileScored<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Profile '{}' scored {:.3} for {} ({}/{} passed)",
            self.profile, self.score, self.subject, self.passed, self.evaluated
        )
    }
}

impl StructuredLog for ProfileScored<'_> {
    fn log(&self) {
        tracing::info!(
            subject = self.subject,
            profile = self.profile,
            score = self.score,
            evaluated = self.evaluated,
            passed = self.passed,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "profile_scored",
            span_name = name,
            subject = self.subject,
            profile = self.profile,
        )
    }
}
