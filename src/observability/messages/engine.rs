// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for pipeline run lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Pipeline run start and terminal status
//! * Step run start, completion and failure
//! * Cancellation and abort of a run in progress

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A pipeline run has been created and is about to execute its plan.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use pipeline_registry::observability::messages::engine::RunStarted;
///
/// let msg = RunStarted {
///     run_id: "0b7e…",
///     pipeline_version_id: "4c1a…",
///     node_count: 3,
///     failure_policy: "continue",
///     max_concurrency: 4,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct RunStarted<'a> {
    pub run_id: &'a str,
    pub pipeline_version_id: &'a str,
    pub node_count: usize,
    pub failure_policy: &'a str,
    pub max_concurrency: usize,
}

impl Display for RunStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting pipeline run {} for version {}: {} nodes, policy={}, max_concurrency={}",
            self.run_id,
            self.pipeline_version_id,
            self.node_count,
            self.failure_policy,
            self.max_concurrency
        )
    }
}

impl StructuredLog for RunStarted<'_> {
    fn log(&self) {
        tracing::info!(
            run_id = self.run_id,
            pipeline_version_id = self.pipeline_version_id,
            node_count = self.node_count,
            failure_policy = self.failure_policy,
            max_concurrency = self.max_concurrency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline_run",
            span_name = name,
            run_id = self.run_id,
            pipeline_version_id = self.pipeline_version_id,
            node_count = self.node_count,
            failure_policy = self.failure_policy,
        )
    }
}

/// A pipeline run reached its terminal status.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunFinished<'a> {
    pub run_id: &'a str,
    pub status: &'a str,
    pub completed: usize,
    pub failed: usize,
    pub not_started: usize,
    pub duration: std::time::Duration,
}

impl Display for RunFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline run {} finished {}: {} completed, {} failed, {} not started in {:?}",
            self.run_id,
            self.status,
            self.completed,
            self.failed,
            self.not_started,
            self.duration
        )
    }
}

impl StructuredLog for RunFinished<'_> {
    fn log(&self) {
        tracing::info!(
            run_id = self.run_id,
            status = self.status,
            completed = self.completed,
            failed = self.failed,
            not_started = self.not_started,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline_run_finished",
            span_name = name,
            run_id = self.run_id,
            status = self.status,
            duration = ?self.duration,
        )
    }
}

/// A step run has been recorded as running and its executor invoked.
///
/// # Log Level
/// `debug!` - Per-node detail
pub struct StepStarted<'a> {
    pub node_key: &'a str,
    pub step_name: &'a str,
    pub step_version_label: &'a str,
}

impl Display for StepStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Running node '{}' with {}@{}",
            self.node_key, self.step_name, self.step_version_label
        )
    }
}

impl StructuredLog for StepStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            node_key = self.node_key,
            step_name = self.step_name,
            step_version_label = self.step_version_label,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "step_run",
            span_name = name,
            node_key = self.node_key,
            step_name = self.step_name,
            step_version_label = self.step_version_label,
        )
    }
}

/// A step produced IR and reached `completed`.
///
/// # Log Level
/// `debug!` - Per-node detail
pub struct StepCompleted<'a> {
    pub node_key: &'a str,
    pub duration_ms: u64,
    pub ir_valid: bool,
}

impl Display for StepCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' completed in {}ms (ir_valid={})",
            self.node_key, self.duration_ms, self.ir_valid
        )
    }
}

impl StructuredLog for StepCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            node_key = self.node_key,
            duration_ms = self.duration_ms,
            ir_valid = self.ir_valid,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "step_completed",
            span_name = name,
            node_key = self.node_key,
            duration_ms = self.duration_ms,
        )
    }
}

/// A step reached `failed`.
///
/// # Log Level
/// `error!` - The node produced no usable output
pub struct StepFailed<'a> {
    pub node_key: &'a str,
    pub duration_ms: u64,
    pub error: &'a str,
}

impl Display for StepFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' failed after {}ms: {}",
            self.node_key, self.duration_ms, self.error
        )
    }
}

impl StructuredLog for StepFailed<'_> {
    fn log(&self) {
        tracing::error!(
            node_key = self.node_key,
            duration_ms = self.duration_ms,
            error = self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "step_failed",
            span_name = name,
            node_key = self.node_key,
            error = self.error,
        )
    }
}

/// The abort policy stopped scheduling after a failed node.
///
/// # Log Level
/// `warn!` - Remaining nodes will not start
pub struct RunAborted<'a> {
    pub run_id: &'a str,
    pub failed_node: &'a str,
    pub not_started: usize,
}

impl Display for RunAborted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline run {} aborted at node '{}': {} node(s) not started",
            self.run_id, self.failed_node, self.not_started
        )
    }
}

impl StructuredLog for RunAborted<'_> {
    fn log(&self) {
        tracing::warn!(
            run_id = self.run_id,
            failed_node = self.failed_node,
            not_started = self.not_started,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "run_aborted",
            span_name = name,
            run_id = self.run_id,
            failed_node = self.failed_node,
        )
    }
}

/// The run's cancellation token fired before all nodes were scheduled.
///
/// # Log Level
/// `warn!` - Remaining nodes will not start
pub struct RunCancelled<'a> {
    pub run_id: &'a str,
    pub not_started: usize,
}

impl Display for RunCancelled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline run {} cancelled: {} node(s) not started",
            self.run_id, self.not_started
        )
    }
}

impl StructuredLog for RunCancelled<'_> {
    fn log(&self) {
        tracing::warn!(
            run_id = self.run_id,
            not_started = self.not_started,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "run_cancelled",
            span_name = name,
            run_id = self.run_id,
            not_started = self.not_started,
        )
    }
}
