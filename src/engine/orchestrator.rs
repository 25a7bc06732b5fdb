// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Runs compiled plans and records every outcome in the [`RunStore`].
//!
//! ## Algorithm
//! 1. Compile the pipeline version and resolve, per node, its executor, its
//!    effective config and its pinned schema. Any failure here is returned
//!    before a single run row exists.
//! 2. Stop there for a dry run.
//! 3. Otherwise create the pipeline run and walk the plan level by level.
//!    Nodes of one level are spawned together and bounded by a semaphore of
//!    `max_concurrency` permits; the next level starts once every task of the
//!    current one has been awaited.
//! 4. Each node records a running step run, invokes its executor (bounded by
//!    the step timeout), stores the IR artifact, validates it, records step
//!    metrics and only then writes its terminal status.
//! 5. Derive the pipeline status, evaluate pipeline metrics and close the run.
//!
//! ## Failure Handling
//! Executor errors, timeouts and panics fail only their own step run. Under
//! [`FailurePolicy::Continue`] the next level still runs and receives IR from
//! the predecessors that completed. Under [`FailurePolicy::Abort`] no further
//! level is scheduled.
//!
//! ## Cancellation
//! The run's token is checked before each level and again by every node after
//! it acquires its permit. Nodes already running finish and record their
//! results; nodes not yet started never run. A run whose token fired before it
//! closed ends `cancelled`, even when nothing was left to start.

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use super::report::{DryRunReport, ExecutionOutcome, RunReport};
use super::request::ExecutionRequest;
use super::run_store::RunStore;
use crate::compiler::{compile_version, ExecutionPlan, PlannedNode};
use crate::config::ExecutorOptions;
use crate::errors::{EngineError, FailurePolicy, StepError};
use crate::metrics::{MetricEvaluator, RunMetrics};
use crate::model::{
    merge_layers, ConfigMap, IrArtifact, MetricScope, MetricSubject, PipelineRun,
    PipelineRunStatus, RunSummary, StepRun, StepRunStatus,
};
use crate::observability::messages::engine::{
    RunAborted, RunCancelled, RunFinished, RunStarted, StepCompleted, StepFailed, StepStarted,
};
use crate::observability::messages::StructuredLog;
use crate::registry::{Registry, SchemaValidation};
use crate::traits::{ExecutorMap, MetricSource, StepExecutor, StepInvocation, StepOutput};

pub struct Orchestrator {
    registry: Arc<Registry>,
    executors: ExecutorMap,
    store: Arc<RunStore>,
    evaluator: Arc<MetricEvaluator>,
    options: ExecutorOptions,
    active_runs: Mutex<HashMap<Uuid, CancellationToken>>,
}

/// A planned node with everything needed to run it.
#[derive(Clone)]
struct PreparedNode {
    planned: PlannedNode,
    config: ConfigMap,
    executor: Arc<dyn StepExecutor>,
    pinned_schema: Option<String>,
}

enum NodeOutcome {
    Completed(Value),
    Failed,
    NotStarted,
}

/// State shared by every node task of one run.
struct NodeContext {
    registry: Arc<Registry>,
    store: Arc<RunStore>,
    evaluator: Arc<MetricEvaluator>,
    run_id: Uuid,
    timeout: Option<Duration>,
    violation_fatal: bool,
    cancellation: CancellationToken,
}

impl Orchestrator {
    /// Builds an orchestrator that scores runs with the built-in [`RunMetrics`].
    pub fn new(registry: Arc<Registry>, executors: ExecutorMap, store: Arc<RunStore>) -> Self {
        let source: Arc<dyn MetricSource> = Arc::new(RunMetrics::new(Arc::clone(&store)));
        let evaluator = Arc::new(MetricEvaluator::new(
            Arc::clone(&registry),
            source,
            Arc::clone(&store),
        ));
        Self {
            registry,
            executors,
            store,
            evaluator,
            options: ExecutorOptions::default(),
            active_runs: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_metric_source(mut self, source: Arc<dyn MetricSource>) -> Self {
        self.evaluator = Arc::new(MetricEvaluator::new(
            Arc::clone(&self.registry),
            source,
            Arc::clone(&self.store),
        ));
        self
    }

    pub fn with_options(mut self, options: ExecutorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<RunStore> {
        &self.store
    }

    /// Compiles a pipeline version without touching the store.
    pub fn plan(&self, pipeline_version_id: Uuid) -> Result<ExecutionPlan, EngineError> {
        let version = self.registry.pipelines().get_version(pipeline_version_id)?;
        Ok(compile_version(&version, self.registry.steps())?)
    }

    /// Executes the active version of the pipeline called `pipeline_name`.
    pub async fn execute_active(
        &self,
        pipeline_name: &str,
        request: ExecutionRequest,
    ) -> Result<ExecutionOutcome, EngineError> {
        let definition = self.registry.pipelines().find_definition(pipeline_name)?;
        let version = self.registry.pipelines().get_active(definition.id)?;
        self.execute(version.id, request).await
    }

    /// Executes (or, for a dry run, only plans) a pipeline version.
    ///
    /// Errors are reserved for problems found before the run starts. Once the
    /// pipeline run exists, step failures are recorded on the run instead.
    pub async fn execute(
        &self,
        pipeline_version_id: Uuid,
        request: ExecutionRequest,
    ) -> Result<ExecutionOutcome, EngineError> {
        let plan = self.plan(pipeline_version_id)?;
        let prepared = self.prepare(&plan, &request)?;

        if request.dry_run {
            let resolved_config = prepared
                .iter()
                .map(|node| (node.planned.key.clone(), node.config.clone()))
                .collect();
            return Ok(ExecutionOutcome::Planned(DryRunReport {
                plan,
                resolved_config,
            }));
        }

        let report = self.run(pipeline_version_id, plan, prepared, &request).await;
        Ok(ExecutionOutcome::Finished(report))
    }

    /// Requests cancellation of a run in progress. Returns `false` when the run
    /// is unknown or already finished.
    pub fn cancel(&self, run_id: Uuid) -> bool {
        match self.active_runs.lock().get(&run_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn active_runs(&self) -> Vec<Uuid> {
        self.active_runs.lock().keys().copied().collect()
    }

    fn prepare(
        &self,
        plan: &ExecutionPlan,
        request: &ExecutionRequest,
    ) -> Result<Vec<PreparedNode>, EngineError> {
        let targeted = request
            .node_overrides
            .keys()
            .chain(request.pinned_schemas.keys());
        for key in targeted {
            if plan.node(key).is_none() {
                return Err(EngineError::UnknownNode {
                    node_key: key.clone(),
                });
            }
        }

        plan.nodes
            .iter()
            .map(|node| {
                let executor = self.executors.get(&node.step_name).cloned().ok_or_else(|| {
                    EngineError::ExecutorNotFound {
                        node_key: node.key.clone(),
                        step: node.step_name.clone(),
                    }
                })?;

                let pinned_schema = request.pinned_schemas.get(&node.key).cloned();
                if let Some(label) = &pinned_schema {
                    self.registry
                        .schemas()
                        .find(node.step_version_id, label)
                        .map_err(|_| EngineError::PinnedSchemaNotFound {
                            node_key: node.key.clone(),
                            schema_version: label.clone(),
                        })?;
                }

                let config = merge_layers(
                    [&node.default_config, &node.params, &request.overrides]
                        .into_iter()
                        .chain(request.node_overrides.get(&node.key)),
                );

                Ok(PreparedNode {
                    planned: node.clone(),
                    config,
                    executor,
                    pinned_schema,
                })
            })
            .collect()
    }

    async fn run(
        &self,
        pipeline_version_id: Uuid,
        plan: ExecutionPlan,
        prepared: Vec<PreparedNode>,
        request: &ExecutionRequest,
    ) -> RunReport {
        let started = Instant::now();
        let run_id = Uuid::new_v4();
        let total_nodes = plan.len();
        let cancellation = request.cancellation.clone().unwrap_or_default();

        self.store.insert_run(PipelineRun {
            id: run_id,
            pipeline_version_id,
            status: PipelineRunStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            summary: RunSummary {
                failure_policy: request.failure_policy,
                total_nodes,
                ..RunSummary::default()
            },
        });
        self.active_runs.lock().insert(run_id, cancellation.clone());

        let run_label = run_id.to_string();
        let started_msg = RunStarted {
            run_id: &run_label,
            pipeline_version_id: &pipeline_version_id.to_string(),
            node_count: total_nodes,
            failure_policy: request.failure_policy.as_str(),
            max_concurrency: self.options.max_concurrency(),
        };
        started_msg.log();
        let span = started_msg.span("execute");

        let ctx = Arc::new(NodeContext {
            registry: Arc::clone(&self.registry),
            store: Arc::clone(&self.store),
            evaluator: Arc::clone(&self.evaluator),
            run_id,
            timeout: self.options.step_timeout(),
            violation_fatal: request.schema_violation_fatal,
            cancellation: cancellation.clone(),
        });

        let aborted_at = self
            .run_levels(&plan, prepared, request.failure_policy, Arc::clone(&ctx))
            .instrument(span)
            .await;

        let step_runs = self.store.step_runs_for(run_id);
        let completed = count_status(&step_runs, StepRunStatus::Completed);
        let failed = count_status(&step_runs, StepRunStatus::Failed);
        let not_started = total_nodes.saturating_sub(step_runs.len());
        let cancelled = aborted_at.is_none() && cancellation.is_cancelled();

        if let Some(node_key) = &aborted_at {
            RunAborted {
                run_id: &run_label,
                failed_node: node_key,
                not_started,
            }
            .log();
        }
        if cancelled {
            RunCancelled {
                run_id: &run_label,
                not_started,
            }
            .log();
        }

        // Failed is reserved for an abort; under continue any failure is partial.
        let status = if aborted_at.is_some() {
            PipelineRunStatus::Failed
        } else if cancelled {
            PipelineRunStatus::Cancelled
        } else if failed == 0 {
            PipelineRunStatus::Completed
        } else {
            PipelineRunStatus::Partial
        };

        let invalid_artifacts = self
            .store
            .artifacts_for(run_id)
            .iter()
            .filter(|a| !a.is_valid)
            .count();
        let profile_score = self
            .evaluator
            .evaluate(MetricSubject::PipelineRun(run_id), MetricScope::Pipeline)
            .await;

        self.store.update_run(run_id, |run| {
            run.status = status;
            run.completed_at = Some(Utc::now());
            run.summary = RunSummary {
                failure_policy: request.failure_policy,
                total_nodes,
                completed,
                failed,
                not_started,
                invalid_artifacts,
                cancelled,
                aborted_at: aborted_at.clone(),
                profile_score,
            };
        });
        self.active_runs.lock().remove(&run_id);

        RunFinished {
            run_id: &run_label,
            status: status.as_str(),
            completed,
            failed,
            not_started,
            duration: started.elapsed(),
        }
        .log();

        RunReport {
            run: self.store.run(run_id).unwrap_or_else(|| PipelineRun {
                id: run_id,
                pipeline_version_id,
                status,
                started_at: Utc::now(),
                completed_at: Some(Utc::now()),
                summary: RunSummary::default(),
            }),
            plan,
            step_runs: self.store.step_runs_for(run_id),
            artifacts: self.store.artifacts_for(run_id),
            metric_results: self.store.metric_results_for_run(run_id),
        }
    }

    /// Runs the plan level by level. Returns the key of the node that triggered
    /// an abort, if any.
    async fn run_levels(
        &self,
        plan: &ExecutionPlan,
        prepared: Vec<PreparedNode>,
        policy: FailurePolicy,
        ctx: Arc<NodeContext>,
    ) -> Option<String> {
        let mut pending: HashMap<String, PreparedNode> = prepared
            .into_iter()
            .map(|node| (node.planned.key.clone(), node))
            .collect();
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrency()));
        let mut outcomes: HashMap<String, NodeOutcome> = HashMap::new();

        for level in &plan.levels {
            if ctx.cancellation.is_cancelled() {
                break;
            }

            let mut tasks = Vec::with_capacity(level.len());
            for key in level {
                let Some(node) = pending.remove(key) else {
                    continue;
                };
                let upstream: BTreeMap<String, Value> = node
                    .planned
                    .depends_on
                    .iter()
                    .filter_map(|dep| match outcomes.get(dep) {
                        Some(NodeOutcome::Completed(ir)) => Some((dep.clone(), ir.clone())),
                        _ => None,
                    })
                    .collect();
                let step_run_id = Uuid::new_v4();
                let task = tokio::spawn(run_node(
                    Arc::clone(&ctx),
                    Arc::clone(&semaphore),
                    node.clone(),
                    upstream,
                    step_run_id,
                ));
                tasks.push((node, step_run_id, task));
            }

            let mut first_failure = None;
            for (node, step_run_id, task) in tasks {
                let outcome = match task.await {
                    Ok(outcome) => outcome,
                    Err(join_error) => {
                        record_crash(&ctx, &node, step_run_id, &join_error.to_string());
                        NodeOutcome::Failed
                    }
                };
                if matches!(outcome, NodeOutcome::Failed) && first_failure.is_none() {
                    first_failure = Some(node.planned.key.clone());
                }
                outcomes.insert(node.planned.key, outcome);
            }

            if policy == FailurePolicy::Abort && first_failure.is_some() {
                return first_failure;
            }
        }

        None
    }
}

async fn run_node(
    ctx: Arc<NodeContext>,
    semaphore: Arc<Semaphore>,
    node: PreparedNode,
    upstream: BTreeMap<String, Value>,
    step_run_id: Uuid,
) -> NodeOutcome {
    let Ok(_permit) = semaphore.acquire_owned().await else {
        return NodeOutcome::NotStarted;
    };
    if ctx.cancellation.is_cancelled() {
        return NodeOutcome::NotStarted;
    }

    let planned = &node.planned;
    let started = Instant::now();
    ctx.store.insert_step_run(StepRun {
        id: step_run_id,
        pipeline_run_id: ctx.run_id,
        step_version_id: planned.step_version_id,
        node_key: planned.key.clone(),
        params: node.config.clone(),
        status: StepRunStatus::Running,
        started_at: Utc::now(),
        completed_at: None,
        error: None,
    });

    let started_msg = StepStarted {
        node_key: &planned.key,
        step_name: &planned.step_name,
        step_version_label: &planned.step_version_label,
    };
    started_msg.log();
    let span = started_msg.span("run_node");

    let invocation = StepInvocation {
        step_version_id: planned.step_version_id,
        node_key: planned.key.clone(),
        config: node.config.clone(),
        upstream,
    };
    let result = invoke(node.executor.as_ref(), &invocation, ctx.timeout)
        .instrument(span)
        .await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(output) => complete_node(&ctx, &node, step_run_id, output.ir, elapsed_ms).await,
        Err(error) => {
            let message = error.to_string();
            StepFailed {
                node_key: &planned.key,
                duration_ms: elapsed_ms,
                error: &message,
            }
            .log();
            fail_step_run(&ctx.store, step_run_id, message);
            NodeOutcome::Failed
        }
    }
}

async fn invoke(
    executor: &dyn StepExecutor,
    invocation: &StepInvocation,
    timeout: Option<Duration>,
) -> Result<StepOutput, StepError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, executor.run(invocation))
            .await
            .unwrap_or_else(|_| Err(StepError::TimedOut(limit))),
        None => executor.run(invocation).await,
    }
}

/// Stores the artifact, validates it and records step metrics before the step
/// run reaches its terminal status.
async fn complete_node(
    ctx: &NodeContext,
    node: &PreparedNode,
    step_run_id: Uuid,
    ir: Value,
    elapsed_ms: u64,
) -> NodeOutcome {
    let planned = &node.planned;
    let validation = ctx
        .registry
        .schemas()
        .validate(planned.step_version_id, &ir, node.pinned_schema.as_deref())
        .unwrap_or_else(|e| SchemaValidation {
            is_valid: false,
            errors: vec![e.to_string()],
            schema_version: node.pinned_schema.clone(),
            warning: None,
        });

    ctx.store.insert_artifact(IrArtifact {
        id: Uuid::new_v4(),
        step_run_id,
        payload: ir.clone(),
        is_valid: validation.is_valid,
        validation_errors: validation.errors.clone(),
        schema_version: validation.schema_version.clone(),
        warning: validation.warning.clone(),
        created_at: Utc::now(),
    });

    if ctx.violation_fatal && !validation.is_valid {
        let message = format!(
            "IR failed schema validation with {} error(s)",
            validation.errors.len()
        );
        StepFailed {
            node_key: &planned.key,
            duration_ms: elapsed_ms,
            error: &message,
        }
        .log();
        fail_step_run(&ctx.store, step_run_id, message);
        return NodeOutcome::Failed;
    }

    ctx.evaluator
        .evaluate(MetricSubject::StepRun(step_run_id), MetricScope::Step)
        .await;

    ctx.store.update_step_run(step_run_id, |step_run| {
        step_run.status = StepRunStatus::Completed;
        step_run.completed_at = Some(Utc::now());
    });

    StepCompleted {
        node_key: &planned.key,
        duration_ms: elapsed_ms,
        ir_valid: validation.is_valid,
    }
    .log();

    NodeOutcome::Completed(ir)
}

fn fail_step_run(store: &RunStore, step_run_id: Uuid, error: String) {
    store.update_step_run(step_run_id, |step_run| {
        step_run.status = StepRunStatus::Failed;
        step_run.completed_at = Some(Utc::now());
        step_run.error = Some(error);
    });
}

/// Records a node whose task panicked or was aborted by the runtime.
fn record_crash(ctx: &NodeContext, node: &PreparedNode, step_run_id: Uuid, error: &str) {
    let message = format!("step task crashed: {error}");
    StepFailed {
        node_key: &node.planned.key,
        duration_ms: 0,
        error: &message,
    }
    .log();

    let updated = ctx.store.update_step_run(step_run_id, |step_run| {
        step_run.status = StepRunStatus::Failed;
        step_run.completed_at = Some(Utc::now());
        step_run.error = Some(message.clone());
    });
    if !updated {
        let now = Utc::now();
        ctx.store.insert_step_run(StepRun {
            id: step_run_id,
            pipeline_run_id: ctx.run_id,
            step_version_id: node.planned.step_version_id,
            node_key: node.planned.key.clone(),
            params: node.config.clone(),
            status: StepRunStatus::Failed,
            started_at: now,
            completed_at: Some(now),
            error: Some(message),
        });
    }
}

fn count_status(step_runs: &[StepRun], status: StepRunStatus) -> usize {
    step_runs.iter().filter(|s| s.status == status).count()
}
