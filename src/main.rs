// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use std::env;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use pipeline_registry::config::{load_config, load_seed};
use pipeline_registry::engine::{ExecutionOutcome, ExecutionRequest, Orchestrator, RunStore};
use pipeline_registry::registry::Registry;

const USAGE: &str = "Usage: pipeline-registry <engine-config> <seed> <pipeline-name> [--dry-run]";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let dry_run = args.iter().any(|a| a == "--dry-run");
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();
    let [config_path, seed_path, pipeline_name] = positional.as_slice() else {
        bail!(USAGE);
    };

    let config = load_config(config_path)
        .with_context(|| format!("loading engine config {config_path}"))?;
    let seed = load_seed(seed_path).with_context(|| format!("loading seed {seed_path}"))?;

    let registry = Arc::new(Registry::new(config.schema.missing_schema));
    let summary = seed.apply(&registry).context("applying seed")?;
    tracing::info!(
        steps = summary.steps,
        pipelines = summary.pipelines,
        schemas = summary.schemas,
        "registry seeded"
    );

    let orchestrator = Orchestrator::new(
        Arc::clone(&registry),
        seed.executor_map()?,
        Arc::new(RunStore::new()),
    )
    .with_options(config.executor_options);

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("⏹  cancelling run...");
            ctrl_c.cancel();
        }
    });

    let mut request = ExecutionRequest::from_config(&config).with_cancellation(token);
    if dry_run {
        request = request.dry_run();
    }

    let outcome = orchestrator
        .execute_active(pipeline_name, request)
        .await
        .with_context(|| format!("executing pipeline '{pipeline_name}'"))?;

    if let ExecutionOutcome::Finished(report) = &outcome {
        eprintln!(
            "🏁 run {} finished: {}",
            report.run.id,
            report.run.status.as_str()
        );
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
