// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::errors::StepError;
use crate::traits::{StepExecutor, StepInvocation, StepOutput};

/// Returns a fixed IR document and remembers every invocation
pub struct RecordingExecutor {
    ir: Value,
    calls: Mutex<Vec<StepInvocation>>,
}

impl RecordingExecutor {
    pub fn new(ir: Value) -> Self {
        Self {
            ir,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<StepInvocation> {
        self.calls.lock().clone()
    }

    pub fn invoked_nodes(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.node_key.clone()).collect()
    }
}

#[async_trait]
impl StepExecutor for RecordingExecutor {
    async fn run(&self, invocation: &StepInvocation) -> Result<StepOutput, StepError> {
        self.calls.lock().push(invocation.clone());
        Ok(StepOutput::new(self.ir.clone()))
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// An executor that fails, either for every node or only for the listed ones
pub struct FailingExecutor {
    only: Option<HashSet<String>>,
    calls: AtomicUsize,
}

impl FailingExecutor {
    pub fn always() -> Self {
        Self {
            only: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn on_nodes(nodes: &[&str]) -> Self {
        Self {
            only: Some(nodes.iter().map(|n| n.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StepExecutor for FailingExecutor {
    async fn run(&self, invocation: &StepInvocation) -> Result<StepOutput, StepError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let fails = self
            .only
            .as_ref()
            .map_or(true, |nodes| nodes.contains(&invocation.node_key));
        if fails {
            Err(StepError::Failed(format!(
                "simulated failure in '{}'",
                invocation.node_key
            )))
        } else {
            Ok(StepOutput::new(json!({"node": invocation.node_key})))
        }
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Sleeps before answering and tracks how many invocations overlap
pub struct SlowExecutor {
    delay: Duration,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowExecutor {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StepExecutor for SlowExecutor {
    async fn run(&self, invocation: &StepInvocation) -> Result<StepOutput, StepError> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.running.fetch_sub(1, Ordering::SeqCst);
        Ok(StepOutput::new(json!({"node": invocation.node_key})))
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

/// Cancels a token while it runs, then succeeds
pub struct CancellingExecutor {
    token: CancellationToken,
}

impl CancellingExecutor {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl StepExecutor for CancellingExecutor {
    async fn run(&self, invocation: &StepInvocation) -> Result<StepOutput, StepError> {
        self.token.cancel();
        Ok(StepOutput::new(json!({"node": invocation.node_key})))
    }

    fn name(&self) -> &'static str {
        "cancelling"
    }
}

/// Panics inside the spawned task
pub struct PanickingExecutor;

#[async_trait]
impl StepExecutor for PanickingExecutor {
    async fn run(&self, invocation: &StepInvocation) -> Result<StepOutput, StepError> {
        panic!("executor for '{}' panicked", invocation.node_key);
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}
