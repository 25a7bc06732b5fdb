// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod orchestrator;
pub mod report;
pub mod request;
pub mod run_store;

pub use orchestrator::Orchestrator;
pub use report::{DryRunReport, ExecutionOutcome, RunReport};
pub use request::ExecutionRequest;
pub use run_store::{RunStore, StoreCounts};
