// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Step executor backends.
//!
//! # Available Backends
//!
//! ## Local Backend
//! In-process executors built by [`local::LocalExecutorFactory`] from a kind
//! name and an options map:
//! - **echo**: emits the merged node config as IR
//! - **static**: emits a fixed IR document
//! - **merge_upstream**: merges the IR of every predecessor
//!
//! ## Stub Backend (Test-Only)
//! Executors that record calls, fail on demand, sleep, cancel a run or panic.
//! Only compiled for tests.
//!
//! # Architecture
//!
//! ```text
//! Seed file → Factory → Executor instance → ExecutorMap → Orchestrator
//! ```

pub mod local;
#[cfg(test)]
pub mod stub;
