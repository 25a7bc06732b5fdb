// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Versioned pipeline and step registry with a DAG execution engine.
//!
//! Pipelines and steps are registered as definitions with labelled versions,
//! exactly one of which may be active. A pipeline version stores a DAG of
//! step versions; the compiler turns it into an ordered plan and the
//! orchestrator runs the plan, validating every step's IR against the step's
//! active JSON schema and scoring runs against metric profiles.

pub mod backends;      // step executors
pub mod compiler;      // DAG payload -> execution plan
pub mod config;        // engine config + registry seeds
pub mod engine;        // orchestrator and run records
pub mod errors;        // error handling
pub mod metrics;       // aggregation and profile scoring
pub mod model;         // registry and run entities
pub mod observability;
pub mod registry;      // versions, schemas, metric profiles
pub mod traits;        // executor and metric source seams
