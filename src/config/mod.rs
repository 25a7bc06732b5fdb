// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod seed;

pub mod consts;

pub use loader::{
    load_config, parse_config, ConfigFormat, EngineConfig, ExecutorOptions, SchemaOptions,
};
pub use seed::{
    load_seed, parse_seed, EdgeSeed, MetricsSeed, NodeSeed, PipelineSeed, PipelineVersionSeed,
    ProfileItemSeed, ProfileSeed, SchemaSeed, Seed, SeedSummary, StepSeed, StepVersionSeed,
};
