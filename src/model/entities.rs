// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::ConfigMap;

/// A pipeline or step definition: a stable identity plus a unique name.
/// Definitions are never versioned themselves.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One version of a definition. At most one version per definition is active.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Version<P> {
    pub id: Uuid,
    pub definition_id: Uuid,
    pub label: String,
    pub payload: P,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload of a pipeline version. `dag` stays the loosely typed stored JSON;
/// the compiler checks it when a run is planned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelinePayload {
    pub dag: Value,
    pub config: Value,
}

/// Payload of a step version.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepPayload {
    pub default_config: ConfigMap,
}

impl StepPayload {
    pub fn new(default_config: ConfigMap) -> Self {
        Self { default_config }
    }
}

pub type PipelineVersion = Version<PipelinePayload>;
pub type StepVersion = Version<StepPayload>;

/// A versioned IR JSON-Schema scoped to one step version.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrSchema {
    pub id: Uuid,
    pub step_version_id: Uuid,
    pub schema_version: String,
    pub document: Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
