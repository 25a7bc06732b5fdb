// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! In-memory registries for pipelines, steps, IR schemas and metrics.
//!
//! [`Registry`] bundles the four stores and carries the operations that span
//! more than one of them, such as registering a schema against a step version
//! or refusing to delete a step version that still owns schemas.

pub mod activation;
pub mod metrics;
pub mod schemas;
pub mod versions;

pub use activation::{Activatable, ActivationTable};
pub use metrics::MetricRegistry;
pub use schemas::{MissingSchemaPolicy, SchemaRegistry, SchemaValidation};
pub use versions::{PipelineRegistry, StepRegistry, VersionRegistry};

use serde_json::Value;
use uuid::Uuid;

use crate::errors::RegistryError;
use crate::model::{DagPayload, IrSchema, PipelinePayload, PipelineVersion, StepVersion};

pub struct Registry {
    pipelines: PipelineRegistry,
    steps: StepRegistry,
    schemas: SchemaRegistry,
    metrics: MetricRegistry,
}

impl Registry {
    pub fn new(missing_schema: MissingSchemaPolicy) -> Self {
        Self {
            pipelines: PipelineRegistry::for_pipelines(),
            steps: StepRegistry::for_steps(),
            schemas: SchemaRegistry::new(missing_schema),
            metrics: MetricRegistry::new(),
        }
    }

    pub fn pipelines(&self) -> &PipelineRegistry {
        &self.pipelines
    }

    pub fn steps(&self) -> &StepRegistry {
        &self.steps
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub fn metrics(&self) -> &MetricRegistry {
        &self.metrics
    }

    /// Stores a pipeline version after checking that `dag` has the payload shape.
    /// Graph checks (cycles, unknown steps) happen when the version is compiled.
    pub fn create_pipeline_version(
        &self,
        definition_id: Uuid,
        label: &str,
        dag: Value,
        config: Value,
    ) -> Result<PipelineVersion, RegistryError> {
        DagPayload::from_value(&dag).map_err(|e| RegistryError::InvalidPayload {
            entity: "pipeline version",
            reason: e.to_string(),
        })?;
        if !(config.is_null() || config.is_object()) {
            return Err(RegistryError::InvalidPayload {
                entity: "pipeline version",
                reason: "config must be a JSON object".to_string(),
            });
        }

        self.pipelines
            .create_version(definition_id, label, PipelinePayload { dag, config })
    }

    pub fn register_schema(
        &self,
        step_version_id: Uuid,
        schema_version: &str,
        document: Value,
    ) -> Result<IrSchema, RegistryError> {
        let step_version = self.steps.get_version(step_version_id)?;
        self.schemas.register(&step_version, schema_version, document)
    }

    /// Deletes an inactive step version that owns no schemas.
    pub fn delete_step_version(&self, definition_id: Uuid, label: &str) -> Result<StepVersion, RegistryError> {
        let version = self.steps.find_version(definition_id, label)?;
        let dependents = self.schemas.count_for(version.id);
        if dependents > 0 {
            return Err(RegistryError::HasDependents {
                entity: "step version",
                name: version.label,
                dependents,
            });
        }
        self.steps.delete_version(definition_id, label)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(MissingSchemaPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::model::StepPayload;
    use serde_json::json;

    #[test]
    fn schemas_require_an_existing_step_version() {
        let registry = Registry::default();

        let error = registry
            .register_schema(Uuid::new_v4(), "v1", json!({"type": "object"}))
            .unwrap_err();

        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[test]
    fn step_versions_with_schemas_cannot_be_deleted() {
        let registry = Registry::default();
        let step = registry.steps().create_definition("ocr").unwrap();
        let version = registry
            .steps()
            .create_version(step.id, "1.0.0", StepPayload::default())
            .unwrap();
        registry
            .register_schema(version.id, "v1", json!({"type": "object"}))
            .unwrap();

        let error = registry.delete_step_version(step.id, "1.0.0").unwrap_err();
        assert_eq!(error.code(), ErrorCode::Conflict);

        registry.schemas().delete(version.id, "v1").unwrap();
        registry.delete_step_version(step.id, "1.0.0").unwrap();
    }

    #[test]
    fn pipeline_versions_need_a_dag_payload() {
        let registry = Registry::default();
        let pipeline = registry.pipelines().create_definition("intake").unwrap();

        let error = registry
            .create_pipeline_version(pipeline.id, "v1", json!({"steps": []}), json!({}))
            .unwrap_err();

        assert_eq!(error.code(), ErrorCode::InvalidConfig);
    }
}
