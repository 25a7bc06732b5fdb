// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Versioned IR JSON-Schemas scoped to a step version.
//!
//! Schemas follow the same activation contract as pipeline and step versions.
//! Documents are compiled once at registration; a document that does not
//! compile is rejected and never stored.

use chrono::Utc;
use jsonschema::Validator;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::activation::ActivationTable;
use crate::errors::RegistryError;
use crate::model::{IrSchema, StepVersion};
use crate::observability::messages::registry::{
    Activated, Deactivated, Registered, SchemaMissing, ValidationFailed,
};
use crate::observability::messages::StructuredLog;

const ENTITY: &str = "IR schema";

/// What validation does when a step version has no schema to check against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSchemaPolicy {
    /// Accept the payload and record a warning.
    #[default]
    Permissive,
    /// Mark the payload invalid.
    Reject,
}

/// Outcome of validating one payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub schema_version: Option<String>,
    pub warning: Option<String>,
}

pub struct SchemaRegistry {
    policy: MissingSchemaPolicy,
    schemas: RwLock<SchemaTable>,
}

/// Schema rows and their compiled validators, always changed together.
struct SchemaTable {
    rows: ActivationTable<IrSchema>,
    validators: HashMap<Uuid, Arc<Validator>>,
}

impl SchemaRegistry {
    pub fn new(policy: MissingSchemaPolicy) -> Self {
        Self {
            policy,
            schemas: RwLock::new(SchemaTable {
                rows: ActivationTable::new(ENTITY),
                validators: HashMap::new(),
            }),
        }
    }

    pub fn policy(&self) -> MissingSchemaPolicy {
        self.policy
    }

    /// Compiles and stores `document` as `schema_version` of `step_version`.
    pub fn register(
        &self,
        step_version: &StepVersion,
        schema_version: &str,
        document: Value,
    ) -> Result<IrSchema, RegistryError> {
        let schema_version = schema_version.trim();
        if schema_version.is_empty() {
            return Err(RegistryError::InvalidPayload {
                entity: ENTITY,
                reason: "schema version must not be empty".to_string(),
            });
        }

        let validator =
            jsonschema::validator_for(&document).map_err(|e| RegistryError::InvalidSchema {
                label: schema_version.to_string(),
                reason: e.to_string(),
            })?;

        let schema = {
            let mut table = self.schemas.write();
            let schema = table.rows.insert(IrSchema {
                id: Uuid::new_v4(),
                step_version_id: step_version.id,
                schema_version: schema_version.to_string(),
                document,
                is_active: false,
                created_at: Utc::now(),
            })?;
            table.validators.insert(schema.id, Arc::new(validator));
            schema
        };

        Registered {
            entity: ENTITY,
            name: &schema.schema_version,
            id: &schema.id.to_string(),
        }
        .log();

        Ok(schema)
    }

    pub fn activate(&self, step_version_id: Uuid, schema_version: &str) -> Result<IrSchema, RegistryError> {
        let schema = self.schemas.write().rows.activate(&step_version_id, schema_version)?;
        Activated {
            entity: ENTITY,
            parent: &step_version_id.to_string(),
            label: &schema.schema_version,
        }
        .log();
        Ok(schema)
    }

    pub fn deactivate(&self, step_version_id: Uuid, schema_version: &str) -> Result<IrSchema, RegistryError> {
        let schema = self.schemas.write().rows.deactivate(&step_version_id, schema_version)?;
        Deactivated {
            entity: ENTITY,
            parent: &step_version_id.to_string(),
            label: &schema.schema_version,
        }
        .log();
        Ok(schema)
    }

    pub fn delete(&self, step_version_id: Uuid, schema_version: &str) -> Result<IrSchema, RegistryError> {
        let mut table = self.schemas.write();
        let schema = table.rows.remove(&step_version_id, schema_version)?;
        table.validators.remove(&schema.id);
        Ok(schema)
    }

    pub fn get_active(&self, step_version_id: Uuid) -> Result<IrSchema, RegistryError> {
        self.schemas
            .read()
            .rows
            .active(&step_version_id)
            .cloned()
            .ok_or_else(|| RegistryError::NoActive {
                entity: ENTITY,
                parent: step_version_id.to_string(),
            })
    }

    pub fn find(&self, step_version_id: Uuid, schema_version: &str) -> Result<IrSchema, RegistryError> {
        self.schemas
            .read()
            .rows
            .require(&step_version_id, schema_version)
            .cloned()
    }

    pub fn list(&self, step_version_id: Uuid) -> Vec<IrSchema> {
        self.schemas.read().rows.siblings(&step_version_id).cloned().collect()
    }

    pub fn count_for(&self, step_version_id: Uuid) -> usize {
        self.schemas.read().rows.siblings(&step_version_id).count()
    }

    /// Picks the schema a payload is checked against: the pinned version when
    /// given, otherwise the active one. An unknown pinned version is `NotFound`.
    pub fn resolve(
        &self,
        step_version_id: Uuid,
        pinned: Option<&str>,
    ) -> Result<Option<IrSchema>, RegistryError> {
        let table = self.schemas.read();
        Self::pick(&table, step_version_id, pinned).map(|found| found.map(|(schema, _)| schema))
    }

    /// Validates `payload` for a step version.
    pub fn validate(
        &self,
        step_version_id: Uuid,
        payload: &Value,
        pinned: Option<&str>,
    ) -> Result<SchemaValidation, RegistryError> {
        // Row and validator come from one read guard, so a schema visible to
        // a lookup always has its validator.
        let table = self.schemas.read();
        let picked = Self::pick(&table, step_version_id, pinned)?;
        drop(table);
        let Some((schema, validator)) = picked else {
            return Ok(self.missing_schema(step_version_id));
        };

        let errors: Vec<String> = validator
            .iter_errors(payload)
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{path}: {e}")
                }
            })
            .collect();

        if !errors.is_empty() {
            ValidationFailed {
                step_version_id: &step_version_id.to_string(),
                schema_version: &schema.schema_version,
                error_count: errors.len(),
            }
            .log();
        }

        Ok(SchemaValidation {
            is_valid: errors.is_empty(),
            errors,
            schema_version: Some(schema.schema_version),
            warning: None,
        })
    }

    fn pick(
        table: &SchemaTable,
        step_version_id: Uuid,
        pinned: Option<&str>,
    ) -> Result<Option<(IrSchema, Arc<Validator>)>, RegistryError> {
        let schema = match pinned {
            Some(label) => Some(table.rows.require(&step_version_id, label)?),
            None => table.rows.active(&step_version_id),
        };
        let Some(schema) = schema else {
            return Ok(None);
        };
        let validator = table
            .validators
            .get(&schema.id)
            .cloned()
            .ok_or_else(|| RegistryError::not_found(ENTITY, schema.id))?;
        Ok(Some((schema.clone(), validator)))
    }

    fn missing_schema(&self, step_version_id: Uuid) -> SchemaValidation {
        let rejected = self.policy == MissingSchemaPolicy::Reject;
        SchemaMissing {
            step_version_id: &step_version_id.to_string(),
            rejected,
        }
        .log();

        let message = format!("no active IR schema for step version {step_version_id}");
        if rejected {
            SchemaValidation {
                is_valid: false,
                errors: vec![message],
                schema_version: None,
                warning: None,
            }
        } else {
            SchemaValidation {
                is_valid: true,
                errors: Vec::new(),
                schema_version: None,
                warning: Some(message),
            }
        }
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new(MissingSchemaPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::model::{StepPayload, Version};
    use serde_json::json;

    fn step_version() -> StepVersion {
        Version {
            id: Uuid::new_v4(),
            definition_id: Uuid::new_v4(),
            label: "1.0.0".to_string(),
            payload: StepPayload::default(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn invoice_schema() -> Value {
        json!({
            "type": "object",
            "required": ["total"],
            "properties": {"total": {"type": "number"}}
        })
    }

    #[test]
    fn uncompilable_schema_is_rejected() {
        let registry = SchemaRegistry::default();

        let error = registry
            .register(&step_version(), "v1", json!({"type": 12}))
            .unwrap_err();

        assert_eq!(error.code(), ErrorCode::InvalidSchema);
    }

    #[test]
    fn duplicate_schema_version_conflicts() {
        let registry = SchemaRegistry::default();
        let step = step_version();
        registry.register(&step, "v1", invoice_schema()).unwrap();

        let error = registry.register(&step, "v1", invoice_schema()).unwrap_err();

        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[test]
    fn validation_uses_the_active_schema() {
        let registry = SchemaRegistry::default();
        let step = step_version();
        registry.register(&step, "v1", invoice_schema()).unwrap();
        registry.activate(step.id, "v1").unwrap();

        let valid = registry.validate(step.id, &json!({"total": 12.5}), None).unwrap();
        let invalid = registry.validate(step.id, &json!({"total": "twelve"}), None).unwrap();

        assert!(valid.is_valid);
        assert_eq!(valid.schema_version.as_deref(), Some("v1"));
        assert!(!invalid.is_valid);
        assert!(!invalid.errors.is_empty());
        assert!(invalid.errors[0].starts_with("/total"));
    }

    #[test]
    fn pinned_schema_wins_over_active() {
        let registry = SchemaRegistry::default();
        let step = step_version();
        registry.register(&step, "v1", invoice_schema()).unwrap();
        registry.register(&step, "v2", json!({"type": "array"})).unwrap();
        registry.activate(step.id, "v2").unwrap();

        let result = registry.validate(step.id, &json!({"total": 1}), Some("v1")).unwrap();

        assert!(result.is_valid);
        assert_eq!(result.schema_version.as_deref(), Some("v1"));
    }

    #[test]
    fn unknown_pinned_schema_is_not_found() {
        let registry = SchemaRegistry::default();
        let step = step_version();

        let error = registry.validate(step.id, &json!({}), Some("v9")).unwrap_err();

        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[test]
    fn missing_schema_follows_policy() {
        let step = step_version();

        let permissive = SchemaRegistry::new(MissingSchemaPolicy::Permissive)
            .validate(step.id, &json!({"anything": true}), None)
            .unwrap();
        let reject = SchemaRegistry::new(MissingSchemaPolicy::Reject)
            .validate(step.id, &json!({"anything": true}), None)
            .unwrap();

        assert!(permissive.is_valid);
        assert!(permissive.warning.is_some());
        assert!(!reject.is_valid);
        assert_eq!(reject.errors.len(), 1);
    }

    #[test]
    fn inactive_schemas_are_not_used_implicitly() {
        let registry = SchemaRegistry::new(MissingSchemaPolicy::Permissive);
        let step = step_version();
        registry.register(&step, "v1", invoice_schema()).unwrap();

        let result = registry.validate(step.id, &json!({"total": "x"}), None).unwrap();

        assert!(result.is_valid);
        assert!(result.warning.is_some());
        assert!(result.schema_version.is_none());
    }

    #[test]
    fn pinned_schema_is_usable_as_soon_as_it_is_visible() {
        let registry = SchemaRegistry::default();
        let step = step_version();
        let labels: Vec<String> = (0..200).map(|i| format!("v{i}")).collect();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for label in &labels {
                    registry.register(&step, label, invoice_schema()).unwrap();
                }
            });
            scope.spawn(|| {
                for label in &labels {
                    while registry.find(step.id, label).is_err() {
                        std::thread::yield_now();
                    }
                    let result = registry
                        .validate(step.id, &json!({"total": 1}), Some(label))
                        .unwrap();
                    assert!(result.is_valid);
                }
            });
        });
    }
}
