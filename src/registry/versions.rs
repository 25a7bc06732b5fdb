// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Definitions and their versions for pipelines and steps.
//!
//! A definition is a stable identity with a case-insensitively unique name. Its
//! versions carry the payload (a DAG for pipelines, a default config for steps)
//! and take part in exclusive activation through [`ActivationTable`].

use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::activation::ActivationTable;
use crate::errors::RegistryError;
use crate::model::{Definition, PipelinePayload, StepPayload, Version};
use crate::observability::messages::registry::{Activated, Deactivated, Registered};
use crate::observability::messages::StructuredLog;

/// Registry of pipeline definitions and pipeline versions.
pub type PipelineRegistry = VersionRegistry<PipelinePayload>;

/// Registry of step definitions and step versions.
pub type StepRegistry = VersionRegistry<StepPayload>;

pub struct VersionRegistry<P> {
    definition_entity: &'static str,
    version_entity: &'static str,
    definitions: RwLock<Vec<Definition>>,
    versions: RwLock<ActivationTable<Version<P>>>,
}

impl VersionRegistry<PipelinePayload> {
    pub fn for_pipelines() -> Self {
        Self::new("pipeline definition", "pipeline version")
    }
}

impl VersionRegistry<StepPayload> {
    pub fn for_steps() -> Self {
        Self::new("step definition", "step version")
    }
}

impl<P: Clone> VersionRegistry<P> {
    fn new(definition_entity: &'static str, version_entity: &'static str) -> Self {
        Self {
            definition_entity,
            version_entity,
            definitions: RwLock::new(Vec::new()),
            versions: RwLock::new(ActivationTable::new(version_entity)),
        }
    }

    pub fn create_definition(&self, name: &str) -> Result<Definition, RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::InvalidPayload {
                entity: self.definition_entity,
                reason: "name must not be empty".to_string(),
            });
        }

        let mut definitions = self.definitions.write();
        if definitions
            .iter()
            .any(|d| d.name.eq_ignore_ascii_case(name))
        {
            return Err(RegistryError::DuplicateName {
                entity: self.definition_entity,
                name: name.to_string(),
            });
        }

        let definition = Definition {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        definitions.push(definition.clone());

        Registered {
            entity: self.definition_entity,
            name: &definition.name,
            id: &definition.id.to_string(),
        }
        .log();

        Ok(definition)
    }

    pub fn get_definition(&self, id: Uuid) -> Result<Definition, RegistryError> {
        self.definitions
            .read()
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| RegistryError::not_found(self.definition_entity, id))
    }

    /// Looks a definition up by name, ignoring case.
    pub fn find_definition(&self, name: &str) -> Result<Definition, RegistryError> {
        let name = name.trim();
        self.definitions
            .read()
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| RegistryError::not_found(self.definition_entity, name))
    }

    pub fn list_definitions(&self) -> Vec<Definition> {
        self.definitions.read().clone()
    }

    /// Deletes a definition that has no versions left.
    pub fn delete_definition(&self, id: Uuid) -> Result<Definition, RegistryError> {
        let mut definitions = self.definitions.write();
        let position = definitions
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| RegistryError::not_found(self.definition_entity, id))?;

        let dependents = self.versions.read().siblings(&id).count();
        if dependents > 0 {
            return Err(RegistryError::HasDependents {
                entity: self.definition_entity,
                name: definitions[position].name.clone(),
                dependents,
            });
        }

        Ok(definitions.remove(position))
    }

    /// Stores a new, inactive version under an existing definition.
    pub fn create_version(
        &self,
        definition_id: Uuid,
        label: &str,
        payload: P,
    ) -> Result<Version<P>, RegistryError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(RegistryError::InvalidPayload {
                entity: self.version_entity,
                reason: "version label must not be empty".to_string(),
            });
        }

        let definitions = self.definitions.read();
        let definition = definitions
            .iter()
            .find(|d| d.id == definition_id)
            .ok_or_else(|| RegistryError::not_found(self.definition_entity, definition_id))?;

        let version = self.versions.write().insert(Version {
            id: Uuid::new_v4(),
            definition_id,
            label: label.to_string(),
            payload,
            is_active: false,
            created_at: Utc::now(),
        })?;

        Registered {
            entity: self.version_entity,
            name: &format!("{}@{}", definition.name, version.label),
            id: &version.id.to_string(),
        }
        .log();

        Ok(version)
    }

    pub fn get_version(&self, version_id: Uuid) -> Result<Version<P>, RegistryError> {
        let versions = self.versions.read();
        versions
            .by_id(version_id)
            .cloned()
            .ok_or_else(|| RegistryError::not_found(versions.entity(), version_id))
    }

    pub fn find_version(&self, definition_id: Uuid, label: &str) -> Result<Version<P>, RegistryError> {
        self.versions.read().require(&definition_id, label).cloned()
    }

    pub fn list_versions(&self, definition_id: Uuid) -> Result<Vec<Version<P>>, RegistryError> {
        self.get_definition(definition_id)?;
        Ok(self.versions.read().siblings(&definition_id).cloned().collect())
    }

    /// Makes `label` the only active version of its definition.
    pub fn activate(&self, definition_id: Uuid, label: &str) -> Result<Version<P>, RegistryError> {
        let activated = {
            let mut versions = self.versions.write();
            versions.activate(&definition_id, label)?
        };

        Activated {
            entity: self.version_entity,
            parent: &definition_id.to_string(),
            label: &activated.label,
        }
        .log();

        Ok(activated)
    }

    pub fn deactivate(&self, definition_id: Uuid, label: &str) -> Result<Version<P>, RegistryError> {
        let deactivated = self.versions.write().deactivate(&definition_id, label)?;

        Deactivated {
            entity: self.version_entity,
            parent: &definition_id.to_string(),
            label: &deactivated.label,
        }
        .log();

        Ok(deactivated)
    }

    pub fn delete_version(&self, definition_id: Uuid, label: &str) -> Result<Version<P>, RegistryError> {
        self.versions.write().remove(&definition_id, label)
    }

    pub fn get_active(&self, definition_id: Uuid) -> Result<Version<P>, RegistryError> {
        let versions = self.versions.read();
        versions
            .active(&definition_id)
            .cloned()
            .ok_or_else(|| RegistryError::NoActive {
                entity: versions.entity(),
                parent: definition_id.to_string(),
            })
    }

    /// Returns a version together with the definition it belongs to.
    pub fn resolve(&self, version_id: Uuid) -> Result<(Definition, Version<P>), RegistryError> {
        let version = self.get_version(version_id)?;
        let definition = self.get_definition(version.definition_id)?;
        Ok((definition, version))
    }
}
