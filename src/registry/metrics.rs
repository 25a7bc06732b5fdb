// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Metric definitions and weighted metric profiles.
//!
//! Profiles are keyed by name within a [`MetricScope`]; at most one profile per
//! scope is active, and that profile decides which metrics the evaluator
//! records for a run.

use parking_lot::RwLock;
use uuid::Uuid;

use super::activation::ActivationTable;
use crate::errors::RegistryError;
use crate::model::{
    MetricDefinition, MetricProfile, MetricProfileItem, MetricScope, NewMetricDefinition,
};
use crate::observability::messages::registry::{Activated, Deactivated, Registered};
use crate::observability::messages::StructuredLog;

const DEFINITION: &str = "metric definition";
const PROFILE: &str = "metric profile";
const PROFILE_ITEM: &str = "metric profile item";

pub struct MetricRegistry {
    definitions: RwLock<Vec<MetricDefinition>>,
    profiles: RwLock<ActivationTable<MetricProfile>>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self {
            definitions: RwLock::new(Vec::new()),
            profiles: RwLock::new(ActivationTable::new(PROFILE)),
        }
    }

    pub fn create_definition(&self, new: NewMetricDefinition) -> Result<MetricDefinition, RegistryError> {
        let key = new.key.trim();
        if key.is_empty() {
            return Err(RegistryError::InvalidPayload {
                entity: DEFINITION,
                reason: "metric key must not be empty".to_string(),
            });
        }
        if new.target.is_some_and(|t| !t.is_finite()) {
            return Err(RegistryError::InvalidPayload {
                entity: DEFINITION,
                reason: format!("target of '{key}' must be a finite number"),
            });
        }

        let mut definitions = self.definitions.write();
        if definitions.iter().any(|d| d.key == key) {
            return Err(RegistryError::DuplicateName {
                entity: DEFINITION,
                name: key.to_string(),
            });
        }

        let definition = MetricDefinition {
            id: Uuid::new_v4(),
            key: key.to_string(),
            aggregation: new.aggregation,
            target: new.target,
            scope: new.scope,
            comparison: new.comparison,
            description: new.description,
        };
        definitions.push(definition.clone());

        Registered {
            entity: DEFINITION,
            name: &definition.key,
            id: &definition.id.to_string(),
        }
        .log();

        Ok(definition)
    }

    pub fn definition(&self, key: &str) -> Result<MetricDefinition, RegistryError> {
        self.definitions
            .read()
            .iter()
            .find(|d| d.key == key)
            .cloned()
            .ok_or_else(|| RegistryError::not_found(DEFINITION, key))
    }

    pub fn list_definitions(&self) -> Vec<MetricDefinition> {
        self.definitions.read().clone()
    }

    /// Deletes a definition no profile item refers to.
    pub fn delete_definition(&self, key: &str) -> Result<MetricDefinition, RegistryError> {
        let mut definitions = self.definitions.write();
        let position = definitions
            .iter()
            .position(|d| d.key == key)
            .ok_or_else(|| RegistryError::not_found(DEFINITION, key))?;

        let dependents = self
            .profiles
            .read()
            .rows()
            .flat_map(|p| p.items.iter())
            .filter(|item| item.metric_key == key)
            .count();
        if dependents > 0 {
            return Err(RegistryError::HasDependents {
                entity: DEFINITION,
                name: key.to_string(),
                dependents,
            });
        }

        Ok(definitions.remove(position))
    }

    pub fn create_profile(&self, name: &str, scope: MetricScope) -> Result<MetricProfile, RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::InvalidPayload {
                entity: PROFILE,
                reason: "profile name must not be empty".to_string(),
            });
        }

        let profile = self.profiles.write().insert(MetricProfile {
            id: Uuid::new_v4(),
            name: name.to_string(),
            scope,
            is_active: false,
            items: Vec::new(),
        })?;

        Registered {
            entity: PROFILE,
            name: &profile.name,
            id: &profile.id.to_string(),
        }
        .log();

        Ok(profile)
    }

    /// Adds a weighted metric to a profile. The key need not have a definition
    /// yet; the evaluator skips keys it cannot resolve.
    pub fn add_profile_item(
        &self,
        scope: MetricScope,
        profile: &str,
        metric_key: &str,
        weight: f64,
        threshold: Option<f64>,
    ) -> Result<MetricProfileItem, RegistryError> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(RegistryError::InvalidPayload {
                entity: PROFILE_ITEM,
                reason: format!("weight of '{metric_key}' must be a positive number"),
            });
        }

        let mut profiles = self.profiles.write();
        let id = profiles.require(&scope, profile)?.id;
        let row = profiles
            .by_id_mut(id)
            .ok_or_else(|| RegistryError::not_found(PROFILE, profile))?;

        if row.items.iter().any(|item| item.metric_key == metric_key) {
            return Err(RegistryError::DuplicateName {
                entity: PROFILE_ITEM,
                name: metric_key.to_string(),
            });
        }

        let item = MetricProfileItem {
            id: Uuid::new_v4(),
            metric_key: metric_key.to_string(),
            weight,
            threshold,
        };
        row.items.push(item.clone());
        Ok(item)
    }

    pub fn remove_profile_item(
        &self,
        scope: MetricScope,
        profile: &str,
        metric_key: &str,
    ) -> Result<MetricProfileItem, RegistryError> {
        let mut profiles = self.profiles.write();
        let id = profiles.require(&scope, profile)?.id;
        let row = profiles
            .by_id_mut(id)
            .ok_or_else(|| RegistryError::not_found(PROFILE, profile))?;

        let position = row
            .items
            .iter()
            .position(|item| item.metric_key == metric_key)
            .ok_or_else(|| RegistryError::not_found(PROFILE_ITEM, metric_key))?;
        Ok(row.items.remove(position))
    }

    pub fn activate_profile(&self, scope: MetricScope, name: &str) -> Result<MetricProfile, RegistryError> {
        let profile = self.profiles.write().activate(&scope, name)?;
        Activated {
            entity: PROFILE,
            parent: &scope.to_string(),
            label: &profile.name,
        }
        .log();
        Ok(profile)
    }

    pub fn deactivate_profile(&self, scope: MetricScope, name: &str) -> Result<MetricProfile, RegistryError> {
        let profile = self.profiles.write().deactivate(&scope, name)?;
        Deactivated {
            entity: PROFILE,
            parent: &scope.to_string(),
            label: &profile.name,
        }
        .log();
        Ok(profile)
    }

    pub fn delete_profile(&self, scope: MetricScope, name: &str) -> Result<MetricProfile, RegistryError> {
        self.profiles.write().remove(&scope, name)
    }

    pub fn active_profile(&self, scope: MetricScope) -> Option<MetricProfile> {
        self.profiles.read().active(&scope).cloned()
    }

    pub fn profile(&self, scope: MetricScope, name: &str) -> Result<MetricProfile, RegistryError> {
        self.profiles.read().require(&scope, name).cloned()
    }

    pub fn list_profiles(&self, scope: MetricScope) -> Vec<MetricProfile> {
        self.profiles.read().siblings(&scope).cloned().collect()
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::model::{Aggregation, Comparison};

    fn new_definition(key: &str) -> NewMetricDefinition {
        NewMetricDefinition {
            key: key.to_string(),
            aggregation: Aggregation::Avg,
            target: Some(0.9),
            scope: MetricScope::Step,
            comparison: Comparison::AtLeast,
            description: None,
        }
    }

    #[test]
    fn metric_keys_are_unique() {
        let registry = MetricRegistry::new();
        registry.create_definition(new_definition("ir_valid")).unwrap();

        let error = registry.create_definition(new_definition("ir_valid")).unwrap_err();

        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[test]
    fn one_active_profile_per_scope() {
        let registry = MetricRegistry::new();
        registry.create_profile("strict", MetricScope::Step).unwrap();
        registry.create_profile("lenient", MetricScope::Step).unwrap();
        registry.create_profile("strict", MetricScope::Pipeline).unwrap();

        registry.activate_profile(MetricScope::Step, "strict").unwrap();
        registry.activate_profile(MetricScope::Pipeline, "strict").unwrap();
        registry.activate_profile(MetricScope::Step, "lenient").unwrap();

        assert_eq!(registry.active_profile(MetricScope::Step).unwrap().name, "lenient");
        assert_eq!(registry.active_profile(MetricScope::Pipeline).unwrap().name, "strict");
        let active_step = registry
            .list_profiles(MetricScope::Step)
            .into_iter()
            .filter(|p| p.is_active)
            .count();
        assert_eq!(active_step, 1);
    }

    #[test]
    fn profile_items_reject_duplicates_and_bad_weights() {
        let registry = MetricRegistry::new();
        registry.create_profile("strict", MetricScope::Step).unwrap();
        registry
            .add_profile_item(MetricScope::Step, "strict", "ir_valid", 2.0, None)
            .unwrap();

        let duplicate = registry
            .add_profile_item(MetricScope::Step, "strict", "ir_valid", 1.0, None)
            .unwrap_err();
        let zero_weight = registry
            .add_profile_item(MetricScope::Step, "strict", "ir_bytes", 0.0, None)
            .unwrap_err();

        assert_eq!(duplicate.code(), ErrorCode::Conflict);
        assert_eq!(zero_weight.code(), ErrorCode::InvalidConfig);
        assert_eq!(registry.profile(MetricScope::Step, "strict").unwrap().items.len(), 1);
    }

    #[test]
    fn referenced_definitions_cannot_be_deleted() {
        let registry = MetricRegistry::new();
        registry.create_definition(new_definition("ir_valid")).unwrap();
        registry.create_profile("strict", MetricScope::Step).unwrap();
        registry
            .add_profile_item(MetricScope::Step, "strict", "ir_valid", 1.0, None)
            .unwrap();

        let error = registry.delete_definition("ir_valid").unwrap_err();
        assert_eq!(error.code(), ErrorCode::Conflict);

        registry
            .remove_profile_item(MetricScope::Step, "strict", "ir_valid")
            .unwrap();
        registry.delete_definition("ir_valid").unwrap();
        assert!(registry.list_definitions().is_empty());
    }

    #[test]
    fn active_profile_cannot_be_deleted() {
        let registry = MetricRegistry::new();
        registry.create_profile("strict", MetricScope::Pipeline).unwrap();
        registry.activate_profile(MetricScope::Pipeline, "strict").unwrap();

        let error = registry
            .delete_profile(MetricScope::Pipeline, "strict")
            .unwrap_err();

        assert_eq!(error.code(), ErrorCode::Conflict);
    }
}
