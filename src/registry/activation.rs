// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Exclusive activation shared by pipeline versions, step versions, IR schemas
//! and metric profiles.
//!
//! Every activatable row belongs to a parent scope (a definition id, a step
//! version id, a metric scope). Within one parent, at most one row is active.
//! [`ActivationTable`] holds the rows and performs the swap; registries keep it
//! behind a single `RwLock`, so an activation is one read-modify-write under the
//! write guard and readers never observe zero or two active rows mid-swap.

use std::fmt::Display;
use uuid::Uuid;

use crate::errors::RegistryError;
use crate::model::{IrSchema, MetricProfile, MetricScope, Version};

/// A row taking part in exclusive activation within its parent scope.
pub trait Activatable: Clone {
    type Parent: PartialEq + Display;

    fn id(&self) -> Uuid;
    fn parent(&self) -> &Self::Parent;
    fn label(&self) -> &str;
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);
}

/// Rows of one entity kind, kept in insertion order.
#[derive(Debug, Clone)]
pub struct ActivationTable<T> {
    entity: &'static str,
    rows: Vec<T>,
}

impl<T: Activatable> ActivationTable<T> {
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            rows: Vec::new(),
        }
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    /// Inserts a row, rejecting a label already used under the same parent.
    pub fn insert(&mut self, row: T) -> Result<T, RegistryError> {
        if self.find(row.parent(), row.label()).is_some() {
            return Err(RegistryError::DuplicateLabel {
                entity: self.entity,
                parent: row.parent().to_string(),
                label: row.label().to_string(),
            });
        }
        self.rows.push(row.clone());
        Ok(row)
    }

    pub fn rows(&self) -> impl Iterator<Item = &T> {
        self.rows.iter()
    }

    pub fn siblings<'a, 'p>(&'a self, parent: &'p T::Parent) -> impl Iterator<Item = &'a T> + 'p
    where
        'a: 'p,
    {
        self.rows.iter().filter(move |row| row.parent() == parent)
    }

    pub fn by_id(&self, id: Uuid) -> Option<&T> {
        self.rows.iter().find(|row| row.id() == id)
    }

    pub fn by_id_mut(&mut self, id: Uuid) -> Option<&mut T> {
        self.rows.iter_mut().find(|row| row.id() == id)
    }

    pub fn find(&self, parent: &T::Parent, label: &str) -> Option<&T> {
        self.rows
            .iter()
            .find(|row| row.parent() == parent && row.label() == label)
    }

    /// Like [`find`](Self::find) but reports a missing row as `NotFound`.
    pub fn require(&self, parent: &T::Parent, label: &str) -> Result<&T, RegistryError> {
        self.find(parent, label)
            .ok_or_else(|| RegistryError::not_found(self.entity, format!("{parent}/{label}")))
    }

    pub fn active(&self, parent: &T::Parent) -> Option<&T> {
        self.rows
            .iter()
            .find(|row| row.parent() == parent && row.is_active())
    }

    /// Activates `label` and deactivates every sibling. The target is checked
    /// first, so a missing label leaves the table untouched.
    pub fn activate(&mut self, parent: &T::Parent, label: &str) -> Result<T, RegistryError> {
        self.require(parent, label)?;

        let mut activated = None;
        for row in self.rows.iter_mut().filter(|row| row.parent() == parent) {
            let is_target = row.label() == label;
            row.set_active(is_target);
            if is_target {
                activated = Some(row.clone());
            }
        }

        activated.ok_or_else(|| RegistryError::not_found(self.entity, label))
    }

    /// Deactivates `label`. The parent may be left without an active row.
    pub fn deactivate(&mut self, parent: &T::Parent, label: &str) -> Result<T, RegistryError> {
        let entity = self.entity;
        let row = self
            .rows
            .iter_mut()
            .find(|row| row.parent() == parent && row.label() == label)
            .ok_or_else(|| RegistryError::not_found(entity, format!("{parent}/{label}")))?;
        row.set_active(false);
        Ok(row.clone())
    }

    /// Removes an inactive row. Active rows are a `Conflict`.
    pub fn remove(&mut self, parent: &T::Parent, label: &str) -> Result<T, RegistryError> {
        let position = self
            .rows
            .iter()
            .position(|row| row.parent() == parent && row.label() == label)
            .ok_or_else(|| RegistryError::not_found(self.entity, format!("{parent}/{label}")))?;

        if self.rows[position].is_active() {
            return Err(RegistryError::DeleteActive {
                entity: self.entity,
                label: label.to_string(),
            });
        }

        Ok(self.rows.remove(position))
    }
}

impl<P: Clone> Activatable for Version<P> {
    type Parent = Uuid;

    fn id(&self) -> Uuid {
        self.id
    }

    fn parent(&self) -> &Uuid {
        &self.definition_id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }
}

impl Activatable for IrSchema {
    type Parent = Uuid;

    fn id(&self) -> Uuid {
        self.id
    }

    fn parent(&self) -> &Uuid {
        &self.step_version_id
    }

    fn label(&self) -> &str {
        &self.schema_version
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }
}

impl Activatable for MetricProfile {
    type Parent = MetricScope;

    fn id(&self) -> Uuid {
        self.id
    }

    fn parent(&self) -> &MetricScope {
        &self.scope
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StepPayload;
    use chrono::Utc;

    fn version(definition_id: Uuid, label: &str) -> Version<StepPayload> {
        Version {
            id: Uuid::new_v4(),
            definition_id,
            label: label.to_string(),
            payload: StepPayload::default(),
            is_active: false,
            created_at: Utc::now(),
        }
    }

    fn active_labels(table: &ActivationTable<Version<StepPayload>>, parent: &Uuid) -> Vec<String> {
        table
            .siblings(parent)
            .filter(|row| row.is_active)
            .map(|row| row.label.clone())
            .collect()
    }

    #[test]
    fn activation_is_exclusive_per_parent() {
        let parent = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut table = ActivationTable::new("step version");
        for label in ["v1", "v2", "v3"] {
            table.insert(version(parent, label)).unwrap();
        }
        table.insert(version(other, "v1")).unwrap();
        table.activate(&other, "v1").unwrap();

        for label in ["v1", "v3", "v2", "v2", "v1"] {
            table.activate(&parent, label).unwrap();
            assert_eq!(active_labels(&table, &parent), vec![label.to_string()]);
        }

        assert_eq!(active_labels(&table, &other), vec!["v1".to_string()]);
    }

    fn active_of(table: &ActivationTable<Version<StepPayload>>, parent: Uuid) -> Option<&Version<StepPayload>> {
        table.active(&parent)
    }

    fn find_of<'t>(table: &'t ActivationTable<Version<StepPayload>>, parent: Uuid, label: &str) -> Option<&'t Version<StepPayload>> {
        table.find(&parent, label)
    }

    #[test]
    fn lookups_outlive_the_parent_key() {
        let parent = Uuid::new_v4();
        let mut table = ActivationTable::new("step version");
        table.insert(version(parent, "v1")).unwrap();
        table.insert(version(parent, "v2")).unwrap();
        table.activate(&parent, "v2").unwrap();

        let active = active_of(&table, parent).unwrap();
        let found = find_of(&table, parent, "v1").unwrap();

        assert_eq!(active.label, "v2");
        assert_eq!(found.label, "v1");
        assert!(find_of(&table, Uuid::new_v4(), "v1").is_none());
    }

    #[test]
    fn activating_unknown_label_changes_nothing() {
        let parent = Uuid::new_v4();
        let mut table = ActivationTable::new("step version");
        table.insert(version(parent, "v1")).unwrap();
        table.activate(&parent, "v1").unwrap();

        let error = table.activate(&parent, "v9").unwrap_err();

        assert!(matches!(error, RegistryError::NotFound { .. }));
        assert_eq!(active_labels(&table, &parent), vec!["v1".to_string()]);
    }

    #[test]
    fn deactivate_can_leave_parent_unbound() {
        let parent = Uuid::new_v4();
        let mut table = ActivationTable::new("step version");
        table.insert(version(parent, "v1")).unwrap();
        table.activate(&parent, "v1").unwrap();

        table.deactivate(&parent, "v1").unwrap();

        assert!(table.active(&parent).is_none());
    }

    #[test]
    fn duplicate_label_and_active_removal_conflict() {
        let parent = Uuid::new_v4();
        let mut table = ActivationTable::new("step version");
        table.insert(version(parent, "v1")).unwrap();
        table.activate(&parent, "v1").unwrap();

        let duplicate = table.insert(version(parent, "v1")).unwrap_err();
        let removal = table.remove(&parent, "v1").unwrap_err();

        assert!(matches!(duplicate, RegistryError::DuplicateLabel { .. }));
        assert!(matches!(removal, RegistryError::DeleteActive { .. }));

        table.deactivate(&parent, "v1").unwrap();
        assert!(table.remove(&parent, "v1").is_ok());
    }
}
