// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use super::ErrorCode;

/// Errors raised by the version, schema and metric registries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("{entity} named '{name}' already exists")]
    DuplicateName { entity: &'static str, name: String },

    #[error("{entity} '{label}' already exists under {parent}")]
    DuplicateLabel {
        entity: &'static str,
        parent: String,
        label: String,
    },

    #[error("cannot delete active {entity} '{label}'")]
    DeleteActive { entity: &'static str, label: String },

    #[error("cannot delete {entity} '{name}': {dependents} dependent record(s) still exist")]
    HasDependents {
        entity: &'static str,
        name: String,
        dependents: usize,
    },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("no active {entity} for {parent}")]
    NoActive { entity: &'static str, parent: String },

    #[error("schema '{label}' is not a valid JSON Schema: {reason}")]
    InvalidSchema { label: String, reason: String },

    #[error("invalid {entity}: {reason}")]
    InvalidPayload { entity: &'static str, reason: String },
}

impl RegistryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RegistryError::DuplicateName { .. }
            | RegistryError::DuplicateLabel { .. }
            | RegistryError::DeleteActive { .. }
            | RegistryError::HasDependents { .. } => ErrorCode::Conflict,
            RegistryError::NotFound { .. } | RegistryError::NoActive { .. } => ErrorCode::NotFound,
            RegistryError::InvalidSchema { .. } => ErrorCode::InvalidSchema,
            RegistryError::InvalidPayload { .. } => ErrorCode::InvalidConfig,
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        RegistryError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
