// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for registry lifecycle events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A version, schema or profile became the active one under its parent.
pub struct Activated<'a> {
    pub entity: &'a str,
    pub parent: &'a str,
    pub label: &'a str,
}

impl Display for Activated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Activated {} '{}' under {}",
            self.entity, self.label, self.parent
        )
    }
}

impl StructuredLog for Activated<'_> {
    fn log(&self) {
        tracing::info!(
            entity = self.entity,
            parent = self.parent,
            label = self.label,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "activation",
            span_name = name,
            entity = self.entity,
            parent = self.parent,
            label = self.label,
        )
    }
}

pub struct Deactivated<'a> {
    pub entity: &'a str,
    pub parent: &'a str,
    pub label: &'a str,
}

impl Display for Deactivated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Deactivated {} '{}' under {}",
            self.entity, self.label, self.parent
        )
    }
}

impl StructuredLog for Deactivated<'_> {
    fn log(&self) {
        tracing::info!(
            entity = self.entity,
            parent = self.parent,
            label = self.label,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "deactivation",
            span_name = name,
            entity = self.entity,
            parent = self.parent,
            label = self.label,
        )
    }
}

/// A new row was stored in one of the registries.
///
/// # Log Level
/// `debug!` - Registration is routine and frequent during seeding
pub struct Registered<'a> {
    pub entity: &'a str,
    pub name: &'a str,
    pub id: &'a str,
}

impl Display for Registered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Registered {} '{}' ({})", self.entity, self.name, self.id)
    }
}

impl StructuredLog for Registered<'_> {
    fn log(&self) {
        tracing::debug!(
            entity = self.entity,
            name = self.name,
            id = self.id,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "registered",
            span_name = name,
            entity = self.entity,
            name = self.name,
            id = self.id,
        )
    }
}

/// Validation ran against a step version that has no active schema.
///
/// # Log Level
/// `warn!` - The artifact is accepted or rejected without a contract
pub struct SchemaMissing<'a> {
    pub step_version_id: &'a str,
    pub rejected: bool,
}

impl Display for SchemaMissing<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let outcome = if self.rejected { "rejected" } else { "accepted" };
        write!(
            f,
            "No active IR schema for step version {}; payload {} without validation",
            self.step_version_id, outcome
        )
    }
}

impl StructuredLog for SchemaMissing<'_> {
    fn log(&self) {
        tracing::warn!(
            step_version_id = self.step_version_id,
            rejected = self.rejected,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "schema_missing",
            span_name = name,
            step_version_id = self.step_version_id,
            rejected = self.rejected,
        )
    }
}

/// A payload did not satisfy its schema.
///
/// # Log Level
/// `warn!` - The artifact is stored but flagged invalid
pub struct ValidationFailed<'a> {
    pub step_version_id: &'a str,
    pub schema_version: &'a str,
    pub error_count: usize,
}

impl Display for ValidationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "IR payload for step version {} failed schema '{}' with {} error(s)",
            self.step_version_id, self.schema_version, self.error_count
        )
    }
}

impl StructuredLog for ValidationFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            step_version_id = self.step_version_id,
            schema_version = self.schema_version,
            error_count = self.error_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "validation_failed",
            span_name = name,
            step_version_id = self.step_version_id,
            schema_version = self.schema_version,
            error_count = self.error_count,
        )
    }
}
