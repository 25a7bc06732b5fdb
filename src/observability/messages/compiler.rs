// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

pub struct PlanCompiled<'a> {
    pub mode: &'a str,
    pub node_count: usize,
    pub level_count: usize,
    pub warning_count: usize,
}

impl Display for PlanCompiled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Compiled {} plan: {} nodes in {} levels, {} warning(s)",
            self.mode, self.node_count, self.level_count, self.warning_count
        )
    }
}

impl StructuredLog for PlanCompiled<'_> {
    fn log(&self) {
        tracing::debug!(
            mode = self.mode,
            node_count = self.node_count,
            level_count = self.level_count,
            warning_count = self.warning_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "plan_compiled",
            span_name = name,
            mode = self.mode,
            node_count = self.node_count,
            level_count = self.level_count,
        )
    }
}

/// A node references a step version that exists but is not active.
pub struct InactiveStepReferenced<'a> {
    pub node_key: &'a str,
    pub step_name: &'a str,
    pub label: &'a str,
}

impl Display for InactiveStepReferenced<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' pins inactive step version {}@{}",
            self.node_key, self.step_name, self.label
        )
    }
}

impl StructuredLog for InactiveStepReferenced<'_> {
    fn log(&self) {
        tracing::warn!(
            node_key = self.node_key,
            step_name = self.step_name,
            label = self.label,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "inactive_step",
            span_name = name,
            node_key = self.node_key,
            step_name = self.step_name,
            label = self.label,
        )
    }
}
