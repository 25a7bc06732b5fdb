// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::StepError;
use crate::traits::{StepExecutor, StepInvocation, StepOutput};

/// What to do when two upstream documents carry the same top-level key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    TakeFirst,
    #[default]
    TakeLast,
    Error,
}

/// Merges the IR of all upstream nodes into one object.
///
/// Upstream documents are visited in node key order. Object documents
/// contribute their top-level keys; any other document is stored under its
/// node key.
pub struct MergeUpstreamExecutor {
    conflict_resolution: ConflictResolution,
}

impl MergeUpstreamExecutor {
    pub fn new(conflict_resolution: ConflictResolution) -> Self {
        Self {
            conflict_resolution,
        }
    }
}

#[async_trait]
impl StepExecutor for MergeUpstreamExecutor {
    async fn run(&self, invocation: &StepInvocation) -> Result<StepOutput, StepError> {
        if invocation.upstream.is_empty() {
            return Err(StepError::Failed(format!(
                "node '{}' has no upstream IR to merge",
                invocation.node_key
            )));
        }

        let mut merged = Map::new();
        for (node_key, ir) in &invocation.upstream {
            let entries = match ir {
                Value::Object(object) => object.clone(),
                other => Map::from_iter([(node_key.clone(), other.clone())]),
            };

            for (key, value) in entries {
                if !merged.contains_key(&key) {
                    merged.insert(key, value);
                    continue;
                }
                match self.conflict_resolution {
                    ConflictResolution::TakeFirst => {}
                    ConflictResolution::TakeLast => {
                        merged.insert(key, value);
                    }
                    ConflictResolution::Error => {
                        return Err(StepError::Failed(format!(
                            "merge conflict on key '{key}' from node '{node_key}'"
                        )));
                    }
                }
            }
        }

        Ok(StepOutput::new(Value::Object(merged)))
    }

    fn name(&self) -> &'static str {
        "merge_upstream"
    }
}
