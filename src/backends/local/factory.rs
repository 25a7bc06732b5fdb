// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;
use std::sync::Arc;

use super::executors::*;
use crate::errors::ConfigError;
use crate::model::ConfigMap;
use crate::traits::StepExecutor;

/// Factory for creating local (in-process) step executors
pub struct LocalExecutorFactory;

impl LocalExecutorFactory {
    /// Create an executor from its kind and options
    ///
    /// - "echo" -> EchoExecutor
    /// - "static" -> StaticIrExecutor (option `ir`, defaults to `{}`)
    /// - "merge_upstream" -> MergeUpstreamExecutor (option `conflict_resolution`)
    pub fn create_executor(kind: &str, options: &ConfigMap) -> Result<Arc<dyn StepExecutor>, ConfigError> {
        match kind {
            "echo" => Ok(Arc::new(EchoExecutor::new())),
            "static" => {
                let ir = options
                    .get("ir")
                    .cloned()
                    .unwrap_or_else(|| Value::Object(ConfigMap::new()));
                Ok(Arc::new(StaticIrExecutor::new(ir)))
            }
            "merge_upstream" => {
                let conflict_resolution = match options.get("conflict_resolution") {
                    None => ConflictResolution::default(),
                    Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                        ConfigError::Invalid {
                            reason: format!("merge_upstream conflict_resolution: {e}"),
                        }
                    })?,
                };
                Ok(Arc::new(MergeUpstreamExecutor::new(conflict_resolution)))
            }
            _ => Err(ConfigError::Invalid {
                reason: format!("unknown local executor kind: '{kind}'"),
            }),
        }
    }

    /// List all available local executor kinds
    pub fn list_available_implementations() -> Vec<&'static str> {
        vec!["echo", "static", "merge_upstream"]
    }

    pub fn is_implementation_available(kind: &str) -> bool {
        Self::list_available_implementations().contains(&kind)
    }
}
