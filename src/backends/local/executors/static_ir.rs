// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::StepError;
use crate::traits::{StepExecutor, StepInvocation, StepOutput};

/// Config key that replaces the fixed document for a single run.
pub const IR_OVERRIDE_KEY: &str = "ir";

/// Static executor - emits a fixed IR document
///
/// Handy for fixtures and for exercising schema validation: the document is
/// set when the executor is built, and a node can substitute its own through
/// the `ir` config key.
pub struct StaticIrExecutor {
    ir: Value,
}

impl StaticIrExecutor {
    pub fn new(ir: Value) -> Self {
        Self { ir }
    }
}

#[async_trait]
impl StepExecutor for StaticIrExecutor {
    async fn run(&self, invocation: &StepInvocation) -> Result<StepOutput, StepError> {
        let ir = invocation
            .config
            .get(IR_OVERRIDE_KEY)
            .cloned()
            .unwrap_or_else(|| self.ir.clone());
        Ok(StepOutput::new(ir))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConfigMap;
    use serde_json::json;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn invocation(config: ConfigMap) -> StepInvocation {
        StepInvocation {
            step_version_id: Uuid::new_v4(),
            node_key: "fixture".to_string(),
            config,
            upstream: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn emits_fixed_document() {
        let executor = StaticIrExecutor::new(json!({"total": 10}));

        let output = executor.run(&invocation(ConfigMap::new())).await.unwrap();

        assert_eq!(output.ir, json!({"total": 10}));
    }

    #[tokio::test]
    async fn config_can_substitute_the_document() {
        let executor = StaticIrExecutor::new(json!({"total": 10}));
        let mut config = ConfigMap::new();
        config.insert(IR_OVERRIDE_KEY.to_string(), json!({"total": "ten"}));

        let output = executor.run(&invocation(config)).await.unwrap();

        assert_eq!(output.ir, json!({"total": "ten"}));
    }
}
