// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::StepError;
use crate::traits::{StepExecutor, StepInvocation, StepOutput};

/// Echo executor - emits its merged config as the IR
pub struct EchoExecutor;

impl EchoExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EchoExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepExecutor for EchoExecutor {
    async fn run(&self, invocation: &StepInvocation) -> Result<StepOutput, StepError> {
        Ok(StepOutput::new(Value::Object(invocation.config.clone())))
    }

    fn name(&self) -> &'static str {
        "echo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    #[tokio::test]
    async fn echoes_config() {
        let invocation = StepInvocation {
            step_version_id: Uuid::new_v4(),
            node_key: "a".to_string(),
            config: json!({"lang": "en", "dpi": 300}).as_object().cloned().unwrap(),
            upstream: BTreeMap::new(),
        };

        let output = EchoExecutor::new().run(&invocation).await.unwrap();

        assert_eq!(output.ir, json!({"lang": "en", "dpi": 300}));
    }
}
