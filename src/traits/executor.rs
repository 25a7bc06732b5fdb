// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use crate::traits::step::StepExecutor;

/// Newtype wrapper mapping step definition names to their executors.
#[derive(Clone, Default)]
pub struct ExecutorMap(HashMap<String, Arc<dyn StepExecutor>>);

impl ExecutorMap {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Registers `executor` for the step definition called `step_name`.
    pub fn insert(&mut self, step_name: impl Into<String>, executor: Arc<dyn StepExecutor>) {
        self.0.insert(step_name.into(), executor);
    }

    pub fn with(mut self, step_name: impl Into<String>, executor: Arc<dyn StepExecutor>) -> Self {
        self.insert(step_name, executor);
        self
    }

    pub fn get(&self, step_name: &str) -> Option<&Arc<dyn StepExecutor>> {
        self.0.get(step_name)
    }

    pub fn contains_key(&self, step_name: &str) -> bool {
        self.0.contains_key(step_name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for ExecutorMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.0.keys().collect();
        names.sort();
        f.debug_struct("ExecutorMap")
            .field("executor_count", &self.0.len())
            .field("step_names", &names)
            .finish()
    }
}

impl From<HashMap<String, Arc<dyn StepExecutor>>> for ExecutorMap {
    fn from(map: HashMap<String, Arc<dyn StepExecutor>>) -> Self {
        Self(map)
    }
}

impl From<ExecutorMap> for HashMap<String, Arc<dyn StepExecutor>> {
    fn from(map: ExecutorMap) -> Self {
        map.0
    }
}
