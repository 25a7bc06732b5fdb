// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Declarative registry contents.
//!
//! A seed file lists steps (with the local executor that runs them), their
//! versions and IR schemas, pipelines with their DAGs, and metric definitions
//! and profiles. Applying a seed replays it through the registry API, so every
//! registry rule (unique names, single active version, schema compilation)
//! holds for seeded data exactly as it does for API calls.
//!
//! # Example
//! ```yaml
//! steps:
//!   - name: ocr
//!     executor: static
//!     options:
//!       ir: { text: "hello" }
//!     versions:
//!       - label: "1.0.0"
//!         active: true
//!         default_config: { lang: en }
//!         schemas:
//!           - version: v1
//!             active: true
//!             document: { type: object, required: [text] }
//! pipelines:
//!   - name: intake
//!     versions:
//!       - label: v1
//!         active: true
//!         nodes:
//!           - { key: read, step: "ocr@1.0.0", order: 0 }
//! metrics:
//!   definitions:
//!     - { key: ir_valid, aggregation: latest, scope: step, target: 1 }
//!   profiles:
//!     - name: quality
//!       scope: step
//!       active: true
//!       items:
//!         - { metric: ir_valid, weight: 1 }
//! ```
//!
//! A node's `step` is `name@label`, or just `name` for the step's active version.

use serde::Deserialize;
use serde_json::{json, Number, Value};
use std::fs;
use std::path::Path;
use uuid::Uuid;

use super::loader::ConfigFormat;
use crate::backends::local::LocalExecutorFactory;
use crate::errors::ConfigError;
use crate::model::{config_map_from_value, ConfigMap, MetricScope, NewMetricDefinition, StepPayload};
use crate::registry::Registry;
use crate::traits::ExecutorMap;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Seed {
    #[serde(default)]
    pub steps: Vec<StepSeed>,
    #[serde(default)]
    pub pipelines: Vec<PipelineSeed>,
    #[serde(default)]
    pub metrics: MetricsSeed,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepSeed {
    pub name: String,
    /// Local executor kind, see [`LocalExecutorFactory`].
    pub executor: String,
    #[serde(default)]
    pub options: Value,
    #[serde(default)]
    pub versions: Vec<StepVersionSeed>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepVersionSeed {
    pub label: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub default_config: Value,
    #[serde(default)]
    pub schemas: Vec<SchemaSeed>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaSeed {
    pub version: String,
    #[serde(default)]
    pub active: bool,
    pub document: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSeed {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<PipelineVersionSeed>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineVersionSeed {
    pub label: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub config: Value,
    pub nodes: Vec<NodeSeed>,
    #[serde(default)]
    pub edges: Option<Vec<EdgeSeed>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSeed {
    pub key: String,
    pub step: String,
    #[serde(default = "first_order")]
    pub order: Number,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeSeed {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSeed {
    #[serde(default)]
    pub definitions: Vec<NewMetricDefinition>,
    #[serde(default)]
    pub profiles: Vec<ProfileSeed>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileSeed {
    pub name: String,
    pub scope: MetricScope,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub items: Vec<ProfileItemSeed>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileItemSeed {
    pub metric: String,
    pub weight: f64,
    #[serde(default)]
    pub threshold: Option<f64>,
}

/// What [`Seed::apply`] created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub steps: usize,
    pub step_versions: usize,
    pub schemas: usize,
    pub pipelines: usize,
    pub pipeline_versions: usize,
    pub metric_definitions: usize,
    pub metric_profiles: usize,
}

/// Reads and parses a seed file (YAML or TOML, picked by extension).
pub fn load_seed<P: AsRef<Path>>(path: P) -> Result<Seed, ConfigError> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_seed(&contents, format, &path.display().to_string())
}

pub fn parse_seed(contents: &str, format: ConfigFormat, origin: &str) -> Result<Seed, ConfigError> {
    match format {
        ConfigFormat::Yaml if contents.trim().is_empty() => Ok(Seed::default()),
        ConfigFormat::Yaml => serde_yaml::from_str(contents).map_err(|source| ConfigError::Yaml {
            path: origin.to_string(),
            source,
        }),
        ConfigFormat::Toml => toml::from_str(contents).map_err(|source| ConfigError::Toml {
            path: origin.to_string(),
            source,
        }),
    }
}

impl Seed {
    /// Builds one executor per seeded step, keyed by step name.
    pub fn executor_map(&self) -> Result<ExecutorMap, ConfigError> {
        let mut executors = ExecutorMap::new();
        for step in &self.steps {
            let options = object(&step.options, &format!("options of step '{}'", step.name))?;
            let executor = LocalExecutorFactory::create_executor(&step.executor, &options)?;
            executors.insert(step.name.clone(), executor);
        }
        Ok(executors)
    }

    /// Replays the seed into `registry`. Stops at the first rejected entry;
    /// entries applied before it stay registered.
    pub fn apply(&self, registry: &Registry) -> Result<SeedSummary, ConfigError> {
        let mut summary = SeedSummary::default();

        for step in &self.steps {
            let definition = registry.steps().create_definition(&step.name)?;
            summary.steps += 1;

            for version in &step.versions {
                let context = format!("default_config of step '{}@{}'", step.name, version.label);
                let default_config = object(&version.default_config, &context)?;
                let created = registry.steps().create_version(
                    definition.id,
                    &version.label,
                    StepPayload::new(default_config),
                )?;
                summary.step_versions += 1;
                if version.active {
                    registry.steps().activate(definition.id, &version.label)?;
                }

                for schema in &version.schemas {
                    registry.register_schema(created.id, &schema.version, schema.document.clone())?;
                    summary.schemas += 1;
                    if schema.active {
                        registry.schemas().activate(created.id, &schema.version)?;
                    }
                }
            }
        }

        for pipeline in &self.pipelines {
            let definition = registry.pipelines().create_definition(&pipeline.name)?;
            summary.pipelines += 1;

            for version in &pipeline.versions {
                let dag = dag_document(registry, version)?;
                registry.create_pipeline_version(
                    definition.id,
                    &version.label,
                    dag,
                    version.config.clone(),
                )?;
                summary.pipeline_versions += 1;
                if version.active {
                    registry.pipelines().activate(definition.id, &version.label)?;
                }
            }
        }

        let metrics = registry.metrics();
        for definition in &self.metrics.definitions {
            metrics.create_definition(definition.clone())?;
            summary.metric_definitions += 1;
        }
        for profile in &self.metrics.profiles {
            metrics.create_profile(&profile.name, profile.scope)?;
            for item in &profile.items {
                metrics.add_profile_item(
                    profile.scope,
                    &profile.name,
                    &item.metric,
                    item.weight,
                    item.threshold,
                )?;
            }
            summary.metric_profiles += 1;
            if profile.active {
                metrics.activate_profile(profile.scope, &profile.name)?;
            }
        }

        Ok(summary)
    }
}

/// Turns a seeded version into the stored DAG document, replacing step
/// references with step version ids.
fn dag_document(registry: &Registry, version: &PipelineVersionSeed) -> Result<Value, ConfigError> {
    let nodes = version
        .nodes
        .iter()
        .map(|node| {
            let step_version_id = resolve_step_ref(registry, &node.step)?;
            let mut document = json!({
                "key": node.key,
                "stepVersionId": step_version_id.to_string(),
                "order": node.order,
            });
            if let Some(params) = &node.params {
                document["params"] = params.clone();
            }
            Ok(document)
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    let mut dag = json!({ "nodes": nodes });
    if let Some(edges) = &version.edges {
        dag["edges"] = edges
            .iter()
            .map(|e| json!({ "from": e.from, "to": e.to }))
            .collect();
    }
    Ok(dag)
}

fn resolve_step_ref(registry: &Registry, reference: &str) -> Result<Uuid, ConfigError> {
    let steps = registry.steps();
    let version = match reference.split_once('@') {
        Some((name, label)) => {
            let definition = steps.find_definition(name)?;
            steps.find_version(definition.id, label)?
        }
        None => {
            let definition = steps.find_definition(reference)?;
            steps.get_active(definition.id)?
        }
    };
    Ok(version.id)
}

fn first_order() -> Number {
    Number::from(0)
}

fn object(value: &Value, context: &str) -> Result<ConfigMap, ConfigError> {
    config_map_from_value(value).ok_or_else(|| ConfigError::Invalid {
        reason: format!("{context} must be a mapping"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::model::{Aggregation, Comparison};
    use std::io::Write;
    use tempfile::Builder;

    const SEED: &str = r#"
steps:
  - name: ocr
    executor: static
    options:
      ir: { text: "hello" }
    versions:
      - label: "0.9.0"
      - label: "1.0.0"
        active: true
        default_config: { lang: en }
        schemas:
          - version: v1
            active: true
            document: { type: object, required: [text] }
  - name: merge
    executor: merge_upstream
    options: { conflict_resolution: take_first }
    versions:
      - label: "1.0.0"
        active: true
pipelines:
  - name: intake
    versions:
      - label: v1
        active: true
        nodes:
          - { key: read, step: "ocr@0.9.0", order: 0 }
          - { key: join, step: merge, order: 1, params: { verbose: true } }
        edges:
          - { from: read, to: join }
metrics:
  definitions:
    - { key: ir_valid, aggregation: latest, scope: step, target: 1 }
    - { key: step_success, aggregation: ratio, scope: pipeline, comparison: at_least }
  profiles:
    - name: quality
      scope: step
      active: true
      items:
        - { metric: ir_valid, weight: 2 }
"#;

    fn seed() -> Seed {
        parse_seed(SEED, ConfigFormat::Yaml, "inline").unwrap()
    }

    #[test]
    fn applies_every_section() {
        let registry = Registry::default();

        let summary = seed().apply(&registry).unwrap();

        assert_eq!(
            summary,
            SeedSummary {
                steps: 2,
                step_versions: 3,
                schemas: 1,
                pipelines: 1,
                pipeline_versions: 1,
                metric_definitions: 2,
                metric_profiles: 1,
            }
        );
        let ocr = registry.steps().find_definition("ocr").unwrap();
        assert_eq!(registry.steps().get_active(ocr.id).unwrap().label, "1.0.0");
        let definition = registry.metrics().definition("step_success").unwrap();
        assert_eq!(definition.aggregation, Aggregation::Ratio);
        assert_eq!(definition.comparison, Comparison::AtLeast);
        let profile = registry.metrics().active_profile(MetricScope::Step).unwrap();
        assert_eq!(profile.items[0].weight, 2.0);
    }

    #[test]
    fn step_references_resolve_to_version_ids() {
        let registry = Registry::default();
        seed().apply(&registry).unwrap();

        let pipeline = registry.pipelines().find_definition("intake").unwrap();
        let version = registry.pipelines().get_active(pipeline.id).unwrap();
        let ocr = registry.steps().find_definition("ocr").unwrap();
        let pinned = registry.steps().find_version(ocr.id, "0.9.0").unwrap();
        let merge = registry.steps().find_definition("merge").unwrap();
        let merge_active = registry.steps().get_active(merge.id).unwrap();

        let nodes = version.payload.dag["nodes"].as_array().unwrap();
        assert_eq!(nodes[0]["stepVersionId"], json!(pinned.id.to_string()));
        assert_eq!(nodes[1]["stepVersionId"], json!(merge_active.id.to_string()));
        assert_eq!(nodes[1]["params"], json!({"verbose": true}));
        assert_eq!(version.payload.dag["edges"], json!([{"from": "read", "to": "join"}]));
    }

    #[test]
    fn executor_map_has_one_executor_per_step() {
        let executors = seed().executor_map().unwrap();

        assert_eq!(executors.len(), 2);
        assert_eq!(executors.get("ocr").unwrap().name(), "static");
        assert_eq!(executors.get("merge").unwrap().name(), "merge_upstream");
    }

    #[test]
    fn unknown_executor_kind_is_rejected() {
        let seed = parse_seed(
            "steps:\n  - { name: ocr, executor: tesseract }\n",
            ConfigFormat::Yaml,
            "inline",
        )
        .unwrap();

        let error = seed.executor_map().unwrap_err();

        assert!(matches!(error, ConfigError::Invalid { .. }));
    }

    #[test]
    fn unknown_step_reference_fails_with_not_found() {
        let text = "pipelines:\n  - name: p\n    versions:\n      - label: v1\n        nodes:\n          - { key: a, step: ghost }\n";
        let seed = parse_seed(text, ConfigFormat::Yaml, "inline").unwrap();

        let error = seed.apply(&Registry::default()).unwrap_err();

        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[test]
    fn non_mapping_default_config_is_rejected() {
        let text = "steps:\n  - name: ocr\n    executor: echo\n    versions:\n      - { label: a, default_config: [1, 2] }\n";
        let seed = parse_seed(text, ConfigFormat::Yaml, "inline").unwrap();

        let error = seed.apply(&Registry::default()).unwrap_err();

        assert!(error.to_string().contains("default_config of step 'ocr@a'"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = parse_seed("stepz: []\n", ConfigFormat::Yaml, "inline");

        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn loads_from_file() {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();

        let seed = load_seed(file.path()).unwrap();

        assert_eq!(seed.steps.len(), 2);
        assert_eq!(seed.pipelines[0].versions[0].nodes.len(), 2);
    }
}
