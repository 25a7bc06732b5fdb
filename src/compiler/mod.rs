// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! DAG compiler: turns a stored DAG payload into an [`ExecutionPlan`].
//!
//! The stored JSON is parsed into a [`DagShape`] at this boundary and checked
//! in a fixed order, so the first error reported for a payload never depends
//! on hash ordering:
//!
//! 1. payload shape (`MalformedDag`)
//! 2. unique node keys (`DuplicateNodeKey`)
//! 3. params are JSON objects (`InvalidParams`)
//! 4. step versions resolve (`UnresolvedStep`)
//! 5. edge endpoints are declared nodes (`UnknownEdgeNode`)
//! 6. no cycles (`CyclicDependency`)
//!
//! Compilation has no side effects, so a dry run can call it freely.

mod graph;
pub mod plan;

pub use plan::{ExecutionPlan, PlanMode, PlanWarning, PlannedNode};

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::errors::CompileError;
use crate::model::{config_map_from_value, ConfigMap, DagEdge, DagNode, DagPayload, DagShape};
use crate::model::{Definition, PipelineVersion, StepVersion};
use crate::observability::messages::compiler::{InactiveStepReferenced, PlanCompiled};
use crate::observability::messages::StructuredLog;
use crate::registry::StepRegistry;
use graph::IndexGraph;

/// A step version together with its definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStep {
    pub definition: Definition,
    pub version: StepVersion,
}

/// Looks up step versions referenced by DAG nodes.
pub trait StepResolver {
    fn resolve_step(&self, step_version_id: Uuid) -> Option<ResolvedStep>;
}

impl StepResolver for StepRegistry {
    fn resolve_step(&self, step_version_id: Uuid) -> Option<ResolvedStep> {
        self.resolve(step_version_id)
            .ok()
            .map(|(definition, version)| ResolvedStep {
                definition,
                version,
            })
    }
}

/// Compiles a pipeline version's DAG and tags the plan with the version id.
pub fn compile_version(
    version: &PipelineVersion,
    steps: &impl StepResolver,
) -> Result<ExecutionPlan, CompileError> {
    let mut plan = compile(&version.payload.dag, steps)?;
    plan.pipeline_version_id = Some(version.id);
    Ok(plan)
}

/// Compiles a DAG payload.
pub fn compile(dag: &Value, steps: &impl StepResolver) -> Result<ExecutionPlan, CompileError> {
    let shape = DagShape::from(DagPayload::from_value(dag)?);
    let nodes = shape.nodes();

    let index = index_nodes(nodes)?;
    let params = nodes
        .iter()
        .map(node_params)
        .collect::<Result<Vec<_>, _>>()?;
    let resolved = nodes
        .iter()
        .map(|node| resolve(node, steps))
        .collect::<Result<Vec<_>, _>>()?;

    let (mode, levels, depends_on) = match &shape {
        DagShape::Linear { nodes } => {
            let (levels, depends_on) = linear_levels(nodes);
            (PlanMode::Linear, levels, depends_on)
        }
        DagShape::Graph { nodes, edges } => {
            let (levels, depends_on) = graph_levels(nodes, edges, &index)?;
            (PlanMode::Graph, levels, depends_on)
        }
    };

    let mut warnings = Vec::new();
    let mut planned = Vec::with_capacity(nodes.len());
    for &i in levels.iter().flatten() {
        let node = &nodes[i];
        let step = &resolved[i];

        if !step.version.is_active {
            InactiveStepReferenced {
                node_key: &node.key,
                step_name: &step.definition.name,
                label: &step.version.label,
            }
            .log();
            warnings.push(PlanWarning::InactiveStepVersion {
                node_key: node.key.clone(),
                step_name: step.definition.name.clone(),
                label: step.version.label.clone(),
            });
        }

        planned.push(PlannedNode {
            key: node.key.clone(),
            step_version_id: step.version.id,
            step_definition_id: step.definition.id,
            step_name: step.definition.name.clone(),
            step_version_label: step.version.label.clone(),
            order: node.order.clone(),
            params: params[i].clone(),
            default_config: step.version.payload.default_config.clone(),
            depends_on: depends_on[i].iter().map(|&d| nodes[d].key.clone()).collect(),
        });
    }

    let plan = ExecutionPlan {
        mode,
        pipeline_version_id: None,
        nodes: planned,
        levels: levels
            .iter()
            .map(|level| level.iter().map(|&i| nodes[i].key.clone()).collect())
            .collect(),
        warnings,
    };

    PlanCompiled {
        mode: mode.as_str(),
        node_count: plan.nodes.len(),
        level_count: plan.levels.len(),
        warning_count: plan.warnings.len(),
    }
    .log();

    Ok(plan)
}

fn index_nodes(nodes: &[DagNode]) -> Result<HashMap<&str, usize>, CompileError> {
    let mut index = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        if index.insert(node.key.as_str(), i).is_some() {
            return Err(CompileError::DuplicateNodeKey {
                key: node.key.clone(),
            });
        }
    }
    Ok(index)
}

fn node_params(node: &DagNode) -> Result<ConfigMap, CompileError> {
    match &node.params {
        None => Ok(ConfigMap::new()),
        Some(value) => config_map_from_value(value).ok_or_else(|| CompileError::InvalidParams {
            node_key: node.key.clone(),
        }),
    }
}

fn resolve(node: &DagNode, steps: &impl StepResolver) -> Result<ResolvedStep, CompileError> {
    let unresolved = || CompileError::UnresolvedStep {
        node_key: node.key.clone(),
        step_version_id: node.step_version_id.clone(),
    };
    let id = Uuid::parse_str(node.step_version_id.trim()).map_err(|_| unresolved())?;
    steps.resolve_step(id).ok_or_else(unresolved)
}

/// Ascending `order`, ties kept in payload order; each node waits on the one
/// before it.
fn linear_levels(nodes: &[DagNode]) -> (Vec<Vec<usize>>, Vec<Vec<usize>>) {
    let mut sequence: Vec<usize> = (0..nodes.len()).collect();
    sequence.sort_by_key(|&i| (nodes[i].order_key(), i));

    let mut depends_on = vec![Vec::new(); nodes.len()];
    for pair in sequence.windows(2) {
        depends_on[pair[1]].push(pair[0]);
    }

    (sequence.into_iter().map(|i| vec![i]).collect(), depends_on)
}

type Levels = (Vec<Vec<usize>>, Vec<Vec<usize>>);

fn graph_levels(
    nodes: &[DagNode],
    edges: &[DagEdge],
    index: &HashMap<&str, usize>,
) -> Result<Levels, CompileError> {
    let mut graph = IndexGraph::new(nodes.len());
    let mut depends_on = vec![Vec::new(); nodes.len()];
    let mut seen = HashSet::new();

    for edge in edges {
        let endpoint = |key: &str| {
            index
                .get(key)
                .copied()
                .ok_or_else(|| CompileError::UnknownEdgeNode {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    missing: key.to_string(),
                })
        };
        let from = endpoint(&edge.from)?;
        let to = endpoint(&edge.to)?;

        if seen.insert((from, to)) && graph.add_edge(from, to) {
            depends_on[to].push(from);
        }
    }

    if let Some(cycle) = graph.find_cycle() {
        return Err(CompileError::CyclicDependency {
            cycle: cycle.into_iter().map(|i| nodes[i].key.clone()).collect(),
        });
    }

    let levels = graph
        .levels(|i| (nodes[i].order_key(), i))
        .ok_or_else(|| CompileError::CyclicDependency { cycle: Vec::new() })?;

    Ok((levels, depends_on))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StepPayload;
    use serde_json::json;

    struct Fixture {
        steps: StepRegistry,
        ocr: Uuid,
        classify: Uuid,
        extract: Uuid,
    }

    fn fixture() -> Fixture {
        let steps = StepRegistry::for_steps();
        let mut ids = Vec::new();
        for name in ["ocr", "classify", "extract"] {
            let definition = steps.create_definition(name).unwrap();
            let version = steps
                .create_version(definition.id, "1.0.0", StepPayload::default())
                .unwrap();
            steps.activate(definition.id, "1.0.0").unwrap();
            ids.push(version.id);
        }
        Fixture {
            steps,
            ocr: ids[0],
            classify: ids[1],
            extract: ids[2],
        }
    }

    #[test]
    fn linear_plan_follows_order_field() {
        let f = fixture();
        let dag = json!({
            "nodes": [
                {"key": "b", "stepVersionId": f.classify.to_string(), "order": 1},
                {"key": "a", "stepVersionId": f.ocr.to_string(), "order": 0}
            ]
        });

        let plan = compile(&dag, &f.steps).unwrap();

        assert_eq!(plan.mode, PlanMode::Linear);
        assert_eq!(plan.order(), vec!["a", "b"]);
        assert_eq!(plan.node("b").unwrap().depends_on, vec!["a".to_string()]);
        assert!(plan.node("a").unwrap().depends_on.is_empty());
    }

    #[test]
    fn linear_ties_keep_payload_order() {
        let f = fixture();
        let dag = json!({
            "nodes": [
                {"key": "x", "stepVersionId": f.ocr.to_string(), "order": 1},
                {"key": "y", "stepVersionId": f.ocr.to_string(), "order": 0},
                {"key": "z", "stepVersionId": f.ocr.to_string(), "order": 1}
            ]
        });

        let plan = compile(&dag, &f.steps).unwrap();

        assert_eq!(plan.order(), vec!["y", "x", "z"]);
    }

    #[test]
    fn fractional_order_slots_between_integers() {
        let f = fixture();
        let dag = json!({
            "nodes": [
                {"key": "last", "stepVersionId": f.ocr.to_string(), "order": 2},
                {"key": "middle", "stepVersionId": f.classify.to_string(), "order": 1.5},
                {"key": "first", "stepVersionId": f.extract.to_string(), "order": 1}
            ]
        });

        let plan = compile(&dag, &f.steps).unwrap();

        assert_eq!(plan.order(), vec!["first", "middle", "last"]);
        assert_eq!(plan.node("middle").unwrap().order.as_f64(), Some(1.5));
    }

    #[test]
    fn graph_plan_is_topological_with_order_tiebreak() {
        let f = fixture();
        let dag = json!({
            "nodes": [
                {"key": "merge", "stepVersionId": f.extract.to_string(), "order": 0},
                {"key": "right", "stepVersionId": f.classify.to_string(), "order": 1},
                {"key": "left", "stepVersionId": f.classify.to_string(), "order": 2},
                {"key": "root", "stepVersionId": f.ocr.to_string(), "order": 9}
            ],
            "edges": [
                {"from": "root", "to": "left"},
                {"from": "root", "to": "right"},
                {"from": "left", "to": "merge"},
                {"from": "right", "to": "merge"}
            ]
        });

        let plan = compile(&dag, &f.steps).unwrap();

        assert_eq!(plan.mode, PlanMode::Graph);
        assert_eq!(plan.order(), vec!["root", "right", "left", "merge"]);
        assert_eq!(
            plan.levels,
            vec![
                vec!["root".to_string()],
                vec!["right".to_string(), "left".to_string()],
                vec!["merge".to_string()]
            ]
        );
        assert_eq!(
            plan.node("merge").unwrap().depends_on,
            vec!["left".to_string(), "right".to_string()]
        );
    }

    #[test]
    fn compilation_is_deterministic() {
        let f = fixture();
        let dag = json!({
            "nodes": [
                {"key": "c", "stepVersionId": f.extract.to_string(), "order": 0},
                {"key": "b", "stepVersionId": f.classify.to_string(), "order": 0},
                {"key": "a", "stepVersionId": f.ocr.to_string(), "order": 0}
            ],
            "edges": [{"from": "a", "to": "c"}]
        });

        let first = compile(&dag, &f.steps).unwrap();
        for _ in 0..10 {
            assert_eq!(compile(&dag, &f.steps).unwrap(), first);
        }
    }

    #[test]
    fn cycle_is_rejected_with_its_path() {
        let f = fixture();
        let dag = json!({
            "nodes": [
                {"key": "a", "stepVersionId": f.ocr.to_string(), "order": 0},
                {"key": "b", "stepVersionId": f.classify.to_string(), "order": 1}
            ],
            "edges": [{"from": "a", "to": "b"}, {"from": "b", "to": "a"}]
        });

        let error = compile(&dag, &f.steps).unwrap_err();

        assert_eq!(
            error,
            CompileError::CyclicDependency {
                cycle: vec!["a".into(), "b".into(), "a".into()]
            }
        );
        assert_eq!(error.code(), crate::errors::ErrorCode::InvalidGraph);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let f = fixture();
        let dag = json!({
            "nodes": [
                {"key": "a", "stepVersionId": f.ocr.to_string(), "order": 0},
                {"key": "a", "stepVersionId": f.classify.to_string(), "order": 1}
            ]
        });

        assert_eq!(
            compile(&dag, &f.steps).unwrap_err(),
            CompileError::DuplicateNodeKey { key: "a".into() }
        );
    }

    #[test]
    fn unknown_step_versions_are_unresolved() {
        let f = fixture();
        let unknown = json!({
            "nodes": [{"key": "a", "stepVersionId": Uuid::new_v4().to_string(), "order": 0}]
        });
        let garbage = json!({
            "nodes": [{"key": "a", "stepVersionId": "not-a-uuid", "order": 0}]
        });

        assert!(matches!(
            compile(&unknown, &f.steps),
            Err(CompileError::UnresolvedStep { .. })
        ));
        assert!(matches!(
            compile(&garbage, &f.steps),
            Err(CompileError::UnresolvedStep { .. })
        ));
    }

    #[test]
    fn edges_must_name_declared_nodes() {
        let f = fixture();
        let dag = json!({
            "nodes": [{"key": "a", "stepVersionId": f.ocr.to_string(), "order": 0}],
            "edges": [{"from": "a", "to": "ghost"}]
        });

        assert_eq!(
            compile(&dag, &f.steps).unwrap_err(),
            CompileError::UnknownEdgeNode {
                from: "a".into(),
                to: "ghost".into(),
                missing: "ghost".into()
            }
        );
    }

    #[test]
    fn params_must_be_objects() {
        let f = fixture();
        let dag = json!({
            "nodes": [{"key": "a", "stepVersionId": f.ocr.to_string(), "order": 0, "params": [1, 2]}]
        });

        assert_eq!(
            compile(&dag, &f.steps).unwrap_err(),
            CompileError::InvalidParams { node_key: "a".into() }
        );
    }

    #[test]
    fn inactive_step_versions_compile_with_a_warning() {
        let f = fixture();
        let definition = f.steps.find_definition("ocr").unwrap();
        let pinned = f
            .steps
            .create_version(definition.id, "0.9.0", StepPayload::default())
            .unwrap();
        let dag = json!({
            "nodes": [{"key": "a", "stepVersionId": pinned.id.to_string(), "order": 0}]
        });

        let plan = compile(&dag, &f.steps).unwrap();

        assert_eq!(plan.node("a").unwrap().step_version_label, "0.9.0");
        assert_eq!(
            plan.warnings,
            vec![PlanWarning::InactiveStepVersion {
                node_key: "a".into(),
                step_name: "ocr".into(),
                label: "0.9.0".into()
            }]
        );
    }
}
