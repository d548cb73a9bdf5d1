//! Pipelines end to end: errors, rebuilds, tagging and evaluation

#[path = "../common/mod.rs"]
mod common;

use common::*;
use depsgraph_core::features::node_registry::{ComponentKey, EvalCallback, EvalContext, OperationKey};
use depsgraph_core::features::scene_db::{AnimData, Base, EntityData, ViewLayer};
use depsgraph_core::{
    build_all_view_layers, BuildConfig, CompositorPipeline, Depsgraph, DepsgraphError, EntityId,
    Evaluator, FromIdsPipeline, NodeType, OpCode, PayloadProvider, Preset, Recalc, RenderPipeline,
    ViewLayerPipeline,
};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

/// Every operation gets a payload recording (entity, opcode) when run
#[derive(Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<(EntityId, OpCode)>>>,
}

impl Recorder {
    fn take(&self) -> Vec<(EntityId, OpCode)> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }
}

impl PayloadProvider for Recorder {
    fn payload(
        &self,
        _entity: EntityId,
        _component: &ComponentKey,
        operation: &OperationKey,
    ) -> Option<EvalCallback> {
        let calls = self.calls.clone();
        let opcode = operation.opcode;
        Some(Arc::new(move |ctx: &EvalContext| {
            calls.lock().unwrap().push((ctx.entity, opcode));
        }))
    }
}

fn animate(fixture: &mut CubeScene) {
    let action = fixture.db.add_data("ACCubeAction", EntityData::Action);
    fixture.db.get_mut(fixture.cube).unwrap().anim_data = Some(AnimData {
        action: Some(action),
        ..Default::default()
    });
}

// ============================================================
// Sanity checks
// ============================================================

#[test]
fn test_root_errors_are_recoverable() {
    let fixture = cube_scene();
    let config = BuildConfig::default();

    let result = ViewLayerPipeline::new(&fixture.db, fixture.cube, VIEW_LAYER, &config).build();
    assert!(matches!(result, Err(DepsgraphError::NotAScene(id)) if id == fixture.cube));

    let result = ViewLayerPipeline::new(&fixture.db, fixture.scene, "Missing", &config).build();
    assert!(matches!(result, Err(DepsgraphError::ViewLayerNotFound { ref name, .. }) if name == "Missing"));

    let result =
        CompositorPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, fixture.scene, &config).build();
    assert!(matches!(result, Err(DepsgraphError::NotANodeTree(_))));
}

#[test]
fn test_invalid_config_rejected_before_building() {
    let fixture = cube_scene();
    let config = BuildConfig::default().memory_limit(Some(0));
    let result = ViewLayerPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &config).build();
    assert!(matches!(result, Err(DepsgraphError::Config(_))));
}

#[test]
fn test_memory_limit_fails_build_and_keeps_need_update() {
    let fixture = cube_scene();
    let config = BuildConfig::default().memory_limit(Some(1));

    let result = ViewLayerPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &config).build();
    assert!(matches!(result, Err(DepsgraphError::Allocation(_))));

    let mut depsgraph = Depsgraph::new(fixture.scene, VIEW_LAYER, &config);
    let result = ViewLayerPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &config).build_into(&mut depsgraph);
    assert!(result.is_err());
    assert!(depsgraph.need_update());
}

#[test]
fn test_build_into_rejects_invalid_config() {
    let fixture = cube_scene();
    let config = BuildConfig::default();
    let mut depsgraph = ViewLayerPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &config)
        .build()
        .unwrap();
    let operations = depsgraph.graph().operations().len();

    let invalid = BuildConfig::default().memory_limit(Some(0));
    let result = ViewLayerPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &invalid).build_into(&mut depsgraph);
    assert!(matches!(result, Err(DepsgraphError::Config(_))));
    assert!(!depsgraph.need_update());
    assert_eq!(depsgraph.graph().operations().len(), operations);
}

#[test]
fn test_build_into_takes_over_scene() {
    let mut fixture = cube_scene();
    let other = scene_with_objects(&mut fixture.db, "SCOther", &[fixture.cube]);
    let config = BuildConfig::default();
    let mut depsgraph = ViewLayerPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &config)
        .build()
        .unwrap();

    ViewLayerPipeline::new(&fixture.db, other, VIEW_LAYER, &config)
        .build_into(&mut depsgraph)
        .unwrap();

    assert_eq!(depsgraph.scene(), other);
    assert_eq!(depsgraph.view_layer(), VIEW_LAYER);
    assert_single_id_node(depsgraph.graph(), other);
    assert_no_id_node(depsgraph.graph(), fixture.scene);
}

// ============================================================
// Pipelines
// ============================================================

#[test]
fn test_view_layer_pipeline_builds_consistent_graph() {
    common::init_tracing();
    let fixture = cube_scene();
    let config = BuildConfig::preset(Preset::Debug);

    let depsgraph = ViewLayerPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &config)
        .build()
        .unwrap();

    assert!(!depsgraph.need_update());
    assert_eq!(depsgraph.view_layer(), VIEW_LAYER);
    assert!(depsgraph.consistency_check().is_empty());
    assert_eq!(depsgraph.schedule().len(), depsgraph.graph().operations().len());
    for entity in [fixture.scene, fixture.cube, fixture.mesh, fixture.material, fixture.camera, fixture.lamp] {
        assert_single_id_node(depsgraph.graph(), entity);
    }
    assert_eq!(depsgraph.graph_stats().cyclic_relations, 0);
}

#[test]
fn test_render_pipeline_on_compositor_scene() {
    let fixture = compositor_scene();
    let config = BuildConfig::preset(Preset::Render);

    let depsgraph = RenderPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &config)
        .build()
        .unwrap();

    let graph = depsgraph.graph();
    assert_single_id_node(graph, fixture.scene);
    assert_has_operation(graph, fixture.tree, NodeType::NTreeOutput, OpCode::NTreeOutput);
    let scene_evals = graph
        .operations()
        .iter()
        .filter(|op| op.key.opcode == OpCode::SceneEval)
        .count();
    assert_eq!(scene_evals, 1);
    assert_time_relation(graph, op(graph, fixture.scene, NodeType::Animation, OpCode::AnimationEntry));
}

#[test]
fn test_compositor_pipeline_adds_extra_tree() {
    let mut fixture = compositor_scene();
    let extra = fixture.db.add_node_tree("NTExtra", Default::default());
    let config = BuildConfig::default();

    let depsgraph = CompositorPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, extra, &config)
        .build()
        .unwrap();

    assert_single_id_node(depsgraph.graph(), extra);
    assert_single_id_node(depsgraph.graph(), fixture.tree);
}

#[test]
fn test_from_ids_pipeline() {
    let fixture = cube_scene();
    let config = BuildConfig::default();
    let ids = [fixture.lamp];

    let depsgraph = FromIdsPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &ids, &config)
        .build()
        .unwrap();

    assert_single_id_node(depsgraph.graph(), fixture.lamp);
    assert_single_id_node(depsgraph.graph(), fixture.light_data);
    assert_no_id_node(depsgraph.graph(), fixture.cube);
    assert_consistent(depsgraph.graph());
}

#[test]
fn test_all_view_layers_in_order() {
    let mut fixture = cube_scene();
    let mut second = ViewLayer::new("Lights");
    second.bases.push(Base::new(fixture.lamp));
    fixture
        .db
        .scene_mut(fixture.scene)
        .unwrap()
        .view_layers
        .push(second);

    for parallel in [true, false] {
        let config = BuildConfig::default().parallel_view_layers(parallel);
        let graphs = build_all_view_layers(&fixture.db, fixture.scene, &config).unwrap();

        let names: Vec<&str> = graphs.iter().map(|g| g.view_layer()).collect();
        assert_eq!(names, vec![VIEW_LAYER, "Lights"]);
        assert!(graphs[0].graph().find_id_node(fixture.cube).is_some());
        assert!(graphs[1].graph().find_id_node(fixture.cube).is_none());
        assert!(graphs[1].graph().find_id_node(fixture.lamp).is_some());
    }

    let config = BuildConfig::default();
    let result = build_all_view_layers(&fixture.db, fixture.cube, &config);
    assert!(matches!(result, Err(DepsgraphError::NotAScene(_))));
}

// ============================================================
// Rebuilds
// ============================================================

#[test]
fn test_update_tags_survive_full_rebuild() {
    let fixture = cube_scene();
    let config = BuildConfig::default();
    let mut depsgraph = ViewLayerPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &config)
        .build()
        .unwrap();

    assert!(depsgraph.tag_id(fixture.cube, Recalc::TRANSFORM) > 0);
    ViewLayerPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &config)
        .build_into(&mut depsgraph)
        .unwrap();

    let graph = depsgraph.graph();
    let init = op(graph, fixture.cube, NodeType::Transform, OpCode::TransformInit);
    assert!(graph.operation(init).needs_update());
    assert!(graph.entry_tags().contains(&init));
}

#[test]
fn test_rebuild_for_merges_new_entities() {
    let mut fixture = cube_scene();
    let config = BuildConfig::preset(Preset::Debug);
    let mut depsgraph = ViewLayerPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &config)
        .build()
        .unwrap();
    let id_nodes_before = depsgraph.graph().id_nodes().len();

    let child = add_child_object(&mut fixture.db, fixture.scene, "OBChild", fixture.cube);
    depsgraph.rebuild_for(&fixture.db, &[child]).unwrap();

    let graph = depsgraph.graph();
    assert_eq!(graph.id_nodes().len(), id_nodes_before + 1);
    assert_single_id_node(graph, fixture.cube);
    assert_single_id_node(graph, child);
    let cube_node = graph.id_node_for(fixture.cube).unwrap();
    assert!(cube_node.is_directly_visible);
    assert_eq!(cube_node.linked_state(), depsgraph_core::LinkedState::Directly);
    let child_node = graph.id_node_for(child).unwrap();
    assert_eq!(child_node.linked_state(), depsgraph_core::LinkedState::Directly);
    assert!(child_node.is_directly_visible);

    let parent = op(graph, fixture.cube, NodeType::Transform, OpCode::TransformFinal);
    let child_parent = op(graph, child, NodeType::Transform, OpCode::TransformParent);
    assert_relation(graph, parent, child_parent);
    assert_consistent(graph);
    assert!(!depsgraph.need_update());
    assert_eq!(depsgraph.schedule().len(), graph.operations().len());
    assert_eq!(
        depsgraph.build_stats().expansions(child, depsgraph_core::BuildStep::Object),
        1
    );
}

#[test]
fn test_rebuild_for_roots_match_full_build() {
    let mut fixture = cube_scene();
    let config = BuildConfig::default();
    let mut incremental = ViewLayerPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &config)
        .build()
        .unwrap();
    assert_eq!(
        incremental.graph().id_node_for(fixture.mesh).unwrap().linked_state(),
        depsgraph_core::LinkedState::Indirectly
    );

    let child = add_child_object(&mut fixture.db, fixture.scene, "OBChild", fixture.cube);
    incremental.rebuild_for(&fixture.db, &[child, fixture.mesh]).unwrap();
    let full = ViewLayerPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &config)
        .build()
        .unwrap();

    let merged = incremental.graph().id_node_for(child).unwrap();
    let rebuilt = full.graph().id_node_for(child).unwrap();
    assert_eq!(merged.linked_state(), rebuilt.linked_state());
    assert_eq!(merged.is_directly_visible, rebuilt.is_directly_visible);
    // An explicitly requested datablock is a root too
    assert_eq!(
        incremental.graph().id_node_for(fixture.mesh).unwrap().linked_state(),
        depsgraph_core::LinkedState::Directly
    );
}

// ============================================================
// Tagging and evaluation
// ============================================================

#[test]
fn test_evaluate_runs_only_tagged_work() {
    let fixture = cube_scene();
    let config = BuildConfig::default();
    let recorder = Recorder::default();
    let mut depsgraph = ViewLayerPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &config)
        .with_payloads(&recorder)
        .build()
        .unwrap();

    let stats = Evaluator::evaluate(&mut depsgraph, 1.0).unwrap();
    assert_eq!(stats.evaluated, 0);
    assert!(recorder.take().is_empty());

    depsgraph.tag_id(fixture.cube, Recalc::TRANSFORM);
    let stats = Evaluator::evaluate(&mut depsgraph, 2.0).unwrap();
    let calls = recorder.take();
    assert_eq!(stats.evaluated, calls.len());
    assert_eq!(depsgraph.frame(), 2.0);
    assert!(calls.contains(&(fixture.cube, OpCode::TransformFinal)));
    assert!(calls.contains(&(fixture.cube, OpCode::SynchronizeToOriginal)));
    assert!(!calls.contains(&(fixture.lamp, OpCode::TransformFinal)));
    assert!(depsgraph.graph().id_node_for(fixture.cube).unwrap().is_user_modified);

    // Order follows the schedule: init before final
    let init = calls
        .iter()
        .position(|c| *c == (fixture.cube, OpCode::TransformInit))
        .unwrap();
    let done = calls
        .iter()
        .position(|c| *c == (fixture.cube, OpCode::TransformFinal))
        .unwrap();
    assert!(init < done);

    // Flags are cleared after evaluation
    assert!(depsgraph.graph().operations().iter().all(|op| !op.needs_update()));
    assert!(depsgraph.graph().entry_tags().is_empty());
}

#[test]
fn test_frame_change_does_not_reach_synchronize() {
    let mut fixture = cube_scene();
    animate(&mut fixture);
    let config = BuildConfig::default();
    let recorder = Recorder::default();
    let mut depsgraph = ViewLayerPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &config)
        .with_payloads(&recorder)
        .build()
        .unwrap();

    assert!(depsgraph.tag_time_source() > 0);
    Evaluator::evaluate(&mut depsgraph, 10.0).unwrap();
    let calls = recorder.take();

    assert!(calls.contains(&(fixture.cube, OpCode::AnimationEval)));
    assert!(calls.contains(&(fixture.cube, OpCode::TransformFinal)));
    assert!(!calls.contains(&(fixture.cube, OpCode::SynchronizeToOriginal)));
    assert!(!depsgraph.graph().id_node_for(fixture.cube).unwrap().is_user_modified);
}

#[test]
fn test_tag_unknown_entity_is_ignored() {
    let fixture = cube_scene();
    let config = BuildConfig::default();
    let mut depsgraph = ViewLayerPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &config)
        .build()
        .unwrap();

    assert_eq!(depsgraph.tag_id(EntityId(4242), Recalc::ALL), 0);
    assert!(depsgraph.graph().entry_tags().is_empty());
}

#[test]
fn test_relations_outdated_blocks_evaluation() {
    let fixture = cube_scene();
    let config = BuildConfig::default();
    let mut depsgraph = ViewLayerPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &config)
        .build()
        .unwrap();

    depsgraph.tag_relations_update();
    let result = Evaluator::evaluate(&mut depsgraph, 1.0);
    assert!(matches!(result, Err(DepsgraphError::RelationsOutdated)));

    ViewLayerPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &config)
        .build_into(&mut depsgraph)
        .unwrap();
    assert!(Evaluator::evaluate(&mut depsgraph, 1.0).is_ok());
}

// ============================================================
// Debug output
// ============================================================

#[test]
fn test_graphviz_and_stats_export() {
    let fixture = compositor_scene();
    let config = BuildConfig::default();
    let depsgraph = ViewLayerPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &config)
        .build()
        .unwrap();

    let dot = depsgraph.to_graphviz();
    assert!(dot.starts_with("digraph depgraph {"));
    assert!(dot.contains("cluster_0"));
    assert!(dot.contains("Time Source"));
    assert!(dot.trim_end().ends_with('}'));

    let stats = depsgraph.graph_stats();
    let json: serde_json::Value = serde_json::from_str(&stats.to_json().unwrap()).unwrap();
    assert_eq!(json["operations"], stats.operations);
    assert_eq!(json["id_nodes"], depsgraph.graph().id_nodes().len());
}

#[test]
fn test_write_graphviz_file() {
    let fixture = cube_scene();
    let config = BuildConfig::default();
    let depsgraph = ViewLayerPipeline::new(&fixture.db, fixture.scene, VIEW_LAYER, &config)
        .build()
        .unwrap();
    let dir = tempfile::tempdir().unwrap();

    let path = dir.path().join("depsgraph.dot");
    depsgraph.write_graphviz(&path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), depsgraph.to_graphviz());

    let result = depsgraph.write_graphviz(dir.path().join("missing").join("depsgraph.dot"));
    assert!(matches!(result, Err(DepsgraphError::Io(_))));
}
