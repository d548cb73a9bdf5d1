//! Relation builder rules, checked on built graphs

#[path = "../common/mod.rs"]
mod common;

use common::*;
use depsgraph_core::features::node_registry::{OperationId, Relation, RelationFlags, RelationSource};
use depsgraph_core::features::scene_db::{
    CameraData, EntityData, NodeTreeData, ObjectData, SceneArena, SceneDatabase, ShadingData, TreeNode,
};
use depsgraph_core::{
    EntityId, Graph, LinkedState, NodeBuilder, NodeType, OpCode, Schedule,
};
use pretty_assertions::assert_eq;

/// Nodes of the view layer plus all relations; returns relations added
fn build_view_layer_graph(db: &dyn SceneDatabase, scene: EntityId, graph: &mut Graph) -> usize {
    let mut builder = NodeBuilder::new(db, graph);
    builder
        .build_view_layer(scene, VIEW_LAYER, LinkedState::Directly)
        .unwrap();
    let mut relations = builder.into_relation_builder();
    relations.build_relations().unwrap();
    relations.relations_added()
}

fn relation_between(graph: &Graph, from: OperationId, to: OperationId) -> &Relation {
    graph
        .operation(to)
        .inlinks()
        .iter()
        .map(|rel| graph.relation(*rel))
        .find(|rel| rel.from == RelationSource::Operation(from))
        .unwrap_or_else(|| {
            panic!(
                "no relation {} -> {}",
                graph.operation_label(from),
                graph.operation_label(to)
            )
        })
}

// ============================================================
// Shared rules
// ============================================================

#[test]
fn test_transform_is_a_strict_chain() {
    let mut fixture = cube_scene();
    let child = add_child_object(&mut fixture.db, fixture.scene, "OBChild", fixture.cube);
    let (mut graph, _alloc) = new_graph();
    build_view_layer_graph(&fixture.db, fixture.scene, &mut graph);

    let init = op(&graph, child, NodeType::Transform, OpCode::TransformInit);
    let local = op(&graph, child, NodeType::Transform, OpCode::TransformLocal);
    let parent = op(&graph, child, NodeType::Transform, OpCode::TransformParent);
    let done = op(&graph, child, NodeType::Transform, OpCode::TransformFinal);
    assert_relation(&graph, init, local);
    assert_relation(&graph, local, parent);
    assert_relation(&graph, parent, done);
    assert_no_relation(&graph, init, done);

    let parent_done = op(&graph, fixture.cube, NodeType::Transform, OpCode::TransformFinal);
    assert_relation(&graph, parent_done, parent);
    assert_consistent(&graph);
}

#[test]
fn test_copy_on_write_precedes_components() {
    let fixture = cube_scene();
    let (mut graph, _alloc) = new_graph();
    build_view_layer_graph(&fixture.db, fixture.scene, &mut graph);

    let cow = op(&graph, fixture.cube, NodeType::CopyOnWrite, OpCode::CopyOnWrite);
    for (node_type, opcode) in [
        (NodeType::Transform, OpCode::TransformInit),
        (NodeType::Geometry, OpCode::GeometryEvalInit),
        (NodeType::Parameters, OpCode::ParametersEntry),
        (NodeType::ObjectFromLayer, OpCode::ObjectFromLayerEntry),
        (NodeType::Synchronization, OpCode::SynchronizeToOriginal),
    ] {
        assert_relation(&graph, cow, op(&graph, fixture.cube, node_type, opcode));
    }
    let visibility = op(&graph, fixture.cube, NodeType::Visibility, OpCode::Visibility);
    assert_no_relation(&graph, cow, visibility);
}

#[test]
fn test_parameters_feed_components() {
    let fixture = cube_scene();
    let (mut graph, _alloc) = new_graph();
    build_view_layer_graph(&fixture.db, fixture.scene, &mut graph);

    let entry = op(&graph, fixture.cube, NodeType::Parameters, OpCode::ParametersEntry);
    let eval = op(&graph, fixture.cube, NodeType::Parameters, OpCode::ParametersEval);
    let exit = op(&graph, fixture.cube, NodeType::Parameters, OpCode::ParametersExit);
    assert_relation(&graph, entry, eval);
    assert_relation(&graph, eval, exit);
    assert_relation(&graph, exit, op(&graph, fixture.cube, NodeType::Transform, OpCode::TransformInit));
    assert_relation(&graph, exit, op(&graph, fixture.cube, NodeType::Geometry, OpCode::GeometryEvalInit));

    let scene_exit = op(&graph, fixture.scene, NodeType::Parameters, OpCode::ParametersExit);
    let view_layer = op(&graph, fixture.scene, NodeType::LayerCollections, OpCode::ViewLayerEval);
    assert_relation(&graph, scene_exit, view_layer);
}

#[test]
fn test_no_duplicate_relations() {
    let fixture = cube_scene();
    let (mut graph, _alloc) = new_graph();
    let added = build_view_layer_graph(&fixture.db, fixture.scene, &mut graph);

    assert_eq!(added, graph.relations().len());
    let mut seen = std::collections::HashSet::new();
    for rel in graph.relations() {
        assert!(
            seen.insert((rel.from, rel.to, rel.name.clone())),
            "duplicate relation {}",
            rel.name
        );
    }
}

// ============================================================
// Animation
// ============================================================

#[test]
fn test_time_source_drives_animation() {
    let fixture = compositor_scene();
    let (mut graph, _alloc) = new_graph();
    build_view_layer_graph(&fixture.db, fixture.scene, &mut graph);

    let animation_entry = op(&graph, fixture.scene, NodeType::Animation, OpCode::AnimationEntry);
    let animation_exit = op(&graph, fixture.scene, NodeType::Animation, OpCode::AnimationExit);
    assert_time_relation(&graph, animation_entry);

    let action = op(&graph, fixture.action, NodeType::Animation, OpCode::AnimationEval);
    assert_relation(&graph, action, animation_entry);
    let parameters = op(&graph, fixture.scene, NodeType::Parameters, OpCode::ParametersEntry);
    assert_relation(&graph, animation_exit, parameters);
    assert_consistent(&graph);
}

#[test]
fn test_driver_target_feeds_driver() {
    let mut fixture = cube_scene();
    let (cube, lamp) = (fixture.cube, fixture.lamp);
    fixture.db.get_mut(cube).unwrap().anim_data = Some(depsgraph_core::features::scene_db::AnimData {
        drivers: vec![depsgraph_core::features::scene_db::Driver::new("location", 0).with_target("lamp", lamp)],
        ..Default::default()
    });
    let (mut graph, _alloc) = new_graph();
    build_view_layer_graph(&fixture.db, fixture.scene, &mut graph);

    let key = depsgraph_core::features::node_registry::OperationKey::named(OpCode::Driver, "location", 0);
    let driver = graph
        .find_operation_node(cube, NodeType::Parameters, "", &key)
        .unwrap();
    let lamp_transform = op(&graph, lamp, NodeType::Transform, OpCode::TransformFinal);
    assert_relation(&graph, lamp_transform, driver);
}

// ============================================================
// Objects and data
// ============================================================

#[test]
fn test_object_data_and_materials() {
    let fixture = cube_scene();
    let (mut graph, _alloc) = new_graph();
    build_view_layer_graph(&fixture.db, fixture.scene, &mut graph);

    let mesh_geometry = op(&graph, fixture.mesh, NodeType::Geometry, OpCode::GeometryEval);
    let object_geometry = op(&graph, fixture.cube, NodeType::Geometry, OpCode::GeometryEvalInit);
    assert_relation(&graph, mesh_geometry, object_geometry);

    let material = op(&graph, fixture.material, NodeType::Shading, OpCode::MaterialUpdate);
    assert_relation(&graph, material, mesh_geometry);

    let camera_parameters = op(&graph, fixture.camera_data, NodeType::Parameters, OpCode::ParametersExit);
    let camera_object = op(&graph, fixture.camera, NodeType::Parameters, OpCode::ParametersEntry);
    assert_relation(&graph, camera_parameters, camera_object);
}

#[test]
fn test_camera_depth_of_field_target() {
    let mut fixture = cube_scene();
    if let Some(entity) = fixture.db.get_mut(fixture.camera_data) {
        entity.data = EntityData::Camera(CameraData {
            dof_object: Some(fixture.cube),
        });
    }
    let (mut graph, _alloc) = new_graph();
    build_view_layer_graph(&fixture.db, fixture.scene, &mut graph);

    let focus = op(&graph, fixture.cube, NodeType::Transform, OpCode::TransformFinal);
    let parameters = op(&graph, fixture.camera_data, NodeType::Parameters, OpCode::ParametersEntry);
    assert_relation(&graph, focus, parameters);
}

#[test]
fn test_synchronize_flushes_only_user_edits() {
    let fixture = cube_scene();
    let (mut graph, _alloc) = new_graph();
    build_view_layer_graph(&fixture.db, fixture.scene, &mut graph);

    let sync = op(&graph, fixture.cube, NodeType::Synchronization, OpCode::SynchronizeToOriginal);
    let transform = op(&graph, fixture.cube, NodeType::Transform, OpCode::TransformFinal);
    let geometry = op(&graph, fixture.cube, NodeType::Geometry, OpCode::GeometryEvalDone);
    for from in [transform, geometry] {
        let rel = relation_between(&graph, from, sync);
        assert!(rel.flags.contains(RelationFlags::FLUSH_USER_EDIT_ONLY));
    }
    let flags = op(&graph, fixture.cube, NodeType::ObjectFromLayer, OpCode::ObjectFromLayerExit);
    assert!(!relation_between(&graph, flags, sync)
        .flags
        .contains(RelationFlags::FLUSH_USER_EDIT_ONLY));
}

#[test]
fn test_view_layer_feeds_base_flags() {
    let fixture = cube_scene();
    let (mut graph, _alloc) = new_graph();
    build_view_layer_graph(&fixture.db, fixture.scene, &mut graph);

    let view_layer = op(&graph, fixture.scene, NodeType::LayerCollections, OpCode::ViewLayerEval);
    for object in [fixture.cube, fixture.camera, fixture.lamp] {
        let entry = op(&graph, object, NodeType::ObjectFromLayer, OpCode::ObjectFromLayerEntry);
        assert_relation(&graph, view_layer, entry);
    }
}

#[test]
fn test_collection_waits_for_objects() {
    let fixture = cube_scene();
    let (mut graph, _alloc) = new_graph();
    let mut builder = NodeBuilder::new(&fixture.db, &mut graph);
    builder.build_collection(None, fixture.collection).unwrap();
    let mut relations = builder.into_relation_builder();
    relations.build_relations().unwrap();

    let done = op(&graph, fixture.collection, NodeType::Geometry, OpCode::GeometryEvalDone);
    for object in [fixture.cube, fixture.camera, fixture.lamp] {
        let transform = op(&graph, object, NodeType::Transform, OpCode::TransformFinal);
        assert_relation(&graph, transform, done);
    }
}

// ============================================================
// Node trees and shading
// ============================================================

#[test]
fn test_node_tree_feeds_shading() {
    let mut db = SceneArena::new();
    let image = db.add_data("IMWood", EntityData::Image);
    let tree = db.add_node_tree(
        "NTShader",
        NodeTreeData {
            nodes: vec![TreeNode::new("Image Texture", Some(image))],
        },
    );
    let material = db.add_data(
        "MAWood",
        EntityData::Material(ShadingData {
            node_tree: Some(tree),
        }),
    );
    let object = db.add_object(
        "OBPlank",
        ObjectData {
            materials: vec![material],
            ..Default::default()
        },
    );
    let scene = scene_with_objects(&mut db, "SCWorkshop", &[object]);
    let (mut graph, _alloc) = new_graph();
    build_view_layer_graph(&db, scene, &mut graph);

    let image_update = op(&graph, image, NodeType::GenericDatablock, OpCode::GenericDatablockUpdate);
    let tree_output = op(&graph, tree, NodeType::NTreeOutput, OpCode::NTreeOutput);
    let shading = op(&graph, material, NodeType::Shading, OpCode::MaterialUpdate);
    assert_relation(&graph, image_update, tree_output);
    assert_relation(&graph, tree_output, shading);

    // No geometry on this object: material slots feed its parameters
    let parameters = op(&graph, object, NodeType::Parameters, OpCode::ParametersEntry);
    assert_relation(&graph, shading, parameters);
    assert_consistent(&graph);
}

// ============================================================
// Cycles
// ============================================================

#[test]
fn test_parent_cycle_is_marked_and_scheduled() {
    common::init_tracing();
    let mut db = SceneArena::new();
    let a = db.add_object("OBA", ObjectData::default());
    let b = db.add_object(
        "OBB",
        ObjectData {
            parent: Some(a),
            ..Default::default()
        },
    );
    db.object_mut(a).unwrap().parent = Some(b);
    let scene = scene_with_objects(&mut db, "SCCycle", &[a, b]);

    let (mut graph, _alloc) = new_graph();
    build_view_layer_graph(&db, scene, &mut graph);
    let schedule = Schedule::build(&mut graph);

    assert!(schedule.has_cycles());
    assert!(graph.relations().iter().any(Relation::is_cyclic));
    assert!(!schedule.strongly_connected().is_empty());
    assert_eq!(schedule.len(), graph.operations().len());

    // Every non-cyclic relation is honoured by the order
    for rel in graph.relations() {
        if rel.is_cyclic() {
            continue;
        }
        if let Some(from) = rel.from.operation() {
            assert!(schedule.position(from) < schedule.position(rel.to));
        }
    }
}

#[test]
fn test_acyclic_scene_has_no_cycles() {
    let fixture = cube_scene();
    let (mut graph, _alloc) = new_graph();
    build_view_layer_graph(&fixture.db, fixture.scene, &mut graph);
    let schedule = Schedule::build(&mut graph);

    assert!(!schedule.has_cycles());
    assert!(schedule.strongly_connected().is_empty());
    assert!(graph.relations().iter().all(|rel| !rel.is_cyclic()));
}
