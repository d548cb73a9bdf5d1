//! Scene fixtures
//!
//! Small hand-built databases covering the shapes the builder has to cope
//! with: shared datablocks, double build paths and reference cycles.

use depsgraph_core::features::scene_db::{
    AnimData, Base, CameraData, CollectionData, EntityData, GeometryData, LayerCollection,
    NodeTreeData, ObjectData, SceneArena, SceneData, ShadingData, TreeNode, ViewLayer,
    SCEMODE_DO_COMPOSITE,
};
use depsgraph_core::features::node_registry::Graph;
use depsgraph_core::{EntityId, EvaluationMode};
use depsgraph_alloc::GuardedAllocator;
use std::sync::Arc;

pub const VIEW_LAYER: &str = "ViewLayer";

/// Empty graph backed by a fresh unlimited allocator
pub fn new_graph() -> (Graph, Arc<GuardedAllocator>) {
    let alloc = Arc::new(GuardedAllocator::new());
    (Graph::new(EvaluationMode::Viewport, alloc.clone()), alloc)
}

// ============================================================
// Compositor scene
// ============================================================

/// Scene with compositing enabled, an animated scene action and a
/// compositor tree; no camera, audio or sequencer
pub struct CompositorScene {
    pub db: SceneArena,
    pub scene: EntityId,
    pub tree: EntityId,
    pub action: EntityId,
}

pub fn compositor_scene() -> CompositorScene {
    let mut db = SceneArena::new();
    let action = db.add_data("ACSceneAction", EntityData::Action);
    let tree = db.add_node_tree(
        "NTCompositing",
        NodeTreeData {
            nodes: vec![TreeNode::new("Render Layers", None), TreeNode::new("Composite", None)],
        },
    );
    let mut scene_data = SceneData {
        view_layers: vec![ViewLayer::new(VIEW_LAYER)],
        compositor_tree: Some(tree),
        ..Default::default()
    };
    scene_data.render.scemode = SCEMODE_DO_COMPOSITE;
    let scene = db.add_scene("SCScene", scene_data);
    if let Some(entity) = db.get_mut(scene) {
        entity.anim_data = Some(AnimData {
            action: Some(action),
            ..Default::default()
        });
    }
    CompositorScene { db, scene, tree, action }
}

/// Compositor scene whose tree has a node pointing back at the scene
pub fn self_referencing_scene() -> CompositorScene {
    let mut fixture = compositor_scene();
    let scene = fixture.scene;
    if let Some(tree) = fixture.db.node_tree_mut(fixture.tree) {
        tree.nodes.push(TreeNode::new("Defocus", Some(scene)));
    }
    fixture
}

// ============================================================
// Cube scene
// ============================================================

/// Default startup scene: cube with mesh and material, camera, light,
/// all in one collection linked into the view layer
pub struct CubeScene {
    pub db: SceneArena,
    pub scene: EntityId,
    pub collection: EntityId,
    pub cube: EntityId,
    pub mesh: EntityId,
    pub material: EntityId,
    pub camera: EntityId,
    pub camera_data: EntityId,
    pub lamp: EntityId,
    pub light_data: EntityId,
}

pub fn cube_scene() -> CubeScene {
    let mut db = SceneArena::new();
    let material = db.add_data("MAMaterial", EntityData::Material(ShadingData::default()));
    let mesh = db.add_data(
        "MECube",
        EntityData::Mesh(GeometryData {
            materials: vec![material],
        }),
    );
    let cube = db.add_object(
        "OBCube",
        ObjectData {
            data: Some(mesh),
            ..Default::default()
        },
    );
    let camera_data = db.add_data("CACamera", EntityData::Camera(CameraData::default()));
    let camera = db.add_object(
        "OBCamera",
        ObjectData {
            data: Some(camera_data),
            ..Default::default()
        },
    );
    let light_data = db.add_data("LALight", EntityData::Light(ShadingData::default()));
    let lamp = db.add_object(
        "OBLight",
        ObjectData {
            data: Some(light_data),
            ..Default::default()
        },
    );
    let collection = db.add_collection(
        "Collection",
        CollectionData {
            objects: vec![cube, camera, lamp],
            ..Default::default()
        },
    );

    let mut layer = ViewLayer::new(VIEW_LAYER);
    layer.bases = vec![Base::new(cube), Base::new(camera), Base::new(lamp)];
    layer.layer_collections = vec![LayerCollection::new(collection)];
    let scene = db.add_scene(
        "SCScene",
        SceneData {
            view_layers: vec![layer],
            camera: Some(camera),
            master_collection: Some(collection),
            ..Default::default()
        },
    );

    CubeScene {
        db,
        scene,
        collection,
        cube,
        mesh,
        material,
        camera,
        camera_data,
        lamp,
        light_data,
    }
}

/// Add an object parented to `parent` and give it a base in the view layer
pub fn add_child_object(db: &mut SceneArena, scene: EntityId, name: &str, parent: EntityId) -> EntityId {
    let child = db.add_object(
        name,
        ObjectData {
            parent: Some(parent),
            ..Default::default()
        },
    );
    if let Some(layer) = db
        .scene_mut(scene)
        .and_then(|s| s.view_layers.iter_mut().find(|vl| vl.name == VIEW_LAYER))
    {
        layer.bases.push(Base::new(child));
    }
    child
}

/// Scene with one view layer holding the given objects as bases
pub fn scene_with_objects(db: &mut SceneArena, name: &str, objects: &[EntityId]) -> EntityId {
    let mut layer = ViewLayer::new(VIEW_LAYER);
    layer.bases = objects.iter().map(|ob| Base::new(*ob)).collect();
    db.add_scene(
        name,
        SceneData {
            view_layers: vec![layer],
            ..Default::default()
        },
    )
}
