//! Turns a [`SceneDescription`] into a live [`SceneGraph`].
//!
//! Bodies become [`NodeKind::Body`] nodes carrying the hierarchy that pose
//! updates act on. The visuals of each body hang below a separate "Visuals"
//! group so they never take part in pose routing.

use std::{collections::HashMap, sync::Arc};

use crate::{
    config::{RegistrationScope, ViewerConfig},
    convert::to_transform,
    data_structures::{
        description::{BodyDescription, SceneDescription, VisualDescription, VisualType},
        scene_graph::{NodeId, NodeKind, RenderLeaf, SceneGraph},
        transform::Transform,
    },
    resources::{
        AssetTable,
        material::Material,
        mesh::{Geometry, Primitive},
    },
};

pub const VISUALS_GROUP: &str = "Visuals";

/// Body name to the node pose updates for that body are written to.
pub type Registry = HashMap<String, NodeId>;

/// A fully built scene: the graph, its registry and the frame poses arrive in.
#[derive(Clone, Debug)]
pub struct BuiltScene {
    pub graph: SceneGraph,
    pub registry: Registry,
    pub root: NodeId,
    /// Local transform of the root right after recentering. Poses are
    /// re-anchored against this, not against the root's live transform.
    pub root_frame: Transform,
}

impl BuiltScene {
    pub fn node(&self, name: &str) -> Option<NodeId> {
        self.registry.get(name).copied()
    }
}

struct SceneBuilder<'a> {
    assets: &'a AssetTable,
    config: &'a ViewerConfig,
    graph: SceneGraph,
    registry: Registry,
}

impl SceneBuilder<'_> {
    fn register(&mut self, name: &str, id: NodeId) {
        if self.registry.contains_key(name) {
            log::warn!("Body name {name} is not unique, pose updates go to its first occurrence");
            return;
        }
        self.registry.insert(name.to_string(), id);
    }

    /// Depth-first, parent before children.
    fn create_body(&mut self, body: &BodyDescription, is_root: bool) -> NodeId {
        let local = to_transform(&body.trans, None, self.config.handedness_conversion);
        let body_node = self.graph.create_node(&body.name, NodeKind::Body, local);
        if !is_root || self.config.registration == RegistrationScope::AllBodies {
            self.register(&body.name, body_node);
        }

        let visuals = self
            .graph
            .create_node(VISUALS_GROUP, NodeKind::Visuals, Transform::default());
        self.graph.add_child(body_node, visuals);

        for visual in &body.visuals {
            let leaf = self.create_visual(&body.name, visual);
            self.graph.add_child(visuals, leaf);
        }

        for child in &body.children {
            let child_node = self.create_body(child, false);
            self.graph.add_child(body_node, child_node);
        }

        body_node
    }

    fn create_visual(&mut self, body_name: &str, visual: &VisualDescription) -> NodeId {
        let geometry = match Primitive::from_visual_type(visual.kind) {
            Some(primitive) => Some(Arc::new(Geometry::Primitive(primitive))),
            None if visual.kind == VisualType::Unknown => {
                log::warn!("Body {body_name} has a visual of unknown type, it will not be drawn");
                None
            }
            None => match &visual.mesh {
                Some(id) => {
                    let mesh = self.assets.meshes.get(id).cloned();
                    if mesh.is_none() {
                        log::error!("Body {body_name} references mesh {id} which did not load");
                    }
                    mesh
                }
                None => {
                    log::error!("Body {body_name} has a mesh visual without a mesh id");
                    None
                }
            },
        };

        let material = match &visual.material {
            Some(id) => self.assets.materials.get(id).cloned().unwrap_or_else(|| {
                log::error!("Body {body_name} references material {id} which did not load");
                Arc::new(Material::default())
            }),
            None => Arc::new(Material::flat(visual.color.as_deref().unwrap_or(&[1.0; 3]))),
        };

        let local = to_transform(&visual.trans, Some(visual.kind), self.config.handedness_conversion);
        self.graph.create_node(
            format!("{body_name}/{}", visual_label(visual.kind)),
            NodeKind::Visual(RenderLeaf {
                kind: visual.kind,
                geometry,
                material,
            }),
            local,
        )
    }

    /// Moves the root so the scene's box is centered on the xz-plane at a fixed height.
    fn recenter(&mut self, root: NodeId) {
        let Some(bounds) = self.graph.world_bounds(root) else {
            log::debug!("Scene has no drawable geometry, only lifting the root");
            if let Some(node) = self.graph.node_mut(root) {
                node.local.position.y = self.config.recenter_height;
            }
            return;
        };
        let center = bounds.center();
        if let Some(node) = self.graph.node_mut(root) {
            node.local.position.x -= center.x;
            node.local.position.z -= center.z;
            node.local.position.y = self.config.recenter_height;
        }
    }
}

fn visual_label(kind: VisualType) -> &'static str {
    match kind {
        VisualType::Mesh => "mesh",
        VisualType::Plane => "plane",
        VisualType::Sphere => "sphere",
        VisualType::Cube => "cube",
        VisualType::Cylinder => "cylinder",
        VisualType::Capsule => "capsule",
        VisualType::Unknown => "unknown",
    }
}

/// Builds the graph for `scene`, resolving asset references against `assets`.
///
/// Missing meshes and materials are logged and tolerated: the visual is kept
/// without geometry, or with a default material respectively.
pub fn build_scene(scene: &SceneDescription, assets: &AssetTable, config: &ViewerConfig) -> BuiltScene {
    let mut builder = SceneBuilder {
        assets,
        config,
        graph: SceneGraph::new(),
        registry: Registry::new(),
    };

    let root = builder.create_body(&scene.root, true);
    builder.graph.set_root(root);
    if config.recenter {
        builder.recenter(root);
    }

    let SceneBuilder {
        graph, registry, ..
    } = builder;
    let root_frame = graph.local_transform(root).unwrap_or_default();
    log::info!(
        "Built scene {} with {} nodes, {} of them addressable",
        scene.root.name,
        graph.len(),
        registry.len()
    );
    BuiltScene {
        graph,
        registry,
        root,
        root_frame,
    }
}
