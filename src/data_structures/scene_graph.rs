//! Scene graph and hierarchical scene organization.
//!
//! Nodes live in a flat arena and refer to each other by [`NodeId`], which
//! gives cheap parent lookups for re-projecting world poses into a node's
//! parent frame. World transforms are never cached: they are composed from
//! the local transforms on demand, so a freshly written parent pose is seen
//! by its children immediately.

use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix};

use crate::{
    data_structures::{bounds::Aabb, description::VisualType, transform::Transform},
    resources::{material::Material, mesh::Geometry},
};

/// Handle of a node inside one [`SceneGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Everything a renderer needs to draw one visual.
#[derive(Clone, Debug)]
pub struct RenderLeaf {
    pub kind: VisualType,
    /// `None` when the referenced mesh failed to load; such leaves draw nothing.
    pub geometry: Option<Arc<Geometry>>,
    pub material: Arc<Material>,
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    /// A body of the simulation; target of pose updates.
    Body,
    /// Grouping node holding the render leaves of its body.
    Visuals,
    Visual(RenderLeaf),
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub local: Transform,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached node.
    pub fn create_node(&mut self, name: impl Into<String>, kind: NodeKind, local: Transform) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.into(),
            kind,
            local,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Attaches `child` under `parent`, detaching it from any previous parent first.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || self.is_ancestor(child, parent) {
            log::warn!("Refusing to attach {:?} under its own descendant {:?}", child, parent);
            return;
        }
        if let Some(old_parent) = self.nodes[child.0].parent.take() {
            self.nodes[old_parent.0].children.retain(|&c| c != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|id| id == ancestor)
    }

    /// Parent, grandparent, ... up to the top of the tree.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes[id.0].parent, |id| self.nodes[id.0].parent)
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    /// Direct child of `id` with the given name.
    pub fn child_by_name(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.node(id)?
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child.0].name == name)
    }

    pub fn local_transform(&self, id: NodeId) -> Option<Transform> {
        self.node(id).map(|node| node.local)
    }

    pub fn set_local_transform(&mut self, id: NodeId, transform: Transform) {
        if let Some(node) = self.node_mut(id) {
            node.local = transform;
        }
    }

    /// Number of ancestors.
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// Composition of all local transforms from the top of the tree down to `id`.
    ///
    /// Position and rotation are exact. Scale is the per-axis product, which
    /// cannot express the shear a non-uniformly scaled ancestor puts on a
    /// rotated descendant; use [`SceneGraph::world_matrix`] to place geometry.
    pub fn world_transform(&self, id: NodeId) -> Transform {
        let mut world = self.nodes[id.0].local;
        for ancestor in self.ancestors(id) {
            world = &self.nodes[ancestor.0].local * &world;
        }
        world
    }

    /// Product of all local matrices from the top of the tree down to `id`.
    pub fn world_matrix(&self, id: NodeId) -> Matrix4<f32> {
        let mut world = self.nodes[id.0].local.to_matrix();
        for ancestor in self.ancestors(id) {
            world = self.nodes[ancestor.0].local.to_matrix() * world;
        }
        world
    }

    /// World-space box around every drawable leaf below (and including) `id`.
    pub fn world_bounds(&self, id: NodeId) -> Option<Aabb> {
        let parent_world = match self.parent(id) {
            Some(parent) => self.world_matrix(parent),
            None => Matrix4::identity(),
        };
        let mut bounds = None;
        self.collect_bounds(id, &parent_world, &mut bounds);
        bounds
    }

    fn collect_bounds(&self, id: NodeId, parent_world: &Matrix4<f32>, bounds: &mut Option<Aabb>) {
        let node = &self.nodes[id.0];
        let world = parent_world * node.local.to_matrix();
        if let NodeKind::Visual(RenderLeaf {
            geometry: Some(geometry),
            ..
        }) = &node.kind
        {
            if let Some(local_bounds) = geometry.bounds() {
                let leaf_bounds = local_bounds.transform(&world);
                *bounds = Some(match *bounds {
                    Some(acc) => acc.merge(&leaf_bounds),
                    None => leaf_bounds,
                });
            }
        }
        for &child in &node.children {
            self.collect_bounds(child, &world, bounds);
        }
    }

    /// Every drawable leaf reachable from the root with its world matrix, in
    /// depth-first order. This is what a renderer consumes each frame.
    pub fn render_leaves(&self) -> Vec<(NodeId, &RenderLeaf, Matrix4<f32>)> {
        let mut leaves = Vec::new();
        if let Some(root) = self.root {
            self.collect_leaves(root, &Matrix4::identity(), &mut leaves);
        }
        leaves
    }

    fn collect_leaves<'a>(
        &'a self,
        id: NodeId,
        parent_world: &Matrix4<f32>,
        leaves: &mut Vec<(NodeId, &'a RenderLeaf, Matrix4<f32>)>,
    ) {
        let node = &self.nodes[id.0];
        let world = parent_world * node.local.to_matrix();
        if let NodeKind::Visual(leaf) = &node.kind {
            if leaf.geometry.is_some() {
                leaves.push((id, leaf, world));
            }
        }
        for &child in &node.children {
            self.collect_leaves(child, &world, leaves);
        }
    }
}
