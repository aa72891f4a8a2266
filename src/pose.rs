//! Applies pose records to a built scene.
//!
//! Poses arrive as world-frame values anchored at the simulation's own
//! origin and axis convention. Each one is converted, re-anchored against the
//! root frame captured at load time and then projected into the parent frame
//! of the node it targets. Writes are absolute, so applying the same record
//! twice leaves the scene exactly as applying it once.

use cgmath::{EuclideanSpace, Point3, Quaternion, SquareMatrix, Transform as _, Vector3};

use crate::{
    builder::BuiltScene,
    config::ViewerConfig,
    convert::{convert_orientation, convert_position},
    data_structures::{description::PoseRecord, scene_graph::NodeId, transform::Transform},
};

/// World-frame pose of one node in the viewer's convention.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldPose {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
}

impl WorldPose {
    /// Interprets `[px, py, pz, qx, qy, qz, qw]` from the host. Returns `None` for short entries.
    pub fn from_wire(values: &[f32], handedness_conversion: bool) -> Option<Self> {
        let &[px, py, pz, qx, qy, qz, qw, ..] = values else {
            return None;
        };
        Some(if handedness_conversion {
            Self {
                position: convert_position(px, py, pz),
                rotation: convert_orientation(qx, qy, qz, qw),
            }
        } else {
            Self {
                position: Vector3::new(px, py, pz),
                rotation: Quaternion::new(qw, qx, qy, qz),
            }
        })
    }

    /// Re-expresses a pose given relative to the uncentered scene origin
    /// relative to the root as it was placed at load time.
    pub fn anchored(self, root_frame: &Transform) -> Self {
        Self {
            position: self.position + root_frame.position,
            rotation: self.rotation * root_frame.rotation,
        }
    }
}

/// Writes `pose` onto `id` as a local transform, keeping the node's scale.
///
/// A node without parent takes the world pose as its local pose.
pub fn set_world_pose(scene: &mut BuiltScene, id: NodeId, pose: WorldPose) {
    let graph = &mut scene.graph;
    let (position, rotation) = match graph.parent(id) {
        Some(parent) => {
            let position = match graph.world_matrix(parent).invert() {
                Some(inverse) => inverse.transform_point(Point3::from_vec(pose.position)).to_vec(),
                None => {
                    log::warn!("Parent of {:?} has a degenerate world transform", id);
                    pose.position
                }
            };
            let rotation = graph.world_transform(parent).inverse_rotation() * pose.rotation;
            (position, rotation)
        }
        None => (pose.position, pose.rotation),
    };
    if let Some(mut local) = graph.local_transform(id) {
        local.position = position;
        local.rotation = rotation;
        graph.set_local_transform(id, local);
    }
}

/// Applies every entry of `record` that names a registered node.
///
/// Unknown names are skipped silently; entries shorter than seven numbers
/// are skipped with a warning. Parents are written before their children so
/// every projection sees the parent's pose of this very record. Returns how
/// many nodes were written.
pub fn apply_pose_record(scene: &mut BuiltScene, record: &PoseRecord, config: &ViewerConfig) -> usize {
    let mut updates: Vec<(usize, NodeId, WorldPose)> = record
        .update_data
        .iter()
        .filter_map(|(name, values)| {
            let id = scene.node(name)?;
            let Some(pose) = WorldPose::from_wire(values, config.handedness_conversion) else {
                log::warn!(
                    "Pose for {name} has {} values, expected 7",
                    values.len()
                );
                return None;
            };
            let pose = if config.compose_root_frame {
                pose.anchored(&scene.root_frame)
            } else {
                pose
            };
            Some((scene.graph.depth(id), id, pose))
        })
        .collect();
    // Depth first, then node id for a stable order within one level.
    updates.sort_by_key(|&(depth, id, _)| (depth, id));

    for &(_, id, pose) in &updates {
        set_world_pose(scene, id, pose);
    }
    log::trace!("Applied {} of {} poses", updates.len(), record.update_data.len());
    updates.len()
}
