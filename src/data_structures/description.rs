//! Wire types served by the simulation host.
//!
//! These mirror the JSON documents behind `/scene_data` and `/scene_state`
//! one to one; nothing in here is converted or validated beyond what serde
//! does while decoding.

use std::collections::HashMap;

use serde::Deserialize;

/// Identifier of a mesh, material or texture inside one scene description.
pub type AssetId = String;

/// Full scene as returned by `/scene_data`.
#[derive(Clone, Debug, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub id: serde_json::Value,
    pub root: BodyDescription,
    #[serde(default)]
    pub meshes: Vec<MeshDescription>,
    #[serde(default)]
    pub materials: Vec<MaterialDescription>,
    #[serde(default)]
    pub textures: Vec<TextureDescription>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TransformDescription {
    pub pos: [f32; 3],
    /// Quaternion in `x, y, z, w` order.
    pub rot: [f32; 4],
    pub scale: [f32; 3],
}

impl Default for TransformDescription {
    fn default() -> Self {
        Self {
            pos: [0.0; 3],
            rot: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
        }
    }
}

/// A named node of the source tree. Names are expected to be unique across the whole tree.
#[derive(Clone, Debug, Deserialize)]
pub struct BodyDescription {
    pub name: String,
    #[serde(default)]
    pub trans: TransformDescription,
    #[serde(default)]
    pub visuals: Vec<VisualDescription>,
    #[serde(default)]
    pub children: Vec<BodyDescription>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VisualType {
    Mesh,
    Plane,
    Sphere,
    Cube,
    Cylinder,
    Capsule,
    /// Any type this viewer does not know how to draw.
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Deserialize)]
pub struct VisualDescription {
    #[serde(rename = "type")]
    pub kind: VisualType,
    #[serde(default)]
    pub mesh: Option<AssetId>,
    #[serde(default)]
    pub material: Option<AssetId>,
    /// Inline colour used when no material is referenced. RGB, alpha ignored.
    #[serde(default)]
    pub color: Option<Vec<f32>>,
    #[serde(default)]
    pub trans: TransformDescription,
}

/// Byte offset and element count of one attribute inside a mesh blob.
pub type BufferLayout = [usize; 2];

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshDescription {
    pub id: AssetId,
    pub data_hash: String,
    #[serde(default)]
    pub tag: Option<String>,
    pub vertices_layout: BufferLayout,
    pub normals_layout: BufferLayout,
    pub uv_layout: BufferLayout,
    pub indices_layout: BufferLayout,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialDescription {
    pub id: AssetId,
    pub color: Vec<f32>,
    #[serde(default)]
    pub emission_color: Vec<f32>,
    #[serde(default)]
    pub shininess: f32,
    #[serde(default)]
    pub reflectance: f32,
    #[serde(default)]
    pub specular: f32,
    #[serde(default)]
    pub texture: Option<AssetId>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureDescription {
    pub id: AssetId,
    pub data_hash: String,
    pub width: u32,
    pub height: u32,
}

/// Body name to `[px, py, pz, qx, qy, qz, qw]` in the source (left-handed) world frame.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseRecord {
    #[serde(default)]
    pub update_data: HashMap<String, Vec<f32>>,
}

impl PoseRecord {
    pub fn is_empty(&self) -> bool {
        self.update_data.is_empty()
    }
}
