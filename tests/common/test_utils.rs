#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
};

use anyhow::anyhow;
use serde_json::{Value, json};
use simviz::{
    data_structures::description::{PoseRecord, SceneDescription},
    transport::SceneSource,
};

/// In-memory stand-in for the simulation host.
///
/// Every queue hands out its entries in order and keeps repeating the last one.
#[derive(Default)]
pub(crate) struct MockHost {
    ids: RefCell<VecDeque<Value>>,
    scenes: RefCell<VecDeque<Value>>,
    states: RefCell<VecDeque<Value>>,
    blobs: HashMap<String, Vec<u8>>,
    pub blob_requests: RefCell<Vec<String>>,
    pub scene_requests: Cell<usize>,
    pub fail_states: Cell<bool>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(self, ids: impl IntoIterator<Item = Value>) -> Self {
        self.ids.borrow_mut().extend(ids);
        self
    }

    pub fn with_scene(self, scene: Value) -> Self {
        self.scenes.borrow_mut().push_back(scene);
        self
    }

    pub fn with_state(self, state: Value) -> Self {
        self.states.borrow_mut().push_back(state);
        self
    }

    pub fn with_blob(mut self, hash: &str, data: Vec<u8>) -> Self {
        self.blobs.insert(hash.to_string(), data);
        self
    }

    pub fn push_state(&self, state: Value) {
        self.states.borrow_mut().push_back(state);
    }
}

fn next_or_last(queue: &RefCell<VecDeque<Value>>) -> Option<Value> {
    let mut queue = queue.borrow_mut();
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

impl SceneSource for MockHost {
    async fn scene_id(&self) -> anyhow::Result<Value> {
        next_or_last(&self.ids).ok_or_else(|| anyhow!("no scene id"))
    }

    async fn scene_data(&self) -> anyhow::Result<SceneDescription> {
        self.scene_requests.set(self.scene_requests.get() + 1);
        let scene = next_or_last(&self.scenes).ok_or_else(|| anyhow!("no scene"))?;
        Ok(serde_json::from_value(scene)?)
    }

    async fn blob(&self, hash: &str) -> anyhow::Result<Vec<u8>> {
        self.blob_requests.borrow_mut().push(hash.to_string());
        self.blobs
            .get(hash)
            .cloned()
            .ok_or_else(|| anyhow!("404 for {hash}"))
    }

    async fn scene_state(&self) -> anyhow::Result<PoseRecord> {
        if self.fail_states.get() {
            return Err(anyhow!("connection refused"));
        }
        let state = next_or_last(&self.states).unwrap_or(json!({}));
        Ok(serde_json::from_value(state)?)
    }
}

/// Encodes mesh attributes the way the host lays them out: vertices, normals,
/// uvs, indices back to back, little endian. Returns the blob and the four layouts.
pub(crate) fn mesh_blob(
    vertices: &[f32],
    normals: &[f32],
    uvs: &[f32],
    indices: &[u32],
) -> (Vec<u8>, Value) {
    let mut data = Vec::new();
    let mut layout = |bytes: Vec<u8>, count: usize| {
        let offset = data.len();
        data.extend_from_slice(&bytes);
        json!([offset, count])
    };
    let floats = |values: &[f32]| values.iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<u8>>();
    let vertices_layout = layout(floats(vertices), vertices.len());
    let normals_layout = layout(floats(normals), normals.len());
    let uv_layout = layout(floats(uvs), uvs.len());
    let indices_layout = layout(
        indices.iter().flat_map(|i| i.to_le_bytes()).collect(),
        indices.len(),
    );
    (
        data,
        json!({
            "verticesLayout": vertices_layout,
            "normalsLayout": normals_layout,
            "uvLayout": uv_layout,
            "indicesLayout": indices_layout,
        }),
    )
}

/// One triangle in the xy-plane, lifted to z = 1.
pub(crate) fn triangle_blob() -> (Vec<u8>, Value) {
    mesh_blob(
        &[0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0],
        &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
        &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
        &[0, 1, 2],
    )
}

pub(crate) fn transform(pos: [f32; 3]) -> Value {
    json!({ "pos": pos, "rot": [0.0, 0.0, 0.0, 1.0], "scale": [1.0, 1.0, 1.0] })
}

pub(crate) fn body(name: &str, pos: [f32; 3], visuals: Value, children: Value) -> Value {
    json!({
        "name": name,
        "trans": transform(pos),
        "visuals": visuals,
        "children": children,
    })
}

/// `world` at the origin with an arm holding a hand, each one unit further out on x.
pub(crate) fn robot_scene() -> Value {
    json!({
        "id": 1,
        "root": body("world", [0.0, 0.0, 0.0], json!([]), json!([
            body("arm", [1.0, 0.0, 0.0], json!([
                { "type": "CUBE", "trans": transform([0.0, 0.0, 0.0]), "color": [1.0, 0.0, 0.0] }
            ]), json!([
                body("hand", [1.0, 0.0, 0.0], json!([]), json!([]))
            ])),
            body("table", [0.0, 0.0, 2.0], json!([]), json!([])),
        ])),
        "meshes": [],
        "materials": [],
        "textures": [],
    })
}

pub(crate) fn pose(name: &str, values: [f32; 7]) -> Value {
    json!({ "updateData": { name: values } })
}

pub(crate) fn approx_eq(a: cgmath::Vector3<f32>, b: cgmath::Vector3<f32>) -> bool {
    (a.x - b.x).abs() < 1e-5 && (a.y - b.y).abs() < 1e-5 && (a.z - b.z).abs() < 1e-5
}
