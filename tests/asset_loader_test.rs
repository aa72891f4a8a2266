use serde_json::{Value, json};
use simviz::{
    ViewerConfig,
    data_structures::description::SceneDescription,
    resources::{AssetTable, load_assets, mesh::Geometry},
};

use crate::common::test_utils::{MockHost, body, mesh_blob, triangle_blob};

mod common;

fn mesh_entry(id: &str, hash: &str, layouts: Value) -> Value {
    let mut entry = json!({ "id": id, "dataHash": hash });
    if let (Some(entry), Some(layouts)) = (entry.as_object_mut(), layouts.as_object()) {
        entry.extend(layouts.clone());
    }
    entry
}

fn scene(meshes: Value, materials: Value, textures: Value) -> SceneDescription {
    serde_json::from_value(json!({
        "id": 1,
        "root": body("world", [0.0; 3], json!([]), json!([])),
        "meshes": meshes,
        "materials": materials,
        "textures": textures,
    }))
    .unwrap()
}

async fn load(host: &MockHost, scene: &SceneDescription, config: &ViewerConfig) -> AssetTable {
    load_assets(host, scene, config).await
}

fn mesh<'a>(assets: &'a AssetTable, id: &str) -> &'a simviz::resources::mesh::MeshGeometry {
    match assets.meshes.get(id).map(|geometry| geometry.as_ref()) {
        Some(Geometry::Mesh(mesh)) => mesh,
        other => panic!("expected mesh {id}, got {:?}", other),
    }
}

#[tokio::test]
async fn mesh_attributes_are_sliced_from_the_blob() {
    let (data, layouts) = triangle_blob();
    let host = MockHost::new().with_blob("tri", data);
    let scene = scene(json!([mesh_entry("m0", "tri", layouts)]), json!([]), json!([]));
    let config = ViewerConfig {
        winding_correction: false,
        ..Default::default()
    };

    let assets = load(&host, &scene, &config).await;

    let triangle = mesh(&assets, "m0");
    assert_eq!(
        triangle.vertices,
        vec![[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]]
    );
    assert_eq!(triangle.normals.len(), 3);
    assert_eq!(triangle.uvs, vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
    assert_eq!(triangle.indices, vec![0, 1, 2]);
    assert_eq!(*host.blob_requests.borrow(), vec!["tri".to_string()]);
}

#[tokio::test]
async fn winding_correction_mirrors_z_and_reverses_triangles() {
    let (data, layouts) = triangle_blob();
    let host = MockHost::new().with_blob("tri", data);
    let scene = scene(json!([mesh_entry("m0", "tri", layouts)]), json!([]), json!([]));

    let assets = load(&host, &scene, &ViewerConfig::default()).await;

    let triangle = mesh(&assets, "m0");
    assert!(triangle.vertices.iter().all(|v| v[2] == -1.0));
    assert!(triangle.normals.iter().all(|n| n[2] == -1.0));
    assert_eq!(triangle.indices, vec![2, 1, 0]);
}

#[tokio::test]
async fn broken_meshes_are_left_out() {
    let (data, _) = triangle_blob();
    let (offset_data, offset_layouts) = mesh_blob(&[0.0; 9], &[0.0; 9], &[0.0; 6], &[0, 1, 5]);
    let host = MockHost::new()
        .with_blob("short", data[..8].to_vec())
        .with_blob("bad-index", offset_data);
    let (_, layouts) = triangle_blob();
    let scene = scene(
        json!([
            mesh_entry("past-end", "short", layouts.clone()),
            mesh_entry("missing-blob", "nowhere", layouts),
            mesh_entry("out-of-range", "bad-index", offset_layouts),
        ]),
        json!([]),
        json!([]),
    );

    let assets = load(&host, &scene, &ViewerConfig::default()).await;

    assert!(assets.meshes.is_empty());
    assert_eq!(host.blob_requests.borrow().len(), 3);
}

#[tokio::test]
async fn one_failed_mesh_does_not_affect_the_others() {
    let (data, layouts) = triangle_blob();
    let host = MockHost::new().with_blob("tri", data);
    let scene = scene(
        json!([
            mesh_entry("good", "tri", layouts.clone()),
            mesh_entry("gone", "nowhere", layouts),
        ]),
        json!([]),
        json!([]),
    );

    let assets = load(&host, &scene, &ViewerConfig::default()).await;

    assert!(assets.meshes.contains_key("good"));
    assert!(!assets.meshes.contains_key("gone"));
}

#[tokio::test]
async fn materials_map_phong_parameters_and_resolve_textures() {
    let pixels = vec![255u8; 2 * 2 * 4];
    let host = MockHost::new().with_blob("px", pixels);
    let scene = scene(
        json!([]),
        json!([
            {
                "id": "painted",
                "color": [0.2, 0.4, 0.6, 1.0],
                "emissionColor": [0.1, 0.0, 0.0],
                "shininess": 0.25,
                "reflectance": 0.5,
                "specular": 0.75,
                "texture": "t0",
            },
            { "id": "orphan", "color": [1.0, 1.0, 1.0], "texture": "never-loaded" },
        ]),
        json!([{ "id": "t0", "dataHash": "px", "width": 2, "height": 2 }]),
    );

    let assets = load(&host, &scene, &ViewerConfig::default()).await;

    let painted = &assets.materials["painted"];
    assert_eq!(painted.color, [0.2, 0.4, 0.6]);
    assert_eq!(painted.emissive, [0.1, 0.0, 0.0]);
    assert!((painted.roughness - 0.75).abs() < 1e-6);
    assert_eq!(painted.metalness, 0.5);
    assert_eq!(painted.specular_intensity, 0.75);
    assert_eq!(painted.map.as_ref().map(|t| t.id.as_str()), Some("t0"));

    let orphan = &assets.materials["orphan"];
    assert!(orphan.map.is_none());
    assert_eq!(orphan.roughness, 1.0);
}

#[tokio::test]
async fn texture_dimensions_follow_the_host_convention() {
    // 3 pixels per row, 2 rows, reported as width 2 and height 3.
    let pixels: Vec<u8> = (0..6u8).flat_map(|i| [i, i, i, 255]).collect();
    let host = MockHost::new().with_blob("px", pixels);
    let scene = scene(
        json!([]),
        json!([]),
        json!([{ "id": "t0", "dataHash": "px", "width": 2, "height": 3 }]),
    );

    let assets = load(&host, &scene, &ViewerConfig::default()).await;

    let image = &assets.textures["t0"].image;
    assert_eq!(image.dimensions(), (3, 2));
    assert_eq!(image.get_pixel(0, 1).0, [3, 3, 3, 255]);
}

#[tokio::test]
async fn texture_rows_can_be_flipped() {
    let pixels: Vec<u8> = (0..4u8).flat_map(|i| [i, 0, 0, 255]).collect();
    let host = MockHost::new().with_blob("px", pixels);
    let scene = scene(
        json!([]),
        json!([]),
        json!([{ "id": "t0", "dataHash": "px", "width": 2, "height": 2 }]),
    );
    let config = ViewerConfig {
        flip_texture_y: true,
        ..Default::default()
    };

    let assets = load(&host, &scene, &config).await;

    let image = &assets.textures["t0"].image;
    assert_eq!(image.get_pixel(0, 0).0, [2, 0, 0, 255]);
    assert_eq!(image.get_pixel(1, 1).0, [1, 0, 0, 255]);
}

#[tokio::test]
async fn undersized_textures_are_left_out() {
    let host = MockHost::new().with_blob("px", vec![0u8; 7]);
    let scene = scene(
        json!([]),
        json!([{ "id": "m", "color": [1.0, 1.0, 1.0], "texture": "t0" }]),
        json!([{ "id": "t0", "dataHash": "px", "width": 2, "height": 2 }]),
    );

    let assets = load(&host, &scene, &ViewerConfig::default()).await;

    assert!(assets.textures.is_empty());
    assert!(assets.materials["m"].map.is_none());
}

#[tokio::test]
async fn oversized_textures_are_left_out() {
    let host = MockHost::new().with_blob("px", vec![0u8; 116]);
    let scene = scene(
        json!([]),
        json!([{ "id": "m", "color": [1.0, 1.0, 1.0], "texture": "t0" }]),
        json!([{ "id": "t0", "dataHash": "px", "width": 2, "height": 2 }]),
    );

    let assets = load(&host, &scene, &ViewerConfig::default()).await;

    assert!(!assets.textures.contains_key("t0"));
    assert!(assets.materials["m"].map.is_none());
}
