use std::{collections::HashMap, sync::Arc};

use futures::future::join_all;

use crate::{
    config::ViewerConfig,
    data_structures::description::{
        AssetId, MeshDescription, SceneDescription, TextureDescription,
    },
    resources::{
        material::Material,
        mesh::{Geometry, load_mesh},
        texture::{Texture, load_texture},
    },
    transport::SceneSource,
};

/**
 * This module contains all logic for turning the host's asset descriptors and
 * blobs into in-memory meshes, materials and textures.
 */
pub mod material;
pub mod mesh;
pub mod texture;

/// Loaded assets of one scene, keyed by type and then by id.
///
/// An asset that failed to load is simply absent; lookups by id must treat
/// a miss as "skip", never as fatal.
#[derive(Clone, Debug, Default)]
pub struct AssetTable {
    pub meshes: HashMap<AssetId, Arc<Geometry>>,
    pub materials: HashMap<AssetId, Arc<Material>>,
    pub textures: HashMap<AssetId, Arc<Texture>>,
}

/// Fetches and decodes every asset of `scene`.
///
/// Meshes and textures are fetched concurrently. Materials are built only
/// once every texture fetch has settled, since they may reference one.
pub async fn load_assets<S: SceneSource>(
    source: &S,
    scene: &SceneDescription,
    config: &ViewerConfig,
) -> AssetTable {
    let textures_then_materials = async {
        let textures: HashMap<_, _> = join_all(
            scene
                .textures
                .iter()
                .map(|desc| fetch_texture(source, desc, config.flip_texture_y)),
        )
        .await
        .into_iter()
        .flatten()
        .collect();
        let materials = scene
            .materials
            .iter()
            .map(|desc| {
                (
                    desc.id.clone(),
                    Arc::new(Material::from_description(desc, &textures)),
                )
            })
            .collect();
        (textures, materials)
    };
    let meshes = async {
        join_all(
            scene
                .meshes
                .iter()
                .map(|desc| fetch_mesh(source, desc, config.winding_correction)),
        )
        .await
        .into_iter()
        .flatten()
        .collect()
    };
    let ((textures, materials), meshes) = futures::join!(textures_then_materials, meshes);

    let assets = AssetTable {
        meshes,
        materials,
        textures,
    };
    log::info!(
        "Loaded {}/{} meshes, {} materials, {}/{} textures",
        assets.meshes.len(),
        scene.meshes.len(),
        assets.materials.len(),
        assets.textures.len(),
        scene.textures.len()
    );
    assets
}

async fn fetch_texture<S: SceneSource>(
    source: &S,
    desc: &TextureDescription,
    flip_y: bool,
) -> Option<(AssetId, Arc<Texture>)> {
    let loaded = async {
        let data = source.blob(&desc.data_hash).await?;
        load_texture(desc, data, flip_y)
    };
    match loaded.await {
        Ok(texture) => Some((desc.id.clone(), Arc::new(texture))),
        Err(e) => {
            log::error!("Error loading texture {}: {:#}", desc.id, e);
            None
        }
    }
}

async fn fetch_mesh<S: SceneSource>(
    source: &S,
    desc: &MeshDescription,
    winding_correction: bool,
) -> Option<(AssetId, Arc<Geometry>)> {
    let loaded = async {
        let data = source.blob(&desc.data_hash).await?;
        load_mesh(desc, &data, winding_correction)
    };
    match loaded.await {
        Ok(mesh) => Some((desc.id.clone(), Arc::new(mesh))),
        Err(e) => {
            log::error!("Error loading mesh {}: {:#}", desc.id, e);
            None
        }
    }
}
