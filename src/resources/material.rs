use std::{collections::HashMap, sync::Arc};

use crate::{
    data_structures::description::{AssetId, MaterialDescription},
    resources::texture::Texture,
};

/// Physically based surface description handed to the renderer.
#[derive(Clone, Debug)]
pub struct Material {
    pub name: String,
    pub color: [f32; 3],
    pub emissive: [f32; 3],
    pub roughness: f32,
    pub metalness: f32,
    pub specular_intensity: f32,
    pub map: Option<Arc<Texture>>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: [1.0; 3],
            emissive: [0.0; 3],
            roughness: 1.0,
            metalness: 0.0,
            specular_intensity: 1.0,
            map: None,
        }
    }
}

impl Material {
    /// Untextured material of a single colour, used for visuals without a material reference.
    pub fn flat(color: &[f32]) -> Self {
        Self {
            name: "flat".to_string(),
            color: rgb(color),
            ..Default::default()
        }
    }

    /// Maps the host's Phong-style parameters onto metallic-roughness.
    ///
    /// `shininess` must already be in `[0, 1]`; values outside produce a
    /// roughness outside `[0, 1]` as nothing is clamped.
    pub fn from_description(
        desc: &MaterialDescription,
        textures: &HashMap<AssetId, Arc<Texture>>,
    ) -> Self {
        let map = desc.texture.as_ref().and_then(|id| {
            let texture = textures.get(id).cloned();
            if texture.is_none() {
                log::error!("Material {} references texture {} which did not load", desc.id, id);
            }
            texture
        });
        Self {
            name: desc.id.clone(),
            color: rgb(&desc.color),
            emissive: rgb(&desc.emission_color),
            roughness: 1.0 - desc.shininess,
            metalness: desc.reflectance,
            specular_intensity: desc.specular,
            map,
        }
    }
}

/// First three channels, missing ones read as zero.
fn rgb(channels: &[f32]) -> [f32; 3] {
    let channel = |i: usize| channels.get(i).copied().unwrap_or(0.0);
    [channel(0), channel(1), channel(2)]
}
