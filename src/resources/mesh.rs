use anyhow::{Context as _, bail};

use crate::data_structures::{
    bounds::Aabb,
    description::{BufferLayout, MeshDescription, VisualType},
};

/// Built-in shapes the renderer can construct without any data.
///
/// Sizes follow the usual engine defaults: a 1x1 plane in xy, a unit-radius
/// sphere, a unit cube, a cylinder of radius 1 and height 1 and a capsule of
/// radius 1 with a straight section of length 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Plane,
    Sphere,
    Cube,
    Cylinder,
    Capsule,
}

impl Primitive {
    pub fn from_visual_type(kind: VisualType) -> Option<Self> {
        match kind {
            VisualType::Mesh | VisualType::Unknown => None,
            VisualType::Plane => Some(Self::Plane),
            VisualType::Sphere => Some(Self::Sphere),
            VisualType::Cube => Some(Self::Cube),
            VisualType::Cylinder => Some(Self::Cylinder),
            VisualType::Capsule => Some(Self::Capsule),
        }
    }

    pub fn bounds(&self) -> Aabb {
        match self {
            Primitive::Plane => Aabb::centered(0.5, 0.5, 0.0),
            Primitive::Sphere => Aabb::centered(1.0, 1.0, 1.0),
            Primitive::Cube => Aabb::centered(0.5, 0.5, 0.5),
            Primitive::Cylinder => Aabb::centered(1.0, 0.5, 1.0),
            Primitive::Capsule => Aabb::centered(1.0, 1.5, 1.0),
        }
    }
}

/// Triangle mesh decoded from a content-addressed blob.
#[derive(Clone, Debug)]
pub struct MeshGeometry {
    pub name: String,
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshGeometry {
    /// Slices the blob into its four attribute arrays.
    ///
    /// Each layout is `[byte offset, element count]`. Attributes are little
    /// endian f32 (vertices, normals, uvs) and u32 (indices).
    pub fn from_bytes(desc: &MeshDescription, data: &[u8]) -> anyhow::Result<Self> {
        let vertices = read_attribute(data, desc.vertices_layout, f32::from_le_bytes)
            .context("vertices")?;
        let normals =
            read_attribute(data, desc.normals_layout, f32::from_le_bytes).context("normals")?;
        let uvs = read_attribute(data, desc.uv_layout, f32::from_le_bytes).context("uvs")?;
        let indices =
            read_attribute(data, desc.indices_layout, u32::from_le_bytes).context("indices")?;

        if vertices.len() % 3 != 0 || normals.len() % 3 != 0 || uvs.len() % 2 != 0 {
            bail!(
                "Mesh {} has attribute lengths that are not multiples of their arity",
                desc.id
            );
        }
        let vertex_count = vertices.len() / 3;
        if let Some(out_of_range) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            bail!(
                "Mesh {} references vertex {} but only has {}",
                desc.id,
                out_of_range,
                vertex_count
            );
        }

        Ok(Self {
            name: desc.tag.clone().unwrap_or_else(|| desc.id.clone()),
            vertices: vertices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect(),
            normals: normals.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect(),
            uvs: uvs.chunks_exact(2).map(|c| [c[0], c[1]]).collect(),
            indices,
        })
    }

    /// Mirrors every vertex and normal on z and reverses the winding of every
    /// triangle so faces keep pointing outwards after the handedness flip.
    pub fn correct_handedness(&mut self) {
        self.vertices.iter_mut().for_each(|v| v[2] = -v[2]);
        self.normals.iter_mut().for_each(|n| n[2] = -n[2]);
        self.indices.chunks_exact_mut(3).for_each(|tri| tri.swap(0, 2));
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.iter().map(|&v| v.into()))
    }
}

/// Reads `count` four-byte elements starting at byte `offset`.
fn read_attribute<T>(
    data: &[u8],
    [offset, count]: BufferLayout,
    decode: fn([u8; 4]) -> T,
) -> anyhow::Result<Vec<T>> {
    let size = 4;
    let Some(end) = count
        .checked_mul(size)
        .and_then(|bytes| offset.checked_add(bytes))
    else {
        bail!("layout [{offset}, {count}] overflows");
    };
    let Some(bytes) = data.get(offset..end) else {
        bail!(
            "layout [{offset}, {count}] exceeds a buffer of {} bytes",
            data.len()
        );
    };
    // The blob carries no alignment guarantee, so read element-wise instead of casting in place.
    Ok(bytes
        .chunks_exact(size)
        .map(|chunk| decode(bytemuck::pod_read_unaligned(chunk)))
        .collect())
}

/// Renderable shape of a visual.
#[derive(Clone, Debug)]
pub enum Geometry {
    Mesh(MeshGeometry),
    Primitive(Primitive),
}

impl Geometry {
    pub fn bounds(&self) -> Option<Aabb> {
        match self {
            Geometry::Mesh(mesh) => mesh.bounds(),
            Geometry::Primitive(primitive) => Some(primitive.bounds()),
        }
    }
}

pub fn load_mesh(
    desc: &MeshDescription,
    data: &[u8],
    winding_correction: bool,
) -> anyhow::Result<Geometry> {
    let mut mesh = MeshGeometry::from_bytes(desc, data)?;
    if winding_correction {
        mesh.correct_handedness();
    }
    log::debug!(
        "Decoded mesh {} with {} vertices and {} triangles",
        mesh.name,
        mesh.vertices.len(),
        mesh.indices.len() / 3
    );
    Ok(Geometry::Mesh(mesh))
}
