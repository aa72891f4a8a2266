//! Conversion from the simulation's left-handed axis convention to the
//! right-handed convention the scene graph is rendered in.
//!
//! All functions are pure and total. Quaternions are not normalized: a
//! non-unit input yields a non-unit output.

use cgmath::{Quaternion, Vector3};

use crate::data_structures::{
    description::{TransformDescription, VisualType},
    transform::Transform,
};

/// Mirrors the z-axis.
pub fn convert_position(x: f32, y: f32, z: f32) -> Vector3<f32> {
    Vector3::new(x, y, -z)
}

/// Mirrors a rotation across the xy-plane. Takes components in `x, y, z, w` order.
pub fn convert_orientation(x: f32, y: f32, z: f32, w: f32) -> Quaternion<f32> {
    Quaternion::new(w, -x, -y, z)
}

/// Reconciles scale encodings between the simulation's primitives and ours.
///
/// Cylinders are parameterized by radius and half height on the simulation
/// side but by unit radius and full height here. Every other type, unknown
/// ones included, is identity.
pub fn convert_scale(kind: Option<VisualType>, x: f32, y: f32, z: f32) -> Vector3<f32> {
    match kind {
        Some(VisualType::Cylinder) => Vector3::new(0.5 * x, 2.0 * y, 0.5 * z),
        _ => Vector3::new(x, y, z),
    }
}

/// Builds a transform from wire values, optionally applying the handedness
/// conversion. Scale conversion for primitive types applies only with it.
pub fn to_transform(
    desc: &TransformDescription,
    kind: Option<VisualType>,
    handedness_conversion: bool,
) -> Transform {
    if !handedness_conversion {
        return Transform::from(desc);
    }
    let [px, py, pz] = desc.pos;
    let [qx, qy, qz, qw] = desc.rot;
    let [sx, sy, sz] = desc.scale;
    Transform::from_parts(
        convert_position(px, py, pz),
        convert_orientation(qx, qy, qz, qw),
        convert_scale(kind, sx, sy, sz),
    )
}
