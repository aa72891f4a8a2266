//! Local and world transforms for scene nodes.
//!
//! A transform is stored decomposed (position, rotation as quaternion, scale)
//! so pose updates can overwrite position and rotation while leaving the
//! scale of a node untouched.

use std::ops::Mul;

use cgmath::{EuclideanSpace, InnerSpace, One};

use crate::data_structures::description::TransformDescription;

/// Position, rotation (as quaternion) and scale of a node relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Transform {
    /// Identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_parts(
        position: cgmath::Vector3<f32>,
        rotation: cgmath::Quaternion<f32>,
        scale: cgmath::Vector3<f32>,
    ) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Maps a point given in this transform's local space into the space of its parent.
    pub fn transform_point(&self, point: cgmath::Point3<f32>) -> cgmath::Point3<f32> {
        let scaled = cgmath::Vector3::new(
            self.scale.x * point.x,
            self.scale.y * point.y,
            self.scale.z * point.z,
        );
        cgmath::Point3::from_vec(self.position + self.rotation * scaled)
    }

    /// Rotation that undoes `self.rotation`, assuming it is (close to) unit length.
    pub fn inverse_rotation(&self) -> cgmath::Quaternion<f32> {
        let magnitude2 = self.rotation.magnitude2();
        if magnitude2 == 0.0 {
            return cgmath::Quaternion::one();
        }
        self.rotation.conjugate() / magnitude2
    }
}

impl Mul<Transform> for Transform {
    type Output = Self;

    fn mul(self, rhs: Transform) -> Self::Output {
        &self * &rhs
    }
}

impl<'a, 'b> Mul<&'b Transform> for &'a Transform {
    type Output = Transform;

    fn mul(self, rhs: &'b Transform) -> Self::Output {
        let new_rotation = self.rotation * rhs.rotation;

        let new_scale = cgmath::Vector3::new(
            self.scale.x * rhs.scale.x,
            self.scale.y * rhs.scale.y,
            self.scale.z * rhs.scale.z,
        );
        let new_position = self
            .transform_point(cgmath::Point3::from_vec(rhs.position))
            .to_vec();

        Transform {
            position: new_position,
            rotation: new_rotation,
            scale: new_scale,
        }
    }
}

impl From<cgmath::Vector3<f32>> for Transform {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Transform {
            position,
            ..Default::default()
        }
    }
}

/// Raw wire values, no coordinate conversion applied.
impl From<&TransformDescription> for Transform {
    fn from(desc: &TransformDescription) -> Self {
        let [x, y, z, w] = desc.rot;
        Transform {
            position: desc.pos.into(),
            rotation: cgmath::Quaternion::new(w, x, y, z),
            scale: desc.scale.into(),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
