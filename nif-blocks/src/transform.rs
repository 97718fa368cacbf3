use glam::{Affine3A, Mat3, Vec3};
use serde::{Deserialize, Serialize};

/// The transform stored on every NIF scene object: a translation, a 3x3
/// rotation matrix and a single uniform scale.
///
/// The rotation matrix is kept exactly as parsed. Corrupt files ship
/// matrices that are not quite orthonormal; consumers that need a clean
/// rotation decompose and repair it themselves.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NiTransform {
    /// Translation relative to the parent object
    pub translation: Vec3,
    /// Rotation matrix, straight from the file
    pub rotation: Mat3,
    /// Uniform scale
    pub scale: f32,
}

impl Default for NiTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Mat3::IDENTITY,
            scale: 1.0,
        }
    }
}

impl NiTransform {
    /// A transform that only translates.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Compose the parts into a single affine, scale applied first.
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_translation(self.translation)
            * Affine3A::from_mat3(self.rotation)
            * Affine3A::from_scale(Vec3::splat(self.scale))
    }
}
