use glam::{Affine3A, Mat3, Quat, Vec3};
use log::warn;

/// An affine transform split into uniform scale, rotation and translation.
///
/// The rotation is kept in both matrix and quaternion form because the
/// retargeting math needs one or the other depending on the channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Srt {
    /// Uniform scale. Negative when the transform mirrors.
    pub scale: f32,
    /// Rotation as a matrix
    pub rotation: Mat3,
    /// Rotation as a quaternion
    pub quat: Quat,
    /// Translation
    pub translation: Vec3,
}

impl Default for Srt {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation: Mat3::IDENTITY,
            quat: Quat::IDENTITY,
            translation: Vec3::ZERO,
        }
    }
}

/// Split an affine into uniform scale, rotation and translation.
///
/// NIF transforms are nominally uniform. When the three scale components
/// disagree by more than `epsilon` the matrix is corrupt; the X component
/// wins and a warning is logged.
#[inline]
pub fn decompose_srt(transform: &Affine3A, epsilon: f32) -> Srt {
    let (scale, quat, translation) = transform.to_scale_rotation_translation();
    if (scale.x - scale.y).abs() >= epsilon || (scale.y - scale.z).abs() >= epsilon {
        warn!("corrupt rotation matrix: non-uniform scale {scale}, clamping to X component");
    }
    Srt {
        scale: scale.x,
        rotation: Mat3::from_quat(quat),
        quat,
        translation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn decompose_recovers_the_parts() {
        let rotation = Quat::from_rotation_y(FRAC_PI_2);
        let transform = Affine3A::from_scale_rotation_translation(
            Vec3::splat(2.5),
            rotation,
            Vec3::new(1.0, -2.0, 3.0),
        );

        let srt = decompose_srt(&transform, 0.005);
        assert_relative_eq!(srt.scale, 2.5, epsilon = 1e-5);
        assert_relative_eq!(srt.translation.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(srt.translation.y, -2.0, epsilon = 1e-5);
        assert!(srt.quat.dot(rotation).abs() > 1.0 - 1e-5);
    }

    #[test]
    fn non_uniform_scale_clamps_to_x() {
        let transform = Affine3A::from_scale(Vec3::new(2.0, 3.0, 4.0));
        let srt = decompose_srt(&transform, 0.005);
        assert_relative_eq!(srt.scale, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn mirrored_transform_has_negative_scale() {
        let transform = Affine3A::from_scale(Vec3::new(-1.0, 1.0, 1.0));
        let srt = decompose_srt(&transform, 0.005);
        assert!(srt.scale < 0.0);
    }
}
