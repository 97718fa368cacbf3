use glam::Affine3A;
use nif_blocks::NiTransform;

/// The bone's rest transform relative to its parent node, exactly as the
/// file stored it.
///
/// NIF keyframes replace this whole transform rather than offsetting it,
/// so the retargeter decomposes it as the bind pose. Corrupt rotation
/// matrices are preserved here and repaired (with a warning) during that
/// decomposition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTransform(pub Affine3A);

impl Default for LocalTransform {
    fn default() -> Self {
        Self(Affine3A::IDENTITY)
    }
}

impl From<&NiTransform> for LocalTransform {
    fn from(transform: &NiTransform) -> Self {
        Self(transform.to_affine())
    }
}
