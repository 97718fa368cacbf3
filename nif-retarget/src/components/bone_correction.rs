use glam::Affine3A;

/// The delta between a bone's stored orientation and the orientation it
/// was imported with: `corrected * stored⁻¹`.
///
/// Identity when bones are imported unrealigned and unscaled. The
/// retargeter conjugates every animation channel through this delta so
/// keyframes authored against the stored orientation land on the imported
/// bone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneCorrection(pub Affine3A);

impl Default for BoneCorrection {
    fn default() -> Self {
        Self(Affine3A::IDENTITY)
    }
}
