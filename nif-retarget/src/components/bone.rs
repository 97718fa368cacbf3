use glam::Vec3;

/// A component that marks an entity as a bone and carries its segment.
///
/// The head sits at the node's armature-space position. The tail is the
/// average of the bone children's positions, or a short nub when the bone
/// has no length of its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bone {
    /// Armature-space position of the bone's base
    pub head: Vec3,
    /// Armature-space position of the bone's tip
    pub tail: Vec3,
}

impl Bone {
    /// The head-to-tail length.
    pub fn length(&self) -> f32 {
        (self.tail - self.head).length()
    }
}
