use hecs::Entity;

/// Component added to indicate that an entity has a parent bone.
/// Bones that hang directly off the armature root have no `Parent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parent(pub Entity);
