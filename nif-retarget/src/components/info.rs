/// Component that adds some information about the entity.
/// Useful for debugging, and for matching entities back to the blocks they
/// were imported from. Added to every entity by the armature importer.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Default)]
pub struct Info {
    /// The unique name allocated on import
    pub name: String,
    /// Arena index of the scene object this entity was created from
    pub block_id: usize,
}
