/// Component to represent that this is the root entity of an armature.
/// Automatically added by the armature importer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Root {}
