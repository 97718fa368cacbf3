/// Blending priority for this bone, carried over from a merged animation
/// sequence. Engines use it to decide which sequence wins on a bone when
/// several play at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BonePriority(pub u8);
