//! Components attached to the entities of an imported armature.
//!
//! An armature is a [`hecs::World`]: one root entity plus one entity per
//! bone. Hosts walk these worlds and read the components; nothing here
//! touches a DCC API.

/// Bone head/tail segment
pub mod bone;
/// Correction delta between stored and imported bone orientation
pub mod bone_correction;
/// Blending priority carried over from merged sequences
pub mod bone_priority;
/// Rest transform relative to the armature root
pub mod global_transform;
/// Entity name and source block id
pub mod info;
/// Rest transform relative to the parent node
pub mod local_transform;
/// Link to the parent bone entity
pub mod parent;
/// Retargeted animation channels
pub mod pose_channels;
/// Marker for armature root entities
pub mod root;
/// Frame rate and animation group markers
pub mod timeline;

pub use bone::Bone;
pub use bone_correction::BoneCorrection;
pub use bone_priority::BonePriority;
pub use global_transform::GlobalTransform;
pub use info::Info;
pub use local_transform::LocalTransform;
pub use parent::Parent;
pub use pose_channels::{ChannelKey, Extrapolation, PoseChannels, PoseSample, PoseValue};
pub use root::Root;
pub use timeline::{TextKey, Timeline};
