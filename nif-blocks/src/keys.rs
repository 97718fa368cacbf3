use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A single keyframe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Key<T> {
    /// Time in seconds
    pub time: f32,
    /// Value at that time
    pub value: T,
}

impl<T> Key<T> {
    /// Build a key from a time and a value.
    pub fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}

/// Key interpolation tag. The numeric values are part of the format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// Seen in the wild, not documented
    Unknown = 0,
    /// Linear interpolation
    #[default]
    Linear = 1,
    /// Quadratic (Bezier-style) interpolation
    Quadratic = 2,
    /// Tension-bias-continuity interpolation
    Tbc = 3,
    /// Rotation stored as three independent Euler channels
    XyzRotation = 4,
    /// Constant (stepped) interpolation
    Const = 5,
}

/// One scalar keyframe channel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FloatKeys {
    /// How values between keys are interpolated
    pub interpolation: KeyType,
    /// The keys, in non-decreasing time order
    pub keys: Vec<Key<f32>>,
}

/// One vector keyframe channel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorKeys {
    /// How values between keys are interpolated
    pub interpolation: KeyType,
    /// The keys, in non-decreasing time order
    pub keys: Vec<Key<Vec3>>,
}

/// Raw keyframe animation data for one scene object.
///
/// The rotation encoding is chosen by `rotation_type`:
/// [`KeyType::XyzRotation`] means the three `xyz_rotations` channels carry
/// independent Euler angles; any other value means `quaternion_keys` carry
/// whole rotations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyframeData {
    /// Selects the rotation encoding
    pub rotation_type: KeyType,
    /// Quaternion rotation keys
    pub quaternion_keys: Vec<Key<Quat>>,
    /// Independent Euler X, Y and Z channels
    pub xyz_rotations: [FloatKeys; 3],
    /// Translation keys
    pub translations: VectorKeys,
    /// Uniform scale keys
    pub scales: FloatKeys,
}
