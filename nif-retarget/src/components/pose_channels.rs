use glam::{Quat, Vec3};
use log::warn;

/// One retargeted key on a single channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelKey<T> {
    /// 1-based frame number; time 0.0 is frame 1
    pub frame: u32,
    /// Pose-space value at that frame
    pub value: T,
}

/// A single retargeted sample, tagged with the channel it lands on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSample {
    /// 1-based frame number
    pub frame: u32,
    /// The value and its channel
    pub value: PoseValue,
}

/// A pose-space value on one of the three animation channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PoseValue {
    /// Location channel
    Translation(Vec3),
    /// Rotation channel
    Rotation(Quat),
    /// Uniform scale channel
    Scale(f32),
}

/// What happens outside a track's keyed range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extrapolation {
    /// Clamp to the first and last key
    #[default]
    Constant,
    /// Loop the track
    Cyclic,
}

impl Extrapolation {
    /// Decode a controller's flags. Bits 1-2 hold the cycle mode; unknown
    /// combinations fall back to constant with a warning.
    pub fn from_flags(flags: u16) -> Self {
        match flags & 0b110 {
            0b100 => Extrapolation::Constant,
            0b000 => Extrapolation::Cyclic,
            other => {
                warn!("unsupported cycle mode {other:#05b} in controller flags, assuming constant");
                Extrapolation::Constant
            }
        }
    }
}

/// The retargeted animation of one bone.
///
/// Keys are in ascending frame order within each channel. Added by the
/// armature importer to every bone whose controller produced samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseChannels {
    /// Location keys
    pub translations: Vec<ChannelKey<Vec3>>,
    /// Rotation keys
    pub rotations: Vec<ChannelKey<Quat>>,
    /// Uniform scale keys
    pub scales: Vec<ChannelKey<f32>>,
    /// Behaviour outside the keyed range, shared by all three channels
    pub extrapolation: Extrapolation,
}

impl PoseChannels {
    /// Whether no channel holds any key.
    pub fn is_empty(&self) -> bool {
        self.translations.is_empty() && self.rotations.is_empty() && self.scales.is_empty()
    }

    /// File a sample under its channel.
    pub fn push(&mut self, sample: PoseSample) {
        match sample.value {
            PoseValue::Translation(value) => self.translations.push(ChannelKey {
                frame: sample.frame,
                value,
            }),
            PoseValue::Rotation(value) => self.rotations.push(ChannelKey {
                frame: sample.frame,
                value,
            }),
            PoseValue::Scale(value) => self.scales.push(ChannelKey {
                frame: sample.frame,
                value,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extrapolation_decodes_controller_flags() {
        assert_eq!(Extrapolation::from_flags(0b100), Extrapolation::Constant);
        assert_eq!(Extrapolation::from_flags(0b000), Extrapolation::Cyclic);
        // Unsupported cycle modes fall back to constant.
        assert_eq!(Extrapolation::from_flags(0b010), Extrapolation::Constant);
        assert_eq!(Extrapolation::from_flags(0b110), Extrapolation::Constant);
        // Bits outside the cycle field are ignored.
        assert_eq!(Extrapolation::from_flags(0b1100), Extrapolation::Constant);
    }

    #[test]
    fn push_files_samples_under_their_channel() {
        let mut channels = PoseChannels::default();
        assert!(channels.is_empty());

        channels.push(PoseSample {
            frame: 1,
            value: PoseValue::Scale(2.0),
        });
        channels.push(PoseSample {
            frame: 1,
            value: PoseValue::Rotation(Quat::IDENTITY),
        });
        channels.push(PoseSample {
            frame: 3,
            value: PoseValue::Translation(Vec3::X),
        });

        assert_eq!(channels.scales.len(), 1);
        assert_eq!(channels.rotations.len(), 1);
        assert_eq!(channels.translations.len(), 1);
        assert_eq!(channels.translations[0].frame, 3);
        assert!(!channels.is_empty());
    }
}
