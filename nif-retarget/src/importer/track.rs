use glam::{Quat, Vec3};
use itertools::{izip, Itertools};
use log::warn;
use nif_blocks::{Interpolator, Key, KeyType, KeyframeController, KeyframeData, NifDocument};

use crate::components::Extrapolation;

/// Rotation keys in whichever encoding the source file used.
#[derive(Debug, Clone)]
pub enum RotationKeys {
    /// Independent Euler channels, zipped by index on retarget
    Euler {
        /// Rotation about X, in radians
        x: Vec<Key<f32>>,
        /// Rotation about Y, in radians
        y: Vec<Key<f32>>,
        /// Rotation about Z, in radians
        z: Vec<Key<f32>>,
    },
    /// Whole-rotation quaternion keys
    Quaternion(Vec<Key<Quat>>),
    /// Quaternions sampled out of a B-spline interpolator
    Sampled(Vec<Key<Quat>>),
}

/// One node's animation with the controller/interpolator/data indirection
/// resolved away: plain keys per channel, ready to retarget.
#[derive(Debug, Clone)]
pub struct TransformTrack {
    /// Rotation keys, in the file's encoding. `None` when the data block
    /// carries no rotations.
    pub rotations: Option<RotationKeys>,
    /// Translation keys
    pub translations: Vec<Key<Vec3>>,
    /// Uniform scale keys
    pub scales: Vec<Key<f32>>,
    /// Behaviour outside the keyed range, from the controller flags
    pub extend: Extrapolation,
}

impl TransformTrack {
    /// Resolves a controller's animation into explicit channels.
    ///
    /// A transform interpolator's data replaces keyframe data stored
    /// directly on the controller, even when the interpolator carries
    /// none; a B-spline interpolator is sampled on its uniform grid.
    /// Controller-attached data only applies when no interpolator is
    /// present. Returns `None` when the controller leads to no animation
    /// at all, which is common and not an error.
    pub fn load(controller: &KeyframeController, document: &NifDocument) -> Option<Self> {
        let extend = Extrapolation::from_flags(controller.flags);
        let data = match &controller.interpolator {
            // new style: the interpolator's data stands in for whatever
            // hangs off the controller, present or not
            Some(Interpolator::Transform(interpolator)) => {
                document.keyframe_data(interpolator.data?)?
            }
            Some(Interpolator::BSpline(bspline)) => {
                let times = bspline.sample_times();
                if times.is_empty() {
                    return None;
                }
                // zipping drops whichever side has surplus entries
                let rotations: Vec<Key<Quat>> = izip!(&times, &bspline.rotations)
                    .map(|(&time, &value)| Key::new(time, value))
                    .collect_vec();
                let translations = izip!(&times, &bspline.translations)
                    .map(|(&time, &value)| Key::new(time, value))
                    .collect_vec();
                return Some(Self {
                    rotations: (!rotations.is_empty()).then_some(RotationKeys::Sampled(rotations)),
                    translations,
                    // scale control points carry no usable curve here
                    scales: Vec::new(),
                    extend,
                });
            }
            // old style: data directly on the controller
            None => controller.data.and_then(|id| document.keyframe_data(id))?,
        };
        Some(Self::from_keyframe_data(data, extend))
    }

    fn from_keyframe_data(data: &KeyframeData, extend: Extrapolation) -> Self {
        let rotations = if data.rotation_type == KeyType::XyzRotation {
            let [x, y, z] = &data.xyz_rotations;
            if x.keys.is_empty() && y.keys.is_empty() && z.keys.is_empty() {
                None
            } else {
                Some(RotationKeys::Euler {
                    x: x.keys.clone(),
                    y: y.keys.clone(),
                    z: z.keys.clone(),
                })
            }
        } else if data.quaternion_keys.is_empty() {
            None
        } else {
            Some(RotationKeys::Quaternion(data.quaternion_keys.clone()))
        };

        if let Some(tag) = unsupported_interpolation(data) {
            warn!("unsupported key interpolation {tag:?}, treating keys as linear");
        }

        Self {
            rotations,
            translations: data.translations.keys.clone(),
            scales: data.scales.keys.clone(),
            extend,
        }
    }
}

/// The first unsupported interpolation tag on a channel that actually
/// holds keys, if any.
fn unsupported_interpolation(data: &KeyframeData) -> Option<KeyType> {
    let mut tags = Vec::new();
    if data.rotation_type == KeyType::XyzRotation {
        for channel in &data.xyz_rotations {
            if !channel.keys.is_empty() {
                tags.push(channel.interpolation);
            }
        }
    } else if !data.quaternion_keys.is_empty() {
        tags.push(data.rotation_type);
    }
    if !data.translations.keys.is_empty() {
        tags.push(data.translations.interpolation);
    }
    if !data.scales.keys.is_empty() {
        tags.push(data.scales.interpolation);
    }
    tags.into_iter()
        .find(|tag| matches!(tag, KeyType::Tbc | KeyType::Unknown))
}
