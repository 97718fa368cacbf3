use std::collections::HashMap;

use glam::{Affine3A, Quat};
use hecs::{Entity, World};
use log::{debug, info, warn};
use nif_blocks::{
    ControllerSequence, Interpolator, Key, KeyType, KeyframeController, KeyframeData, NifDocument,
    ObjectId, TransformInterpolator,
};

use crate::{
    components::{
        BoneCorrection, BonePriority, LocalTransform, PoseChannels, PoseSample, PoseValue, TextKey,
        Timeline,
    },
    importer::{
        fps::frame_for_time,
        track::{RotationKeys, TransformTrack},
        ImportContext,
    },
    util::{decompose_srt, Srt},
    NifError, NifResult,
};

/// Blend priorities recovered from a merged sequence, keyed by node name.
pub type BonePriorities = HashMap<String, u8>;

/// The two decompositions the retargeter needs for one bone: the rest pose
/// its keyframes are absolute against, and the axis-correction delta the
/// bone was rebuilt with.
///
/// NIF keyframes store full parent-relative transforms. With `total` the
/// keyframed transform, `bind` the rest pose and `X` the correction delta,
/// the channel values follow from `channel * bind = total` conjugated by
/// `X`, which is what [`retarget`] evaluates.
#[derive(Debug, Clone)]
pub struct BoneBind {
    rest: Srt,
    correction: Srt,
}

impl BoneBind {
    /// Decomposes a bone's rest pose and correction delta once, up front.
    pub fn new(rest: &Affine3A, correction: &Affine3A, epsilon: f32) -> Self {
        Self {
            rest: decompose_srt(rest, epsilon),
            correction: decompose_srt(correction, epsilon),
        }
    }
}

/// Converts a bone's keyframes into pose-space channel samples.
///
/// Samples come out in ascending frame order; within one frame the order is
/// scale, rotation, translation, so the translation law can look up the
/// channel values already emitted for its own frame.
pub fn retarget<'a>(
    track: &'a TransformTrack,
    bind: &'a BoneBind,
    fps: u32,
    epsilon: f32,
) -> impl Iterator<Item = PoseSample> + 'a {
    Retargeter {
        track,
        bind,
        fps,
        epsilon,
        scale_cursor: 0,
        rotation_cursor: 0,
        translation_cursor: 0,
        rotations_at: HashMap::new(),
        scales_at: HashMap::new(),
    }
}

struct Retargeter<'a> {
    track: &'a TransformTrack,
    bind: &'a BoneBind,
    fps: u32,
    epsilon: f32,
    scale_cursor: usize,
    rotation_cursor: usize,
    translation_cursor: usize,
    // channel values already emitted, for the translation law
    rotations_at: HashMap<u32, Quat>,
    scales_at: HashMap<u32, f32>,
}

impl Retargeter<'_> {
    fn rotation_len(&self) -> usize {
        match &self.track.rotations {
            // euler channels are zipped: the shortest one decides
            Some(RotationKeys::Euler { x, y, z }) => x.len().min(y.len()).min(z.len()),
            Some(RotationKeys::Quaternion(keys)) | Some(RotationKeys::Sampled(keys)) => keys.len(),
            None => 0,
        }
    }

    fn rotation_time(&self) -> Option<f32> {
        if self.rotation_cursor >= self.rotation_len() {
            return None;
        }
        Some(match self.track.rotations.as_ref()? {
            RotationKeys::Euler { x, .. } => x[self.rotation_cursor].time,
            RotationKeys::Quaternion(keys) | RotationKeys::Sampled(keys) => {
                keys[self.rotation_cursor].time
            }
        })
    }

    fn emit_scale(&mut self) -> PoseSample {
        let key = &self.track.scales[self.scale_cursor];
        self.scale_cursor += 1;
        let frame = frame_for_time(key.time, self.fps);
        let value = key.value / self.bind.rest.scale;
        self.scales_at.insert(frame, value);
        PoseSample {
            frame,
            value: PoseValue::Scale(value),
        }
    }

    fn emit_rotation(&mut self) -> PoseSample {
        let cursor = self.rotation_cursor;
        self.rotation_cursor += 1;
        let (time, raw) = match self.track.rotations.as_ref().unwrap() {
            RotationKeys::Euler { x, y, z } => {
                let (kx, ky, kz) = (&x[cursor], &y[cursor], &z[cursor]);
                if (ky.time - kx.time).abs() > self.epsilon
                    || (kz.time - kx.time).abs() > self.epsilon
                {
                    warn!("XYZ key times do not correspond, animation may not be correctly imported");
                }
                // X-first euler order
                let quat = Quat::from_rotation_z(kz.value)
                    * Quat::from_rotation_y(ky.value)
                    * Quat::from_rotation_x(kx.value);
                (kx.time, quat)
            }
            RotationKeys::Quaternion(keys) | RotationKeys::Sampled(keys) => {
                (keys[cursor].time, keys[cursor].value)
            }
        };
        let frame = frame_for_time(time, self.fps);
        let x = self.bind.correction.quat;
        let value = x.inverse() * (self.bind.rest.quat.inverse() * raw) * x;
        self.rotations_at.insert(frame, value);
        PoseSample {
            frame,
            value: PoseValue::Rotation(value),
        }
    }

    fn emit_translation(&mut self) -> PoseSample {
        let key = &self.track.translations[self.translation_cursor];
        self.translation_cursor += 1;
        let frame = frame_for_time(key.time, self.fps);
        let rest = &self.bind.rest;
        let x = &self.bind.correction;
        let loc_val = rest.quat.inverse() * (key.value - rest.translation) / rest.scale;
        // the channel rotation and scale at this exact frame; emission order
        // guarantees same-frame keys are already cached
        let rotation = self
            .rotations_at
            .get(&frame)
            .copied()
            .unwrap_or(Quat::IDENTITY);
        let scale = self.scales_at.get(&frame).copied().unwrap_or(1.0);
        let value =
            (x.quat.inverse() * (rotation * (x.translation * scale) + loc_val - x.translation))
                / x.scale;
        PoseSample {
            frame,
            value: PoseValue::Translation(value),
        }
    }
}

impl Iterator for Retargeter<'_> {
    type Item = PoseSample;

    fn next(&mut self) -> Option<Self::Item> {
        let scale = (self.scale_cursor < self.track.scales.len()).then(|| {
            let time = self.track.scales[self.scale_cursor].time;
            (frame_for_time(time, self.fps), 0u8)
        });
        let rotation = self
            .rotation_time()
            .map(|time| (frame_for_time(time, self.fps), 1u8));
        let translation = (self.translation_cursor < self.track.translations.len()).then(|| {
            let time = self.track.translations[self.translation_cursor].time;
            (frame_for_time(time, self.fps), 2u8)
        });
        let (_, channel) = [scale, rotation, translation].into_iter().flatten().min()?;
        Some(match channel {
            0 => self.emit_scale(),
            1 => self.emit_rotation(),
            _ => self.emit_translation(),
        })
    }
}

/// Retargets every marked bone's keyframes into [`PoseChannels`] and hangs
/// the armature's [`Timeline`] off its root entity.
pub(crate) fn import_armature_animation(
    armature: ObjectId,
    root_entity: Entity,
    context: &mut ImportContext,
    world: &mut World,
) -> NifResult<()> {
    let document = context.document;
    let bones = context.armatures.get(&armature).cloned().unwrap_or_default();
    for bone in bones {
        let object = document.object(bone);
        // a malformed skin can mark bones outside the skeleton root's
        // subtree; those never became entities
        let entity = match context.node_entity_map.get(&bone) {
            Some(entity) => *entity,
            None => {
                warn!(
                    "bone '{}' is not under armature '{}', skipping it",
                    object.name,
                    document.object(armature).name
                );
                continue;
            }
        };
        if let Some(&priority) = context.priorities.get(&object.name) {
            world.insert_one(entity, BonePriority(priority)).unwrap();
        }
        let controller = match object.controller {
            Some(id) => document.controller(id).ok_or(NifError::MissingBlock)?,
            None => continue,
        };
        debug!("importing animation for bone '{}'", object.name);
        let track = match TransformTrack::load(controller, document) {
            Some(track) => track,
            None => continue,
        };
        let bind = {
            let rest = world.get::<&LocalTransform>(entity).unwrap();
            let correction = world.get::<&BoneCorrection>(entity).unwrap();
            BoneBind::new(&rest.0, &correction.0, context.settings.epsilon)
        };
        let mut channels = PoseChannels {
            extrapolation: track.extend,
            ..Default::default()
        };
        for sample in retarget(&track, &bind, context.fps, context.settings.epsilon) {
            channels.push(sample);
        }
        if !channels.is_empty() {
            world.insert_one(entity, channels).unwrap();
        }
    }

    let mut timeline = Timeline {
        fps: context.fps,
        ..Default::default()
    };
    // text keys usually hang off the scene root, above the armature
    let text_keys = document
        .roots()
        .iter()
        .find_map(|&root| document.find_text_keys(root));
    if let Some(keys) = text_keys {
        for key in keys {
            let label = key.value.replace("\r\n", "/");
            timeline.text_keys.push(TextKey {
                frame: frame_for_time(key.time, context.fps),
                label: label.trim_end_matches('/').to_string(),
            });
        }
        if let Some(last) = timeline.text_keys.last() {
            timeline.frame_end = last.frame;
        }
    }
    world.insert_one(root_entity, timeline).unwrap();
    Ok(())
}

/// Merges an externally parsed animation sequence (a `.kf` file) into the
/// scene tree, so a following import picks its keyframes up as if the scene
/// had carried them all along. Returns the per-node blend priorities the
/// sequence declared.
pub fn merge_sequence(document: &mut NifDocument, sequence: &ControllerSequence) -> BonePriorities {
    info!("merging sequence '{}' into the scene tree", sequence.name);
    if !sequence.text_keys.is_empty() {
        if let Some(&root) = document.roots().first() {
            document.object_mut(root).text_keys = sequence.text_keys.clone();
        }
    }

    let mut priorities = BonePriorities::new();
    for block in &sequence.controlled_blocks {
        if block.node_name.is_empty() {
            info!("animation block without a node name, so skipping");
            continue;
        }
        let node = document
            .roots()
            .iter()
            .copied()
            .find_map(|root| document.find_by_name(root, &block.node_name));
        let node = match node {
            Some(node) => node,
            None => {
                info!(
                    "animation for '{}' but no such node found in the scene",
                    block.node_name
                );
                continue;
            }
        };
        if block.controller_type.is_empty() {
            info!(
                "animation for '{}' without controller type, so skipping",
                block.node_name
            );
            continue;
        }
        let controller_id = match document.object(node).controller {
            Some(id) => id,
            None => {
                info!(
                    "no controller found on animation node '{}', creating one",
                    block.node_name
                );
                let id = document.add_controller(KeyframeController::default());
                document.object_mut(node).controller = Some(id);
                id
            }
        };
        let mut interpolator = block.interpolator.clone();
        if let Some(Interpolator::Transform(transform)) = &mut interpolator {
            if transform.data.is_none() {
                // single-key data from the fallback pose, so the keyframes
                // survive a later re-export
                let data = dummy_keyframe_data(transform);
                transform.data = Some(document.add_keyframe_data(data));
            }
        }
        let controller = document.controller_mut(controller_id).unwrap();
        controller.interpolator = interpolator;
        priorities.insert(block.node_name.clone(), block.priority);
    }
    priorities
}

fn dummy_keyframe_data(interpolator: &TransformInterpolator) -> KeyframeData {
    let mut data = KeyframeData {
        rotation_type: KeyType::Linear,
        ..Default::default()
    };
    data.quaternion_keys
        .push(Key::new(0.0, interpolator.rotation));
    if interpolator.translation.x < -1_000_000.0 {
        // invalid marker seen in some game files
        warn!("Ignored NaN in interpolator translation");
    } else {
        data.translations
            .keys
            .push(Key::new(0.0, interpolator.translation));
    }
    // interpolator scale usually carries garbage
    data
}
