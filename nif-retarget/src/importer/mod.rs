//! The import pipeline.
//!
//! Marking walks the scene trees and decides which nodes are armature
//! roots and which are bones ([`armature`]); building turns each marked
//! armature into a [`World`] of bone entities; retargeting converts every
//! animated bone's keyframes into pose-space channels ([`animation`]).

mod animation;
mod armature;
mod correction;
mod fps;
mod names;
mod track;

pub use animation::{merge_sequence, retarget, BoneBind, BonePriorities};
pub use correction::select_correction;
pub use fps::estimate_fps;
pub use track::{RotationKeys, TransformTrack};

use std::collections::HashMap;

use hecs::{Entity, World};
use nif_blocks::{ControllerSequence, NifDocument, ObjectId};

use crate::{importer::names::NameRegistry, settings::ImportSettings, NifResult};

/// Imported armatures by name, each one a self-contained world of bone
/// entities.
pub type Armatures = HashMap<String, World>;

/// Shared state of one import run.
pub(crate) struct ImportContext<'a> {
    document: &'a NifDocument,
    settings: &'a ImportSettings,
    /// Marked bones per armature root, in marking order
    armatures: HashMap<ObjectId, Vec<ObjectId>>,
    /// Armature roots in discovery order, for deterministic imports
    armature_order: Vec<ObjectId>,
    node_entity_map: HashMap<ObjectId, Entity>,
    names: NameRegistry,
    /// Blend priorities from merged sequences, by raw node name
    priorities: HashMap<String, u8>,
    fps: u32,
}

impl<'a> ImportContext<'a> {
    fn new(document: &'a NifDocument, settings: &'a ImportSettings) -> Self {
        Self {
            document,
            settings,
            armatures: HashMap::new(),
            armature_order: Vec::new(),
            node_entity_map: HashMap::new(),
            names: NameRegistry::new(),
            priorities: HashMap::new(),
            fps: fps::document_frame_rate(document),
        }
    }

    /// Whether the node was marked as a bone of any armature.
    fn is_bone(&self, id: ObjectId) -> bool {
        self.armatures.values().any(|bones| bones.contains(&id))
    }

    /// Registers an armature root, keeping discovery order.
    fn ensure_armature(&mut self, id: ObjectId) {
        if !self.armatures.contains_key(&id) {
            self.armatures.insert(id, Vec::new());
            self.armature_order.push(id);
        }
    }

    /// Marks a node as a bone of the given armature. Returns whether it was
    /// newly marked; the armature root itself is never a bone.
    fn add_bone(&mut self, armature: ObjectId, bone: ObjectId) -> bool {
        if bone == armature {
            return false;
        }
        let bones = self.armatures.get_mut(&armature).unwrap();
        if bones.contains(&bone) {
            return false;
        }
        bones.push(bone);
        true
    }
}

/// Imports every armature of the document into its own world.
///
/// Marking honours [`ImportSettings::skeleton`]; with
/// [`ImportSettings::animation`] set, each bone's keyframes are retargeted
/// into [`crate::components::PoseChannels`] and the armature root gets a
/// [`crate::components::Timeline`].
pub fn load_armatures(document: &NifDocument, settings: &ImportSettings) -> NifResult<Armatures> {
    let mut context = ImportContext::new(document, settings);
    import(&mut context)
}

/// Merges external animation sequences into the document, then imports with
/// the sequences' blend priorities attached to the bones they name.
pub fn load_armatures_with_sequences(
    document: &mut NifDocument,
    sequences: &[ControllerSequence],
    settings: &ImportSettings,
) -> NifResult<Armatures> {
    let mut priorities = BonePriorities::new();
    for sequence in sequences {
        priorities.extend(merge_sequence(document, sequence));
    }
    let mut context = ImportContext::new(document, settings);
    context.priorities = priorities;
    import(&mut context)
}

fn import(context: &mut ImportContext) -> NifResult<Armatures> {
    let document = context.document;
    for &root in document.roots() {
        armature::mark_armatures_bones(root, context)?;
    }
    let mut imported = Armatures::new();
    for armature in context.armature_order.clone() {
        let mut world = World::default();
        let root_entity = armature::build_armature(armature, context, &mut world)?;
        if context.settings.animation {
            animation::import_armature_animation(armature, root_entity, context, &mut world)?;
        }
        let name = context.names.name_for(document, armature);
        imported.insert(name, world);
    }
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BonePriority, Info, PoseChannels, Root, TextKey, Timeline};
    use glam::{Quat, Vec3};
    use nif_blocks::{
        AvObject, ControlledBlock, Interpolator, Key, KeyframeController, KeyframeData,
        NiTransform, SkinInstance, TransformInterpolator,
    };

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// A walking-skeleton file: an armature with one animated bone and a
    /// text key track on the root.
    fn animated_scene() -> NifDocument {
        let mut document = NifDocument::new();
        let scene = document.add_root(AvObject::node("Scene Root"));
        let skeleton = document.add_child(scene, AvObject::node("Skeleton"));
        let mut hip = AvObject::node("Hip");
        hip.transform = NiTransform::from_translation(Vec3::new(0.0, 0.0, 1.0));

        let mut data = KeyframeData::default();
        data.quaternion_keys.push(Key::new(0.0, Quat::IDENTITY));
        data.quaternion_keys
            .push(Key::new(1.0, Quat::from_rotation_x(0.5)));
        let data = document.add_keyframe_data(data);
        let controller = document.add_controller(KeyframeController {
            data: Some(data),
            ..Default::default()
        });
        hip.controller = Some(controller);

        let hip = document.add_child(skeleton, hip);
        document.add_child(
            scene,
            AvObject::skinned_geometry(
                "Body",
                SkinInstance {
                    skeleton_root: skeleton,
                    bones: vec![Some(hip)],
                },
            ),
        );
        document.object_mut(scene).text_keys = vec![
            Key::new(0.0, "start".to_string()),
            Key::new(1.0, "end\r\n".to_string()),
        ];
        document
    }

    #[test]
    fn animated_bones_get_pose_channels() {
        init_logging();
        let document = animated_scene();
        let armatures = load_armatures(&document, &ImportSettings::default()).unwrap();
        let world = &armatures["Skeleton"];

        let mut query = world.query::<(&Info, &PoseChannels)>();
        let (_, (info, channels)) = query.iter().next().unwrap();
        assert_eq!(info.name, "Hip");
        assert_eq!(channels.rotations.len(), 2);
        assert_eq!(channels.rotations[0].frame, 1);
        assert_eq!(channels.rotations[1].frame, 31);
        assert!(channels.translations.is_empty());
    }

    #[test]
    fn animation_can_be_switched_off() {
        let document = animated_scene();
        let settings = ImportSettings {
            animation: false,
            ..Default::default()
        };
        let armatures = load_armatures(&document, &settings).unwrap();
        let world = &armatures["Skeleton"];
        assert_eq!(world.query::<&PoseChannels>().iter().count(), 0);
        assert_eq!(world.query::<&Timeline>().iter().count(), 0);
    }

    #[test]
    fn the_timeline_lands_on_the_root_entity() {
        let document = animated_scene();
        let armatures = load_armatures(&document, &ImportSettings::default()).unwrap();
        let world = &armatures["Skeleton"];

        let mut roots = world.query::<(&Root, &Timeline)>();
        let (_, (_, timeline)) = roots.iter().next().unwrap();
        assert_eq!(timeline.fps, 30);
        assert_eq!(timeline.frame_start, 1);
        assert_eq!(timeline.frame_end, 31);
        assert_eq!(
            timeline.text_keys,
            vec![
                TextKey {
                    frame: 1,
                    label: "start".to_string()
                },
                TextKey {
                    frame: 31,
                    label: "end".to_string()
                },
            ]
        );
    }

    #[test]
    fn merged_sequences_animate_and_prioritize_their_bones() {
        init_logging();
        let mut document = NifDocument::new();
        let scene = document.add_root(AvObject::node("Scene Root"));
        let skeleton = document.add_child(scene, AvObject::node("Skeleton"));
        let hip = document.add_child(skeleton, AvObject::node("Hip"));
        document.add_child(
            scene,
            AvObject::skinned_geometry(
                "Body",
                SkinInstance {
                    skeleton_root: skeleton,
                    bones: vec![Some(hip)],
                },
            ),
        );

        let sequence = ControllerSequence {
            name: "Idle".to_string(),
            text_keys: vec![],
            controlled_blocks: vec![ControlledBlock {
                node_name: "Hip".to_string(),
                controller_type: "NiTransformController".to_string(),
                priority: 27,
                interpolator: Some(Interpolator::Transform(TransformInterpolator {
                    translation: Vec3::new(0.0, 2.0, 0.0),
                    rotation: Quat::from_rotation_y(0.25),
                    scale: 1.0,
                    data: None,
                })),
            }],
        };

        let armatures = load_armatures_with_sequences(
            &mut document,
            std::slice::from_ref(&sequence),
            &ImportSettings::default(),
        )
        .unwrap();
        let world = &armatures["Skeleton"];

        let mut query = world.query::<(&Info, &BonePriority, &PoseChannels)>();
        let (_, (info, priority, channels)) = query.iter().next().unwrap();
        assert_eq!(info.name, "Hip");
        assert_eq!(priority.0, 27);
        // the dummy data holds one rotation and one translation key at t=0
        assert_eq!(channels.rotations.len(), 1);
        assert_eq!(channels.translations.len(), 1);
        assert_eq!(channels.translations[0].frame, 1);
        let rotation = channels.rotations[0].value;
        assert!(rotation.dot(Quat::from_rotation_y(0.25)).abs() > 1.0 - 1e-6);
        assert_eq!(channels.translations[0].value, Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn merged_keys_replace_stale_controller_data() {
        let mut document = NifDocument::new();
        let scene = document.add_root(AvObject::node("Scene Root"));
        let skeleton = document.add_child(scene, AvObject::node("Skeleton"));

        // old-style animation directly on the bone's controller
        let mut stale = KeyframeData::default();
        stale.translations.keys = vec![Key::new(0.0, Vec3::ZERO), Key::new(1.0, Vec3::X)];
        let stale = document.add_keyframe_data(stale);
        let controller = document.add_controller(KeyframeController {
            data: Some(stale),
            ..Default::default()
        });
        let mut hip = AvObject::node("Hip");
        hip.controller = Some(controller);
        let hip = document.add_child(skeleton, hip);
        document.add_child(
            scene,
            AvObject::skinned_geometry(
                "Body",
                SkinInstance {
                    skeleton_root: skeleton,
                    bones: vec![Some(hip)],
                },
            ),
        );

        let mut walk = KeyframeData::default();
        walk.translations.keys = vec![
            Key::new(0.0, Vec3::Y),
            Key::new(0.5, Vec3::Y * 2.0),
            Key::new(1.0, Vec3::Y * 3.0),
        ];
        let walk = document.add_keyframe_data(walk);
        let sequence = ControllerSequence {
            name: "Walk".to_string(),
            text_keys: vec![],
            controlled_blocks: vec![ControlledBlock {
                node_name: "Hip".to_string(),
                controller_type: "NiTransformController".to_string(),
                priority: 0,
                interpolator: Some(Interpolator::Transform(TransformInterpolator {
                    data: Some(walk),
                    ..Default::default()
                })),
            }],
        };

        let armatures = load_armatures_with_sequences(
            &mut document,
            std::slice::from_ref(&sequence),
            &ImportSettings::default(),
        )
        .unwrap();
        let world = &armatures["Skeleton"];

        let mut query = world.query::<&PoseChannels>();
        let (_, channels) = query.iter().next().unwrap();
        // the sequence's three keys play, not the two stale ones
        assert_eq!(channels.translations.len(), 3);
        assert_eq!(channels.translations[0].value, Vec3::Y);
    }

    #[test]
    fn armature_names_key_the_result_map() {
        let mut document = NifDocument::new();
        let scene = document.add_root(AvObject::node("Scene Root"));
        // two skinned shapes with distinct skeleton roots, one unnamed
        let named = document.add_child(scene, AvObject::node("Skeleton"));
        let named_bone = document.add_child(named, AvObject::node("A"));
        let unnamed = document.add_child(scene, AvObject::node(""));
        let unnamed_bone = document.add_child(unnamed, AvObject::node("B"));
        document.add_child(
            scene,
            AvObject::skinned_geometry(
                "First",
                SkinInstance {
                    skeleton_root: named,
                    bones: vec![Some(named_bone)],
                },
            ),
        );
        document.add_child(
            scene,
            AvObject::skinned_geometry(
                "Second",
                SkinInstance {
                    skeleton_root: unnamed,
                    bones: vec![Some(unnamed_bone)],
                },
            ),
        );

        let armatures = load_armatures(&document, &ImportSettings::default()).unwrap();
        assert_eq!(armatures.len(), 2);
        assert!(armatures.contains_key("Skeleton"));
        assert!(armatures.contains_key("noname"));
    }

    #[test]
    fn unanimated_files_still_get_a_default_timeline() {
        let mut document = NifDocument::new();
        let scene = document.add_root(AvObject::node("Scene Root"));
        let skeleton = document.add_child(scene, AvObject::node("Skeleton"));
        let hip = document.add_child(skeleton, AvObject::node("Hip"));
        document.add_child(
            scene,
            AvObject::skinned_geometry(
                "Body",
                SkinInstance {
                    skeleton_root: skeleton,
                    bones: vec![Some(hip)],
                },
            ),
        );

        let armatures = load_armatures(&document, &ImportSettings::default()).unwrap();
        let world = &armatures["Skeleton"];
        let mut roots = world.query::<(&Root, &Timeline)>();
        let (_, (_, timeline)) = roots.iter().next().unwrap();
        assert_eq!(timeline, &Timeline::default());
    }
}
