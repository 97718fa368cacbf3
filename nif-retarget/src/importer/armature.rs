use std::collections::HashMap;

use anyhow::anyhow;
use glam::{Affine3A, Mat3, Vec3};
use hecs::{Entity, World};
use log::{debug, info, warn};
use nif_blocks::{NifDocument, NodeKind, ObjectId};

use crate::{
    components::{Bone, BoneCorrection, GlobalTransform, Info, LocalTransform, Parent, Root},
    importer::{correction::select_correction, ImportContext},
    settings::{BoneAlignment, ImportSettings, SkeletonMode, TargetArmature},
    NifError, NifResult, NUB_LENGTH,
};

/// Decides which nodes are armature roots and which are bones, per the
/// configured skeleton mode.
pub(crate) fn mark_armatures_bones(root: ObjectId, context: &mut ImportContext) -> NifResult<()> {
    match &context.settings.skeleton {
        SkeletonMode::SkeletonOnly { root_name } => {
            mark_whole_skeleton(root, root_name.as_deref(), context)
        }
        SkeletonMode::GeometryOnly { armature } => {
            mark_target_armature(root, armature, context)?;
            mark_skinned_geometry(root, Some(armature), context)
        }
        SkeletonMode::Everything => mark_skinned_geometry(root, None, context),
    }
}

/// Skeleton-only files: the whole tree under the root is one armature.
fn mark_whole_skeleton(
    scene_root: ObjectId,
    root_name: Option<&str>,
    context: &mut ImportContext,
) -> NifResult<()> {
    let document = context.document;
    if !document.object(scene_root).is_branching() {
        return Err(NifError::RootNotBranching(
            document.object(scene_root).name.clone(),
        ));
    }
    // legacy skeleton files bury the real root one level down
    let skelroot = root_name
        .and_then(|name| {
            document.descendants(scene_root).find(|&id| {
                let object = document.object(id);
                object.is_branching() && object.name == name
            })
        })
        .unwrap_or(scene_root);
    info!(
        "selecting node '{}' as skeleton root",
        document.object(skelroot).name
    );
    context.ensure_armature(skelroot);
    for id in document.descendants(skelroot) {
        if id == skelroot {
            continue;
        }
        let object = document.object(id);
        if object.is_branching() && !is_grouping_node(document, id, context.settings) {
            context.add_bone(skelroot, id);
        }
    }
    Ok(())
}

/// Geometry-only imports match the caller's armature into the scene. Runs
/// once; the skin scan afterwards only verifies skeleton roots against it.
fn mark_target_armature(
    root: ObjectId,
    target: &TargetArmature,
    context: &mut ImportContext,
) -> NifResult<()> {
    if !context.armatures.is_empty() {
        return Ok(());
    }
    let document = context.document;
    let skelroot = document
        .find_by_name(root, &target.name)
        .ok_or_else(|| NifError::ArmatureNotFound(target.name.clone()))?;
    debug!("identified '{}' as armature", target.name);
    context.ensure_armature(skelroot);
    for bone_name in &target.bone_names {
        if let Some(bone) = document.find_by_name(skelroot, bone_name) {
            if context.add_bone(skelroot, bone) {
                complete_bone_tree(bone, skelroot, context);
            }
            context.names.assign(bone, bone_name);
        }
    }
    Ok(())
}

/// Walks the tree for skinned geometry, growing one armature per skeleton
/// root - or, when a target armature was supplied, checking every skin
/// against it.
fn mark_skinned_geometry(
    root: ObjectId,
    target: Option<&TargetArmature>,
    context: &mut ImportContext,
) -> NifResult<()> {
    let document = context.document;
    for id in document.descendants(root) {
        let object = document.object(id);
        let skin = match object.skin() {
            Some(skin) => skin,
            None => continue,
        };
        let skelroot = skin.skeleton_root;
        if !context.armatures.contains_key(&skelroot) {
            match target {
                Some(target) => {
                    return Err(NifError::SkeletonRootMismatch {
                        geometry: object.name.clone(),
                        expected: target.name.clone(),
                        actual: document.object(skelroot).name.clone(),
                    });
                }
                None => {
                    debug!("'{}' is an armature", document.object(skelroot).name);
                    context.ensure_armature(skelroot);
                }
            }
        }
        for bone in &skin.bones {
            match bone {
                Some(bone) => {
                    if context.add_bone(skelroot, *bone) {
                        complete_bone_tree(*bone, skelroot, context);
                    }
                }
                None => warn!("skin on '{}' references a missing bone", object.name),
            }
        }
        if context.settings.extra_bones && target.is_none() {
            mark_extra_bones(skelroot, context);
        }
    }
    Ok(())
}

/// With `extra_bones` set, every plain node under the armature becomes a
/// bone too, grouping and LOD nodes excepted.
fn mark_extra_bones(skelroot: ObjectId, context: &mut ImportContext) {
    let document = context.document;
    for id in document.descendants(skelroot) {
        if id == skelroot {
            continue;
        }
        let candidate = matches!(
            document.object(id).kind,
            NodeKind::Node | NodeKind::CollisionRoot
        );
        if candidate
            && !is_grouping_node(document, id, context.settings)
            && context.add_bone(skelroot, id)
        {
            complete_bone_tree(id, skelroot, context);
        }
    }
}

/// Marks every unmarked ancestor between a bone and its skeleton root as a
/// bone too, so parent chains reach the root without gaps.
fn complete_bone_tree(bone: ObjectId, skelroot: ObjectId, context: &mut ImportContext) {
    let document = context.document;
    let mut current = bone;
    while let Some(parent) = document.object(current).parent() {
        if parent == skelroot {
            break;
        }
        context.add_bone(skelroot, parent);
        current = parent;
    }
}

/// A grouping node's geometry children are merged into one shape on
/// import, so the node itself is never a bone.
fn is_grouping_node(document: &NifDocument, id: ObjectId, settings: &ImportSettings) -> bool {
    if !settings.combine_shapes {
        return false;
    }
    let object = document.object(id);
    match object.kind {
        // a collision root joins all its geometry children
        NodeKind::CollisionRoot => object
            .children()
            .iter()
            .any(|&child| matches!(document.object(child).kind, NodeKind::Geometry { .. })),
        NodeKind::Node => {
            if object.name.is_empty() {
                return false;
            }
            let name = strip_non_accum(&object.name);
            object.children().iter().any(|&child| {
                let child = document.object(child);
                matches!(child.kind, NodeKind::Geometry { .. }) && child.name.contains(name)
            })
        }
        // LOD nodes keep their children separate
        _ => false,
    }
}

fn strip_non_accum(name: &str) -> &str {
    let len = name.len();
    if len >= 9
        && name.is_char_boundary(len - 9)
        && name[len - 9..].eq_ignore_ascii_case(" nonaccum")
    {
        &name[..len - 9]
    } else {
        name
    }
}

/// Builds the hecs world for one marked armature: the root entity first,
/// then every bone depth-first so parent entities exist before their
/// children need them.
pub(crate) fn build_armature(
    armature: ObjectId,
    context: &mut ImportContext,
    world: &mut World,
) -> NifResult<Entity> {
    let document = context.document;
    let name = context.names.name_for(document, armature);
    debug!("building armature '{name}'");

    let transform = document.object(armature).transform.to_affine();
    let root_entity = world.spawn((
        Info {
            name,
            block_id: armature.index(),
        },
        Root {},
        LocalTransform(transform),
        GlobalTransform(transform),
    ));
    context.node_entity_map.insert(armature, root_entity);

    let mut corrections = HashMap::new();
    let mut stack: Vec<(ObjectId, Option<ObjectId>)> = Vec::new();
    for &child in document.object(armature).children().iter().rev() {
        if context.is_bone(child) {
            stack.push((child, None));
        }
    }
    while let Some((bone, parent_bone)) = stack.pop() {
        import_bone(bone, parent_bone, armature, context, world, &mut corrections)?;
        for &child in document.object(bone).children().iter().rev() {
            if context.is_bone(child) {
                stack.push((child, Some(bone)));
            }
        }
    }
    Ok(root_entity)
}

fn import_bone(
    bone: ObjectId,
    parent_bone: Option<ObjectId>,
    armature: ObjectId,
    context: &mut ImportContext,
    world: &mut World,
    corrections: &mut HashMap<ObjectId, Mat3>,
) -> NifResult<()> {
    let document = context.document;
    let settings = context.settings;
    let realign = settings.alignment == BoneAlignment::Corrected;
    let name = context.names.name_for(document, bone);
    let object = document.object(bone);

    let armature_space = document
        .relative_transform(bone, armature)
        .ok_or_else(|| anyhow!("bone '{name}' is outside its armature's tree"))?;
    let head = Vec3::from(armature_space.translation);

    let bone_children: Vec<ObjectId> = object
        .children()
        .iter()
        .copied()
        .filter(|&child| context.is_bone(child))
        .collect();

    // tail: average of the child positions. Without children the bone is
    // zero-length until it gets its nub below.
    let mut tail = head;
    let mut is_zero_length = true;
    let mut correction = Mat3::IDENTITY;
    if !bone_children.is_empty() {
        let mut child_sum = Vec3::ZERO;
        let mut local_sum = Vec3::ZERO;
        for &child in &bone_children {
            let child_space = document
                .relative_transform(child, armature)
                .ok_or_else(|| anyhow!("bone '{name}' has a child outside its armature's tree"))?;
            child_sum += Vec3::from(child_space.translation);
            local_sum += document.object(child).transform.translation;
        }
        tail = child_sum / bone_children.len() as f32;
        let delta = head - tail;
        is_zero_length = (delta.x + delta.y + delta.z).abs() * 200.0 < settings.epsilon;
        if realign {
            correction = select_correction(local_sum).unwrap_or(Mat3::IDENTITY);
        }
    } else if realign {
        // the selection depends on child offsets, so a childless bone
        // borrows its parent's
        correction = parent_bone
            .and_then(|parent| corrections.get(&parent).copied())
            .unwrap_or(Mat3::IDENTITY);
    }

    if is_zero_length {
        let nub = NUB_LENGTH * settings.scale_correction;
        let parent_segment = parent_bone.map(|parent| {
            let entity = context.node_entity_map.get(&parent).unwrap();
            *world.get::<&Bone>(*entity).unwrap()
        });
        match parent_segment {
            Some(parent_segment) if !realign => {
                // keep unrealigned chains neat: point the nub away from the
                // parent's tail
                let mut direction = head - parent_segment.tail;
                if (direction.x + direction.y + direction.z).abs() * 200.0 < settings.epsilon {
                    // sitting on the parent's tail: follow the parent instead
                    direction = parent_segment.tail - parent_segment.head;
                }
                tail = head + direction.normalize_or_zero() * nub;
            }
            // realigned, or hanging straight off the armature root
            _ => tail = head + Vec3::new(nub, 0.0, 0.0),
        }
    }

    // hosts keep bone axes orthonormal: apply any correction, keep only the
    // rotation, re-anchor it at the head, and remember the delta for the
    // retargeter
    let stored = if realign {
        Affine3A::from_mat3(correction) * armature_space
    } else {
        armature_space
    };
    let (_, orientation, _) = stored.to_scale_rotation_translation();
    let oriented = Affine3A::from_rotation_translation(orientation, head);
    let delta = oriented * armature_space.inverse();

    let entity = world.spawn((
        Info {
            name,
            block_id: bone.index(),
        },
        Bone { head, tail },
        LocalTransform(object.transform.to_affine()),
        GlobalTransform(armature_space),
        BoneCorrection(delta),
    ));
    if let Some(parent) = parent_bone {
        let parent_entity = context.node_entity_map.get(&parent).unwrap();
        world.insert_one(entity, Parent(*parent_entity)).unwrap();
    }
    corrections.insert(bone, correction);
    context.node_entity_map.insert(bone, entity);
    Ok(())
}
