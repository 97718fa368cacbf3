use glam::{Quat, Vec3};
use id_arena::Id;
use serde::{Deserialize, Serialize};

use crate::{
    keys::{Key, KeyframeData},
    transform::NiTransform,
};

/// Id of a scene object within its document.
pub type ObjectId = Id<AvObject>;
/// Id of a keyframe controller within its document.
pub type ControllerId = Id<KeyframeController>;
/// Id of a keyframe data block within its document.
pub type KeyframeDataId = Id<KeyframeData>;

/// A scene-graph object: what the deserializer produces for every
/// `NiAVObject`-derived block.
#[derive(Clone, Debug)]
pub struct AvObject {
    /// Name as stored in the file. May be empty; need not be unique.
    pub name: String,
    /// Transform relative to the parent object
    pub transform: NiTransform,
    /// What kind of object this is
    pub kind: NodeKind,
    /// The first keyframe controller attached to this object
    pub controller: Option<ControllerId>,
    /// Text keys hung off this object's extra data, usually empty
    pub text_keys: Vec<Key<String>>,
    pub(crate) children: Vec<ObjectId>,
    pub(crate) parent: Option<ObjectId>,
}

impl AvObject {
    fn with_kind(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: NiTransform::default(),
            kind,
            controller: None,
            text_keys: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    /// A plain branching node.
    pub fn node(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Node)
    }

    /// A level-of-detail switch node.
    pub fn lod_node(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::LodNode)
    }

    /// The scene's collision container node.
    pub fn collision_root(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::CollisionRoot)
    }

    /// A geometry leaf, not skinned.
    pub fn geometry(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Geometry { skin: None })
    }

    /// A geometry leaf deformed by a skeleton.
    pub fn skinned_geometry(name: impl Into<String>, skin: SkinInstance) -> Self {
        Self::with_kind(name, NodeKind::Geometry { skin: Some(skin) })
    }

    /// This object's children, in file order. Always empty for geometry.
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    /// Back-reference to the containing object, if any.
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Whether this object may carry children.
    pub fn is_branching(&self) -> bool {
        self.kind.is_branching()
    }

    /// The skin instance, for skinned geometry.
    pub fn skin(&self) -> Option<&SkinInstance> {
        match &self.kind {
            NodeKind::Geometry { skin } => skin.as_ref(),
            _ => None,
        }
    }
}

/// The object kinds an importer distinguishes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// A plain `NiNode`: may branch, may become a bone
    Node,
    /// A level-of-detail switch node: branches, never groups, never a bone
    LodNode,
    /// A collision container: branches, groups its geometry children
    CollisionRoot,
    /// A geometry leaf
    Geometry {
        /// Skin binding this geometry to a skeleton, if present
        skin: Option<SkinInstance>,
    },
}

impl NodeKind {
    /// Branching kinds may carry children; geometry never does.
    pub fn is_branching(&self) -> bool {
        !matches!(self, NodeKind::Geometry { .. })
    }
}

/// Binds a geometry to the bones that deform it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkinInstance {
    /// The node the skeleton hangs from
    pub skeleton_root: ObjectId,
    /// Influence bones, in influence order. Corrupt files leave holes.
    pub bones: Vec<Option<ObjectId>>,
}

/// A keyframe controller block. Animation data is reached either directly
/// (`data`, the old style) or through an interpolator (the new style).
#[derive(Clone, Debug)]
pub struct KeyframeController {
    /// Controller flags; bits 1-2 select the extrapolation mode
    pub flags: u16,
    /// Playback frequency
    pub frequency: f32,
    /// Playback phase offset
    pub phase: f32,
    /// Start of the controlled time range, in seconds
    pub start_time: f32,
    /// End of the controlled time range, in seconds
    pub stop_time: f32,
    /// New-style animation source
    pub interpolator: Option<Interpolator>,
    /// Old-style animation source
    pub data: Option<KeyframeDataId>,
}

impl Default for KeyframeController {
    fn default() -> Self {
        Self {
            flags: 0,
            frequency: 1.0,
            phase: 0.0,
            start_time: 0.0,
            stop_time: 0.0,
            interpolator: None,
            data: None,
        }
    }
}

/// The two interpolator families that drive transform animation.
#[derive(Clone, Debug)]
pub enum Interpolator {
    /// Keyframe-data-backed interpolator with a single fallback pose
    Transform(TransformInterpolator),
    /// Compressed B-spline interpolator
    BSpline(BSplineInterpolator),
}

/// Points at keyframe data and carries a single fallback pose used when no
/// data block is present.
#[derive(Clone, Debug)]
pub struct TransformInterpolator {
    /// Fallback translation. Some game files mark this invalid with a
    /// large negative sentinel.
    pub translation: Vec3,
    /// Fallback rotation
    pub rotation: Quat,
    /// Fallback uniform scale
    pub scale: f32,
    /// The actual keyframe data, when present
    pub data: Option<KeyframeDataId>,
}

impl Default for TransformInterpolator {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
            data: None,
        }
    }
}

/// Basis description for a compressed B-spline channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BSplineBasis {
    /// Number of control points in each channel
    pub num_control_points: u32,
}

/// A B-spline interpolator: channels stored as already-dequantized control
/// points over a uniform basis.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BSplineInterpolator {
    /// Time of the first sample, in seconds
    pub start_time: f32,
    /// Time of the last sample, in seconds
    pub stop_time: f32,
    /// Basis data; absent in some game files, which disables the channels
    pub basis: Option<BSplineBasis>,
    /// Rotation control points
    pub rotations: Vec<Quat>,
    /// Translation control points
    pub translations: Vec<Vec3>,
    /// Uniform scale control points
    pub scales: Vec<f32>,
}

impl BSplineInterpolator {
    /// Sample times for this interpolator's channels: `n - 2` uniformly
    /// spaced points starting at `start_time`, for `n` control points.
    /// No basis data, or fewer than three control points, means no samples.
    pub fn sample_times(&self) -> Vec<f32> {
        let basis = match self.basis {
            Some(basis) => basis,
            None => return Vec::new(),
        };
        let segments = basis.num_control_points.saturating_sub(2);
        if segments == 0 {
            return Vec::new();
        }
        let step = (self.stop_time - self.start_time) / segments as f32;
        (0..segments)
            .map(|i| self.start_time + i as f32 * step)
            .collect()
    }
}

/// An externally parsed animation sequence: the root of a `.kf` file.
#[derive(Clone, Debug, Default)]
pub struct ControllerSequence {
    /// Sequence name
    pub name: String,
    /// Animation group markers for this sequence
    pub text_keys: Vec<Key<String>>,
    /// One entry per animated node
    pub controlled_blocks: Vec<ControlledBlock>,
}

/// One animated node within a [`ControllerSequence`].
#[derive(Clone, Debug)]
pub struct ControlledBlock {
    /// Name of the scene node this entry animates
    pub node_name: String,
    /// Block-type name of the controller to attach to; may be empty
    pub controller_type: String,
    /// Bone priority, used by engines to blend between sequences
    pub priority: u8,
    /// The interpolator carrying this entry's animation
    pub interpolator: Option<Interpolator>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bspline_sample_times_are_uniform() {
        let interpolator = BSplineInterpolator {
            start_time: 0.0,
            stop_time: 1.0,
            basis: Some(BSplineBasis {
                num_control_points: 6,
            }),
            ..Default::default()
        };

        let times = interpolator.sample_times();
        assert_eq!(times.len(), 4);
        assert_relative_eq!(times[0], 0.0);
        assert_relative_eq!(times[1], 0.25);
        assert_relative_eq!(times[3], 0.75);
    }

    #[test]
    fn bspline_without_basis_has_no_samples() {
        let interpolator = BSplineInterpolator {
            start_time: 0.0,
            stop_time: 1.0,
            basis: None,
            rotations: vec![Quat::IDENTITY; 8],
            ..Default::default()
        };
        assert!(interpolator.sample_times().is_empty());
    }

    #[test]
    fn bspline_with_degenerate_basis_has_no_samples() {
        for n in 0..3 {
            let interpolator = BSplineInterpolator {
                start_time: 0.0,
                stop_time: 1.0,
                basis: Some(BSplineBasis {
                    num_control_points: n,
                }),
                ..Default::default()
            };
            assert!(interpolator.sample_times().is_empty(), "n = {n}");
        }
    }

    #[test]
    fn geometry_never_branches() {
        assert!(!AvObject::geometry("shape").is_branching());
        assert!(AvObject::node("node").is_branching());
        assert!(AvObject::lod_node("lod").is_branching());
        assert!(AvObject::collision_root("col").is_branching());
    }
}
