use serde::{Deserialize, Serialize};

/// Which parts of the scene the import builds bones from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum SkeletonMode {
    /// Import armatures discovered through skinned geometry, completing
    /// partial bone chains up to each skeleton root
    #[default]
    Everything,
    /// The file is a pure skeleton: every non-grouping branching node under
    /// the root becomes a bone
    SkeletonOnly {
        /// Re-designate the skeleton root by name. Some legacy skeleton
        /// files bury the real root one level down; when the name is not
        /// found the scene root is kept.
        root_name: Option<String>,
    },
    /// The file is geometry for an armature the caller already has; only
    /// nodes matching the caller's bone names become bones
    GeometryOnly {
        /// The armature the geometry must attach to
        armature: TargetArmature,
    },
}

/// A pre-existing armature that geometry-only imports attach to.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetArmature {
    /// Node name of the armature root in the incoming scene
    pub name: String,
    /// Names of the bones the armature already has
    pub bone_names: Vec<String>,
}

/// How bone orientations are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoneAlignment {
    /// Realign each bone along its dominant child axis using the
    /// correction matrices
    #[default]
    Corrected,
    /// Keep orientations exactly as stored in the file
    Preserved,
}

/// Import configuration, with sensible defaults for game assets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// What to treat as bones
    pub skeleton: SkeletonMode,
    /// Whether bones are realigned on import
    pub alignment: BoneAlignment,
    /// Scale factor between file units and host units; also scales the
    /// nubs given to zero-length bones
    pub scale_correction: f32,
    /// Tolerance for zero-length checks, timestamp comparisons and scale
    /// uniformity
    pub epsilon: f32,
    /// Merge the geometry under a grouping node into one shape; grouping
    /// nodes are then excluded from bone marking
    pub combine_shapes: bool,
    /// Also turn ungrouped, unskinned nodes under a known armature into
    /// bones
    pub extra_bones: bool,
    /// Import keyframe animation onto the bones
    pub animation: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            skeleton: SkeletonMode::default(),
            alignment: BoneAlignment::default(),
            scale_correction: 1.0,
            epsilon: 0.005,
            combine_shapes: true,
            extra_bones: false,
            animation: true,
        }
    }
}
