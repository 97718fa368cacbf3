#![deny(missing_docs)]

//! Skeleton import and keyframe retargeting for NIF scene graphs.
//!
//! Given a parsed NIF file (a [`nif_blocks::NifDocument`]), this crate works
//! out which scene nodes are skeleton bones, builds one armature per
//! skeleton root - bones with parent links, head/tail segments, rest
//! transforms and axis corrections - and converts the file's keyframe
//! animation (quaternion, Euler or B-spline encoded) into pose-space
//! channel keys on those bones. It also estimates the animation's frame
//! rate from raw keyframe timestamps and can merge externally parsed `.kf`
//! sequences into the scene before import.
//!
//! The entry point is [`importer::load_armatures`]; each armature comes
//! back as a [`hecs`] world of bone entities ready for a host (a DCC
//! plugin, an engine, a converter) to walk.

pub use hecs;
pub use nif_blocks;
pub use nif_error::NifError;

/// Components carried by the entities of an imported armature
pub mod components;
/// The import pipeline: marking, armature building, retargeting
pub mod importer;
mod nif_error;
mod settings;
/// Transform decomposition helpers
pub mod util;

pub use importer::{load_armatures, load_armatures_with_sequences, merge_sequence, Armatures};
pub use settings::{BoneAlignment, ImportSettings, SkeletonMode, TargetArmature};

/// Result type used throughout this crate
pub type NifResult<T> = std::result::Result<T, NifError>;

/// Default frame rate assumed when a file carries no keyframes
pub const DEFAULT_FPS: u32 = 30;

/// Length of the nub given to zero-length bones, before scale correction
pub const NUB_LENGTH: f32 = 5.0;
