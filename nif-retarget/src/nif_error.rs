use thiserror::Error;

/// Errors that halt an import.
///
/// Only structural problems land here: a scene that cannot produce a
/// meaningful armature at all. Bad data that can be skipped or
/// approximated is logged through the `log` facade instead and the import
/// carries on.
#[derive(Error, Debug)]
pub enum NifError {
    /// The designated skeleton root cannot carry bones
    #[error("cannot import skeleton: root '{0}' is not a branching node")]
    RootNotBranching(String),
    /// Geometry-only import could not find the selected armature
    #[error("nif has no armature '{0}'")]
    ArmatureNotFound(String),
    /// A skin points at a different skeleton than the one selected
    #[error("geometry '{geometry}' is skinned to '{actual}', not to the selected armature '{expected}'")]
    SkeletonRootMismatch {
        /// The skinned geometry's name
        geometry: String,
        /// The armature the import was asked to use
        expected: String,
        /// The skeleton root the skin actually references
        actual: String,
    },
    /// A block id did not resolve inside its own document
    #[error("dangling block reference (parser bug?)")]
    MissingBlock,
    #[error(transparent)]
    /// Anything else
    Other(#[from] anyhow::Error),
}
