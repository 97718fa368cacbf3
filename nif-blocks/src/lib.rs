//! A typed object model for parsed NIF (NetImmerse/Gamebryo) scene graphs.
//!
//! This crate is the contract between a NIF deserializer and whatever
//! consumes the parsed file: scene objects, skin instances, keyframe
//! controllers and their interpolators, raw keyframe data, and external
//! animation sequences. Blocks live in typed arenas inside a
//! [`NifDocument`] and reference each other by id, mirroring the block
//! reference structure of the file format itself.
//!
//! There is deliberately no I/O here. A real deserializer fills a
//! [`NifDocument`]; tests build one by hand.

pub mod blocks;
pub mod document;
pub mod keys;
pub mod transform;

pub use blocks::{
    AvObject, BSplineBasis, BSplineInterpolator, ControlledBlock, ControllerId,
    ControllerSequence, Interpolator, KeyframeController, KeyframeDataId, NodeKind, ObjectId,
    SkinInstance, TransformInterpolator,
};
pub use document::NifDocument;
pub use keys::{FloatKeys, Key, KeyType, KeyframeData, VectorKeys};
pub use transform::NiTransform;
