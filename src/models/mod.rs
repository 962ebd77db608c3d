//! Storemedia Models
//!
//! Pure data structures and math shared across the engine.

pub mod asset;
pub mod reference;
pub mod transform;

pub use asset::{detect_mime_type, AssetError, ImageAsset, NaturalSize};
pub use reference::{sanitize_for_path, LogicalSlot, StoredImageReference, UploadTarget};
pub use transform::{
    Anchor, ContainerBox, FitMode, NudgeDirection, TransformEvent, TransformMetadata,
    TransformState, TransformTuning, ZoomRange,
};
