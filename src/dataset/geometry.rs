//! Scene geometry module
//!
//! Rays, bounding volumes, and the coordinate-frame normalization that
//! maps every supported capture convention into the canonical unit-cube
//! frame used by the training engine.

pub mod convention;
pub mod types;

pub use convention::{SceneNormalization, SourceConvention};
pub use types::{BoundingBox, Ray};
