//! Scene loading module
//!
//! Parses scene-description sources, derives the global normalization,
//! and assembles the dataset aggregate via the ingestion operations.

pub mod factory;
pub mod records;
pub mod source;
#[cfg(test)]
mod tests;

pub use factory::{create_empty_dataset, load_dataset, NERF_SCALE};
pub use records::{FrameRecord, SceneDescription};
pub use source::{
    DepthImage, FrameReader, JsonSceneSource, PixelImage, SceneSource, SyntheticFrameReader,
};
