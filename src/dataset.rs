//! Multi-view capture dataset module
//!
//! This module turns heterogeneous capture data (posed images, optional
//! depth, optional precomputed rays, per-image intrinsics) into a single
//! device-resident dataset consumed by the volumetric training engine,
//! with separate modules for coordinate normalization, device buffers,
//! per-image ingestion, and scene-description loading.

pub mod common;
pub mod geometry;
pub mod camera;
pub mod device;
pub mod ingest;
pub mod aggregate;
pub mod loader;

pub use common::{
    DatasetError,
    Result,
};

pub use geometry::{
    BoundingBox,
    Ray,
    SceneNormalization,
    SourceConvention,
};

pub use camera::{
    BufferView,
    CameraDistortion,
    DepthDataType,
    ImageDataType,
    TrainingImageMetadata,
    TrainingXForm,
};

pub use device::{
    DeviceBuffer,
    DeviceContext,
};

pub use ingest::{
    DepthData,
    IngestOptions,
    PixelData,
};

pub use aggregate::{
    NerfDataset,
    PassKind,
    TrainingPass,
};

pub use loader::{
    FrameReader,
    JsonSceneSource,
    SceneSource,
    SyntheticFrameReader,
    create_empty_dataset,
    load_dataset,
};
