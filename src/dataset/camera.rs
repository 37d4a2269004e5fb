//! Camera metadata module
//!
//! Per-image intrinsics, element-type tags, and the non-owning views a
//! metadata record holds into the dataset's device buffers.

pub mod types;

pub use types::{
    BufferView,
    CameraDistortion,
    DepthDataType,
    ImageDataType,
    TrainingImageMetadata,
    TrainingXForm,
};
