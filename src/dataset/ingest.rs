//! Image ingestion module
//!
//! Host-side conversion of source pixel/depth payloads into the
//! dataset's canonical on-device formats: half RGBA texels, f32 depth,
//! verbatim rays.

pub mod convert;
pub mod types;

pub use convert::{f16_to_f32, f32_to_f16};
pub use types::{DepthData, IngestOptions, PixelData};
