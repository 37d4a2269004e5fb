//! Per-image camera and pixel-storage types

use glam::{Affine3A, UVec2, Vec2, Vec3, Vec4};

/// On-device pixel element type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageDataType {
    /// Slot has no pixel data yet.
    #[default]
    None,
    Byte,
    Half,
    Float,
}

impl ImageDataType {
    /// Bytes per scalar element.
    pub fn size(self) -> usize {
        match self {
            ImageDataType::None => 0,
            ImageDataType::Byte => 1,
            ImageDataType::Half => 2,
            ImageDataType::Float => 4,
        }
    }
}

/// On-device depth element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthDataType {
    UShort,
    Float,
}

impl DepthDataType {
    /// Bytes per scalar element.
    pub fn size(self) -> usize {
        match self {
            DepthDataType::UShort => 2,
            DepthDataType::Float => 4,
        }
    }
}

/// Radial/tangential lens distortion coefficients.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraDistortion {
    pub k1: f32,
    pub k2: f32,
    pub p1: f32,
    pub p2: f32,
}

impl CameraDistortion {
    pub fn is_identity(&self) -> bool {
        self.k1 == 0.0 && self.k2 == 0.0 && self.p1 == 0.0 && self.p2 == 0.0
    }
}

/// Non-owning view into a buffer owned by the dataset aggregate: the
/// index of the owning entry in its buffer sequence plus the expected
/// element count. Resolved (and validated) against the owning pass, so a
/// view can never dangle past the buffer it references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferView {
    pub index: usize,
    pub len: usize,
}

/// Camera intrinsics and buffer views for one training image of one
/// pass. The pixel/depth/ray storage itself is owned by the aggregate;
/// this record only describes it.
#[derive(Debug, Clone)]
pub struct TrainingImageMetadata {
    pub pixels: Option<BufferView>,
    pub image_data_type: ImageDataType,
    pub depth: Option<BufferView>,
    pub depth_data_type: Option<DepthDataType>,
    pub rays: Option<BufferView>,

    pub distortion: CameraDistortion,
    pub resolution: UVec2,
    pub principal_point: Vec2,
    pub focal_length: Vec2,
    pub rolling_shutter: Vec4,
    pub light_dir: Vec3,
    pub s0: f32,
}

impl Default for TrainingImageMetadata {
    fn default() -> Self {
        Self {
            pixels: None,
            image_data_type: ImageDataType::None,
            depth: None,
            depth_data_type: None,
            rays: None,
            distortion: CameraDistortion::default(),
            resolution: UVec2::ZERO,
            principal_point: Vec2::splat(0.5),
            focal_length: Vec2::splat(1000.0),
            rolling_shutter: Vec4::ZERO,
            light_dir: Vec3::ZERO,
            s0: 0.0,
        }
    }
}

impl TrainingImageMetadata {
    pub fn n_pixels(&self) -> usize {
        self.resolution.x as usize * self.resolution.y as usize
    }
}

/// Camera pose over the exposure of one image, in the canonical frame.
/// `start == end` unless the sensor has a rolling shutter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingXForm {
    pub start: Affine3A,
    pub end: Affine3A,
}

impl Default for TrainingXForm {
    fn default() -> Self {
        Self {
            start: Affine3A::IDENTITY,
            end: Affine3A::IDENTITY,
        }
    }
}

impl TrainingXForm {
    pub fn rigid(pose: Affine3A) -> Self {
        Self {
            start: pose,
            end: pose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_sizes_match_storage() {
        assert_eq!(ImageDataType::None.size(), 0);
        assert_eq!(ImageDataType::Byte.size(), 1);
        assert_eq!(ImageDataType::Half.size(), 2);
        assert_eq!(ImageDataType::Float.size(), 4);
        assert_eq!(DepthDataType::UShort.size(), 2);
        assert_eq!(DepthDataType::Float.size(), 4);
    }

    #[test]
    fn metadata_defaults() {
        let meta = TrainingImageMetadata::default();
        assert_eq!(meta.image_data_type, ImageDataType::None);
        assert!(meta.pixels.is_none());
        assert_eq!(meta.principal_point, Vec2::splat(0.5));
        assert_eq!(meta.focal_length, Vec2::splat(1000.0));
        assert_eq!(meta.light_dir, Vec3::ZERO);
        assert_eq!(meta.n_pixels(), 0);
        assert!(meta.distortion.is_identity());
    }
}
