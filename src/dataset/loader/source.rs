//! Scene-description and frame-payload sources.
//!
//! Scene parsing and image decoding are collaborator boundaries: a
//! [`SceneSource`] yields parsed records, a [`FrameReader`] yields
//! decoded pixel/depth/ray payloads. The loader never touches codecs
//! itself.

use std::path::{Path, PathBuf};

use glam::UVec2;

use crate::dataset::common::{DatasetError, Result};
use crate::dataset::geometry::Ray;
use crate::dataset::ingest::types::{DepthData, PixelData};
use crate::dataset::loader::records::SceneDescription;

/// One scene-description source, parsed into records on demand.
pub trait SceneSource {
    /// Parses this source into a scene description.
    fn describe(&self) -> Result<SceneDescription>;

    /// Identity used in error messages and logs.
    fn name(&self) -> String;

    /// Resolves a frame-relative payload reference.
    fn resolve(&self, path: &str) -> PathBuf;
}

/// A `transform.json` scene description on disk.
pub struct JsonSceneSource {
    path: PathBuf,
}

impl JsonSceneSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SceneSource for JsonSceneSource {
    fn describe(&self) -> Result<SceneDescription> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            DatasetError::SourceReadError(format!("{}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            DatasetError::SceneParseError(format!("{}: {}", self.path.display(), e))
        })
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(path)
    }
}

/// A decoded RGBA pixel payload.
#[derive(Debug, Clone)]
pub struct PixelImage {
    pub resolution: UVec2,
    pub data: PixelData,
}

/// A decoded depth payload, one scalar per pixel.
#[derive(Debug, Clone)]
pub struct DepthImage {
    pub resolution: UVec2,
    pub data: DepthData,
}

/// Decodes frame payload references into pixel/depth/ray data.
pub trait FrameReader {
    fn read_pixels(&self, path: &Path) -> Result<PixelImage>;

    fn read_depth(&self, path: &Path) -> Result<DepthImage>;

    fn read_rays(&self, path: &Path) -> Result<Vec<Ray>>;
}

/// Frame source producing flat synthetic images, for dry runs and
/// benchmarks without real captures.
pub struct SyntheticFrameReader {
    pub resolution: UVec2,
    pub value: u8,
}

impl Default for SyntheticFrameReader {
    fn default() -> Self {
        Self {
            resolution: UVec2::new(64, 64),
            value: 128,
        }
    }
}

impl FrameReader for SyntheticFrameReader {
    fn read_pixels(&self, _path: &Path) -> Result<PixelImage> {
        let n_pixels = (self.resolution.x * self.resolution.y) as usize;
        let mut data = vec![self.value; n_pixels * 4];
        for texel in data.chunks_exact_mut(4) {
            texel[3] = 255;
        }
        Ok(PixelImage {
            resolution: self.resolution,
            data: PixelData::Byte(data),
        })
    }

    fn read_depth(&self, _path: &Path) -> Result<DepthImage> {
        let n_pixels = (self.resolution.x * self.resolution.y) as usize;
        Ok(DepthImage {
            resolution: self.resolution,
            data: DepthData::UShort(vec![1000; n_pixels]),
        })
    }

    fn read_rays(&self, path: &Path) -> Result<Vec<Ray>> {
        Err(DatasetError::UnsupportedFormat(format!(
            "synthetic frames carry no rays ({})",
            path.display()
        )))
    }
}
