//! The canonical device-resident dataset aggregate.
//!
//! Two mirrored passes (normal-lit, albedo-lit) describe the same
//! cameras under different lighting/material renditions; a shared pose
//! sequence and shared normalization serve both. The aggregate owns
//! every device buffer; metadata records only hold views into them.

use glam::{UVec2, Vec3};
use tracing::{debug, info, instrument};

use crate::dataset::camera::{
    BufferView, DepthDataType, ImageDataType, TrainingImageMetadata, TrainingXForm,
};
use crate::dataset::common::{DatasetError, Result};
use crate::dataset::device::{DeviceBuffer, DeviceContext};
use crate::dataset::geometry::{BoundingBox, Ray, SourceConvention};
use crate::dataset::ingest::types::{DepthData, IngestOptions, PixelData};
use crate::dataset::ingest::convert;

pub const N_PASSES: usize = 2;

/// Which lighting/material rendition of the scene a pass holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    NormalLit = 0,
    AlbedoLit = 1,
}

impl PassKind {
    pub const ALL: [PassKind; N_PASSES] = [PassKind::NormalLit, PassKind::AlbedoLit];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One pass's buffer sequences and metadata, index-aligned per image.
#[derive(Debug, Default)]
pub struct TrainingPass {
    pub rays: Vec<DeviceBuffer<Ray>>,
    pub pixels: Vec<DeviceBuffer<u16>>,
    pub depths: Vec<DeviceBuffer<f32>>,
    pub metadata: Vec<TrainingImageMetadata>,
}

impl TrainingPass {
    fn with_slots(n_images: usize) -> Self {
        Self {
            rays: (0..n_images).map(|_| DeviceBuffer::empty()).collect(),
            pixels: (0..n_images).map(|_| DeviceBuffer::empty()).collect(),
            depths: (0..n_images).map(|_| DeviceBuffer::empty()).collect(),
            metadata: vec![TrainingImageMetadata::default(); n_images],
        }
    }

    pub fn n_images(&self) -> usize {
        self.metadata.len()
    }

    /// Resolves a metadata record's pixel view against this pass,
    /// verifying that the owning buffer still matches the view.
    pub fn pixels_of(&self, meta: &TrainingImageMetadata) -> Option<&DeviceBuffer<u16>> {
        let view = meta.pixels?;
        let buffer = self.pixels.get(view.index)?;
        (buffer.len() == view.len).then_some(buffer)
    }

    pub fn depth_of(&self, meta: &TrainingImageMetadata) -> Option<&DeviceBuffer<f32>> {
        let view = meta.depth?;
        let buffer = self.depths.get(view.index)?;
        (buffer.len() == view.len).then_some(buffer)
    }

    pub fn rays_of(&self, meta: &TrainingImageMetadata) -> Option<&DeviceBuffer<Ray>> {
        let view = meta.rays?;
        let buffer = self.rays.get(view.index)?;
        (buffer.len() == view.len).then_some(buffer)
    }

    fn clear(&mut self) {
        self.rays.clear();
        self.pixels.clear();
        self.depths.clear();
        self.metadata.clear();
    }
}

/// The canonical dataset handed to the training engine.
#[derive(Debug)]
pub struct NerfDataset {
    passes: [TrainingPass; N_PASSES],
    pub xforms: Vec<TrainingXForm>,

    pub sharpness_data: DeviceBuffer<f32>,
    pub sharpness_resolution: UVec2,
    pub envmap_data: DeviceBuffer<f32>,
    pub envmap_resolution: UVec2,

    pub render_aabb: BoundingBox,
    pub up: Vec3,
    pub offset: Vec3,
    pub n2w_s: f32,
    pub n2w_t: Vec3,

    pub n_images: usize,
    pub n_lights: usize,
    pub n_views: usize,
    pub width: usize,
    pub height: usize,

    pub scale: f32,
    pub aabb_scale: u32,
    pub convention: SourceConvention,
    pub is_hdr: bool,
    pub wants_importance_sampling: bool,
    pub has_rays: bool,
    pub has_light_dirs: bool,
    pub n_extra_learnable_dims: u32,
}

impl Default for NerfDataset {
    fn default() -> Self {
        Self::with_slots(0)
    }
}

impl NerfDataset {
    /// An aggregate with `n_images` unpopulated slots per pass.
    pub fn with_slots(n_images: usize) -> Self {
        Self {
            passes: [
                TrainingPass::with_slots(n_images),
                TrainingPass::with_slots(n_images),
            ],
            xforms: vec![TrainingXForm::default(); n_images],
            sharpness_data: DeviceBuffer::empty(),
            sharpness_resolution: UVec2::ZERO,
            envmap_data: DeviceBuffer::empty(),
            envmap_resolution: UVec2::ZERO,
            render_aabb: BoundingBox::default(),
            up: Vec3::Y,
            offset: Vec3::ZERO,
            n2w_s: 1.0,
            n2w_t: Vec3::ZERO,
            n_images,
            n_lights: 0,
            n_views: 0,
            width: 0,
            height: 0,
            scale: 1.0,
            aabb_scale: 1,
            convention: SourceConvention::Standard,
            is_hdr: false,
            wants_importance_sampling: true,
            has_rays: false,
            has_light_dirs: false,
            n_extra_learnable_dims: 0,
        }
    }

    pub fn pass(&self, kind: PassKind) -> &TrainingPass {
        &self.passes[kind.index()]
    }

    pub fn metadata(&self, kind: PassKind, frame_idx: usize) -> Result<&TrainingImageMetadata> {
        let pass = &self.passes[kind.index()];
        pass.metadata
            .get(frame_idx)
            .ok_or(DatasetError::SlotOutOfRange(frame_idx, pass.n_images()))
    }

    pub fn metadata_mut(
        &mut self,
        kind: PassKind,
        frame_idx: usize,
    ) -> Result<&mut TrainingImageMetadata> {
        let pass = &mut self.passes[kind.index()];
        let n_images = pass.metadata.len();
        pass.metadata
            .get_mut(frame_idx)
            .ok_or(DatasetError::SlotOutOfRange(frame_idx, n_images))
    }

    /// Extra per-sample network input dims: the per-image light
    /// direction (when present) plus any learned embedding dims.
    pub fn n_extra_dims(&self) -> u32 {
        (if self.has_light_dirs { 3 } else { 0 }) + self.n_extra_learnable_dims
    }

    /// Populates one image slot of one pass from host payloads.
    ///
    /// Converts the source pixels into canonical half texels (applying
    /// the transparency rule and sharpen filter), rescales depth into
    /// f32, copies rays verbatim, and rewrites the slot's metadata.
    /// Re-ingesting a slot fully replaces its prior contents without
    /// leaking the previous allocation.
    #[instrument(skip(self, ctx, pixels, depth, rays), fields(pass = ?pass, frame = frame_idx))]
    pub fn set_training_image(
        &mut self,
        ctx: &DeviceContext,
        pass: PassKind,
        frame_idx: usize,
        resolution: UVec2,
        pixels: &PixelData,
        depth: Option<(&DepthData, f32)>,
        rays: Option<&[Ray]>,
        options: &IngestOptions,
    ) -> Result<()> {
        let n_slots = self.passes[pass.index()].n_images();
        if frame_idx >= n_slots {
            return Err(DatasetError::SlotOutOfRange(frame_idx, n_slots));
        }

        let (w, h) = (resolution.x as usize, resolution.y as usize);
        if w == 0 || h == 0 {
            return Err(DatasetError::InvalidDimensions(w, h));
        }
        let n_pixels = w * h;

        if pixels.len() != n_pixels * convert::CHANNELS {
            return Err(DatasetError::ResolutionMismatch {
                index: frame_idx,
                what: "pixels",
                got: pixels.len(),
                expected: n_pixels * convert::CHANNELS,
            });
        }
        if let Some((depth_data, _)) = depth {
            if depth_data.len() != n_pixels {
                return Err(DatasetError::ResolutionMismatch {
                    index: frame_idx,
                    what: "depth",
                    got: depth_data.len(),
                    expected: n_pixels,
                });
            }
        }
        if let Some(rays) = rays {
            if rays.len() != n_pixels {
                return Err(DatasetError::ResolutionMismatch {
                    index: frame_idx,
                    what: "rays",
                    got: rays.len(),
                    expected: n_pixels,
                });
            }
        }

        let texels = convert::convert_pixels(resolution, pixels, options);
        let pass_data = &mut self.passes[pass.index()];
        pass_data.pixels[frame_idx].upload(ctx, &texels)?;

        if let Some((depth_data, depth_scale)) = depth {
            let depths = convert::convert_depth(depth_data, depth_scale);
            pass_data.depths[frame_idx].upload(ctx, &depths)?;
        } else {
            pass_data.depths[frame_idx].release();
        }

        if let Some(rays) = rays {
            pass_data.rays[frame_idx].upload(ctx, rays)?;
        } else {
            pass_data.rays[frame_idx].release();
        }

        let meta = &mut pass_data.metadata[frame_idx];
        meta.resolution = resolution;
        meta.image_data_type = ImageDataType::Half;
        meta.pixels = Some(BufferView {
            index: frame_idx,
            len: n_pixels * convert::CHANNELS,
        });
        meta.depth = depth.map(|_| BufferView {
            index: frame_idx,
            len: n_pixels,
        });
        meta.depth_data_type = depth.map(|_| DepthDataType::Float);
        meta.rays = rays.map(|r| BufferView {
            index: frame_idx,
            len: r.len(),
        });

        if rays.is_some() {
            self.has_rays = true;
        }
        debug!(width = w, height = h, "ingested training image");
        Ok(())
    }

    /// Installs already-device-resident payloads into one slot, taking
    /// ownership of the buffers. Payloads must already be canonical
    /// (half RGBA texels, f32 depth); lengths are validated against
    /// `resolution`. The slot's previous buffers are dropped, never
    /// leaked.
    pub fn adopt_training_image(
        &mut self,
        pass: PassKind,
        frame_idx: usize,
        resolution: UVec2,
        pixels: DeviceBuffer<u16>,
        depth: Option<DeviceBuffer<f32>>,
        rays: Option<DeviceBuffer<Ray>>,
    ) -> Result<()> {
        let n_slots = self.passes[pass.index()].n_images();
        if frame_idx >= n_slots {
            return Err(DatasetError::SlotOutOfRange(frame_idx, n_slots));
        }
        let (w, h) = (resolution.x as usize, resolution.y as usize);
        if w == 0 || h == 0 {
            return Err(DatasetError::InvalidDimensions(w, h));
        }
        let n_pixels = w * h;

        if pixels.len() != n_pixels * convert::CHANNELS {
            return Err(DatasetError::ResolutionMismatch {
                index: frame_idx,
                what: "pixels",
                got: pixels.len(),
                expected: n_pixels * convert::CHANNELS,
            });
        }
        if let Some(depth) = &depth {
            if depth.len() != n_pixels {
                return Err(DatasetError::ResolutionMismatch {
                    index: frame_idx,
                    what: "depth",
                    got: depth.len(),
                    expected: n_pixels,
                });
            }
        }
        if let Some(rays) = &rays {
            if rays.len() != n_pixels {
                return Err(DatasetError::ResolutionMismatch {
                    index: frame_idx,
                    what: "rays",
                    got: rays.len(),
                    expected: n_pixels,
                });
            }
        }

        let has_depth = depth.is_some();
        let has_rays = rays.is_some();
        let pass_data = &mut self.passes[pass.index()];
        pass_data.pixels[frame_idx] = pixels;
        match depth {
            Some(depth) => pass_data.depths[frame_idx] = depth,
            None => pass_data.depths[frame_idx].release(),
        }
        match rays {
            Some(rays) => pass_data.rays[frame_idx] = rays,
            None => pass_data.rays[frame_idx].release(),
        }

        let meta = &mut pass_data.metadata[frame_idx];
        meta.resolution = resolution;
        meta.image_data_type = ImageDataType::Half;
        meta.pixels = Some(BufferView {
            index: frame_idx,
            len: n_pixels * convert::CHANNELS,
        });
        meta.depth = has_depth.then_some(BufferView {
            index: frame_idx,
            len: n_pixels,
        });
        meta.depth_data_type = has_depth.then_some(DepthDataType::Float);
        meta.rays = has_rays.then_some(BufferView {
            index: frame_idx,
            len: n_pixels,
        });

        if has_rays {
            self.has_rays = true;
        }
        Ok(())
    }

    /// Allocates the per-image sharpness map at `tile_resolution` tiles
    /// per image.
    pub fn allocate_sharpness(&mut self, ctx: &DeviceContext, tile_resolution: UVec2) -> Result<()> {
        let len = tile_resolution.x as usize * tile_resolution.y as usize * self.n_images;
        self.sharpness_data = DeviceBuffer::alloc_zeros(ctx, len)?;
        self.sharpness_resolution = tile_resolution;
        Ok(())
    }

    /// Allocates the scene environment map (RGBA) at `resolution`.
    pub fn allocate_envmap(&mut self, ctx: &DeviceContext, resolution: UVec2) -> Result<()> {
        let len = resolution.x as usize * resolution.y as usize * 4;
        self.envmap_data = DeviceBuffer::alloc_zeros(ctx, len)?;
        self.envmap_resolution = resolution;
        Ok(())
    }

    /// Releases every device allocation owned by the aggregate and
    /// clears all sequences. Safe to call repeatedly; an already-empty
    /// aggregate is a no-op. Dropping the aggregate without calling
    /// this also frees, since each buffer handle owns its allocation.
    pub fn free_memory(&mut self) {
        for pass in &mut self.passes {
            pass.clear();
        }
        self.sharpness_data.release();
        self.envmap_data.release();
        self.sharpness_resolution = UVec2::ZERO;
        self.envmap_resolution = UVec2::ZERO;
        self.xforms.clear();
        self.n_images = 0;
        info!("released dataset device memory");
    }
}
