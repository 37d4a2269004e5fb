//! Dataset construction.
//!
//! Builds a fully-formed aggregate from scene-description sources, or a
//! placeholder aggregate with pre-sized but unpopulated slots.

use glam::{Vec3, Vec4};
use tracing::{info, instrument, warn};

use crate::dataset::aggregate::{NerfDataset, PassKind};
use crate::dataset::camera::TrainingXForm;
use crate::dataset::common::{DatasetError, Result};
use crate::dataset::device::DeviceContext;
use crate::dataset::geometry::{BoundingBox, SceneNormalization, SourceConvention};
use crate::dataset::ingest::types::IngestOptions;
use crate::dataset::loader::records::SceneDescription;
use crate::dataset::loader::source::{FrameReader, SceneSource};

/// Scene scale applied when a source does not carry one; fits typical
/// captures into the unit cube.
pub const NERF_SCALE: f32 = 0.33;

/// Builds the dataset aggregate from one or more scene-description
/// sources.
///
/// All sources are parsed and checked for convention agreement before
/// any device allocation. A failure while ingesting any frame releases
/// the partially-built aggregate and surfaces the error; there is no
/// partial-success contract.
#[instrument(skip(ctx, sources, reader), fields(n_sources = sources.len()))]
pub fn load_dataset<S: SceneSource>(
    ctx: &DeviceContext,
    sources: &[S],
    reader: &dyn FrameReader,
    sharpen_amount: f32,
) -> Result<NerfDataset> {
    if sources.is_empty() {
        return Err(DatasetError::SourceReadError(
            "no scene sources given".to_string(),
        ));
    }

    let mut descriptions = Vec::with_capacity(sources.len());
    for source in sources {
        descriptions.push(source.describe()?);
    }

    let first = &descriptions[0];
    let convention = SourceConvention::from_flags(first.from_mitsuba, first.from_na)?;
    for (source, description) in sources.iter().zip(&descriptions).skip(1) {
        let other = SourceConvention::from_flags(description.from_mitsuba, description.from_na)?;
        if other != convention {
            return Err(DatasetError::ConventionConflict(
                format!("{convention:?} ({})", sources[0].name()),
                format!("{other:?} ({})", source.name()),
            ));
        }
    }

    let scale = first.scale.unwrap_or(NERF_SCALE);
    let offset = first.offset.map(Vec3::from).unwrap_or(Vec3::splat(0.5));
    let normalization = SceneNormalization::new(convention, scale, offset)?;

    let n_images: usize = descriptions.iter().map(|d| d.frames.len()).sum();
    let mut dataset = NerfDataset::with_slots(n_images);
    dataset.convention = convention;
    dataset.scale = scale;
    dataset.offset = offset;
    dataset.is_hdr = descriptions.iter().any(|d| d.is_hdr);
    dataset.aabb_scale = descriptions
        .iter()
        .map(|d| d.aabb_scale.round().max(1.0) as u32)
        .max()
        .unwrap_or(1);
    dataset.render_aabb = BoundingBox::from_aabb_scale(dataset.aabb_scale);
    if let Some(up) = first.up {
        dataset.up = Vec3::from(up).normalize_or_zero();
    }
    if let Some((n2w_s, n2w_t)) = first.n2w_similarity() {
        dataset.n2w_s = n2w_s;
        dataset.n2w_t = n2w_t;
    }
    dataset.width = first.w.unwrap_or(0) as usize;
    dataset.height = first.h.unwrap_or(0) as usize;
    dataset.n_extra_learnable_dims = first.n_extra_learnable_dims;

    let n_lights = first.n_lights.unwrap_or(1).max(1);
    if n_images % n_lights == 0 && n_images > 0 {
        dataset.n_lights = n_lights;
        dataset.n_views = n_images / n_lights;
    } else {
        if first.n_lights.is_some() {
            warn!(n_images, n_lights, "light count does not divide image count");
        }
        dataset.n_lights = n_images.min(1);
        dataset.n_views = n_images;
    }

    if let Err(e) = populate(
        &mut dataset,
        ctx,
        sources,
        &descriptions,
        reader,
        &normalization,
        sharpen_amount,
    ) {
        dataset.free_memory();
        return Err(e);
    }

    if let Err(e) = ctx.synchronize() {
        dataset.free_memory();
        return Err(e);
    }

    info!(
        n_images = dataset.n_images,
        n_views = dataset.n_views,
        n_lights = dataset.n_lights,
        "dataset loaded"
    );
    Ok(dataset)
}

fn populate<S: SceneSource>(
    dataset: &mut NerfDataset,
    ctx: &DeviceContext,
    sources: &[S],
    descriptions: &[SceneDescription],
    reader: &dyn FrameReader,
    normalization: &SceneNormalization,
    sharpen_amount: f32,
) -> Result<()> {
    let options = IngestOptions {
        sharpen_amount,
        ..Default::default()
    };

    let mut slot = 0;
    for (source, description) in sources.iter().zip(descriptions) {
        let depth_scale = description.integer_depth_scale.unwrap_or(1.0);

        for (i, frame) in description.frames.iter().enumerate() {
            let context = format!("frame {i} of {}", source.name());

            let pose = normalization.pose_to_canonical(frame.pose(&context)?);
            dataset.xforms[slot] = TrainingXForm::rigid(pose);

            let normal = reader.read_pixels(&source.resolve(&frame.file_path))?;
            let albedo_path = frame.albedo_file_path.as_deref().unwrap_or(&frame.file_path);
            let albedo = reader.read_pixels(&source.resolve(albedo_path))?;

            let depth = match &frame.depth_path {
                Some(path) => Some(reader.read_depth(&source.resolve(path))?),
                None => None,
            };
            let rays = match &frame.rays_path {
                Some(path) => {
                    let rays = reader.read_rays(&source.resolve(path))?;
                    Some(
                        rays.into_iter()
                            .map(|ray| normalization.ray_to_canonical(ray, false))
                            .collect::<Vec<_>>(),
                    )
                }
                None => None,
            };

            for (kind, image) in [
                (PassKind::NormalLit, &normal),
                (PassKind::AlbedoLit, &albedo),
            ] {
                dataset.set_training_image(
                    ctx,
                    kind,
                    slot,
                    image.resolution,
                    &image.data,
                    depth.as_ref().map(|d| (&d.data, depth_scale)),
                    rays.as_deref(),
                    &options,
                )?;
            }

            let focal = frame.focal_length(normal.resolution, &context)?;
            let principal_point = frame.principal_point(normal.resolution);
            let distortion = frame.distortion();
            let light_dir = frame
                .light
                .map(|l| normalization.direction_to_canonical(Vec3::from(l)));
            for kind in PassKind::ALL {
                let meta = dataset.metadata_mut(kind, slot)?;
                meta.focal_length = focal;
                meta.principal_point = principal_point;
                meta.distortion = distortion;
                if let Some(rs) = frame.rolling_shutter {
                    meta.rolling_shutter = Vec4::from(rs);
                }
                if let Some(light_dir) = light_dir {
                    meta.light_dir = light_dir;
                }
                if let Some(s0) = frame.s0 {
                    meta.s0 = s0;
                }
            }
            if light_dir.is_some() {
                dataset.has_light_dirs = true;
            }

            slot += 1;
        }
    }

    // Scene-level auxiliary buffers once every slot is in place.
    if sharpen_amount > 0.0 && dataset.width > 0 && dataset.height > 0 {
        let tiles = glam::UVec2::new(
            (dataset.width as u32 / 16).max(1),
            (dataset.height as u32 / 16).max(1),
        );
        dataset.allocate_sharpness(ctx, tiles)?;
    }
    if let Some(resolution) = descriptions.iter().find_map(|d| d.envmap_resolution) {
        dataset.allocate_envmap(ctx, glam::UVec2::from(resolution))?;
    }

    Ok(())
}

/// Builds a placeholder aggregate with `n_images` pre-sized but
/// unpopulated slots per pass, default metadata, and identity poses.
/// Used for benchmarking and testing without real capture data.
pub fn create_empty_dataset(n_images: usize, aabb_scale: u32, is_hdr: bool) -> NerfDataset {
    let mut dataset = NerfDataset::with_slots(n_images);
    dataset.aabb_scale = aabb_scale;
    dataset.is_hdr = is_hdr;
    info!(n_images, aabb_scale, is_hdr, "created placeholder dataset");
    dataset
}
