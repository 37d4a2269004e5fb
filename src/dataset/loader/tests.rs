use std::path::{Path, PathBuf};

use glam::{UVec2, Vec2, Vec3};

use crate::dataset::aggregate::PassKind;
use crate::dataset::common::{DatasetError, Result};
use crate::dataset::device::DeviceContext;
use crate::dataset::geometry::{BoundingBox, Ray, SourceConvention};
use crate::dataset::ingest::types::{DepthData, PixelData};
use crate::dataset::loader::factory::{create_empty_dataset, load_dataset};
use crate::dataset::loader::source::{DepthImage, FrameReader, JsonSceneSource, PixelImage};

struct MockFrameReader {
    resolution: UVec2,
    value: u8,
    fail: bool,
}

impl Default for MockFrameReader {
    fn default() -> Self {
        Self {
            resolution: UVec2::new(4, 4),
            value: 200,
            fail: false,
        }
    }
}

impl FrameReader for MockFrameReader {
    fn read_pixels(&self, path: &Path) -> Result<PixelImage> {
        if self.fail {
            return Err(DatasetError::SourceReadError(format!(
                "mock failure: {}",
                path.display()
            )));
        }
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
            data: DepthData::UShort(vec![500; n_pixels]),
        })
    }

    fn read_rays(&self, _path: &Path) -> Result<Vec<Ray>> {
        let n_pixels = (self.resolution.x * self.resolution.y) as usize;
        Ok(vec![Ray::new(Vec3::ONE, Vec3::Z); n_pixels])
    }
}

fn write_scene(dir: &Path, name: &str, value: serde_json::Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    path
}

fn two_frame_scene() -> serde_json::Value {
    serde_json::json!({
        "w": 4,
        "h": 4,
        "aabb_scale": 2.0,
        "scale": 0.5,
        "offset": [0.5, 0.5, 0.5],
        "from_na": true,
        "n_lights": 2,
        "integer_depth_scale": 0.001,
        "frames": [
            {
                "file_path": "images/0.png",
                "transform_matrix": [[1,0,0,0],[0,1,0,0],[0,0,1,2.0],[0,0,0,1]],
                "camera_angle_x": 0.7,
                "light": [0.0, 0.0, 1.0],
                "depth_path": "depth/0.png"
            },
            {
                "file_path": "images/1.png",
                "albedo_file_path": "albedos/1.png",
                "transform_matrix": [[1,0,0,1.0],[0,1,0,0],[0,0,1,0],[0,0,0,1]],
                "fl_x": 800.0,
                "fl_y": 810.0
            }
        ]
    })
}

#[test]
fn loads_dual_pass_dataset_from_json() {
    let ctx = DeviceContext::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(dir.path(), "transform.json", two_frame_scene());
    let reader = MockFrameReader::default();

    let dataset = load_dataset(&ctx, &[JsonSceneSource::new(path)], &reader, 0.0).unwrap();

    assert_eq!(dataset.n_images, 2);
    assert_eq!(dataset.n_lights, 2);
    assert_eq!(dataset.n_views, 1);
    assert_eq!(dataset.convention, SourceConvention::Na);
    assert_eq!(dataset.scale, 0.5);
    assert_eq!(dataset.aabb_scale, 2);
    assert_eq!(dataset.render_aabb, BoundingBox::from_aabb_scale(2));
    assert!(dataset.has_light_dirs);
    assert_eq!(dataset.n_extra_dims(), 3);
    assert_eq!(dataset.width, 4);
    assert_eq!(dataset.xforms.len(), 2);

    for kind in PassKind::ALL {
        let pass = dataset.pass(kind);
        assert_eq!(pass.n_images(), 2);
        assert_eq!(pass.pixels[0].len(), 4 * 4 * 4);
        assert_eq!(pass.metadata[1].focal_length, Vec2::new(800.0, 810.0));
    }

    // Na keeps the axes; the translation moves into the canonical frame.
    let t = Vec3::from(dataset.xforms[0].start.translation);
    assert!((t - Vec3::new(0.5, 0.5, 1.5)).length() < 1e-6);

    // Depth was referenced by frame 0 only, rescaled by the scene's
    // integer depth scale.
    let pass = dataset.pass(PassKind::NormalLit);
    let depth = pass
        .depth_of(&pass.metadata[0])
        .unwrap()
        .to_host(&ctx)
        .unwrap();
    assert!((depth[0] - 0.5).abs() < 1e-6);
    assert!(pass.metadata[1].depth.is_none());

    // Per-image light direction is already canonical for Na sources.
    assert_eq!(pass.metadata[0].light_dir, Vec3::Z);
}

#[test]
fn multiple_sources_concatenate_frames() {
    let ctx = DeviceContext::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let a = write_scene(dir.path(), "a.json", two_frame_scene());
    let b = write_scene(dir.path(), "b.json", two_frame_scene());
    let reader = MockFrameReader::default();

    let sources = [JsonSceneSource::new(a), JsonSceneSource::new(b)];
    let dataset = load_dataset(&ctx, &sources, &reader, 0.0).unwrap();

    assert_eq!(dataset.n_images, 4);
    assert_eq!(dataset.n_views, 2);
    for kind in PassKind::ALL {
        assert_eq!(dataset.pass(kind).n_images(), 4);
    }
}

#[test]
fn convention_conflict_fails_before_any_ingest() {
    let ctx = DeviceContext::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut mitsuba = two_frame_scene();
    mitsuba["from_na"] = serde_json::json!(false);
    mitsuba["from_mitsuba"] = serde_json::json!(true);
    let a = write_scene(dir.path(), "a.json", two_frame_scene());
    let b = write_scene(dir.path(), "b.json", mitsuba);

    // A failing reader proves the conflict surfaces before frames are
    // touched.
    let reader = MockFrameReader {
        fail: true,
        ..Default::default()
    };
    let sources = [JsonSceneSource::new(a), JsonSceneSource::new(b)];
    let result = load_dataset(&ctx, &sources, &reader, 0.0);
    assert!(matches!(
        result.unwrap_err(),
        DatasetError::ConventionConflict(_, _)
    ));
}

#[test]
fn malformed_source_reports_file_and_field() {
    let ctx = DeviceContext::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(
        dir.path(),
        "broken.json",
        serde_json::json!({
            "frames": [{ "file_path": "images/0.png" }]
        }),
    );
    let reader = MockFrameReader::default();

    let err = load_dataset(&ctx, &[JsonSceneSource::new(path)], &reader, 0.0).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("transform_matrix"), "{message}");
    assert!(message.contains("broken.json"), "{message}");
}

#[test]
fn reader_failure_aborts_the_load() {
    let ctx = DeviceContext::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(dir.path(), "transform.json", two_frame_scene());
    let reader = MockFrameReader {
        fail: true,
        ..Default::default()
    };

    let result = load_dataset(&ctx, &[JsonSceneSource::new(path)], &reader, 0.0);
    assert!(matches!(
        result.unwrap_err(),
        DatasetError::SourceReadError(_)
    ));
}

#[test]
fn rays_are_converted_into_the_canonical_frame() {
    let ctx = DeviceContext::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut scene = two_frame_scene();
    scene["frames"][0]["rays_path"] = serde_json::json!("rays/0.bin");
    let path = write_scene(dir.path(), "transform.json", scene);
    let reader = MockFrameReader::default();

    let dataset = load_dataset(&ctx, &[JsonSceneSource::new(path)], &reader, 0.0).unwrap();
    assert!(dataset.has_rays);

    let pass = dataset.pass(PassKind::NormalLit);
    let rays = pass
        .rays_of(&pass.metadata[0])
        .unwrap()
        .to_host(&ctx)
        .unwrap();
    assert_eq!(rays.len(), 16);
    // origin * 0.5 + 0.5 then the cyclic axis order; direction kept
    // unit-length and cycled.
    assert!((rays[0].origin - Vec3::ONE).length() < 1e-6);
    assert!((rays[0].direction - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);
}

#[test]
fn placeholder_has_presized_empty_slots() {
    let dataset = create_empty_dataset(2, 4, false);

    assert_eq!(dataset.n_images, 2);
    assert_eq!(dataset.scale, 1.0);
    assert_eq!(dataset.render_aabb, BoundingBox::default());
    assert!(!dataset.is_hdr);
    assert_eq!(dataset.aabb_scale, 4);
    assert_eq!(dataset.xforms.len(), 2);

    for kind in PassKind::ALL {
        let pass = dataset.pass(kind);
        assert_eq!(pass.n_images(), 2);
        assert_eq!(pass.pixels.len(), 2);
        assert_eq!(pass.depths.len(), 2);
        assert_eq!(pass.rays.len(), 2);
        for buffer in &pass.pixels {
            assert!(buffer.is_empty());
        }
        for meta in &pass.metadata {
            assert!(meta.pixels.is_none());
            assert_eq!(meta.focal_length, Vec2::splat(1000.0));
        }
    }
}
