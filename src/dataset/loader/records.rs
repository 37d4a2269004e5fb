//! Scene-description records.
//!
//! On-disk schema of the `transform.json` files written by the capture
//! preprocessing tools. Records stay plain (arrays, not math types) so
//! any structured source can produce them.

use glam::{Affine3A, Mat3, UVec2, Vec2, Vec3};
use serde::Deserialize;

use crate::dataset::camera::CameraDistortion;
use crate::dataset::common::{DatasetError, Result};

/// Scene-level description: global flags plus one record per frame.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub w: Option<u32>,
    #[serde(default)]
    pub h: Option<u32>,
    #[serde(default = "default_aabb_scale")]
    pub aabb_scale: f32,
    #[serde(default)]
    pub scale: Option<f32>,
    #[serde(default)]
    pub offset: Option<[f32; 3]>,
    #[serde(default)]
    pub up: Option<[f32; 3]>,
    #[serde(default)]
    pub from_mitsuba: bool,
    #[serde(default)]
    pub from_na: bool,
    #[serde(default)]
    pub is_hdr: bool,
    /// Normalized-to-world similarity, as a 4x4 row-major matrix.
    #[serde(default)]
    pub n2w: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    pub n_extra_learnable_dims: u32,
    #[serde(default)]
    pub n_lights: Option<usize>,
    #[serde(default)]
    pub integer_depth_scale: Option<f32>,
    #[serde(default)]
    pub envmap_resolution: Option<[u32; 2]>,
    pub frames: Vec<FrameRecord>,
}

fn default_aabb_scale() -> f32 {
    1.0
}

impl SceneDescription {
    /// The similarity carried by the `n2w` matrix: uniform scale and
    /// translation.
    pub fn n2w_similarity(&self) -> Option<(f32, Vec3)> {
        let m = self.n2w.as_ref()?;
        if m.len() < 3 || m.iter().take(3).any(|row| row.len() < 4) {
            return None;
        }
        Some((m[0][0], Vec3::new(m[0][3], m[1][3], m[2][3])))
    }
}

/// Per-frame record: pose, intrinsics, and payload references.
#[derive(Debug, Clone, Deserialize)]
pub struct FrameRecord {
    /// Normal-lit image payload.
    pub file_path: String,
    /// Albedo-lit image payload; falls back to `file_path`.
    #[serde(default)]
    pub albedo_file_path: Option<String>,
    /// Camera-to-world pose, 3x4 or 4x4 row-major.
    pub transform_matrix: Vec<Vec<f32>>,
    #[serde(default)]
    pub intrinsic_matrix: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    pub camera_angle_x: Option<f32>,
    #[serde(default)]
    pub fl_x: Option<f32>,
    #[serde(default)]
    pub fl_y: Option<f32>,
    #[serde(default)]
    pub cx: Option<f32>,
    #[serde(default)]
    pub cy: Option<f32>,
    #[serde(default)]
    pub k1: Option<f32>,
    #[serde(default)]
    pub k2: Option<f32>,
    #[serde(default)]
    pub p1: Option<f32>,
    #[serde(default)]
    pub p2: Option<f32>,
    #[serde(default)]
    pub rolling_shutter: Option<[f32; 4]>,
    /// Per-image light direction in source-space coordinates.
    #[serde(default)]
    pub light: Option<[f32; 3]>,
    #[serde(default)]
    pub depth_path: Option<String>,
    #[serde(default)]
    pub rays_path: Option<String>,
    #[serde(default)]
    pub s0: Option<f32>,
    #[serde(default)]
    pub w: Option<u32>,
    #[serde(default)]
    pub h: Option<u32>,
}

impl FrameRecord {
    /// The source-space camera pose.
    pub fn pose(&self, context: &str) -> Result<Affine3A> {
        let rows = &self.transform_matrix;
        if rows.len() < 3 || rows.iter().take(3).any(|row| row.len() < 4) {
            return Err(DatasetError::SceneParseError(format!(
                "{context}: transform_matrix must be at least 3x4"
            )));
        }
        let col = |j: usize| Vec3::new(rows[0][j], rows[1][j], rows[2][j]);
        Ok(Affine3A::from_mat3_translation(
            Mat3::from_cols(col(0), col(1), col(2)),
            col(3),
        ))
    }

    /// Focal length in pixels, from whichever intrinsics form the
    /// record carries.
    pub fn focal_length(&self, resolution: UVec2, context: &str) -> Result<Vec2> {
        if let Some(k) = &self.intrinsic_matrix {
            if k.len() < 2 || k[0].len() < 3 || k[1].len() < 3 {
                return Err(DatasetError::SceneParseError(format!(
                    "{context}: intrinsic_matrix must be at least 2x3"
                )));
            }
            return Ok(Vec2::new(k[0][0], k[1][1]));
        }
        if let Some(fl_x) = self.fl_x {
            return Ok(Vec2::new(fl_x, self.fl_y.unwrap_or(fl_x)));
        }
        if let Some(angle) = self.camera_angle_x {
            let focal = 0.5 * resolution.x as f32 / (0.5 * angle).tan();
            return Ok(Vec2::splat(focal));
        }
        Err(DatasetError::MissingField {
            field: "camera_angle_x, fl_x, or intrinsic_matrix",
            context: context.to_string(),
        })
    }

    /// Principal point in normalized image coordinates.
    pub fn principal_point(&self, resolution: UVec2) -> Vec2 {
        let (w, h) = (resolution.x.max(1) as f32, resolution.y.max(1) as f32);
        if let Some(k) = &self.intrinsic_matrix {
            if k.len() >= 2 && k[0].len() >= 3 && k[1].len() >= 3 {
                return Vec2::new(k[0][2] / w, k[1][2] / h);
            }
        }
        match (self.cx, self.cy) {
            (Some(cx), Some(cy)) => Vec2::new(cx / w, cy / h),
            _ => Vec2::splat(0.5),
        }
    }

    pub fn distortion(&self) -> CameraDistortion {
        CameraDistortion {
            k1: self.k1.unwrap_or(0.0),
            k2: self.k2.unwrap_or(0.0),
            p1: self.p1.unwrap_or(0.0),
            p2: self.p2.unwrap_or(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_json(extra: &str) -> String {
        format!(
            r#"{{
                "file_path": "images/0.png",
                "transform_matrix": [[1,0,0,4],[0,1,0,5],[0,0,1,6],[0,0,0,1]]
                {extra}
            }}"#
        )
    }

    #[test]
    fn pose_takes_top_three_rows() {
        let frame: FrameRecord = serde_json::from_str(&frame_json("")).unwrap();
        let pose = frame.pose("frame 0").unwrap();
        assert_eq!(Vec3::from(pose.translation), Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(Vec3::from(pose.matrix3.x_axis), Vec3::X);
    }

    #[test]
    fn focal_prefers_intrinsic_matrix() {
        let frame: FrameRecord = serde_json::from_str(&frame_json(
            r#", "intrinsic_matrix": [[800,0,320,0],[0,810,240,0],[0,0,1,0]], "fl_x": 100"#,
        ))
        .unwrap();
        let resolution = UVec2::new(640, 480);
        assert_eq!(
            frame.focal_length(resolution, "frame 0").unwrap(),
            Vec2::new(800.0, 810.0)
        );
        assert_eq!(frame.principal_point(resolution), Vec2::splat(0.5));
    }

    #[test]
    fn focal_from_camera_angle() {
        let frame: FrameRecord =
            serde_json::from_str(&frame_json(r#", "camera_angle_x": 0.7"#)).unwrap();
        let focal = frame.focal_length(UVec2::new(640, 480), "frame 0").unwrap();
        let expected = 0.5 * 640.0 / (0.35f32).tan();
        assert!((focal.x - expected).abs() < 1e-3);
        assert_eq!(focal.x, focal.y);
    }

    #[test]
    fn missing_intrinsics_is_reported() {
        let frame: FrameRecord = serde_json::from_str(&frame_json("")).unwrap();
        assert!(matches!(
            frame.focal_length(UVec2::new(640, 480), "frame 0"),
            Err(DatasetError::MissingField { .. })
        ));
    }

    #[test]
    fn n2w_similarity_extracts_scale_and_translation() {
        let scene: SceneDescription = serde_json::from_str(
            r#"{
                "n2w": [[2,0,0,1],[0,2,0,2],[0,0,2,3],[0,0,0,1]],
                "frames": []
            }"#,
        )
        .unwrap();
        let (s, t) = scene.n2w_similarity().unwrap();
        assert_eq!(s, 2.0);
        assert_eq!(t, Vec3::new(1.0, 2.0, 3.0));
    }
}
