//! Coordinate-frame normalization.
//!
//! Capture rigs describe camera poses in one of three conventions; the
//! training engine consumes everything in a single canonical unit-cube
//! frame. Conversion is a pure permutation/sign-flip on directions and a
//! column/row rewrite plus a uniform similarity on poses, so a pose can
//! always be mapped back to its source convention exactly.

use glam::{Affine3A, Mat3, Vec3};

use crate::dataset::common::{DatasetError, Result};
use crate::dataset::geometry::types::Ray;

/// Which convention the scene source expresses poses and directions in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourceConvention {
    /// Synthetic-capture convention: axes cycle `(x,y,z) -> (y,z,x)`.
    #[default]
    Standard,
    /// Mitsuba exports: all direction components negated.
    Mitsuba,
    /// Neural-actor style exports: axes already match the canonical frame.
    Na,
}

impl SourceConvention {
    /// Resolves the flag pair carried by scene descriptions. The flags
    /// are mutually exclusive.
    pub fn from_flags(from_mitsuba: bool, from_na: bool) -> Result<Self> {
        match (from_mitsuba, from_na) {
            (false, false) => Ok(Self::Standard),
            (true, false) => Ok(Self::Mitsuba),
            (false, true) => Ok(Self::Na),
            (true, true) => Err(DatasetError::ConventionConflict(
                "mitsuba".to_string(),
                "na".to_string(),
            )),
        }
    }
}

fn cycle_yzx(v: Vec3) -> Vec3 {
    Vec3::new(v.y, v.z, v.x)
}

fn cycle_zxy(v: Vec3) -> Vec3 {
    Vec3::new(v.z, v.x, v.y)
}

/// Global normalization mapping source-space coordinates into the
/// canonical frame: a source convention plus the uniform similarity
/// `p -> p * scale + offset`. Read-only once derived; shared freely
/// across ingestion tasks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneNormalization {
    pub convention: SourceConvention,
    pub scale: f32,
    pub offset: Vec3,
}

impl Default for SceneNormalization {
    fn default() -> Self {
        Self {
            convention: SourceConvention::Standard,
            scale: 1.0,
            offset: Vec3::ZERO,
        }
    }
}

impl SceneNormalization {
    pub fn new(convention: SourceConvention, scale: f32, offset: Vec3) -> Result<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(DatasetError::InvalidScale(scale));
        }
        Ok(Self {
            convention,
            scale,
            offset,
        })
    }

    /// Maps a source-space direction into the canonical frame. Pure
    /// permutation/sign-flip; preserves the norm.
    pub fn direction_to_canonical(&self, direction: Vec3) -> Vec3 {
        match self.convention {
            SourceConvention::Standard => cycle_yzx(direction),
            SourceConvention::Mitsuba => -direction,
            SourceConvention::Na => direction,
        }
    }

    /// Maps a source-space 3x4 camera pose into the canonical frame.
    pub fn pose_to_canonical(&self, pose: Affine3A) -> Affine3A {
        let mut c0 = Vec3::from(pose.matrix3.x_axis);
        let mut c1 = -Vec3::from(pose.matrix3.y_axis);
        let mut c2 = -Vec3::from(pose.matrix3.z_axis);
        let mut c3 = Vec3::from(pose.translation) * self.scale + self.offset;

        match self.convention {
            SourceConvention::Na => {
                c1 = -c1;
                c2 = -c2;
            }
            SourceConvention::Mitsuba => {
                c0 = -c0;
                c2 = -c2;
            }
            SourceConvention::Standard => {
                // Cycle rows xyz <- yzx, translation included.
                c0 = cycle_yzx(c0);
                c1 = cycle_yzx(c1);
                c2 = cycle_yzx(c2);
                c3 = cycle_yzx(c3);
            }
        }

        Affine3A::from_mat3_translation(Mat3::from_cols(c0, c1, c2), c3)
    }

    /// Exact inverse of [`pose_to_canonical`](Self::pose_to_canonical)
    /// for the same convention, scale, and offset.
    pub fn canonical_to_pose(&self, pose: Affine3A) -> Affine3A {
        let mut c0 = Vec3::from(pose.matrix3.x_axis);
        let mut c1 = Vec3::from(pose.matrix3.y_axis);
        let mut c2 = Vec3::from(pose.matrix3.z_axis);
        let mut c3 = Vec3::from(pose.translation);

        match self.convention {
            SourceConvention::Na => {
                c1 = -c1;
                c2 = -c2;
            }
            SourceConvention::Mitsuba => {
                c0 = -c0;
                c2 = -c2;
            }
            SourceConvention::Standard => {
                // Cycle rows xyz -> yzx, translation included.
                c0 = cycle_zxy(c0);
                c1 = cycle_zxy(c1);
                c2 = cycle_zxy(c2);
                c3 = cycle_zxy(c3);
            }
        }

        c1 = -c1;
        c2 = -c2;
        c3 = (c3 - self.offset) / self.scale;

        Affine3A::from_mat3_translation(Mat3::from_cols(c0, c1, c2), c3)
    }

    /// Maps a precomputed source-space ray into the canonical frame.
    ///
    /// Origin and direction always use the cyclic axis order, regardless
    /// of the pose convention. `scale_direction` additionally scales the
    /// direction, for rays whose length encodes depth.
    pub fn ray_to_canonical(&self, ray: Ray, scale_direction: bool) -> Ray {
        let origin = ray.origin * self.scale + self.offset;
        let direction = if scale_direction {
            ray.direction * self.scale
        } else {
            ray.direction
        };

        Ray {
            origin: cycle_yzx(origin),
            direction: cycle_yzx(direction),
        }
    }
}
