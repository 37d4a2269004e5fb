//! Geometric primitive types

use glam::Vec3;

/// A single camera ray, used when a capture rig supplies precomputed
/// per-pixel rays instead of deriving them from intrinsics and pose.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }
}

/// Axis-aligned bounding box constraining the renderable region.
///
/// The default box is empty (inverted bounds), the identity for
/// `enlarge`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min: Vec3::INFINITY,
            max: Vec3::NEG_INFINITY,
        }
    }
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The canonical unit cube `[0,1]^3`.
    pub fn unit() -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::ONE,
        }
    }

    /// A cube of side `aabb_scale` centered on the unit cube's center.
    pub fn from_aabb_scale(aabb_scale: u32) -> Self {
        let half = aabb_scale as f32 * 0.5;
        Self {
            min: Vec3::splat(0.5 - half),
            max: Vec3::splat(0.5 + half),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    pub fn enlarge(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn diag(&self) -> Vec3 {
        self.max - self.min
    }
}
