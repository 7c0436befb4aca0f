// Transform utilities for Mat4
//
// Extends glam::Mat4 with the few operations instanced geometry needs.
// glam::Mat4 already provides transform_point3(), transform_vector3() and inverse().

use glam::{Mat4, Vec3};
use crate::Aabb;

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;

    /// Transform a surface normal by the inverse transpose of `self`.
    ///
    /// `self` must already be the inverse of the object-to-world matrix,
    /// which is what ray transforms keep around anyway. The result is unit
    /// length, or zero for a degenerate normal.
    fn transform_normal(&self, normal: Vec3) -> Vec3;

    /// True when the matrix can be inverted reliably.
    fn is_invertible(&self) -> bool;
}

impl Mat4Ext for Mat4 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        let corners = [
            Vec3::new(aabb.min.x, aabb.min.y, aabb.min.z),
            Vec3::new(aabb.max.x, aabb.min.y, aabb.min.z),
            Vec3::new(aabb.min.x, aabb.max.y, aabb.min.z),
            Vec3::new(aabb.max.x, aabb.max.y, aabb.min.z),
            Vec3::new(aabb.min.x, aabb.min.y, aabb.max.z),
            Vec3::new(aabb.max.x, aabb.min.y, aabb.max.z),
            Vec3::new(aabb.min.x, aabb.max.y, aabb.max.z),
            Vec3::new(aabb.max.x, aabb.max.y, aabb.max.z),
        ];

        Aabb::from_iter_points(corners.iter().map(|&corner| self.transform_point3(corner)))
    }

    fn transform_normal(&self, normal: Vec3) -> Vec3 {
        self.transpose().transform_vector3(normal).normalize_or_zero()
    }

    fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det.abs() > 1e-12
    }
}
