//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use crate::{Hit, Material};
use lumen_math::{Aabb, Ray, Vec3};

/// Determinants below this are treated as a ray parallel to the triangle.
const PARALLEL_EPSILON: f32 = 1e-8;

/// Möller-Trumbore ray-triangle intersection.
///
/// Returns `(t, beta, gamma)` where the hit point is
/// `(1 - beta - gamma) * a + beta * b + gamma * c`. `t` is not range
/// checked. Degenerate triangles and parallel rays return `None`.
#[inline]
pub fn intersect_triangle(a: Vec3, b: Vec3, c: Vec3, ray: &Ray) -> Option<(f32, f32, f32)> {
    let edge1 = b - a;
    let edge2 = c - a;

    let h = ray.direction().cross(edge2);
    let det = edge1.dot(h);

    // Ray is parallel to triangle
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }

    let f = 1.0 / det;
    let s = ray.origin() - a;
    let beta = f * s.dot(h);
    if !(0.0..=1.0).contains(&beta) {
        return None;
    }

    let q = s.cross(edge1);
    let gamma = f * ray.direction().dot(q);
    if gamma < 0.0 || beta + gamma > 1.0 {
        return None;
    }

    Some((f * edge2.dot(q), beta, gamma))
}

/// Unit face normal `(b - a) × (c - a)`, or zero for a degenerate triangle.
#[inline]
pub fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}

/// A triangle primitive.
#[derive(Debug, Clone)]
pub struct Triangle {
    /// Vertices
    vertices: [Vec3; 3],
    /// Pre-computed face normal (unit length)
    normal: Vec3,
    material: Material,
    bbox: Aabb,
}

impl Triangle {
    /// Create a new triangle from three vertices.
    pub fn new(a: Vec3, b: Vec3, c: Vec3, material: Material) -> Self {
        Self {
            vertices: [a, b, c],
            normal: triangle_normal(a, b, c),
            material,
            bbox: Aabb::from_iter_points([a, b, c]),
        }
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        self.vertices
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn intersect<'a>(&'a self, ray: &Ray, hit: &mut Hit<'a>, tmin: f32) -> bool {
        let [a, b, c] = self.vertices;
        match intersect_triangle(a, b, c, ray) {
            Some((t, _, _)) if hit.accepts(t, tmin) => {
                hit.set(t, &self.material, self.normal);
                true
            }
            _ => false,
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
