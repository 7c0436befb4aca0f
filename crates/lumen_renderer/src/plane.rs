//! Infinite plane primitive.

use crate::error::GeometryError;
use crate::{Hit, Material};
use lumen_math::{Ray, Vec3};

const PARALLEL_EPSILON: f32 = 1e-8;

/// The plane `normal · x = offset`. Unbounded, so it never enters the BVH.
#[derive(Debug, Clone)]
pub struct Plane {
    normal: Vec3,
    offset: f32,
    material: Material,
}

impl Plane {
    /// Create a plane; `normal` is normalized and `offset` rescaled to match.
    pub fn new(normal: Vec3, offset: f32, material: Material) -> Result<Self, GeometryError> {
        let length = normal.length();
        if !(length > 0.0 && length.is_finite()) {
            return Err(GeometryError::PlaneNormal);
        }
        Ok(Self {
            normal: normal / length,
            offset: offset / length,
            material,
        })
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn intersect<'a>(&'a self, ray: &Ray, hit: &mut Hit<'a>, tmin: f32) -> bool {
        let denom = self.normal.dot(ray.direction());
        if denom.abs() < PARALLEL_EPSILON {
            return false;
        }
        let t = (self.offset - self.normal.dot(ray.origin())) / denom;
        if !hit.accepts(t, tmin) {
            return false;
        }
        hit.set(t, &self.material, self.normal);
        true
    }
}
