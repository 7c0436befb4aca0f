//! Closest-hit record shared by every intersection routine.

use crate::Material;
use lumen_math::Vec3;

/// Record of the closest ray-surface intersection found so far.
///
/// Starts at `t = +inf` and only ever moves closer: a primitive may update it
/// when its own distance lies in `(tmin, hit.t)`.
#[derive(Debug, Clone, Copy)]
pub struct Hit<'a> {
    /// Ray parameter of the closest hit
    pub t: f32,
    /// Material at the hit point, `None` until something was hit
    pub material: Option<&'a Material>,
    /// Surface normal at the hit point (unit length, not oriented to the ray)
    pub normal: Vec3,
}

impl<'a> Default for Hit<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Hit<'a> {
    pub fn new() -> Self {
        Self {
            t: f32::INFINITY,
            material: None,
            normal: Vec3::ZERO,
        }
    }

    /// Overwrite the record with a closer hit.
    pub fn set(&mut self, t: f32, material: &'a Material, normal: Vec3) {
        self.t = t;
        self.material = Some(material);
        self.normal = normal;
    }

    /// True once any primitive has been hit.
    pub fn is_hit(&self) -> bool {
        self.material.is_some()
    }

    /// True when `t` lies strictly between `tmin` and the current closest hit.
    #[inline]
    pub fn accepts(&self, t: f32, tmin: f32) -> bool {
        t > tmin && t < self.t
    }
}
