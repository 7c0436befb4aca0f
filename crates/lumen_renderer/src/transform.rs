//! Affine transform wrapper around any primitive.

use crate::error::GeometryError;
use crate::primitive::Primitive;
use crate::Hit;
use lumen_math::{Aabb, Mat4, Mat4Ext, Ray};

/// A primitive placed in the world by an object-to-world matrix.
///
/// Rays are carried into object space with the inverse matrix. The
/// direction is not renormalized, so the object-space `t` equals the
/// world-space `t`.
#[derive(Debug, Clone)]
pub struct Transform {
    matrix: Mat4,
    inverse: Mat4,
    object: Box<Primitive>,
    bbox: Option<Aabb>,
}

impl Transform {
    pub fn new(matrix: Mat4, object: Primitive) -> Result<Self, GeometryError> {
        if !matrix.is_invertible() {
            return Err(GeometryError::SingularTransform);
        }
        let bbox = object.bounding_box().map(|b| matrix.transform_aabb(&b));
        Ok(Self {
            matrix,
            inverse: matrix.inverse(),
            object: Box::new(object),
            bbox,
        })
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    pub fn object(&self) -> &Primitive {
        &self.object
    }

    pub fn intersect<'a>(&'a self, ray: &Ray, hit: &mut Hit<'a>, tmin: f32) -> bool {
        let local = Ray::new(
            self.inverse.transform_point3(ray.origin()),
            self.inverse.transform_vector3(ray.direction()),
        );
        if !self.object.intersect(&local, hit, tmin) {
            return false;
        }
        hit.normal = self.inverse.transform_normal(hit.normal);
        true
    }

    /// World-space bounds, `None` when the wrapped object is unbounded.
    pub fn bounding_box(&self) -> Option<Aabb> {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Material, Sphere};
    use lumen_math::Vec3;

    fn unit_sphere() -> Primitive {
        Primitive::Sphere(Sphere::new(Vec3::ZERO, 1.0, Material::default()).unwrap())
    }

    #[test]
    fn test_translated_sphere() {
        let t = Transform::new(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)), unit_sphere())
            .unwrap();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut hit = Hit::new();

        assert!(t.intersect(&ray, &mut hit, 0.001));
        assert!((hit.t - 4.0).abs() < 1e-5);
        assert!((hit.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_scaled_sphere_keeps_world_t() {
        // Ellipsoid with x semi-axis 3
        let t = Transform::new(Mat4::from_scale(Vec3::new(3.0, 1.0, 1.0)), unit_sphere()).unwrap();
        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        let mut hit = Hit::new();

        assert!(t.intersect(&ray, &mut hit, 0.001));
        assert!((hit.t - 7.0).abs() < 1e-4);
        assert!((hit.normal - Vec3::X).length() < 1e-4);

        let bbox = t.bounding_box().unwrap();
        assert!((bbox.max.x - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_non_uniform_scale_normal() {
        // Point (3 cos a, sin a, 0) on the ellipsoid has normal ∝ (cos a / 3, sin a, 0)
        let t = Transform::new(Mat4::from_scale(Vec3::new(3.0, 1.0, 1.0)), unit_sphere()).unwrap();
        let a = 0.6f32;
        let target = Vec3::new(3.0 * a.cos(), a.sin(), 0.0);
        let expected = Vec3::new(a.cos() / 3.0, a.sin(), 0.0).normalize();
        let ray = Ray::new(target + expected * 4.0, -expected);
        let mut hit = Hit::new();

        assert!(t.intersect(&ray, &mut hit, 0.001));
        assert!((ray.at(hit.t) - target).length() < 1e-3);
        assert!((hit.normal - expected).length() < 1e-3);
    }

    #[test]
    fn test_singular_matrix_rejected() {
        let err = Transform::new(Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0)), unit_sphere())
            .unwrap_err();
        assert_eq!(err, GeometryError::SingularTransform);
    }
}
