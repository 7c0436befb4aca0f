//! Sphere primitive for ray tracing.

use crate::error::GeometryError;
use crate::{Hit, Material};
use lumen_math::{Aabb, Ray, Vec3};

/// A sphere primitive.
#[derive(Debug, Clone)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    material: Material,
    bbox: Aabb,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f32, material: Material) -> Result<Self, GeometryError> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(GeometryError::Radius(radius));
        }
        let rvec = Vec3::splat(radius);
        let bbox = Aabb::from_points(center - rvec, center + rvec);

        Ok(Self {
            center,
            radius,
            material,
            bbox,
        })
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Nearest root of the ray/sphere quadratic; the direction need not be unit length.
    pub fn intersect<'a>(&'a self, ray: &Ray, hit: &mut Hit<'a>, tmin: f32) -> bool {
        let oc = self.center - ray.origin();
        let a = ray.direction().length_squared();
        if a == 0.0 {
            return false;
        }
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return false;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !hit.accepts(root, tmin) {
            root = (h + sqrtd) / a;
            if !hit.accepts(root, tmin) {
                return false;
            }
        }

        let outward_normal = (ray.at(root) - self.center) / self.radius;
        hit.set(root, &self.material, outward_normal);
        true
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_sphere() -> Sphere {
        Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, Material::default()).unwrap()
    }

    #[test]
    fn test_sphere_hit() {
        let sphere = unit_sphere();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut hit = Hit::new();

        assert!(sphere.intersect(&ray, &mut hit, 0.001));
        assert!((hit.t - 0.5).abs() < 0.001); // Should hit at t=0.5
        assert!((hit.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_sphere_hit_non_unit_direction() {
        let sphere = unit_sphere();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -4.0));
        let mut hit = Hit::new();

        assert!(sphere.intersect(&ray, &mut hit, 0.001));
        assert!((hit.t - 0.125).abs() < 0.001);
    }

    #[test]
    fn test_sphere_from_inside_uses_far_root() {
        let sphere = unit_sphere();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -1.0), Vec3::X);
        let mut hit = Hit::new();

        assert!(sphere.intersect(&ray, &mut hit, 0.001));
        assert!((hit.t - 0.5).abs() < 0.001);
        assert!((hit.normal - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = unit_sphere();

        // Ray pointing away from sphere
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        let mut hit = Hit::new();

        assert!(!sphere.intersect(&ray, &mut hit, 0.001));
        assert!(!hit.is_hit());
    }

    #[test]
    fn test_sphere_rejects_bad_radius() {
        assert_eq!(
            Sphere::new(Vec3::ZERO, 0.0, Material::default()).unwrap_err(),
            GeometryError::Radius(0.0)
        );
    }
}
