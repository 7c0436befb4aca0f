//! The closed set of renderable objects.

use crate::mesh::TriangleMesh;
use crate::plane::Plane;
use crate::revsurface::RevSurface;
use crate::sphere::Sphere;
use crate::transform::Transform;
use crate::triangle::Triangle;
use crate::Hit;
use lumen_math::{Aabb, Ray};

/// Any object the scene can hold.
///
/// Dispatch is a `match`, so the BVH stores primitives by value.
#[derive(Debug, Clone)]
pub enum Primitive {
    Sphere(Sphere),
    Triangle(Triangle),
    Plane(Plane),
    Mesh(TriangleMesh),
    Transform(Transform),
    RevSurface(RevSurface),
    /// Unordered collection, tested linearly
    Group(Vec<Primitive>),
}

impl Primitive {
    /// Update `hit` if this primitive is hit in `(tmin, hit.t)`.
    pub fn intersect<'a>(&'a self, ray: &Ray, hit: &mut Hit<'a>, tmin: f32) -> bool {
        match self {
            Primitive::Sphere(s) => s.intersect(ray, hit, tmin),
            Primitive::Triangle(t) => t.intersect(ray, hit, tmin),
            Primitive::Plane(p) => p.intersect(ray, hit, tmin),
            Primitive::Mesh(m) => m.intersect(ray, hit, tmin),
            Primitive::Transform(t) => t.intersect(ray, hit, tmin),
            Primitive::RevSurface(r) => r.intersect(ray, hit, tmin),
            Primitive::Group(children) => {
                let mut flag = false;
                for child in children {
                    flag |= child.intersect(ray, hit, tmin);
                }
                flag
            }
        }
    }

    /// World-space bounds; `None` for anything unbounded.
    pub fn bounding_box(&self) -> Option<Aabb> {
        match self {
            Primitive::Sphere(s) => Some(s.bounding_box()),
            Primitive::Triangle(t) => Some(t.bounding_box()),
            Primitive::Plane(_) => None,
            Primitive::Mesh(m) => Some(m.bounding_box()),
            Primitive::Transform(t) => t.bounding_box(),
            Primitive::RevSurface(r) => Some(r.bounding_box()),
            Primitive::Group(children) => children
                .iter()
                .try_fold(Aabb::EMPTY, |acc, c| Some(Aabb::surrounding(&acc, &c.bounding_box()?))),
        }
    }

    /// Move nested groups' members up into `out`, leaving other primitives whole.
    pub fn flatten_into(self, out: &mut Vec<Primitive>) {
        match self {
            Primitive::Group(children) => {
                for child in children {
                    child.flatten_into(out);
                }
            }
            other => out.push(other),
        }
    }
}

impl From<Sphere> for Primitive {
    fn from(s: Sphere) -> Self {
        Primitive::Sphere(s)
    }
}

impl From<Triangle> for Primitive {
    fn from(t: Triangle) -> Self {
        Primitive::Triangle(t)
    }
}

impl From<Plane> for Primitive {
    fn from(p: Plane) -> Self {
        Primitive::Plane(p)
    }
}

impl From<TriangleMesh> for Primitive {
    fn from(m: TriangleMesh) -> Self {
        Primitive::Mesh(m)
    }
}

impl From<Transform> for Primitive {
    fn from(t: Transform) -> Self {
        Primitive::Transform(t)
    }
}

impl From<RevSurface> for Primitive {
    fn from(r: RevSurface) -> Self {
        Primitive::RevSurface(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Material;
    use lumen_math::Vec3;

    fn sphere(z: f32) -> Primitive {
        Sphere::new(Vec3::new(0.0, 0.0, z), 0.5, Material::default())
            .unwrap()
            .into()
    }

    #[test]
    fn test_group_reports_closest_member() {
        let group = Primitive::Group(vec![sphere(-10.0), sphere(-3.0), sphere(-6.0)]);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut hit = Hit::new();

        assert!(group.intersect(&ray, &mut hit, 0.001));
        assert!((hit.t - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_group_with_plane_is_unbounded() {
        let plane: Primitive = Plane::new(Vec3::Y, 0.0, Material::default()).unwrap().into();
        assert!(Primitive::Group(vec![sphere(0.0), sphere(-2.0)])
            .bounding_box()
            .is_some());
        assert!(Primitive::Group(vec![sphere(0.0), plane]).bounding_box().is_none());
    }

    #[test]
    fn test_flatten_nested_groups() {
        let nested = Primitive::Group(vec![
            sphere(0.0),
            Primitive::Group(vec![sphere(-1.0), Primitive::Group(vec![sphere(-2.0)])]),
        ]);
        let mut out = Vec::new();
        nested.flatten_into(&mut out);

        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|p| matches!(p, Primitive::Sphere(_))));
    }
}
