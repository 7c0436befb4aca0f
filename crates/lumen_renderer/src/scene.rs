//! Renderable scene: geometry in a BVH plus lights and a camera.

use std::path::Path;

use crate::bvh::ObjectBvh;
use crate::camera::Camera;
use crate::curve::Curve;
use crate::error::SceneError;
use crate::light::{Illumination, Light};
use crate::mesh::TriangleMesh;
use crate::plane::Plane;
use crate::primitive::Primitive;
use crate::revsurface::RevSurface;
use crate::sphere::Sphere;
use crate::transform::Transform;
use crate::triangle::Triangle;
use crate::{Hit, Material};
use lumen_core::{ObjectDescription, SceneDescription};
use lumen_math::{Aabb, Color, Ray, Vec3};

pub struct Scene {
    bvh: ObjectBvh,
    lights: Vec<Light>,
    camera: Camera,
    background: Color,
    bounds: Aabb,
}

impl Scene {
    pub fn new(primitives: Vec<Primitive>, lights: Vec<Light>, camera: Camera) -> Self {
        let bvh = ObjectBvh::new(primitives);
        // Planes alone have no extent; fall back to a box around the eye
        let bounds = bvh.bounding_box().unwrap_or_else(|| {
            Aabb::from_points(camera.center() - Vec3::ONE, camera.center() + Vec3::ONE)
        });
        Self {
            bvh,
            lights,
            camera,
            background: Color::ZERO,
            bounds,
        }
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    /// Build every object of a description. Relative mesh paths resolve
    /// against `base_dir`.
    pub fn from_description(desc: &SceneDescription, base_dir: &Path) -> Result<Self, SceneError> {
        let camera = Camera::from_description(&desc.camera)?;
        let lights = desc
            .lights
            .iter()
            .map(Light::from_description)
            .collect::<Result<Vec<_>, _>>()?;
        let materials: Vec<Material> = desc.materials.iter().map(Material::from).collect();

        let builder = ObjectBuilder {
            materials: &materials,
            base_dir,
        };
        let primitives = desc
            .objects
            .iter()
            .map(|object| builder.build(object))
            .collect::<Result<Vec<_>, _>>()?;

        let scene = Self::new(primitives, lights, camera)
            .with_background(Color::from_array(desc.background));
        log::info!(
            "Built scene: {} primitives, {} lights, {} materials",
            scene.bvh.primitives().len(),
            scene.lights.len(),
            materials.len()
        );
        Ok(scene)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn background(&self) -> Color {
        self.background
    }

    /// Bounds of the bounded geometry (see [`Scene::new`] for the fallback).
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn bvh(&self) -> &ObjectBvh {
        &self.bvh
    }

    /// Closest hit in `(tmin, hit.t)`.
    pub fn intersect<'a>(&'a self, ray: &Ray, hit: &mut Hit<'a>, tmin: f32) -> bool {
        self.bvh.intersect(ray, hit, tmin)
    }

    /// True when something blocks `point` from the sampled light.
    pub fn occluded(&self, point: Vec3, light: &Illumination, tmin: f32) -> bool {
        let ray = Ray::new(point, light.direction);
        let mut hit = Hit::new();
        self.intersect(&ray, &mut hit, tmin) && hit.t < light.distance - tmin
    }
}

struct ObjectBuilder<'m> {
    materials: &'m [Material],
    base_dir: &'m Path,
}

impl ObjectBuilder<'_> {
    fn material(&self, index: usize) -> Result<Material, SceneError> {
        self.materials
            .get(index)
            .copied()
            .ok_or(SceneError::MissingMaterial {
                index,
                count: self.materials.len(),
            })
    }

    fn build(&self, desc: &ObjectDescription) -> Result<Primitive, SceneError> {
        let primitive = match desc {
            ObjectDescription::Sphere {
                center,
                radius,
                material,
            } => Sphere::new(Vec3::from_array(*center), *radius, self.material(*material)?)?.into(),
            ObjectDescription::Plane {
                normal,
                offset,
                material,
            } => Plane::new(Vec3::from_array(*normal), *offset, self.material(*material)?)?.into(),
            ObjectDescription::Triangle { vertices, material } => {
                let [a, b, c] = vertices.map(Vec3::from_array);
                Triangle::new(a, b, c, self.material(*material)?).into()
            }
            ObjectDescription::Mesh { path, material } => {
                let material = self.material(*material)?;
                let path = if path.is_relative() {
                    self.base_dir.join(path)
                } else {
                    path.clone()
                };
                let mesh = lumen_core::load_obj(&path)?;
                TriangleMesh::from_mesh(&mesh, material)?.into()
            }
            ObjectDescription::RevSurface { profile, material } => {
                let curve = Curve::from_description(profile)?;
                RevSurface::new(curve, self.material(*material)?)?.into()
            }
            ObjectDescription::Group { objects } => Primitive::Group(
                objects
                    .iter()
                    .map(|object| self.build(object))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            ObjectDescription::Transform { transform, object } => {
                Transform::new(transform.to_matrix(), self.build(object)?)?.into()
            }
        };
        Ok(primitive)
    }
}
