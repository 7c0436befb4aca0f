//! Photon records and the recursive photon tracer.
//!
//! The same tracer serves both directions of SPPM: photons shot from the
//! lights (with diffuse bounces) and importance shot from the camera
//! (without), where each deposit becomes a visible point.

use crate::material::{specular_scatter, SpecularScatter};
use crate::sampling::{gen_f32, random_in_hemisphere};
use crate::scene::Scene;
use crate::{Hit, Material};
use lumen_core::TracerConfig;
use lumen_math::{Color, Ray, Vec3};
use rand::RngCore;

/// Power arriving at a point from one direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Photon {
    pub position: Vec3,
    /// Unit direction pointing back toward where the photon came from
    pub direction: Vec3,
    pub power: Color,
}

/// A photon stored on a surface by the tracer.
#[derive(Debug, Clone, Copy)]
pub struct Deposit<'a> {
    pub photon: Photon,
    /// Surface normal, facing the side the photon arrived from
    pub normal: Vec3,
    pub material: &'a Material,
    /// 1 for the first surface the emitted ray reaches
    pub bounce: u32,
}

/// Trace `ray` carrying `power` and return every deposit it leaves.
///
/// Recursion stops after `depth` surface interactions, on a miss, or once
/// both the diffuse and the specular share fall below `config.min_power`.
pub fn trace_ray<'a>(
    scene: &'a Scene,
    ray: Ray,
    power: Color,
    depth: u32,
    sample_diffuse: bool,
    config: &TracerConfig,
    rng: &mut dyn RngCore,
) -> Vec<Deposit<'a>> {
    let mut deposits = Vec::new();
    trace_into(scene, ray, power, depth, sample_diffuse, config, rng, &mut deposits);
    deposits
}

/// [`trace_ray`] appending to a caller-owned buffer.
#[allow(clippy::too_many_arguments)]
pub fn trace_into<'a>(
    scene: &'a Scene,
    ray: Ray,
    power: Color,
    depth: u32,
    sample_diffuse: bool,
    config: &TracerConfig,
    rng: &mut dyn RngCore,
    out: &mut Vec<Deposit<'a>>,
) {
    let tracer = Tracer {
        scene,
        config,
        sample_diffuse,
    };
    tracer.trace(ray, power, depth, 1, rng, out);
}

struct Tracer<'a, 'c> {
    scene: &'a Scene,
    config: &'c TracerConfig,
    sample_diffuse: bool,
}

impl<'a> Tracer<'a, '_> {
    fn trace(
        &self,
        ray: Ray,
        power: Color,
        depth: u32,
        bounce: u32,
        rng: &mut dyn RngCore,
        out: &mut Vec<Deposit<'a>>,
    ) {
        if depth == 0 {
            return;
        }
        let mut hit = Hit::new();
        if !self.scene.intersect(&ray, &mut hit, self.config.min_time) {
            return;
        }
        let Some(material) = hit.material else {
            return;
        };

        let direction = ray.direction().normalize();
        let position = ray.at(hit.t);
        let facing = if hit.normal.dot(direction) > 0.0 {
            -hit.normal
        } else {
            hit.normal
        };

        let specular = power * material.specular_ratio;
        let diffuse = power - specular;

        if diffuse.length() > self.config.min_power {
            out.push(Deposit {
                photon: Photon {
                    position,
                    direction: -direction,
                    power: diffuse,
                },
                normal: facing,
                material,
                bounce,
            });

            if self.sample_diffuse && gen_f32(rng) < self.config.diffuse_bounce_probability {
                let bounced = Ray::new(position, random_in_hemisphere(facing, rng));
                self.trace(bounced, diffuse, depth - 1, bounce + 1, rng, out);
            }
        }

        if specular.length() > self.config.min_power {
            match specular_scatter(direction, hit.normal, material.refractive_index) {
                SpecularScatter::Reflect { reflected } => {
                    self.trace(Ray::new(position, reflected), specular, depth - 1, bounce + 1, rng, out);
                }
                SpecularScatter::Split {
                    reflected,
                    refracted,
                    reflectance,
                } => {
                    let r = Ray::new(position, reflected);
                    self.trace(r, specular * reflectance, depth - 1, bounce + 1, rng, out);
                    let t = Ray::new(position, refracted);
                    self.trace(t, specular * (1.0 - reflectance), depth - 1, bounce + 1, rng, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Camera, Light, Plane, Primitive, Sphere};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn camera() -> Camera {
        Camera::new(Vec3::new(0.0, 5.0, 0.0), -Vec3::Y, Vec3::Z, 16, 16, 40.0).unwrap()
    }

    fn scene(primitives: Vec<Primitive>) -> Scene {
        Scene::new(primitives, vec![Light::point(Vec3::new(0.0, 4.0, 0.0), Color::ONE)], camera())
    }

    #[test]
    fn test_diffuse_floor_deposit() {
        let scene = scene(vec![Plane::new(Vec3::Y, 0.0, Material::default()).unwrap().into()]);
        let mut rng = StdRng::seed_from_u64(42);
        let ray = Ray::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, -2.0, 0.0));

        let deposits = trace_ray(&scene, ray, Color::ONE, 5, false, &TracerConfig::default(), &mut rng);

        assert_eq!(deposits.len(), 1);
        let d = &deposits[0];
        assert!(d.photon.position.length() < 1e-5);
        assert_eq!(d.photon.direction, Vec3::Y);
        assert_eq!(d.photon.power, Color::ONE);
        assert_eq!(d.normal, Vec3::Y);
        assert_eq!(d.bounce, 1);
    }

    #[test]
    fn test_mirror_sphere_reflection() {
        let light_dir = Vec3::new(0.3, -1.0, 0.1).normalize();
        let SpecularScatter::Reflect { reflected } = specular_scatter(light_dir, Vec3::Y, None) else {
            panic!("mirror must reflect");
        };
        let analytic = light_dir - 2.0 * light_dir.dot(Vec3::Y) * Vec3::Y;
        assert!((reflected - analytic).length() < 1e-6);

        // Unit mirror sphere at the origin under a diffuse ceiling at y = 3
        let scene = scene(vec![
            Sphere::new(Vec3::ZERO, 1.0, Material::mirror()).unwrap().into(),
            Plane::new(Vec3::Y, 3.0, Material::default()).unwrap().into(),
        ]);
        let mut rng = StdRng::seed_from_u64(42);
        let down = Ray::new(Vec3::new(0.0, 2.0, 0.0), -Vec3::Y);

        // Straight down onto the top, straight back up into the ceiling
        let deposits = trace_ray(&scene, down, Color::ONE, 5, false, &TracerConfig::default(), &mut rng);
        assert_eq!(deposits.len(), 1);
        assert_eq!(deposits[0].bounce, 2);
        assert!((deposits[0].photon.position.y - 3.0).abs() < 1e-4);
        assert!((deposits[0].photon.direction + Vec3::Y).length() < 1e-5);
        assert_eq!(deposits[0].normal, -Vec3::Y);
    }

    #[test]
    fn test_glass_leaves_no_deposits() {
        let scene = scene(vec![Sphere::new(Vec3::ZERO, 1.0, Material::glass(1.5)).unwrap().into()]);
        let mut rng = StdRng::seed_from_u64(42);
        let config = TracerConfig {
            min_power: 0.0,
            ..Default::default()
        };
        let ray = Ray::new(Vec3::new(0.2, 3.0, 0.0), -Vec3::Y);

        // Glass never deposits; the rays escape without touching anything diffuse
        let deposits = trace_ray(&scene, ray, Color::ONE, 8, false, &config, &mut rng);
        assert!(deposits.is_empty());
    }

    #[test]
    fn test_first_bounce_energy_below_emitted() {
        let scene = scene(vec![
            Plane::new(Vec3::Y, 0.0, Material::diffuse(Color::splat(0.7))).unwrap().into(),
            Sphere::new(Vec3::new(0.0, 1.0, 0.0), 0.8, Material {
                specular_ratio: 0.4,
                ..Material::default()
            })
            .unwrap()
            .into(),
        ]);
        let light = &scene.lights()[0];
        let mut rng = StdRng::seed_from_u64(42);
        let config = TracerConfig::default();

        let mut emitted = Color::ZERO;
        let mut first = Color::ZERO;
        for _ in 0..2000 {
            let (ray, power) = light.generate(scene.bounds(), &mut rng);
            emitted += power;
            for d in trace_ray(&scene, ray, power, 10, true, &config, &mut rng) {
                if d.bounce == 1 {
                    first += d.photon.power;
                }
            }
        }
        assert!(first.x <= emitted.x && first.y <= emitted.y && first.z <= emitted.z);
        assert!(first.x > 0.0);
    }

    #[test]
    fn test_depth_zero_traces_nothing() {
        let scene = scene(vec![Plane::new(Vec3::Y, 0.0, Material::default()).unwrap().into()]);
        let mut rng = StdRng::seed_from_u64(42);
        let ray = Ray::new(Vec3::new(0.0, 2.0, 0.0), -Vec3::Y);

        assert!(trace_ray(&scene, ray, Color::ONE, 0, true, &TracerConfig::default(), &mut rng).is_empty());
    }
}
