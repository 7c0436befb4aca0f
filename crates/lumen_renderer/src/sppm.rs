//! Stochastic progressive photon mapping.
//!
//! Pass 0 traces camera rays through specular chains and stores where they
//! land as visible points, grouped per pixel into a [`ViewPoint`]. Every
//! later pass shoots a fresh batch of photons, builds a [`PhotonTree`] over
//! them and lets each view point gather within its radius. A view point
//! keeps a fraction `alpha` of what it gathers, so its radius shrinks and
//! its estimate converges as passes accumulate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::SceneError;
use crate::photon::{trace_into, trace_ray, Photon};
use crate::photon_tree::PhotonTree;
use crate::renderer::ImageBuffer;
use crate::sampling::stream_rng;
use crate::scene::Scene;
use crate::Material;
use lumen_core::SppmConfig;
use lumen_math::{Color, Vec3};
use rayon::prelude::*;

/// A camera path's landing point on a diffuse surface.
#[derive(Debug, Clone, Copy)]
pub struct VisiblePoint<'a> {
    pub position: Vec3,
    /// Normal facing the viewer's side
    pub normal: Vec3,
    /// Unit direction back along the camera path
    pub to_viewer: Vec3,
    /// Share of the pixel this point stands for
    pub throughput: Color,
    pub material: &'a Material,
}

/// Persistent per-pixel estimator state.
#[derive(Debug, Clone)]
pub struct ViewPoint<'a> {
    pub points: Vec<VisiblePoint<'a>>,
    /// Accumulated (radius-scaled) flux
    pub power: Color,
    /// Running photon count `N`
    pub count: f32,
    pub radius: f32,
    alpha: f32,
}

impl<'a> ViewPoint<'a> {
    pub fn new(points: Vec<VisiblePoint<'a>>, count: f32, radius: f32, alpha: f32) -> Self {
        Self {
            points,
            power: Color::ZERO,
            count,
            radius,
            alpha,
        }
    }

    /// Gather photons around every visible point at the current radius.
    ///
    /// Returns the photon count `M` and the shaded power they contribute.
    pub fn gather(&self, tree: &PhotonTree) -> (usize, Color) {
        let mut found = 0;
        let mut power = Color::ZERO;
        for point in &self.points {
            tree.for_each_within(point.position, self.radius, |photon| {
                found += 1;
                power += point.throughput
                    * point.material.shade(point.to_viewer, photon.direction, point.normal, photon.power);
            });
        }
        (found, power)
    }

    /// Fold one pass's gather into the estimate.
    pub fn update(&mut self, found: usize, added: Color) {
        let m = found as f32;
        let count = self.count + self.alpha * m;
        if m + self.count > 0.0 {
            let ratio = count / (self.count + m);
            self.radius *= ratio.sqrt();
            self.power = (self.power + added) * ratio;
        } else {
            self.power += added;
        }
        self.count = count;
    }

    /// Current radiance estimate `power / (pi R^2 N)`.
    pub fn radiance(&self) -> Color {
        let area = std::f32::consts::PI * self.radius * self.radius;
        if self.count > 0.0 && area > 0.0 {
            self.power / (area * self.count)
        } else {
            Color::ZERO
        }
    }
}

/// What one forward pass did, logged at info level.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PassStats {
    pub pass: u32,
    pub photons_emitted: u64,
    pub photons_stored: usize,
    pub emitted_power: Color,
    /// Power of deposits on the first surface each emitted ray reached
    pub first_bounce_power: Color,
    pub mean_radius: f32,
}

/// Output of one forward work item.
#[derive(Default)]
struct ChunkOutput {
    photons: Vec<Photon>,
    emitted: u64,
    emitted_power: Color,
    first_bounce_power: Color,
}

pub struct SppmRenderer<'s> {
    scene: &'s Scene,
    config: SppmConfig,
    view_points: Vec<ViewPoint<'s>>,
    passes_done: u32,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'s> SppmRenderer<'s> {
    pub fn new(scene: &'s Scene, config: SppmConfig) -> Result<Self, SceneError> {
        config.validate()?;
        if scene.lights().is_empty() {
            return Err(SceneError::NoLights);
        }
        Ok(Self {
            scene,
            config,
            view_points: Vec::new(),
            passes_done: 0,
            cancel: None,
        })
    }

    /// Abort between photon chunks and passes once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &SppmConfig {
        &self.config
    }

    pub fn view_points(&self) -> &[ViewPoint<'s>] {
        &self.view_points
    }

    pub fn passes_done(&self) -> u32 {
        self.passes_done
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Pass 0: trace camera rays and create one view point per pixel.
    pub fn initialize(&mut self) {
        let start = Instant::now();
        let scene = self.scene;
        let config = &self.config;
        let camera = scene.camera();
        let width = camera.width();
        let pixel_count = width as usize * camera.height() as usize;
        let weight = Color::splat(1.0 / config.samples_per_pixel as f32);

        self.view_points = (0..pixel_count)
            .into_par_iter()
            .map(|index| {
                let mut rng = stream_rng(config.seed, 0, 0, index as u64);
                let (i, j) = ((index % width as usize) as u32, (index / width as usize) as u32);
                let mut points = Vec::new();
                for _ in 0..config.samples_per_pixel {
                    let ray = camera.pixel_ray(i, j, &mut rng);
                    let deposits =
                        trace_ray(scene, ray, weight, config.view_depth, false, &config.tracer, &mut rng);
                    points.extend(deposits.into_iter().map(|d| VisiblePoint {
                        position: d.photon.position,
                        normal: d.normal,
                        to_viewer: d.photon.direction,
                        throughput: d.photon.power,
                        material: d.material,
                    }));
                }
                ViewPoint::new(points, config.initial_count, config.initial_radius, config.alpha)
            })
            .collect();

        let visible: usize = self.view_points.iter().map(|vp| vp.points.len()).sum();
        log::info!(
            "Camera pass: {} pixels, {} visible points in {:.2?}",
            pixel_count,
            visible,
            start.elapsed()
        );
    }

    /// Shoot this pass's photons from every light.
    ///
    /// Work is split into `(light, chunk)` items, each with its own seeded
    /// generator, so the result does not depend on thread scheduling.
    fn forward_pass(&self, pass: u32) -> Option<ChunkOutput> {
        let scene = self.scene;
        let config = &self.config;
        let chunk_size = config.photon_chunk_size;
        let chunks_per_light = config.photons_per_light.div_ceil(chunk_size);

        let jobs: Vec<(usize, u32)> = (0..scene.lights().len())
            .flat_map(|light| (0..chunks_per_light).map(move |chunk| (light, chunk)))
            .collect();

        let outputs: Vec<Option<ChunkOutput>> = jobs
            .par_iter()
            .map(|&(light_index, chunk)| {
                if self.cancelled() {
                    return None;
                }
                let light = &scene.lights()[light_index];
                let mut rng = stream_rng(config.seed, pass as u64, light_index as u64 + 1, chunk as u64);
                let count = chunk_size.min(config.photons_per_light - chunk * chunk_size);

                let mut out = ChunkOutput::default();
                let mut deposits = Vec::new();
                for _ in 0..count {
                    let (ray, power) = light.generate(scene.bounds(), &mut rng);
                    out.emitted += 1;
                    out.emitted_power += power;
                    out.photons.push(Photon {
                        position: ray.origin(),
                        direction: -ray.direction().normalize(),
                        power: power * config.light_origin_gain,
                    });

                    deposits.clear();
                    trace_into(scene, ray, power, config.photon_depth, true, &config.tracer, &mut rng, &mut deposits);
                    for d in &deposits {
                        if d.bounce == 1 {
                            out.first_bounce_power += d.photon.power;
                        }
                        out.photons.push(d.photon);
                    }
                }
                Some(out)
            })
            .collect();

        let mut total = ChunkOutput::default();
        for output in outputs {
            let output = output?;
            total.photons.extend(output.photons);
            total.emitted += output.emitted;
            total.emitted_power += output.emitted_power;
            total.first_bounce_power += output.first_bounce_power;
        }
        Some(total)
    }

    /// Run one photon pass and fold it into every view point.
    ///
    /// Returns `None` (leaving all state untouched) if cancelled midway.
    pub fn run_pass(&mut self) -> Option<PassStats> {
        if self.view_points.is_empty() {
            self.initialize();
        }
        if self.cancelled() {
            return None;
        }

        let start = Instant::now();
        let pass = self.passes_done + 1;
        let forward = self.forward_pass(pass)?;
        let photons_stored = forward.photons.len();
        let tree = PhotonTree::new(forward.photons);

        self.view_points.par_iter_mut().for_each(|vp| {
            let (found, added) = vp.gather(&tree);
            vp.update(found, added);
        });
        self.passes_done = pass;

        let mean_radius = self.view_points.iter().map(|vp| vp.radius).sum::<f32>()
            / self.view_points.len().max(1) as f32;
        let stats = PassStats {
            pass,
            photons_emitted: forward.emitted,
            photons_stored,
            emitted_power: forward.emitted_power,
            first_bounce_power: forward.first_bounce_power,
            mean_radius,
        };
        log::info!(
            "Pass {}: {} photons emitted, {} stored, mean radius {:.4} ({:.2?})",
            stats.pass,
            stats.photons_emitted,
            stats.photons_stored,
            stats.mean_radius,
            start.elapsed()
        );
        log::debug!(
            "Pass {} power: emitted {:?}, first bounce {:?}",
            stats.pass,
            stats.emitted_power,
            stats.first_bounce_power
        );
        Some(stats)
    }

    /// Radiance of every pixel from the last committed pass.
    pub fn image(&self) -> ImageBuffer {
        let camera = self.scene.camera();
        let mut image = ImageBuffer::new(camera.width(), camera.height());
        for (pixel, vp) in image.pixels.iter_mut().zip(&self.view_points) {
            *pixel = vp.radiance();
        }
        image
    }

    /// Run the configured number of passes, handing each image to `on_pass`.
    ///
    /// Stops early when cancelled and returns the last committed image.
    pub fn render<F: FnMut(&PassStats, &ImageBuffer)>(&mut self, mut on_pass: F) -> ImageBuffer {
        for _ in 0..self.config.passes {
            match self.run_pass() {
                Some(stats) => on_pass(&stats, &self.image()),
                None => {
                    log::warn!("Render cancelled after {} passes", self.passes_done);
                    break;
                }
            }
        }
        self.image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Camera, Light, Plane, Sphere};

    /// Diffuse floor, a mirror ball and a point light, seen from above.
    fn scene() -> Scene {
        let camera = Camera::new(Vec3::new(0.0, 6.0, 0.0), -Vec3::Y, Vec3::Z, 8, 8, 50.0).unwrap();
        Scene::new(
            vec![
                Plane::new(Vec3::Y, 0.0, Material::diffuse(Color::splat(0.8))).unwrap().into(),
                Sphere::new(Vec3::new(0.0, 1.0, 0.0), 0.7, Material::mirror()).unwrap().into(),
            ],
            vec![Light::point(Vec3::new(1.0, 4.0, 1.0), Color::ONE)],
            camera,
        )
    }

    fn config() -> SppmConfig {
        SppmConfig {
            passes: 3,
            photons_per_light: 3000,
            photon_chunk_size: 1000,
            samples_per_pixel: 2,
            seed: 42,
            ..Default::default()
        }
    }

    #[test]
    fn test_update_rule() {
        let material = Material::default();
        let point = VisiblePoint {
            position: Vec3::ZERO,
            normal: Vec3::Y,
            to_viewer: Vec3::Y,
            throughput: Color::ONE,
            material: &material,
        };
        let mut vp = ViewPoint::new(vec![point], 50.0, 0.5, 0.7);

        vp.update(10, Color::splat(2.0));
        assert!((vp.count - 57.0).abs() < 1e-5);
        assert!((vp.radius - 0.5 * (57.0f32 / 60.0).sqrt()).abs() < 1e-6);
        assert!((vp.power.x - 2.0 * 57.0 / 60.0).abs() < 1e-5);

        // Nothing gathered: radius and count stay put
        let radius = vp.radius;
        vp.update(0, Color::ZERO);
        assert_eq!(vp.radius, radius);
        assert!((vp.count - 57.0).abs() < 1e-5);

        let expected = vp.power / (std::f32::consts::PI * radius * radius * vp.count);
        assert!((vp.radiance() - expected).length() < 1e-6);
    }

    #[test]
    fn test_radius_never_grows() {
        let scene = scene();
        let mut renderer = SppmRenderer::new(&scene, config()).unwrap();
        renderer.initialize();
        assert_eq!(renderer.view_points().len(), 64);

        let mut previous: Vec<f32> = renderer.view_points().iter().map(|vp| vp.radius).collect();
        for _ in 0..3 {
            renderer.run_pass().unwrap();
            for (vp, before) in renderer.view_points().iter().zip(&previous) {
                assert!(vp.radius <= *before);
            }
            previous = renderer.view_points().iter().map(|vp| vp.radius).collect();
        }
        // Somewhere photons were gathered
        assert!(previous.iter().any(|&r| r < 0.5));
    }

    #[test]
    fn test_first_bounce_energy_bounded() {
        let scene = scene();
        let mut renderer = SppmRenderer::new(&scene, config()).unwrap();
        let stats = renderer.run_pass().unwrap();

        assert_eq!(stats.photons_emitted, 3000);
        assert!((stats.emitted_power.x - 3000.0).abs() < 1e-2);
        assert!(stats.first_bounce_power.x <= stats.emitted_power.x);
        assert!(stats.first_bounce_power.x > 0.0);
    }

    #[test]
    fn test_render_is_deterministic() {
        let scene = scene();
        let mut a = SppmRenderer::new(&scene, config()).unwrap();
        let mut b = SppmRenderer::new(&scene, config()).unwrap();

        let mut delivered = 0;
        let image_a = a.render(|_, _| delivered += 1);
        let image_b = b.render(|_, _| {});

        assert_eq!(delivered, 3);
        assert_eq!(image_a.pixels, image_b.pixels);
        assert!(image_a.pixels.iter().any(|p| p.x > 0.0));
    }

    #[test]
    fn test_cancelled_pass_changes_nothing() {
        let scene = scene();
        let flag = Arc::new(AtomicBool::new(false));
        let mut renderer = SppmRenderer::new(&scene, config())
            .unwrap()
            .with_cancel_flag(flag.clone());
        renderer.run_pass().unwrap();
        let before = renderer.image();

        flag.store(true, Ordering::Relaxed);
        assert!(renderer.run_pass().is_none());
        assert_eq!(renderer.passes_done(), 1);
        assert_eq!(renderer.image().pixels, before.pixels);
    }

    #[test]
    fn test_scene_without_lights_rejected() {
        let camera = Camera::new(Vec3::ZERO, -Vec3::Z, Vec3::Y, 4, 4, 40.0).unwrap();
        let scene = Scene::new(Vec::new(), Vec::new(), camera);
        assert!(matches!(
            SppmRenderer::new(&scene, SppmConfig::default()),
            Err(SceneError::NoLights)
        ));
    }

    #[test]
    fn test_light_origin_photon_points_back_to_source() {
        let camera = Camera::new(Vec3::new(0.0, 5.0, 0.0), -Vec3::Y, Vec3::Z, 4, 4, 40.0).unwrap();
        let scene = Scene::new(
            vec![Plane::new(Vec3::Y, 0.0, Material::default()).unwrap().into()],
            vec![Light::directional(-Vec3::Y, Color::ONE).unwrap()],
            camera,
        );
        let config = SppmConfig {
            photons_per_light: 200,
            photon_chunk_size: 100,
            seed: 42,
            ..Default::default()
        };
        let renderer = SppmRenderer::new(&scene, config).unwrap();

        let output = renderer.forward_pass(1).unwrap();
        let (origins, floor): (Vec<Photon>, Vec<Photon>) =
            output.photons.iter().copied().partition(|p| p.position.y > 0.5);

        assert_eq!(origins.len(), 200);
        assert_eq!(floor.len(), 200);
        // Both kinds store the direction back toward the light
        for photon in origins.iter().chain(&floor) {
            assert!((photon.direction - Vec3::Y).length() < 1e-6, "{:?}", photon);
        }
    }
}
