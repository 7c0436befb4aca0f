//! Image output and the direct-lighting preview.
//!
//! The preview shades the first diffuse hit against every light with a
//! shadow ray and follows mirror and glass chains, without any indirect
//! light. It is fast enough to frame a scene before committing to a long
//! photon mapping run.

use std::path::Path;
use std::time::Instant;

use crate::bucket::{generate_buckets, render_bucket, BucketResult};
use crate::error::SceneError;
use crate::material::{specular_scatter, SpecularScatter};
use crate::scene::Scene;
use crate::Hit;
use lumen_core::PreviewConfig;
use lumen_math::{Color, Ray};
use rand::RngCore;
use rayon::prelude::*;

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Clamp a value to [0, 1] range.
#[inline]
pub fn clamp_01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Convert a color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let r = (255.0 * clamp_01(linear_to_gamma(color.x))) as u8;
    let g = (255.0 * clamp_01(linear_to_gamma(color.y))) as u8;
    let b = (255.0 * clamp_01(linear_to_gamma(color.z))) as u8;
    [r, g, b, 255]
}

/// Linear radiance image, row-major from the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; (width * height) as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// Copy a rendered bucket into place.
    pub fn write_bucket(&mut self, result: &BucketResult) {
        let bucket = &result.bucket;
        for (k, color) in result.pixels.iter().enumerate() {
            let k = k as u32;
            self.set(bucket.x + k % bucket.width, bucket.y + k / bucket.width, *color);
        }
    }

    /// Convert to RGBA bytes (for display or saving).
    pub fn to_rgba(&self) -> Vec<u8> {
        self.to_rgba_with_exposure(1.0)
    }

    /// Like [`ImageBuffer::to_rgba`], scaling radiance by `exposure` first.
    pub fn to_rgba_with_exposure(&self, exposure: f32) -> Vec<u8> {
        let mut bytes = Vec::with_capacity((self.width * self.height * 4) as usize);
        for color in &self.pixels {
            bytes.extend_from_slice(&color_to_rgba(*color * exposure));
        }
        bytes
    }

    /// Write a gamma-corrected 8-bit PNG.
    pub fn save_png(&self, path: &Path, exposure: f32) -> image::ImageResult<()> {
        image::save_buffer(
            path,
            &self.to_rgba_with_exposure(exposure),
            self.width,
            self.height,
            image::ColorType::Rgba8,
        )
    }
}

/// Radiance seen along `ray`: direct light on diffuse surfaces plus
/// recursively traced specular paths.
pub fn ray_color(
    scene: &Scene,
    ray: &Ray,
    depth: u32,
    config: &PreviewConfig,
    rng: &mut dyn RngCore,
) -> Color {
    if depth == 0 {
        return Color::ZERO;
    }
    let tmin = config.tracer.min_time;
    let mut hit = Hit::new();
    if !scene.intersect(ray, &mut hit, tmin) {
        return scene.background();
    }
    let Some(material) = hit.material else {
        return scene.background();
    };

    let direction = ray.direction().normalize();
    let position = ray.at(hit.t);
    let normal = if hit.normal.dot(direction) > 0.0 {
        -hit.normal
    } else {
        hit.normal
    };

    let mut color = Color::ZERO;
    let diffuse_share = 1.0 - material.specular_ratio;
    if diffuse_share > 0.0 {
        for light in scene.lights() {
            let illumination = light.illumination(position, rng);
            if illumination.color == Color::ZERO || scene.occluded(position, &illumination, tmin) {
                continue;
            }
            color += material.shade(-direction, illumination.direction, normal, illumination.color);
        }
        color *= diffuse_share;
    }

    if material.is_specular() {
        let specular = match specular_scatter(direction, hit.normal, material.refractive_index) {
            SpecularScatter::Reflect { reflected } => {
                ray_color(scene, &Ray::new(position, reflected), depth - 1, config, rng)
            }
            SpecularScatter::Split {
                reflected,
                refracted,
                reflectance,
            } => {
                let r = ray_color(scene, &Ray::new(position, reflected), depth - 1, config, rng);
                let t = ray_color(scene, &Ray::new(position, refracted), depth - 1, config, rng);
                r * reflectance + t * (1.0 - reflectance)
            }
        };
        color += specular * material.specular_ratio;
    }
    color
}

/// Render a single pixel with multi-sampling.
pub fn render_pixel(
    scene: &Scene,
    x: u32,
    y: u32,
    config: &PreviewConfig,
    rng: &mut dyn RngCore,
) -> Color {
    let mut pixel_color = Color::ZERO;
    for _ in 0..config.samples_per_pixel {
        let ray = scene.camera().pixel_ray(x, y, rng);
        pixel_color += ray_color(scene, &ray, config.max_depth, config, rng);
    }
    pixel_color / config.samples_per_pixel as f32
}

/// Render the preview image, buckets in parallel from the center out.
pub fn render_direct(scene: &Scene, config: &PreviewConfig) -> Result<ImageBuffer, SceneError> {
    config.validate()?;
    let camera = scene.camera();
    let buckets = generate_buckets(camera.width(), camera.height(), config.bucket_size);

    log::info!(
        "Rendering preview in {} buckets using {} CPU cores...",
        buckets.len(),
        rayon::current_num_threads()
    );
    let start = Instant::now();

    let results: Vec<BucketResult> = buckets
        .par_iter()
        .map(|bucket| render_bucket(bucket, scene, config))
        .collect();

    let mut image = ImageBuffer::new(camera.width(), camera.height());
    for result in &results {
        image.write_bucket(result);
    }
    log::info!("Preview finished in {:.2?}", start.elapsed());
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Camera, Light, Material, Plane, Sphere};
    use lumen_math::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scene(floor: Material) -> Scene {
        let camera = Camera::new(Vec3::new(0.0, 5.0, 0.0), -Vec3::Y, Vec3::Z, 20, 12, 40.0).unwrap();
        Scene::new(
            vec![Plane::new(Vec3::Y, 0.0, floor).unwrap().into()],
            vec![Light::point(Vec3::new(0.0, 4.0, 0.0), Color::ONE)],
            camera,
        )
        .with_background(Color::new(0.1, 0.2, 0.3))
    }

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 0.0001);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_exposure_scales_before_gamma() {
        let mut image = ImageBuffer::new(1, 1);
        image.set(0, 0, Color::splat(0.0625));

        assert_eq!(image.to_rgba()[0], 63);
        assert_eq!(image.to_rgba_with_exposure(4.0)[0], 127);
    }

    #[test]
    fn test_directly_lit_floor() {
        let scene = scene(Material::diffuse(Color::splat(0.5)));
        let mut rng = StdRng::seed_from_u64(42);
        let down = Ray::new(Vec3::new(0.0, 2.0, 0.0), -Vec3::Y);

        let color = ray_color(&scene, &down, 5, &PreviewConfig::default(), &mut rng);
        assert!((color - Color::splat(0.5)).length() < 1e-4);

        let up = Ray::new(Vec3::new(0.0, 2.0, 0.0), Vec3::Y);
        let color = ray_color(&scene, &up, 5, &PreviewConfig::default(), &mut rng);
        assert_eq!(color, scene.background());
    }

    #[test]
    fn test_shadowed_point_is_dark() {
        let camera = Camera::new(Vec3::new(0.0, 5.0, 0.0), -Vec3::Y, Vec3::Z, 8, 8, 40.0).unwrap();
        let scene = Scene::new(
            vec![
                Plane::new(Vec3::Y, 0.0, Material::diffuse(Color::ONE)).unwrap().into(),
                Sphere::new(Vec3::new(2.0, 2.0, 0.0), 0.5, Material::default()).unwrap().into(),
            ],
            vec![Light::point(Vec3::new(2.0, 4.0, 0.0), Color::ONE)],
            camera,
        );
        let mut rng = StdRng::seed_from_u64(42);
        let ray = Ray::new(Vec3::new(2.0, 1.0, 0.0), -Vec3::Y);

        let color = ray_color(&scene, &ray, 5, &PreviewConfig::default(), &mut rng);
        assert_eq!(color, Color::ZERO);
    }

    #[test]
    fn test_mirror_floor_shows_background() {
        let scene = scene(Material::mirror());
        let mut rng = StdRng::seed_from_u64(42);
        let ray = Ray::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.3, -1.0, 0.0));

        let color = ray_color(&scene, &ray, 5, &PreviewConfig::default(), &mut rng);
        assert!((color - scene.background()).length() < 1e-6);
    }

    #[test]
    fn test_render_direct_fills_every_pixel() {
        let scene = scene(Material::diffuse(Color::splat(0.8)));
        let config = PreviewConfig {
            bucket_size: 7,
            samples_per_pixel: 2,
            ..Default::default()
        };

        let image = render_direct(&scene, &config).unwrap();
        assert_eq!(image.pixels.len(), 20 * 12);
        // Looking straight down, every pixel sees the lit floor
        assert!(image.pixels.iter().all(|p| p.x > 0.0));
        assert_eq!(render_direct(&scene, &config).unwrap(), image);
    }
}
