//! Camera for ray generation.

use crate::error::SceneError;
use crate::sampling::{random_in_unit_disk, sample_square};
use lumen_core::CameraDescription;
use lumen_math::{Ray, Vec2, Vec3};
use rand::RngCore;

/// Perspective camera with an optional thin lens.
///
/// Pixel coordinates are continuous: `(0, 0)` is the top-left corner of the
/// image and `(width, height)` the bottom-right one.
#[derive(Debug, Clone)]
pub struct Camera {
    width: u32,
    height: u32,

    center: Vec3,
    // Orthonormal basis; `forward` is the viewing direction
    forward: Vec3,
    right: Vec3,
    up: Vec3,

    /// Distance from the eye to the image plane, in pixels
    focal: f32,

    aperture: f32, // Lens radius; zero is a pinhole
    focus_distance: f32,
}

impl Camera {
    /// Create a pinhole camera. `fov` is the vertical field of view in degrees.
    pub fn new(
        center: Vec3,
        direction: Vec3,
        up: Vec3,
        width: u32,
        height: u32,
        fov: f32,
    ) -> Result<Self, SceneError> {
        if width == 0 || height == 0 {
            return Err(SceneError::Camera("image size must be non-zero"));
        }
        if !(fov > 0.0 && fov < 180.0) {
            return Err(SceneError::Camera("field of view must be between 0 and 180 degrees"));
        }
        let forward = direction.normalize_or_zero();
        let right = forward.cross(up).normalize_or_zero();
        if right == Vec3::ZERO {
            return Err(SceneError::Camera("direction and up must be non-zero and not parallel"));
        }

        Ok(Self {
            width,
            height,
            center,
            forward,
            right,
            up: right.cross(forward),
            focal: 0.5 * height as f32 / (0.5 * fov.to_radians()).tan(),
            aperture: 0.0,
            focus_distance: 1.0,
        })
    }

    /// Set lens settings.
    pub fn with_lens(mut self, aperture: f32, focus_distance: f32) -> Result<Self, SceneError> {
        if aperture < 0.0 || !(focus_distance > 0.0) {
            return Err(SceneError::Camera(
                "aperture must be non-negative and focus distance positive",
            ));
        }
        self.aperture = aperture;
        self.focus_distance = focus_distance;
        Ok(self)
    }

    pub fn from_description(desc: &CameraDescription) -> Result<Self, SceneError> {
        Self::new(
            Vec3::from_array(desc.center),
            Vec3::from_array(desc.direction),
            Vec3::from_array(desc.up),
            desc.width,
            desc.height,
            desc.fov,
        )?
        .with_lens(desc.aperture, desc.focus_distance)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Ray through the continuous image position `pixel`; unit direction.
    pub fn generate_ray(&self, pixel: Vec2, rng: &mut dyn RngCore) -> Ray {
        let x = (pixel.x - 0.5 * self.width as f32) / self.focal;
        let y = (0.5 * self.height as f32 - pixel.y) / self.focal;
        let direction = self.forward + self.right * x + self.up * y;

        if self.aperture <= 0.0 {
            return Ray::new(self.center, direction.normalize());
        }

        // Every lens sample converges on the plane of focus
        let focus_point = self.center + direction * self.focus_distance;
        let lens = random_in_unit_disk(rng) * self.aperture;
        let origin = self.center + self.right * lens.x + self.up * lens.y;
        Ray::new(origin, (focus_point - origin).normalize())
    }

    /// Jittered ray through pixel `(i, j)`.
    pub fn pixel_ray(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Ray {
        let offset = sample_square(rng);
        let pixel = Vec2::new(i as f32 + 0.5 + offset.x, j as f32 + 0.5 + offset.y);
        self.generate_ray(pixel, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn camera() -> Camera {
        Camera::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y, 200, 100, 90.0).unwrap()
    }

    #[test]
    fn test_center_ray_looks_forward() {
        let mut rng = StdRng::seed_from_u64(42);
        let ray = camera().generate_ray(Vec2::new(100.0, 50.0), &mut rng);

        assert!((ray.direction() - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn test_top_left_corner_looks_up_and_left() {
        let mut rng = StdRng::seed_from_u64(42);
        let ray = camera().generate_ray(Vec2::ZERO, &mut rng);
        let d = ray.direction();

        assert!(d.x < 0.0 && d.y > 0.0 && d.z < 0.0);
        // 90 degree vertical FOV: the top edge is at 45 degrees
        let top = camera().generate_ray(Vec2::new(100.0, 0.0), &mut rng).direction();
        assert!((top.y + top.z).abs() < 1e-5);
    }

    #[test]
    fn test_thin_lens_rays_meet_on_focus_plane() {
        let cam = camera().with_lens(0.2, 4.0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let pixel = Vec2::new(130.0, 20.0);

        let pinhole = camera().generate_ray(pixel, &mut rng);
        let target = pinhole.at(4.0 / -pinhole.direction().z);
        for _ in 0..16 {
            let ray = cam.generate_ray(pixel, &mut rng);
            let t = (target.z - ray.origin().z) / ray.direction().z;
            assert!((ray.at(t) - target).length() < 1e-4);
        }
    }

    #[test]
    fn test_invalid_camera_rejected() {
        assert!(Camera::new(Vec3::ZERO, Vec3::Y, Vec3::Y, 10, 10, 60.0).is_err());
        assert!(Camera::new(Vec3::ZERO, Vec3::Z, Vec3::Y, 0, 10, 60.0).is_err());
        assert!(Camera::new(Vec3::ZERO, Vec3::Z, Vec3::Y, 10, 10, 180.0).is_err());
        assert!(camera().with_lens(-1.0, 1.0).is_err());
    }
}
