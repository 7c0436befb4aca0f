//! Light sources: photon emission and direct illumination.

use crate::error::SceneError;
use crate::sampling::{
    gen_f32, orthonormal_basis, random_in_hemisphere, random_in_unit_disk, random_unit_vector,
};
use lumen_core::LightDescription;
use lumen_math::{Aabb, Color, Ray, Vec3};
use rand::RngCore;

/// Light arriving at a shading point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Illumination {
    /// Unit direction from the shading point toward the light
    pub direction: Vec3,
    pub color: Color,
    /// Distance to the sampled light point; infinite for directional lights
    pub distance: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    Point {
        position: Vec3,
        color: Color,
    },
    Directional {
        /// Unit direction the light travels in
        direction: Vec3,
        color: Color,
    },
    /// One-sided rectangle emitting along `normal = x_axis × y_axis`.
    Area {
        center: Vec3,
        x_axis: Vec3,
        y_axis: Vec3,
        normal: Vec3,
        width: f32,
        height: f32,
        color: Color,
    },
}

impl Light {
    pub fn point(position: Vec3, color: Color) -> Self {
        Light::Point { position, color }
    }

    pub fn directional(direction: Vec3, color: Color) -> Result<Self, SceneError> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return Err(SceneError::Light("directional light needs a non-zero direction"));
        }
        Ok(Light::Directional { direction, color })
    }

    pub fn area(
        center: Vec3,
        x_axis: Vec3,
        y_axis: Vec3,
        width: f32,
        height: f32,
        color: Color,
    ) -> Result<Self, SceneError> {
        let x_axis = x_axis.normalize_or_zero();
        let y_axis = y_axis.normalize_or_zero();
        let normal = x_axis.cross(y_axis).normalize_or_zero();
        if normal == Vec3::ZERO {
            return Err(SceneError::Light("area light axes must be non-zero and not parallel"));
        }
        if !(width > 0.0 && height > 0.0) {
            return Err(SceneError::Light("area light needs a positive width and height"));
        }
        Ok(Light::Area {
            center,
            x_axis,
            y_axis,
            normal,
            width,
            height,
            color,
        })
    }

    pub fn from_description(desc: &LightDescription) -> Result<Self, SceneError> {
        let light = match desc {
            LightDescription::Point { position, color } => {
                Self::point(Vec3::from_array(*position), Color::from_array(*color))
            }
            LightDescription::Directional { direction, color } => {
                Self::directional(Vec3::from_array(*direction), Color::from_array(*color))?
            }
            LightDescription::Area {
                center,
                x_axis,
                y_axis,
                width,
                height,
                color,
            } => Self::area(
                Vec3::from_array(*center),
                Vec3::from_array(*x_axis),
                Vec3::from_array(*y_axis),
                *width,
                *height,
                Color::from_array(*color),
            )?,
        };
        Ok(light)
    }

    pub fn color(&self) -> Color {
        match self {
            Light::Point { color, .. } | Light::Directional { color, .. } | Light::Area { color, .. } => {
                *color
            }
        }
    }

    /// Emit one photon: its ray and its power.
    ///
    /// `bounds` is the scene's bounding box; directional lights emit from a
    /// disk covering it.
    pub fn generate(&self, bounds: &Aabb, rng: &mut dyn RngCore) -> (Ray, Color) {
        match self {
            Light::Point { position, color } => (Ray::new(*position, random_unit_vector(rng)), *color),
            Light::Directional { direction, color } => {
                let radius = 0.5 * bounds.diagonal();
                let (a, b) = orthonormal_basis(*direction);
                let disk = random_in_unit_disk(rng) * radius;
                let origin = bounds.centroid() - *direction * radius + a * disk.x + b * disk.y;
                (Ray::new(origin, *direction), *color)
            }
            Light::Area {
                center,
                x_axis,
                y_axis,
                normal,
                width,
                height,
                color,
            } => {
                let origin = rectangle_point(*center, *x_axis * *width, *y_axis * *height, rng);
                (Ray::new(origin, random_in_hemisphere(*normal, rng)), *color)
            }
        }
    }

    /// Sample the light as seen from `point`.
    pub fn illumination(&self, point: Vec3, rng: &mut dyn RngCore) -> Illumination {
        match self {
            Light::Point { position, color } => {
                let offset = *position - point;
                Illumination {
                    direction: offset.normalize_or_zero(),
                    color: *color,
                    distance: offset.length(),
                }
            }
            Light::Directional { direction, color } => Illumination {
                direction: -*direction,
                color: *color,
                distance: f32::INFINITY,
            },
            Light::Area {
                center,
                x_axis,
                y_axis,
                normal,
                width,
                height,
                color,
            } => {
                let sample = rectangle_point(*center, *x_axis * *width, *y_axis * *height, rng);
                let offset = sample - point;
                let direction = offset.normalize_or_zero();
                // One-sided: nothing reaches points behind the emitter
                let color = if direction.dot(*normal) < 0.0 { *color } else { Color::ZERO };
                Illumination {
                    direction,
                    color,
                    distance: offset.length(),
                }
            }
        }
    }
}

/// Uniform point on the rectangle `center + u * x + v * y`, `u, v` in `[-0.5, 0.5)`.
fn rectangle_point(center: Vec3, x: Vec3, y: Vec3, rng: &mut dyn RngCore) -> Vec3 {
    center + x * (gen_f32(rng) - 0.5) + y * (gen_f32(rng) - 0.5)
}
