//! Surface materials and the specular scattering math.
//!
//! A material splits incident power into a specular share
//! (`specular_ratio`) and a diffuse remainder. The diffuse part is what
//! photons deposit; the specular part is mirrored or, for dielectrics,
//! divided between reflection and refraction by the Fresnel equations.

use lumen_core::MaterialDescription;
use lumen_math::{Color, Vec3};

/// Phong-style surface description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Diffuse reflectance
    pub diffuse: Color,
    /// Specular lobe color
    pub specular: Color,
    /// Specular lobe exponent
    pub shininess: f32,
    /// Fraction of incident power scattered specularly, in `[0, 1]`
    pub specular_ratio: f32,
    /// Index of refraction; `None` marks an opaque mirror
    pub refractive_index: Option<f32>,
}

impl Default for Material {
    fn default() -> Self {
        Self::diffuse(Color::splat(0.5))
    }
}

impl Material {
    /// Purely diffuse material.
    pub fn diffuse(color: Color) -> Self {
        Self {
            diffuse: color,
            specular: Color::ZERO,
            shininess: 0.0,
            specular_ratio: 0.0,
            refractive_index: None,
        }
    }

    /// Perfect mirror.
    pub fn mirror() -> Self {
        Self {
            diffuse: Color::ZERO,
            specular_ratio: 1.0,
            ..Self::diffuse(Color::ZERO)
        }
    }

    /// Clear dielectric with the given index of refraction.
    pub fn glass(ior: f32) -> Self {
        Self {
            refractive_index: Some(ior),
            ..Self::mirror()
        }
    }

    /// Evaluate the local reflectance model.
    ///
    /// `to_viewer` and `to_light` both point away from the surface. The
    /// diffuse lobe is `diffuse * (l·n)`, the specular lobe is
    /// `specular * (r·v)^shininess` with `r = 2(l·n)n - l`; each lobe only
    /// contributes when its cosine is positive.
    pub fn shade(&self, to_viewer: Vec3, to_light: Vec3, normal: Vec3, color: Color) -> Color {
        let mut shaded = Color::ZERO;
        let dot_diffuse = to_light.dot(normal);
        let dot_specular = (2.0 * dot_diffuse * normal - to_light).dot(to_viewer);
        if dot_diffuse > 0.0 {
            shaded += self.diffuse * dot_diffuse * color;
        }
        if dot_specular > 0.0 {
            shaded += self.specular * dot_specular.powf(self.shininess) * color;
        }
        shaded
    }

    pub fn is_specular(&self) -> bool {
        self.specular_ratio > 0.0
    }
}

impl From<&MaterialDescription> for Material {
    fn from(desc: &MaterialDescription) -> Self {
        Self {
            diffuse: Color::from_array(desc.diffuse),
            specular: Color::from_array(desc.specular),
            shininess: desc.shininess,
            specular_ratio: desc.specular_ratio.clamp(0.0, 1.0),
            refractive_index: desc.refractive_index,
        }
    }
}

/// How a specular interaction divides its power.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpecularScatter {
    /// All specular power follows the mirror direction (mirrors and total
    /// internal reflection)
    Reflect { reflected: Vec3 },
    /// Fresnel split: `reflectance` goes to `reflected`, the rest to `refracted`
    Split {
        reflected: Vec3,
        refracted: Vec3,
        reflectance: f32,
    },
}

/// Scatter a unit `direction` off a surface with geometric `normal`.
///
/// Entering or exiting is decided by the sign of `direction · normal`, so
/// the normal may face either way.
pub fn specular_scatter(direction: Vec3, normal: Vec3, ior: Option<f32>) -> SpecularScatter {
    let reflected = reflect(direction, normal);
    let Some(ior) = ior else {
        return SpecularScatter::Reflect { reflected };
    };

    let mut cos_i = -direction.dot(normal);
    let (n1, n2, facing) = if cos_i >= 0.0 {
        (1.0, ior, normal)
    } else {
        cos_i = -cos_i;
        (ior, 1.0, -normal)
    };

    let eta = n1 / n2;
    let sin_t2 = eta * eta * (1.0 - cos_i * cos_i);
    if sin_t2 > 1.0 {
        return SpecularScatter::Reflect { reflected };
    }

    let cos_t = (1.0 - sin_t2).sqrt();
    let refracted = (eta * direction + (eta * cos_i - cos_t) * facing).normalize_or_zero();
    SpecularScatter::Split {
        reflected,
        refracted,
        reflectance: fresnel_reflectance(n1, n2, cos_i, cos_t),
    }
}

/// Unpolarized Fresnel reflectance, the mean of the s and p terms.
pub fn fresnel_reflectance(n1: f32, n2: f32, cos_i: f32, cos_t: f32) -> f32 {
    let rs = (n1 * cos_i - n2 * cos_t) / (n1 * cos_i + n2 * cos_t);
    let rp = (n1 * cos_t - n2 * cos_i) / (n1 * cos_t + n2 * cos_i);
    let r = 0.5 * (rs * rs + rp * rp);
    if r.is_finite() {
        r.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shade_diffuse_lobe() {
        let material = Material::diffuse(Color::new(0.5, 0.5, 0.5));
        let shaded = material.shade(Vec3::Y, Vec3::Y, Vec3::Y, Color::ONE);
        assert!((shaded - Color::splat(0.5)).length() < 1e-6);

        // Light below the surface contributes nothing
        let shaded = material.shade(Vec3::Y, -Vec3::Y, Vec3::Y, Color::ONE);
        assert_eq!(shaded, Color::ZERO);
    }

    #[test]
    fn test_shade_specular_lobe_peaks_at_mirror_direction() {
        let material = Material {
            diffuse: Color::ZERO,
            specular: Color::ONE,
            shininess: 20.0,
            ..Material::default()
        };
        let to_light = Vec3::new(1.0, 1.0, 0.0).normalize();
        let mirror = Vec3::new(-1.0, 1.0, 0.0).normalize();
        let off = Vec3::new(-0.2, 1.0, 0.0).normalize();

        let peak = material.shade(mirror, to_light, Vec3::Y, Color::ONE);
        let side = material.shade(off, to_light, Vec3::Y, Color::ONE);
        assert!((peak.x - 1.0).abs() < 1e-4);
        assert!(side.x < peak.x);
    }

    #[test]
    fn test_fresnel_normal_incidence() {
        // ((1 - 1.5) / (1 + 1.5))^2 = 0.04
        let r = fresnel_reflectance(1.0, 1.5, 1.0, 1.0);
        assert!((r - 0.04).abs() < 1e-6);
    }

    #[test]
    fn test_specular_scatter_mirror() {
        let d = Vec3::new(1.0, -1.0, 0.0).normalize();
        match specular_scatter(d, Vec3::Y, None) {
            SpecularScatter::Reflect { reflected } => {
                assert!((reflected - Vec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-6)
            }
            other => panic!("expected reflection, got {:?}", other),
        }
    }

    #[test]
    fn test_specular_scatter_refraction_follows_snell() {
        let d = Vec3::new(0.5, -(0.75f32).sqrt(), 0.0); // 30 degrees from the normal
        match specular_scatter(d, Vec3::Y, Some(1.5)) {
            SpecularScatter::Split { refracted, reflectance, .. } => {
                let sin_t = refracted.x / refracted.length();
                assert!((sin_t - 0.5 / 1.5).abs() < 1e-5);
                assert!(refracted.y < 0.0);
                assert!(reflectance > 0.0 && reflectance < 0.1);
            }
            other => panic!("expected a split, got {:?}", other),
        }
    }

    #[test]
    fn test_specular_scatter_total_internal_reflection() {
        // Leaving glass at 60 degrees: sin_t = 1.5 * sin(60) > 1
        let d = Vec3::new((0.75f32).sqrt(), 0.5, 0.0);
        assert!(matches!(
            specular_scatter(d, Vec3::Y, Some(1.5)),
            SpecularScatter::Reflect { .. }
        ));
    }
}
