//! Surface of revolution: a profile curve in the XY plane swept around +Y.
//!
//! Intersection runs in two stages. A coarse proxy mesh (with its own
//! KD-tree) yields a first hit and a starting parameter; a Newton iteration
//! on `(t, u)` then solves
//!
//! ```text
//! (ox + t dx)^2 + (oz + t dz)^2 - x(u)^2 = 0
//!  oy + t dy                    - y(u)   = 0
//! ```
//!
//! for the exact surface. The proxy encloses the surface, so rays that
//! reach the true surface always cross it first; when the iteration does
//! not converge the ray misses.

use crate::curve::Curve;
use crate::error::GeometryError;
use crate::mesh::TriangleMesh;
use crate::{Hit, Material};
use lumen_math::{Aabb, Ray, Vec3};
use std::f32::consts::PI;

/// Profile samples per curve segment in the proxy mesh.
const PROFILE_RESOLUTION: usize = 10;
/// Angular steps of the proxy mesh.
const SWEEP_STEPS: usize = 30;
const NEWTON_ITERATIONS: usize = 20;
const NEWTON_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone)]
pub struct RevSurface {
    curve: Curve,
    material: Material,
    proxy: TriangleMesh,
    /// `(u, radius, height)` of the proxy's profile rings
    rings: Vec<(f32, f32, f32)>,
    bbox: Aabb,
}

impl RevSurface {
    pub fn new(curve: Curve, material: Material) -> Result<Self, GeometryError> {
        if let Some((index, c)) = curve
            .controls()
            .iter()
            .enumerate()
            .find(|(_, c)| c.z.abs() > 1e-6)
        {
            return Err(GeometryError::NonPlanarProfile { index, z: c.z });
        }

        let samples = curve.discretize(PROFILE_RESOLUTION);

        // Circumscribe each ring so the polygon never cuts inside the circle
        let scale = 1.0 / (PI / SWEEP_STEPS as f32).cos();
        let mut vertices = Vec::with_capacity(samples.len() * SWEEP_STEPS);
        for (_, point) in &samples {
            for step in 0..SWEEP_STEPS {
                let theta = 2.0 * PI * step as f32 / SWEEP_STEPS as f32;
                let x = point.position.x * scale;
                vertices.push(Vec3::new(x * theta.cos(), point.position.y, x * theta.sin()));
            }
        }

        let mut triangles = Vec::with_capacity(2 * (samples.len() - 1) * SWEEP_STEPS);
        for ring in 0..samples.len() - 1 {
            for step in 0..SWEEP_STEPS {
                let next = (step + 1) % SWEEP_STEPS;
                let v = |r: usize, s: usize| (r * SWEEP_STEPS + s) as u32;
                triangles.push([v(ring + 1, step), v(ring, next), v(ring, step)]);
                triangles.push([v(ring + 1, step), v(ring + 1, next), v(ring, next)]);
            }
        }
        let proxy = TriangleMesh::new(vertices, triangles, material)?;

        // The control polygon bounds the curve for both curve families
        let controls = curve.controls();
        let radius = controls.iter().map(|c| c.x.abs()).fold(0.0, f32::max);
        let (y_min, y_max) = controls
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), c| (lo.min(c.y), hi.max(c.y)));
        let hull = Aabb::from_points(
            Vec3::new(-radius, y_min, -radius),
            Vec3::new(radius, y_max, radius),
        );
        let bbox = Aabb::surrounding(&hull, &proxy.bounding_box());

        let rings = samples
            .iter()
            .map(|(u, p)| (*u, p.position.x.abs(), p.position.y))
            .collect();

        Ok(Self {
            curve,
            material,
            proxy,
            rings,
            bbox,
        })
    }

    pub fn curve(&self) -> &Curve {
        &self.curve
    }

    pub fn intersect<'a>(&'a self, ray: &Ray, hit: &mut Hit<'a>, tmin: f32) -> bool {
        let mut proxy_hit = Hit::new();
        if !self.proxy.intersect(ray, &mut proxy_hit, tmin) {
            return false;
        }

        let guess = ray.at(proxy_hit.t);
        let radius = (guess.x * guess.x + guess.z * guess.z).sqrt();
        let u0 = self
            .rings
            .iter()
            .map(|&(u, r, y)| (u, (r - radius).powi(2) + (y - guess.y).powi(2)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(0.0, |(u, _)| u);

        // The proxy only seeds the iteration; without convergence there is no hit
        let Some((t, u)) = self.refine(ray, proxy_hit.t, u0) else {
            return false;
        };
        if !hit.accepts(t, tmin) {
            return false;
        }
        let normal = self.surface_normal(ray.at(t), u);
        let normal = if normal == Vec3::ZERO { proxy_hit.normal } else { normal };
        hit.set(t, &self.material, normal);
        true
    }

    /// Newton iteration on `(t, u)`; `None` when it fails to converge.
    fn refine(&self, ray: &Ray, mut t: f32, mut u: f32) -> Option<(f32, f32)> {
        let (start, end) = self.curve.range();
        let o = ray.origin();
        let d = ray.direction();

        for _ in 0..NEWTON_ITERATIONS {
            let c = self.curve.evaluate(u);
            let (x, y) = (c.position.x, c.position.y);
            let px = o.x + t * d.x;
            let pz = o.z + t * d.z;

            let f1 = px * px + pz * pz - x * x;
            let f2 = o.y + t * d.y - y;
            if f1.abs() < NEWTON_EPSILON * (1.0 + x * x) && f2.abs() < NEWTON_EPSILON * (1.0 + y.abs())
            {
                return Some((t, u));
            }

            let a11 = 2.0 * (px * d.x + pz * d.z);
            let a12 = -2.0 * x * c.tangent.x;
            let a21 = d.y;
            let a22 = -c.tangent.y;
            let det = a11 * a22 - a12 * a21;
            if det.abs() < 1e-12 {
                return None;
            }

            t -= (f1 * a22 - a12 * f2) / det;
            u = (u - (a11 * f2 - a21 * f1) / det).clamp(start, end);
        }
        None
    }

    /// Normal of the swept surface at `point`, oriented by the profile's
    /// direction (outward where the profile rises in y with x > 0).
    fn surface_normal(&self, point: Vec3, u: f32) -> Vec3 {
        let r = (point.x * point.x + point.z * point.z).sqrt();
        if r < 1e-6 {
            return Vec3::ZERO;
        }
        let (cos_theta, sin_theta) = (point.x / r, point.z / r);
        let c = self.curve.evaluate(u);
        let sign = if c.position.x < 0.0 { -1.0 } else { 1.0 };
        let dx = c.tangent.x * sign;
        let dy = c.tangent.y;
        Vec3::new(dy * cos_theta, -dx, dy * sin_theta).normalize_or_zero()
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
