//! Parametric profile curves for surfaces of revolution.
//!
//! Two families are supported: piecewise cubic Bezier curves (`3k + 1`
//! control points, consecutive segments share an end point) and uniform
//! cubic B-splines (at least 4 control points, knots `i / (n + 3)`).

use crate::error::GeometryError;
use lumen_core::CurveDescription;
use lumen_math::Vec3;

const DEGREE: usize = 3;

/// A point on a curve with its (unnormalized) derivative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub position: Vec3,
    pub tangent: Vec3,
}

#[derive(Debug, Clone)]
pub enum Curve {
    Bezier { controls: Vec<Vec3> },
    BSpline { controls: Vec<Vec3>, knots: Vec<f32> },
}

impl Curve {
    pub fn bezier(controls: Vec<Vec3>) -> Result<Self, GeometryError> {
        if controls.len() < 4 || controls.len() % 3 != 1 {
            return Err(GeometryError::BezierControlCount(controls.len()));
        }
        Ok(Curve::Bezier { controls })
    }

    pub fn bspline(controls: Vec<Vec3>) -> Result<Self, GeometryError> {
        if controls.len() < 4 {
            return Err(GeometryError::BsplineControlCount(controls.len()));
        }
        let knot_count = controls.len() + DEGREE + 1;
        let knots = (0..knot_count)
            .map(|i| i as f32 / (knot_count - 1) as f32)
            .collect();
        Ok(Curve::BSpline { controls, knots })
    }

    pub fn from_description(desc: &CurveDescription) -> Result<Self, GeometryError> {
        match desc {
            CurveDescription::Bezier { .. } => Self::bezier(desc.controls()),
            CurveDescription::BSpline { .. } => Self::bspline(desc.controls()),
        }
    }

    pub fn controls(&self) -> &[Vec3] {
        match self {
            Curve::Bezier { controls } | Curve::BSpline { controls, .. } => controls,
        }
    }

    /// Valid parameter range `(start, end)`.
    pub fn range(&self) -> (f32, f32) {
        match self {
            Curve::Bezier { .. } => (0.0, 1.0),
            Curve::BSpline { controls, knots } => (knots[DEGREE], knots[controls.len()]),
        }
    }

    /// Number of polynomial pieces.
    pub fn segment_count(&self) -> usize {
        match self {
            Curve::Bezier { controls } => (controls.len() - 1) / 3,
            Curve::BSpline { controls, .. } => controls.len() - DEGREE,
        }
    }

    /// Evaluate position and derivative at `u`, clamped into [`Curve::range`].
    pub fn evaluate(&self, u: f32) -> CurvePoint {
        let (start, end) = self.range();
        let u = u.clamp(start, end);
        match self {
            Curve::Bezier { controls } => evaluate_bezier(controls, u),
            Curve::BSpline { controls, knots } => evaluate_bspline(controls, knots, u),
        }
    }

    /// Sample `resolution` points per segment plus the end point, with unit tangents.
    ///
    /// Returns `(u, point)` pairs in increasing `u`.
    pub fn discretize(&self, resolution: usize) -> Vec<(f32, CurvePoint)> {
        let (start, end) = self.range();
        let count = self.segment_count() * resolution.max(1);
        (0..=count)
            .map(|i| {
                let u = start + (end - start) * i as f32 / count as f32;
                let mut point = self.evaluate(u);
                point.tangent = point.tangent.normalize_or_zero();
                (u, point)
            })
            .collect()
    }
}

/// De Casteljau on the cubic segment containing `u`.
fn evaluate_bezier(controls: &[Vec3], u: f32) -> CurvePoint {
    let segments = (controls.len() - 1) / 3;
    let scaled = u * segments as f32;
    let segment = (scaled as usize).min(segments - 1);
    let s = scaled - segment as f32;

    let mut p = [
        controls[3 * segment],
        controls[3 * segment + 1],
        controls[3 * segment + 2],
        controls[3 * segment + 3],
    ];
    for level in 1..DEGREE {
        for i in 0..=DEGREE - level {
            p[i] = p[i].lerp(p[i + 1], s);
        }
    }

    // d/du = d/ds * segments
    CurvePoint {
        position: p[0].lerp(p[1], s),
        tangent: (p[1] - p[0]) * (DEGREE * segments) as f32,
    }
}

/// Cox-de Boor evaluation of the cubic basis on the knot span of `u`.
fn evaluate_bspline(controls: &[Vec3], knots: &[f32], u: f32) -> CurvePoint {
    let n = controls.len();
    // Span j with knots[j] <= u < knots[j + 1], kept inside [DEGREE, n - 1]
    let span = (knots.partition_point(|&k| k <= u).saturating_sub(1)).clamp(DEGREE, n - 1);

    // basis[r] holds N_{span - d + r, d} after iteration d
    let mut basis = [0.0f32; DEGREE + 1];
    let mut lower = [0.0f32; DEGREE];
    let mut left = [0.0f32; DEGREE + 1];
    let mut right = [0.0f32; DEGREE + 1];
    basis[0] = 1.0;
    for d in 1..=DEGREE {
        if d == DEGREE {
            lower.copy_from_slice(&basis[..DEGREE]);
        }
        left[d] = u - knots[span + 1 - d];
        right[d] = knots[span + d] - u;
        let mut saved = 0.0;
        for r in 0..d {
            let temp = basis[r] / (right[r + 1] + left[d - r]);
            basis[r] = saved + right[r + 1] * temp;
            saved = left[d - r] * temp;
        }
        basis[d] = saved;
    }

    let mut point = CurvePoint {
        position: Vec3::ZERO,
        tangent: Vec3::ZERO,
    };
    let p = DEGREE as f32;
    for r in 0..=DEGREE {
        let i = span - DEGREE + r;
        point.position += controls[i] * basis[r];

        // N'_{i,p} = p / (t_{i+p} - t_i) N_{i,p-1} - p / (t_{i+p+1} - t_{i+1}) N_{i+1,p-1}
        let mut derivative = 0.0;
        if r >= 1 {
            derivative += p / (knots[i + DEGREE] - knots[i]) * lower[r - 1];
        }
        if r < DEGREE {
            derivative -= p / (knots[i + DEGREE + 1] - knots[i + 1]) * lower[r];
        }
        point.tangent += controls[i] * derivative;
    }
    point
}
