//! Random sampling helpers.
//!
//! Everything takes `&mut dyn RngCore` so callers own their generator;
//! parallel workers each seed their own.

use lumen_math::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Uniform float in `[0, 1)`.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Sample a random point in the unit square [-0.5, 0.5] x [-0.5, 0.5].
pub fn sample_square(rng: &mut dyn RngCore) -> Vec2 {
    Vec2::new(gen_f32(rng) - 0.5, gen_f32(rng) - 0.5)
}

/// Sample a random point in the unit disk.
pub fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec2 {
    loop {
        let p = Vec2::new(gen_f32(rng) * 2.0 - 1.0, gen_f32(rng) * 2.0 - 1.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

/// Uniform point inside the unit ball, excluding a tiny core around the
/// origin so the result can always be normalized.
pub fn random_in_unit_ball(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
        );
        let len_sq = p.length_squared();
        if len_sq > 1e-8 && len_sq <= 1.0 {
            return p;
        }
    }
}

/// Uniform direction on the unit sphere.
pub fn random_unit_vector(rng: &mut dyn RngCore) -> Vec3 {
    random_in_unit_ball(rng).normalize()
}

/// Uniform direction in the hemisphere around `normal`.
///
/// Rejection sampled: points drawn in the unit ball on the wrong side of
/// the normal are discarded.
pub fn random_in_hemisphere(normal: Vec3, rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = random_in_unit_ball(rng);
        if p.dot(normal) > 0.0 {
            return p.normalize();
        }
    }
}

/// Two unit vectors completing `n` to an orthonormal basis.
pub fn orthonormal_basis(n: Vec3) -> (Vec3, Vec3) {
    let helper = if n.x.abs() > 0.9 { Vec3::Y } else { Vec3::X };
    let a = n.cross(helper).normalize();
    let b = n.cross(a);
    (a, b)
}

/// Generator for one independent work item.
///
/// Parallel stages key their generators by position in the work, not by
/// thread, so output never depends on scheduling. The four keys fill the
/// 256-bit ChaCha seed directly, so distinct keys never share a stream.
pub fn stream_rng(seed: u64, pass: u64, stream: u64, item: u64) -> StdRng {
    let mut key = <StdRng as SeedableRng>::Seed::default();
    for (bytes, value) in key.chunks_exact_mut(8).zip([seed, pass, stream, item]) {
        bytes.copy_from_slice(&value.to_le_bytes());
    }
    StdRng::from_seed(key)
}
