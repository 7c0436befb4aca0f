use crate::{Interval, Ray, Vec3};

/// Axis-Aligned Bounding Box for spatial acceleration structures.
///
/// Stored as two corners with `min[d] <= max[d]` on every axis. Boxes built
/// from geometry via [`Aabb::from_points`] are padded so no axis has zero
/// thickness; [`Aabb::point`] keeps an exact, zero-volume box (used by the
/// photon tree, where pruning must be exact).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

/// Minimum extent of a padded box along any axis.
const PAD_DELTA: f32 = 0.0001;

impl Aabb {
    /// Create an AABB from its corners without padding.
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a padded AABB from two arbitrary corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let mut aabb = Self {
            min: a.min(b),
            max: a.max(b),
        };
        aabb.pad_to_minimums();
        aabb
    }

    /// Create a padded AABB enclosing every point of the iterator.
    ///
    /// Returns [`Aabb::EMPTY`] for an empty iterator.
    pub fn from_iter_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        let mut bounds = Aabb::EMPTY;
        for p in points {
            bounds = bounds.include_point(p);
        }
        if bounds.is_empty() {
            return bounds;
        }
        bounds.pad_to_minimums();
        bounds
    }

    /// Exact box around a single point.
    pub fn point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            min: box0.min.min(box1.min),
            max: box0.max.max(box1.max),
        }
    }

    /// Grow the box to include `p`.
    pub fn include_point(&self, p: Vec3) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    /// True for the inverted box returned by [`Aabb::EMPTY`].
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Get the interval for a specific axis (0=X, 1=Y, 2=Z).
    pub fn axis_interval(&self, n: usize) -> Interval {
        Interval::new(self.min[n], self.max[n])
    }

    /// Parametric entry/exit distances of `ray` through the box (slab method).
    ///
    /// A zero direction component only passes when the origin already lies
    /// inside that slab; otherwise the result is [`Interval::EMPTY`].
    pub fn slab(&self, ray: &Ray) -> Interval {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;

        for dim in 0..3 {
            let o = ray.origin[dim];
            let d = ray.direction[dim];
            if d > 0.0 {
                t_enter = t_enter.max((self.min[dim] - o) / d);
                t_exit = t_exit.min((self.max[dim] - o) / d);
            } else if d < 0.0 {
                t_enter = t_enter.max((self.max[dim] - o) / d);
                t_exit = t_exit.min((self.min[dim] - o) / d);
            } else if self.min[dim] > o || self.max[dim] < o {
                return Interval::EMPTY;
            }
        }

        Interval::new(t_enter, t_exit)
    }

    /// Test if a ray intersects this AABB beyond `tmin`.
    pub fn hit(&self, ray: &Ray, tmin: f32) -> bool {
        let span = self.slab(ray);
        span.min <= span.max && span.max > tmin
    }

    /// Inclusive point containment.
    pub fn contains(&self, p: Vec3) -> bool {
        (0..3).all(|d| self.min[d] <= p[d] && p[d] <= self.max[d])
    }

    /// Squared distance from `p` to the nearest point of the box. Zero inside.
    pub fn distance_squared(&self, p: Vec3) -> f32 {
        let mut dis = 0.0;
        for dim in 0..3 {
            if p[dim] < self.min[dim] {
                dis += (self.min[dim] - p[dim]) * (self.min[dim] - p[dim]);
            } else if p[dim] > self.max[dim] {
                dis += (p[dim] - self.max[dim]) * (p[dim] - self.max[dim]);
            }
        }
        dis
    }

    /// Total surface area of the box.
    pub fn surface_area(&self) -> f32 {
        let e = (self.max - self.min).max(Vec3::ZERO);
        2.0 * (e.x * e.y + e.y * e.z + e.z * e.x)
    }

    /// Split the box by the plane `axis = value` into (below, above).
    pub fn split(&self, axis: usize, value: f32) -> (Aabb, Aabb) {
        let mut below = *self;
        let mut above = *self;
        below.max[axis] = value;
        above.min[axis] = value;
        (below, above)
    }

    /// Intersection of two boxes. May be empty.
    pub fn clip(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Length of the box diagonal.
    pub fn diagonal(&self) -> f32 {
        (self.max - self.min).length()
    }

    /// Pad axes to avoid zero-width AABBs (degenerate cases).
    fn pad_to_minimums(&mut self) {
        for dim in 0..3 {
            let axis = self.axis_interval(dim);
            if axis.size() < PAD_DELTA {
                let padded = axis.expand(PAD_DELTA);
                self.min[dim] = padded.min;
                self.max[dim] = padded.max;
            }
        }
    }

    /// The inverted box that contains nothing; identity for `surrounding`.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Per-axis interval intersection, written independently of `slab`.
    fn brute_force_hit(aabb: &Aabb, ray: &Ray, tmin: f32) -> bool {
        let mut span = Interval::UNIVERSE;
        for dim in 0..3 {
            let o = ray.origin[dim];
            let d = ray.direction[dim];
            let axis = if d == 0.0 {
                if aabb.axis_interval(dim).contains(o) {
                    Interval::UNIVERSE
                } else {
                    Interval::EMPTY
                }
            } else {
                let a = (aabb.min[dim] - o) / d;
                let b = (aabb.max[dim] - o) / d;
                Interval::new(a.min(b), a.max(b))
            };
            span = span.intersect(&axis);
        }
        !span.is_empty() && span.max > tmin
    }

    #[test]
    fn test_aabb_from_points() {
        let aabb = Aabb::from_points(Vec3::new(10.0, 0.0, 10.0), Vec3::new(0.0, 10.0, 0.0));

        assert_eq!(aabb.min, Vec3::ZERO);
        assert_eq!(aabb.max, Vec3::splat(10.0));
    }

    #[test]
    fn test_aabb_pads_degenerate_axis() {
        let aabb = Aabb::from_points(Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 1.0, 1.0));

        assert!(aabb.min.z < 1.0);
        assert!(aabb.max.z > 1.0);
        assert!(aabb.axis_interval(2).size() >= PAD_DELTA);
    }

    #[test]
    fn test_aabb_surrounding() {
        let box1 = Aabb::from_points(Vec3::ZERO, Vec3::new(5.0, 5.0, 5.0));
        let box2 = Aabb::from_points(Vec3::new(3.0, 3.0, 3.0), Vec3::new(10.0, 10.0, 10.0));
        let surrounding = Aabb::surrounding(&box1, &box2);

        assert_eq!(surrounding.min.x, 0.0);
        assert_eq!(surrounding.max.x, 10.0);
        assert_eq!(Aabb::surrounding(&Aabb::EMPTY, &box1), box1);
    }

    #[test]
    fn test_aabb_hit() {
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));

        // Ray pointing at center
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(aabb.hit(&ray, 0.0));

        // Ray pointing away
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(!aabb.hit(&ray, 0.0));

        // Axis-parallel ray outside the x slab
        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(!aabb.hit(&ray, 0.0));

        // Origin inside the box always hits
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.3, -0.2, 0.1));
        assert!(aabb.hit(&ray, 0.0));
    }

    #[test]
    fn test_aabb_slab_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        let aabb = Aabb::from_points(Vec3::new(-1.0, -2.0, -0.5), Vec3::new(2.0, 1.0, 3.0));

        for i in 0..20_000 {
            let origin = Vec3::new(
                rng.gen_range(-5.0..5.0),
                rng.gen_range(-5.0..5.0),
                rng.gen_range(-5.0..5.0),
            );
            let mut direction = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            // Exercise axis-parallel directions regularly
            match i % 4 {
                1 => direction.x = 0.0,
                2 => {
                    direction.x = 0.0;
                    direction.y = 0.0;
                }
                _ => {}
            }
            if direction == Vec3::ZERO {
                continue;
            }
            let ray = Ray::new(origin, direction);
            assert_eq!(
                aabb.hit(&ray, 0.0),
                brute_force_hit(&aabb, &ray, 0.0),
                "ray {:?}",
                ray
            );
        }
    }

    #[test]
    fn test_aabb_distance_squared() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);

        assert_eq!(aabb.distance_squared(Vec3::splat(0.5)), 0.0);
        assert_eq!(aabb.distance_squared(Vec3::new(3.0, 0.5, 0.5)), 4.0);
        assert_eq!(aabb.distance_squared(Vec3::new(-1.0, 2.0, 0.5)), 2.0);
    }

    #[test]
    fn test_aabb_split_and_surface_area() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::new(2.0, 1.0, 1.0));
        assert_eq!(aabb.surface_area(), 10.0);

        let (below, above) = aabb.split(0, 0.5);
        assert_eq!(below.max.x, 0.5);
        assert_eq!(above.min.x, 0.5);
        assert!(below.contains(Vec3::new(0.25, 0.5, 0.5)));
        assert!(!below.contains(Vec3::new(0.75, 0.5, 0.5)));
        assert!(above.contains(Vec3::new(0.75, 0.5, 0.5)));
    }

    #[test]
    fn test_aabb_from_iter_points() {
        let bounds = Aabb::from_iter_points([Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0), Vec3::X]);
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 3.0));

        assert!(Aabb::from_iter_points(std::iter::empty()).is_empty());
    }
}
