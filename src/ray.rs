use std::ops::Range;

use crate::vec3::Vec3;

/// Minimum hit distance. A bounce ray spawned on a surface would otherwise
/// re-hit that surface at t ≈ 0.
pub const EPSILON: f64 = 1e-3;

/// Origin plus direction, with the range of `t` values a hit may occupy.
///
/// The direction is stored as given; callers normalize. Keeping it that way
/// lets `t` double as euclidean distance everywhere in the tracer.
#[derive(Clone, Debug)]
pub struct Ray {
    origin: Vec3<f64>,
    direction: Vec3<f64>,
    range: Range<f64>,
}

impl Ray {
    pub fn new(origin: Vec3<f64>, direction: Vec3<f64>) -> Self {
        Self::bounded(origin, direction, EPSILON..f64::INFINITY)
    }

    /// Ray with an explicit valid range, e.g. a shadow ray that must not see
    /// occluders beyond the light itself.
    pub fn bounded(origin: Vec3<f64>, direction: Vec3<f64>, range: Range<f64>) -> Self {
        Self {
            origin,
            direction,
            range,
        }
    }

    #[inline]
    pub fn origin(&self) -> Vec3<f64> {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> &Vec3<f64> {
        &self.direction
    }

    #[inline]
    pub fn offset(&self, t: f64) -> Vec3<f64> {
        self.origin + self.direction.scale(t)
    }

    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        self.range.contains(&t)
    }
}

#[test]
fn offset_walks_along_direction() {
    let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 1.0));

    assert_eq!(Vec3::new(0.0, 1.0, 2.5), ray.offset(2.5));
}

#[test]
fn default_range_excludes_the_guard_band() {
    let ray = Ray::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0));

    assert!(!ray.contains(0.0));
    assert!(!ray.contains(EPSILON / 2.0));
    assert!(ray.contains(EPSILON));
    assert!(ray.contains(1.0e9));
}

#[test]
fn bounded_range_excludes_the_far_end() {
    let ray = Ray::bounded(
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        EPSILON..5.0,
    );

    assert!(ray.contains(4.9));
    assert!(!ray.contains(5.0));
}
