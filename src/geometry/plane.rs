use serde::Deserialize;

use crate::geometry::Geometry;
use crate::intersection::Intersection;
use crate::ray::{Ray, EPSILON};
use crate::vec3::Vec3;

/// Infinite one-sided plane: a point on it and a unit normal. Only rays
/// approaching from the side the normal faces can hit it.
#[derive(Copy, Clone, Debug, Deserialize)]
pub struct Plane {
    pub point: Vec3<f64>,
    pub normal: Vec3<f64>,
}

impl Geometry for Plane {
    fn intersection(&self, ray: &Ray) -> Option<Intersection> {
        let denominator = self.normal.dot(ray.direction());

        // Parallel, or approaching the back face.
        if denominator.abs() < EPSILON || denominator > 0.0 {
            return None;
        }

        let t = (self.point - ray.origin()).dot(&self.normal) / denominator;
        if !ray.contains(t) {
            return None;
        }

        Some(Intersection::new(t, ray.offset(t), self.normal))
    }
}

#[test]
fn ray_straight_down_hits_the_floor() {
    let plane = Plane {
        point: Vec3::new(0.0, -1.0, 0.0),
        normal: Vec3::new(0.0, 1.0, 0.0),
    };
    let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -1.0, 0.0));

    let hit = plane.intersection(&ray).unwrap();

    assert!((hit.distance - 6.0).abs() < 1e-9);
    assert!((hit.point.y - -1.0).abs() < 1e-9);
    assert_eq!(Vec3::new(0.0, 1.0, 0.0), hit.normal);
}

#[test]
fn parallel_ray_misses() {
    let plane = Plane {
        point: Vec3::new(0.0, -1.0, 0.0),
        normal: Vec3::new(0.0, 1.0, 0.0),
    };
    let ray = Ray::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));

    assert!(plane.intersection(&ray).is_none());
}

#[test]
fn back_face_is_culled() {
    let plane = Plane {
        point: Vec3::new(0.0, -1.0, 0.0),
        normal: Vec3::new(0.0, 1.0, 0.0),
    };
    // Approaching from below, travelling the same way the normal points.
    let ray = Ray::new(Vec3::new(0.0, -5.0, 0.0), Vec3::new(0.0, 1.0, 0.0));

    assert!(plane.intersection(&ray).is_none());
}

#[test]
fn plane_behind_the_ray_is_ignored() {
    let plane = Plane {
        point: Vec3::new(0.0, -1.0, 0.0),
        normal: Vec3::new(0.0, 1.0, 0.0),
    };
    let ray = Ray::new(Vec3::new(0.0, -5.0, 0.0), Vec3::new(0.0, -1.0, 0.0));

    assert!(plane.intersection(&ray).is_none());
}
