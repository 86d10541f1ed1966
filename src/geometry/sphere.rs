use serde::Deserialize;

use crate::geometry::Geometry;
use crate::intersection::Intersection;
use crate::ray::Ray;
use crate::vec3::Vec3;

#[derive(Copy, Clone, Debug, Deserialize)]
pub struct Sphere {
    pub center: Vec3<f64>,
    pub radius: f64,
}

impl Geometry for Sphere {
    fn intersection(&self, ray: &Ray) -> Option<Intersection> {
        let oc = ray.origin() - self.center;

        let a = ray.direction().dot(ray.direction());
        let b = 2.0 * oc.dot(ray.direction());
        let c = oc.dot(&oc) - self.radius * self.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt = discriminant.sqrt();
        let denominator = 2.0 * a;

        let near = (-b - sqrt) / denominator;
        let far = (-b + sqrt) / denominator;

        // A bounce ray starting on this sphere sees its own surface as the
        // near root; the far root is the exit on the other side.
        let distance = if ray.contains(near) {
            near
        } else if ray.contains(far) {
            far
        } else {
            return None;
        };

        let point = ray.offset(distance);
        let normal = (point - self.center).unit();

        Some(Intersection::new(distance, point, normal))
    }
}

#[test]
fn ray_aimed_at_sphere_hits_the_near_side() {
    let sphere = Sphere {
        center: Vec3::new(0.0, 0.0, 5.0),
        radius: 1.0,
    };
    let ray = Ray::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0));

    let hit = sphere.intersection(&ray).unwrap();

    assert!((hit.distance - 4.0).abs() < 1e-9);
    assert!(hit.distance > 0.0);
    // Normal points from the center out toward the ray origin.
    assert!((hit.normal.x - 0.0).abs() < 1e-9);
    assert!((hit.normal.z - -1.0).abs() < 1e-9);
}

#[test]
fn ray_aimed_away_misses() {
    let sphere = Sphere {
        center: Vec3::new(0.0, 0.0, 5.0),
        radius: 1.0,
    };
    let ray = Ray::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0));

    assert!(sphere.intersection(&ray).is_none());
}

#[test]
fn bounce_ray_on_the_surface_finds_the_exit_root() {
    let sphere = Sphere {
        center: Vec3::new(0.0, 0.0, 0.0),
        radius: 1.0,
    };
    // Origin exactly on the surface, pointing through the sphere.
    let ray = Ray::new(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, 1.0));

    let hit = sphere.intersection(&ray).unwrap();

    assert!((hit.distance - 2.0).abs() < 1e-9);
}

#[test]
fn grazing_ray_outside_the_sphere_misses() {
    let sphere = Sphere {
        center: Vec3::new(0.0, 0.0, 5.0),
        radius: 1.0,
    };
    let ray = Ray::new(Vec3::new(0.0, 1.5, 0.0), Vec3::new(0.0, 0.0, 1.0));

    assert!(sphere.intersection(&ray).is_none());
}
