use crate::vec3::Vec3;

/// A surface hit. Built fresh per query and consumed by the shading pass,
/// never retained.
#[derive(Copy, Clone, Debug)]
pub struct Intersection {
    pub distance: f64,
    pub point: Vec3<f64>,
    /// Outward unit normal of the surface that was hit.
    pub normal: Vec3<f64>,
}

impl Intersection {
    pub fn new(distance: f64, point: Vec3<f64>, normal: Vec3<f64>) -> Self {
        Self {
            distance,
            point,
            normal,
        }
    }
}
