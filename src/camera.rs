use crate::ray::Ray;
use crate::vec3::Vec3;

/// Pinhole camera. `direction`, `right` and `up` form an orthonormal basis;
/// the fields stay private because every mutation has to re-derive the basis
/// to keep it that way.
#[derive(Clone, Debug)]
pub struct Camera {
    position: Vec3<f64>,
    direction: Vec3<f64>,
    right: Vec3<f64>,
    up: Vec3<f64>,
    fov_degrees: f64,
    aspect_ratio: f64,
}

impl Camera {
    pub fn new(
        position: Vec3<f64>,
        look_at: Vec3<f64>,
        up_guide: Vec3<f64>,
        fov_degrees: f64,
        aspect_ratio: f64,
    ) -> Self {
        let direction = (look_at - position).unit();
        let right = direction.cross(&up_guide).unit();
        let up = right.cross(&direction).unit();

        Self {
            position,
            direction,
            right,
            up,
            fov_degrees,
            aspect_ratio,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3<f64> {
        self.position
    }

    #[inline]
    pub fn direction(&self) -> Vec3<f64> {
        self.direction
    }

    #[inline]
    pub fn right(&self) -> Vec3<f64> {
        self.right
    }

    #[inline]
    pub fn up(&self) -> Vec3<f64> {
        self.up
    }

    /// Primary ray through pixel (x, y) of a width×height viewport. Row 0 is
    /// the top of the image.
    pub fn generate_ray(&self, x: u32, y: u32, width: u32, height: u32) -> Ray {
        let ndc_x = 2.0 * x as f64 / width as f64 - 1.0;
        let ndc_y = 1.0 - 2.0 * y as f64 / height as f64;

        let half_height = (self.fov_degrees.to_radians() / 2.0).tan();
        let half_width = half_height * self.aspect_ratio;

        let direction = (self.right.scale(ndc_x * half_width)
            + self.up.scale(ndc_y * half_height)
            + self.direction)
            .unit();

        Ray::new(self.position, direction)
    }

    /// Rotate the view in the horizontal plane. Positive degrees pan right.
    pub fn pan(&mut self, degrees: f64) {
        let angle = -degrees.to_radians();
        let (x, z) = (self.direction.x, self.direction.z);

        self.direction.x = x * angle.cos() - z * angle.sin();
        self.direction.z = x * angle.sin() + z * angle.cos();
        self.direction = self.direction.unit();

        self.right = self.direction.cross(&self.up).unit();
        self.up = self.right.cross(&self.direction).unit();
    }

    /// Rotate the view vertically. Positive degrees tilt up; `right` is held
    /// fixed and `up` re-derived.
    pub fn tilt(&mut self, degrees: f64) {
        let angle = degrees.to_radians();
        let (y, z) = (self.direction.y, self.direction.z);

        self.direction.y = y * angle.cos() - z * angle.sin();
        self.direction.z = y * angle.sin() + z * angle.cos();
        self.direction = self.direction.unit();

        self.up = self.right.cross(&self.direction).unit();
    }

    pub fn move_forward(&mut self, distance: f64) {
        self.position = self.position + self.direction.scale(distance);
    }

    pub fn move_right(&mut self, distance: f64) {
        self.position = self.position + self.right.scale(distance);
    }

    pub fn move_up(&mut self, distance: f64) {
        self.position = self.position + self.up.scale(distance);
    }
}

#[cfg(test)]
fn assert_orthonormal(camera: &Camera) {
    use approx::assert_relative_eq;

    assert_relative_eq!(camera.direction().len(), 1.0, epsilon = 1e-9);
    assert_relative_eq!(camera.right().len(), 1.0, epsilon = 1e-9);
    assert_relative_eq!(camera.up().len(), 1.0, epsilon = 1e-9);
    assert_relative_eq!(camera.direction().dot(&camera.right()), 0.0, epsilon = 1e-9);
    assert_relative_eq!(camera.direction().dot(&camera.up()), 0.0, epsilon = 1e-9);
    assert_relative_eq!(camera.right().dot(&camera.up()), 0.0, epsilon = 1e-9);
}

#[cfg(test)]
fn test_camera() -> Camera {
    Camera::new(
        Vec3::new(0.0, 1.0, -5.0),
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        60.0,
        4.0 / 3.0,
    )
}

#[test]
fn constructed_basis_is_orthonormal() {
    assert_orthonormal(&test_camera());
}

#[test]
fn basis_survives_arbitrary_pan_and_tilt() {
    let mut camera = test_camera();

    camera.pan(37.0);
    assert_orthonormal(&camera);
    camera.tilt(-12.5);
    assert_orthonormal(&camera);
    camera.pan(190.0);
    assert_orthonormal(&camera);
    camera.tilt(85.0);
    assert_orthonormal(&camera);
    camera.pan(-361.0);
    assert_orthonormal(&camera);
}

#[test]
fn center_pixel_looks_along_the_view_direction() {
    use approx::assert_relative_eq;

    let camera = test_camera();
    // Even width/height put pixel (W/2, H/2) exactly at NDC (0, 0).
    let ray = camera.generate_ray(320, 240, 640, 480);

    assert_eq!(camera.position(), ray.origin());
    assert_relative_eq!(ray.direction().x, camera.direction().x, epsilon = 1e-9);
    assert_relative_eq!(ray.direction().y, camera.direction().y, epsilon = 1e-9);
    assert_relative_eq!(ray.direction().z, camera.direction().z, epsilon = 1e-9);
}

#[test]
fn top_of_the_image_is_row_zero() {
    let camera = test_camera();

    let top = camera.generate_ray(320, 0, 640, 480);
    let bottom = camera.generate_ray(320, 479, 640, 480);

    // Higher rows aim higher along the up axis.
    assert!(top.direction().dot(&camera.up()) > 0.0);
    assert!(bottom.direction().dot(&camera.up()) < 0.0);
}

#[test]
fn pan_rotates_the_view_by_the_requested_angle() {
    use approx::assert_relative_eq;

    let mut camera = Camera::new(
        Vec3::new(0.0, 0.0, -5.0),
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        60.0,
        1.0,
    );
    let before = camera.direction();

    camera.pan(30.0);

    // Rotation happens in the horizontal plane, through exactly the angle.
    assert_relative_eq!(
        before.dot(&camera.direction()),
        30.0_f64.to_radians().cos(),
        epsilon = 1e-9
    );
    assert_relative_eq!(camera.direction().y, before.y, epsilon = 1e-9);
}

#[test]
fn tilt_rotates_the_view_by_the_requested_angle() {
    use approx::assert_relative_eq;

    let mut camera = Camera::new(
        Vec3::new(0.0, 0.0, -5.0),
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        60.0,
        1.0,
    );
    let before = camera.direction();

    camera.tilt(20.0);

    assert_relative_eq!(
        before.dot(&camera.direction()),
        20.0_f64.to_radians().cos(),
        epsilon = 1e-9
    );
    // Right is held fixed while tilting.
    assert_eq!(Vec3::new(-1.0, 0.0, 0.0), camera.right());
}

#[test]
fn movement_follows_the_current_basis() {
    let mut camera = test_camera();
    let before = camera.position();

    camera.move_forward(2.0);
    let forward = camera.position() - before;
    assert!((forward.len() - 2.0).abs() < 1e-9);
    assert!(forward.dot(&camera.direction()) > 0.0);

    camera.move_right(-1.0);
    camera.move_up(0.5);
    assert!((camera.position() - before).len() > 2.0);
}
