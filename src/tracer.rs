use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;

use crate::camera::Camera;
use crate::color::Color;
use crate::intersection::Intersection;
use crate::light::Illumination;
use crate::material::Material;
use crate::ray::{Ray, EPSILON};
use crate::scene::Scene;
use crate::vec3::Vec3;

/// Hard ceiling on recursion. `RenderSettings::max_depth` may lower the
/// bound but never raise it past this.
pub const MAX_TRACE_DEPTH: u16 = 5;

/// Per-render configuration, passed in explicitly so renders stay
/// deterministic and testable in isolation.
#[derive(Copy, Clone, Debug)]
pub struct RenderSettings {
    pub shadows: bool,
    pub max_depth: u16,
    pub refraction: bool,
    /// Reserved. Rendering is one primary ray per pixel.
    pub samples_per_pixel: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            shadows: true,
            max_depth: 3,
            refraction: true,
            samples_per_pixel: 1,
        }
    }
}

/// Optional hook notified for every nearest-hit query the tracer makes.
pub trait TraceObserver: Sync {
    fn ray_hit(&self) {}
    fn ray_miss(&self) {}
}

/// Observer that tallies hits and misses.
#[derive(Debug, Default)]
pub struct HitCounter {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl HitCounter {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl TraceObserver for HitCounter {
    fn ray_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn ray_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }
}

/// Whitted-style recursive tracer over a read-only scene.
pub struct Tracer<'a> {
    scene: &'a Scene,
    settings: RenderSettings,
    observer: Option<&'a dyn TraceObserver>,
}

impl<'a> Tracer<'a> {
    pub fn new(scene: &'a Scene, settings: RenderSettings) -> Self {
        Self {
            scene,
            settings,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn TraceObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    fn depth_limit(&self) -> u16 {
        self.settings.max_depth.min(MAX_TRACE_DEPTH)
    }

    /// Color seen along `ray`. Primary rays start at depth 0; each bounce
    /// recurses one level deeper until the depth limit returns the
    /// background.
    pub fn trace(&self, ray: &Ray, depth: u16) -> Color {
        if depth > self.depth_limit() {
            return self.scene.background;
        }

        let (model, intersection) = match self.scene.closest_intersection(ray) {
            Some(hit) => {
                if let Some(observer) = self.observer {
                    observer.ray_hit();
                }
                hit
            }
            None => {
                if let Some(observer) = self.observer {
                    observer.ray_miss();
                }
                return self.scene.background;
            }
        };

        let material = &model.material;
        let normal = intersection.normal;
        let mut color = self.shade(ray, &intersection, material);

        if material.reflection > 0.0 {
            let direction = reflect(ray.direction(), &normal);
            // Nudged off the surface along the normal so the bounce cannot
            // immediately re-intersect it.
            let origin = intersection.point + normal.scale(EPSILON);
            let reflected = self.trace(&Ray::new(origin, direction), depth + 1);

            let k = material.reflection;
            color = color.scale(1.0 - k) + reflected.scale(k);
        }

        if self.settings.refraction && material.transparency > 0.0 {
            let fresnel = fresnel_reflectance(ray.direction(), &normal, material.refractive_index);

            // Past the critical angle there is no transmitted ray and the
            // transparency term contributes nothing.
            if let Some(direction) = refract(ray.direction(), &normal, material.refractive_index) {
                let origin = intersection.point - normal.scale(EPSILON);
                let refracted = self.trace(&Ray::new(origin, direction), depth + 1);

                let k = material.transparency * (1.0 - fresnel);
                color = color.scale(1.0 - k) + refracted.scale(k);
            }
        }

        color.clamp()
    }

    /// Phong local illumination: ambient plus, for every light the point can
    /// see, a diffuse and a specular term.
    fn shade(&self, ray: &Ray, intersection: &Intersection, material: &Material) -> Color {
        let surface = material.surface_color(&intersection.normal);
        let mut color = surface.scale(material.ambient);

        for light in &self.scene.lights {
            let illumination = light.illuminate(intersection.point);

            if self.settings.shadows && self.occluded(intersection.point, &illumination) {
                continue;
            }

            let lambert = intersection.normal.dot(&illumination.direction).max(0.0);
            color = color
                + (surface * illumination.color)
                    .scale(material.diffuse * lambert * illumination.intensity);

            let highlight = reflect(&illumination.direction, &intersection.normal)
                .dot(ray.direction())
                .max(0.0);
            color = color
                + illumination.color.scale(
                    highlight.powf(material.shininess)
                        * material.specular
                        * illumination.intensity,
                );
        }

        color.clamp()
    }

    /// Anything between the point and the light blocks it entirely.
    fn occluded(&self, point: Vec3<f64>, illumination: &Illumination) -> bool {
        let shadow_ray = Ray::bounded(point, illumination.direction, EPSILON..illumination.distance);

        self.scene.closest_intersection(&shadow_ray).is_some()
    }

    /// Render into a dense row-major RGBA8 buffer, one primary ray per
    /// pixel. Pixels are independent, so they are traced in parallel.
    pub fn render_into(&self, camera: &Camera, width: u32, height: u32, framebuffer: &mut [u8]) {
        assert_eq!(framebuffer.len(), (width * height * 4) as usize);

        framebuffer
            .par_chunks_mut(4)
            .enumerate()
            .for_each(|(n, pixel)| {
                let x = n as u32 % width;
                let y = n as u32 / width;

                let ray = camera.generate_ray(x, y, width, height);
                let color = self.trace(&ray, 0);

                pixel.copy_from_slice(&color.to_rgba());
            });
    }

    pub fn render(&self, camera: &Camera, width: u32, height: u32) -> Vec<u8> {
        let mut framebuffer = vec![0; (width * height * 4) as usize];
        self.render_into(camera, width, height, &mut framebuffer);

        framebuffer
    }
}

/// Mirror `direction` about `normal`.
#[inline]
pub fn reflect(direction: &Vec3<f64>, normal: &Vec3<f64>) -> Vec3<f64> {
    *direction - normal.scale(2.0 * direction.dot(normal))
}

/// Snell's law. Returns the transmitted direction, or `None` past the
/// critical angle (total internal reflection).
pub fn refract(
    direction: &Vec3<f64>,
    normal: &Vec3<f64>,
    refractive_index: f64,
) -> Option<Vec3<f64>> {
    let mut cosi = direction.dot(normal).clamp(-1.0, 1.0);
    let mut etai = 1.0;
    let mut etat = refractive_index;
    let mut n = *normal;

    if cosi < 0.0 {
        // Entering the surface.
        cosi = -cosi;
    } else {
        // Exiting: indices swap and the normal flips inward.
        std::mem::swap(&mut etai, &mut etat);
        n = n.inverse();
    }

    let eta = etai / etat;
    let k = 1.0 - eta * eta * (1.0 - cosi * cosi);
    if k <= 0.0 {
        return None;
    }

    Some((direction.scale(eta) + n.scale(eta * cosi - k.sqrt())).unit())
}

/// Exact dielectric Fresnel reflectance (average of the s- and p-polarized
/// terms), 1.0 past the critical angle.
pub fn fresnel_reflectance(direction: &Vec3<f64>, normal: &Vec3<f64>, refractive_index: f64) -> f64 {
    let cosi = direction.dot(normal).clamp(-1.0, 1.0);
    let (etai, etat) = if cosi > 0.0 {
        (refractive_index, 1.0)
    } else {
        (1.0, refractive_index)
    };

    let sint = etai / etat * (1.0 - cosi * cosi).max(0.0).sqrt();
    if sint >= 1.0 {
        return 1.0;
    }

    let cost = (1.0 - sint * sint).max(0.0).sqrt();
    let cosi = cosi.abs();
    let rs = (etat * cosi - etai * cost) / (etat * cosi + etai * cost);
    let rp = (etai * cosi - etat * cost) / (etai * cosi + etat * cost);

    (rs * rs + rp * rp) / 2.0
}

#[cfg(test)]
use crate::geometry::{Plane, Sphere};
#[cfg(test)]
use crate::light::Light;

#[cfg(test)]
fn single_sphere_scene() -> Scene {
    let mut scene = Scene::new(Color::new(0.1, 0.2, 0.3));
    scene.add_object(
        Sphere {
            center: Vec3::new(0.0, 0.0, 5.0),
            radius: 1.0,
        },
        Material::new(Color::new(0.9, 0.2, 0.2)),
    );
    scene.add_light(Light::Point {
        position: Vec3::new(0.0, 5.0, 0.0),
        color: Color::WHITE,
        intensity: 1.0,
    });

    scene
}

#[test]
fn fresnel_at_normal_incidence_is_four_percent() {
    let reflectance =
        fresnel_reflectance(&Vec3::new(0.0, -1.0, 0.0), &Vec3::new(0.0, 1.0, 0.0), 1.5);

    assert!((reflectance - 0.04).abs() < 1e-3);
}

#[test]
fn fresnel_past_the_critical_angle_is_total() {
    // Leaving glass at a grazing angle.
    let direction = Vec3::new(1.0, 0.2, 0.0).unit();
    let reflectance = fresnel_reflectance(&direction, &Vec3::new(0.0, 1.0, 0.0), 1.5);

    assert_eq!(1.0, reflectance);
}

#[test]
fn refraction_at_normal_incidence_goes_straight_through() {
    let direction =
        refract(&Vec3::new(0.0, -1.0, 0.0), &Vec3::new(0.0, 1.0, 0.0), 1.5).unwrap();

    assert!((direction.x - 0.0).abs() < 1e-9);
    assert!((direction.y - -1.0).abs() < 1e-9);
    assert!((direction.z - 0.0).abs() < 1e-9);
}

#[test]
fn refraction_bends_toward_the_normal_on_entry() {
    let incident = Vec3::new(1.0, -1.0, 0.0).unit();
    let normal = Vec3::new(0.0, 1.0, 0.0);

    let transmitted = refract(&incident, &normal, 1.5).unwrap();

    // sin of the transmitted angle shrinks by the index ratio.
    let sin_in = incident.x;
    let sin_out = transmitted.x;
    assert!((sin_out - sin_in / 1.5).abs() < 1e-9);
    assert!(transmitted.y < 0.0);
}

#[test]
fn total_internal_reflection_has_no_transmitted_ray() {
    let direction = Vec3::new(1.0, 0.2, 0.0).unit();

    assert!(refract(&direction, &Vec3::new(0.0, 1.0, 0.0), 1.5).is_none());
}

#[test]
fn reflect_mirrors_about_the_normal() {
    let reflected = reflect(&Vec3::new(1.0, -1.0, 0.0), &Vec3::new(0.0, 1.0, 0.0));

    assert_eq!(Vec3::new(1.0, 1.0, 0.0), reflected);
}

#[test]
fn empty_scene_traces_to_the_exact_background() {
    let background = Color::new(0.25, 0.5, 0.75);
    let scene = Scene::new(background);
    let tracer = Tracer::new(&scene, RenderSettings::default());

    let ray = Ray::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0));

    assert_eq!(background, tracer.trace(&ray, 0));
}

#[test]
fn exhausted_depth_returns_the_background() {
    let scene = single_sphere_scene();
    let settings = RenderSettings {
        max_depth: 20,
        ..RenderSettings::default()
    };
    let tracer = Tracer::new(&scene, settings);
    let ray = Ray::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0));

    // The configured bound is clamped to the hard ceiling.
    assert_ne!(scene.background, tracer.trace(&ray, MAX_TRACE_DEPTH));
    assert_eq!(scene.background, tracer.trace(&ray, MAX_TRACE_DEPTH + 1));
}

#[test]
fn traced_channels_stay_in_unit_range() {
    let mut scene = single_sphere_scene();
    for _ in 0..4 {
        scene.add_light(Light::Point {
            position: Vec3::new(0.0, 0.0, 0.0),
            color: Color::WHITE,
            intensity: 1000.0,
        });
    }
    let tracer = Tracer::new(&scene, RenderSettings::default());

    let ray = Ray::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0));
    let color = tracer.trace(&ray, 0);

    for channel in [color.r, color.g, color.b] {
        assert!((0.0..=1.0).contains(&channel));
    }
}

#[test]
fn disabling_shadows_never_darkens_a_point() {
    let mut scene = Scene::new(Color::BLACK);
    scene.add_object(
        Plane {
            point: Vec3::new(0.0, 0.0, 0.0),
            normal: Vec3::new(0.0, 1.0, 0.0),
        },
        Material::new(Color::WHITE),
    );
    // Occluder between the floor and the light.
    scene.add_object(
        Sphere {
            center: Vec3::new(0.0, 2.0, 0.0),
            radius: 0.5,
        },
        Material::new(Color::WHITE),
    );
    scene.add_light(Light::Point {
        position: Vec3::new(0.0, 4.0, 0.0),
        color: Color::WHITE,
        intensity: 2.0,
    });

    // Grazes past the occluder and lands on the floor right below it.
    let ray = Ray::new(Vec3::new(3.0, 3.0, 0.0), Vec3::new(-3.0, -3.0, 0.0).unit());

    let shadowed = Tracer::new(&scene, RenderSettings::default()).trace(&ray, 0);
    let unshadowed = Tracer::new(
        &scene,
        RenderSettings {
            shadows: false,
            ..RenderSettings::default()
        },
    )
    .trace(&ray, 0);

    assert!(unshadowed.r >= shadowed.r);
    assert!(unshadowed.g >= shadowed.g);
    assert!(unshadowed.b >= shadowed.b);
    assert!(unshadowed.r > shadowed.r);
}

#[test]
fn mirror_floor_picks_up_the_ceiling_color() {
    let mut scene = Scene::new(Color::BLACK);

    let mut mirror = Material::new(Color::new(0.5, 0.5, 0.5));
    mirror.reflection = 1.0;
    scene.add_object(
        Plane {
            point: Vec3::new(0.0, 0.0, 0.0),
            normal: Vec3::new(0.0, 1.0, 0.0),
        },
        mirror,
    );

    let mut glowing_red = Material::new(Color::new(1.0, 0.0, 0.0));
    glowing_red.ambient = 1.0;
    scene.add_object(
        Plane {
            point: Vec3::new(0.0, 10.0, 0.0),
            normal: Vec3::new(0.0, -1.0, 0.0),
        },
        glowing_red,
    );

    let ray = Ray::new(Vec3::new(0.0, 1.0, -1.0), Vec3::new(0.0, -1.0, 1.0).unit());
    let color = Tracer::new(&scene, RenderSettings::default()).trace(&ray, 0);

    // The bounce off the floor lands on the red ceiling.
    assert!(color.r > 0.5);
    assert!(color.g < 0.1);
    assert!(color.b < 0.1);
}

#[test]
fn glass_sphere_transmits_the_background() {
    let mut scene = Scene::new(Color::new(0.0, 0.0, 1.0));

    let mut glass = Material::new(Color::WHITE);
    glass.transparency = 1.0;
    glass.ambient = 0.0;
    glass.diffuse = 0.0;
    glass.specular = 0.0;
    scene.add_object(
        Sphere {
            center: Vec3::new(0.0, 0.0, 5.0),
            radius: 1.0,
        },
        glass,
    );

    let ray = Ray::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0));

    let with_refraction = Tracer::new(&scene, RenderSettings::default()).trace(&ray, 0);
    let without = Tracer::new(
        &scene,
        RenderSettings {
            refraction: false,
            ..RenderSettings::default()
        },
    )
    .trace(&ray, 0);

    // At normal incidence ~96% of the background makes it through.
    assert!(with_refraction.b > 0.8);
    assert_eq!(Color::BLACK, without);
}

#[test]
fn rendering_twice_is_bit_identical() {
    let scene = single_sphere_scene();
    let camera = Camera::new(
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 5.0),
        Vec3::new(0.0, 1.0, 0.0),
        60.0,
        1.0,
    );
    let tracer = Tracer::new(&scene, RenderSettings::default());

    let first = tracer.render(&camera, 16, 16);
    let second = tracer.render(&camera, 16, 16);

    assert_eq!(first, second);
}

#[test]
fn framebuffer_is_rgba_with_opaque_alpha() {
    let scene = single_sphere_scene();
    let camera = Camera::new(
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 5.0),
        Vec3::new(0.0, 1.0, 0.0),
        60.0,
        1.0,
    );
    let counter = HitCounter::default();
    let tracer = Tracer::new(&scene, RenderSettings::default()).with_observer(&counter);

    let pixels = tracer.render(&camera, 8, 8);

    assert_eq!(8 * 8 * 4, pixels.len());
    assert!(pixels.chunks(4).all(|pixel| pixel[3] == 255));
    // Every primary ray either hit the sphere or escaped to the background.
    assert_eq!(64, counter.hits() + counter.misses());
}
