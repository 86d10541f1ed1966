use std::f64::consts::PI;
use std::fmt::Debug;
use std::sync::Arc;

use serde::Deserialize;

use crate::color::Color;
use crate::vec3::Vec3;

/// Optional surface pattern sampled in UV space, `u, v ∈ [0, 1]`.
pub trait Texture: Debug + Send + Sync {
    fn color_at(&self, u: f64, v: f64) -> Color;
}

/// Phong reflectance parameters of a surface.
#[derive(Clone, Debug, Deserialize)]
pub struct Material {
    pub color: Color,
    #[serde(default = "default_diffuse")]
    pub diffuse: f64,
    #[serde(default = "default_specular")]
    pub specular: f64,
    #[serde(default = "default_ambient")]
    pub ambient: f64,
    #[serde(default = "default_shininess")]
    pub shininess: f64,
    #[serde(default)]
    pub reflection: f64,
    #[serde(default)]
    pub transparency: f64,
    #[serde(default = "default_refractive_index")]
    pub refractive_index: f64,
    /// Injected by the caller, not part of the scene document.
    #[serde(skip)]
    pub texture: Option<Arc<dyn Texture>>,
}

fn default_diffuse() -> f64 {
    0.7
}

fn default_specular() -> f64 {
    0.3
}

fn default_ambient() -> f64 {
    0.1
}

fn default_shininess() -> f64 {
    32.0
}

fn default_refractive_index() -> f64 {
    1.5
}

impl Material {
    /// Plain colored material with default coefficients.
    pub fn new(color: Color) -> Self {
        Self {
            color,
            diffuse: default_diffuse(),
            specular: default_specular(),
            ambient: default_ambient(),
            shininess: default_shininess(),
            reflection: 0.0,
            transparency: 0.0,
            refractive_index: default_refractive_index(),
            texture: None,
        }
    }

    pub fn with_texture(mut self, texture: Arc<dyn Texture>) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Base color at a surface point. With a texture attached the unit normal
    /// is spherically mapped to UV; the mapping holds for any unit normal, no
    /// matter which geometry produced it.
    pub fn surface_color(&self, normal: &Vec3<f64>) -> Color {
        match &self.texture {
            Some(texture) => {
                let u = normal.z.atan2(normal.x) / (2.0 * PI) + 0.5;
                let v = normal.y.asin() / PI + 0.5;

                texture.color_at(u, v)
            }
            None => self.color,
        }
    }
}

/// Two-tone square pattern. `scale` counts squares per unit of UV.
#[derive(Clone, Debug)]
pub struct Checkerboard {
    pub even: Color,
    pub odd: Color,
    pub scale: f64,
}

impl Texture for Checkerboard {
    fn color_at(&self, u: f64, v: f64) -> Color {
        let cell = (u * self.scale).floor() + (v * self.scale).floor();

        if cell.rem_euclid(2.0) == 0.0 {
            self.even
        } else {
            self.odd
        }
    }
}

#[test]
fn coefficients_default_from_partial_document() {
    let material: Material = serde_json::from_str(r#"{"color": [1.0, 0.0, 0.0]}"#).unwrap();

    assert_eq!(Color::new(1.0, 0.0, 0.0), material.color);
    assert_eq!(0.7, material.diffuse);
    assert_eq!(0.3, material.specular);
    assert_eq!(0.1, material.ambient);
    assert_eq!(32.0, material.shininess);
    assert_eq!(0.0, material.reflection);
    assert_eq!(0.0, material.transparency);
    assert_eq!(1.5, material.refractive_index);
    assert!(material.texture.is_none());
}

#[test]
fn surface_color_without_texture_is_the_base_color() {
    let material = Material::new(Color::new(0.2, 0.4, 0.6));

    assert_eq!(
        Color::new(0.2, 0.4, 0.6),
        material.surface_color(&Vec3::new(0.0, 1.0, 0.0))
    );
}

#[test]
fn spherical_mapping_places_poles_and_equator() {
    let checker = Arc::new(Checkerboard {
        even: Color::BLACK,
        odd: Color::WHITE,
        scale: 2.0,
    });
    let material = Material::new(Color::WHITE).with_texture(checker);

    // +x maps to (0.5, 0.5), the poles to v = 1 and v = 0.
    let center = material.surface_color(&Vec3::new(1.0, 0.0, 0.0));
    let north = material.surface_color(&Vec3::new(0.0, 1.0, 0.0));
    let south = material.surface_color(&Vec3::new(0.0, -1.0, 0.0));

    assert_eq!(Color::BLACK, center);
    assert_eq!(Color::WHITE, north);
    assert_eq!(Color::WHITE, south);
}
