use serde::Deserialize;

use crate::color::Color;
use crate::vec3::Vec3;

/// Quadratic falloff damping for point lights; keeps near-field intensity
/// from blowing up.
const FALLOFF_DAMPING: f64 = 0.01;

/// An emitter. Directional lights store the direction the light travels,
/// i.e. pointing from the source into the scene.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Light {
    Point {
        position: Vec3<f64>,
        color: Color,
        #[serde(default = "default_intensity")]
        intensity: f64,
    },
    Directional {
        direction: Vec3<f64>,
        color: Color,
        #[serde(default = "default_intensity")]
        intensity: f64,
    },
}

fn default_intensity() -> f64 {
    1.0
}

/// What a single light contributes at one surface point.
#[derive(Copy, Clone, Debug)]
pub struct Illumination {
    /// Unit vector from the surface point toward the light.
    pub direction: Vec3<f64>,
    /// Distance to the emitter; infinite for directional lights.
    pub distance: f64,
    /// Intensity after distance falloff.
    pub intensity: f64,
    pub color: Color,
}

impl Light {
    pub fn illuminate(&self, point: Vec3<f64>) -> Illumination {
        match self {
            Light::Point {
                position,
                color,
                intensity,
            } => {
                let to_light = *position - point;
                let distance = to_light.len();

                Illumination {
                    direction: to_light.unit(),
                    distance,
                    intensity: intensity / (1.0 + FALLOFF_DAMPING * distance * distance),
                    color: *color,
                }
            }
            Light::Directional {
                direction,
                color,
                intensity,
            } => Illumination {
                direction: direction.inverse(),
                distance: f64::INFINITY,
                intensity: *intensity,
                color: *color,
            },
        }
    }
}

#[test]
fn point_light_attenuates_with_distance() {
    let light = Light::Point {
        position: Vec3::new(0.0, 10.0, 0.0),
        color: Color::WHITE,
        intensity: 1.0,
    };

    let near = light.illuminate(Vec3::new(0.0, 9.0, 0.0));
    let far = light.illuminate(Vec3::new(0.0, 0.0, 0.0));

    assert_eq!(Vec3::new(0.0, 1.0, 0.0), near.direction);
    assert_eq!(1.0, near.distance);
    assert!((near.intensity - 1.0 / 1.01).abs() < 1e-12);
    assert_eq!(10.0, far.distance);
    assert!((far.intensity - 0.5).abs() < 1e-12);
    assert!(near.intensity > far.intensity);
}

#[test]
fn directional_light_points_back_at_the_source() {
    let light = Light::Directional {
        direction: Vec3::new(0.0, -1.0, 0.0),
        color: Color::WHITE,
        intensity: 0.8,
    };

    let illumination = light.illuminate(Vec3::new(5.0, 0.0, 5.0));

    assert_eq!(Vec3::new(0.0, 1.0, 0.0), illumination.direction);
    assert_eq!(f64::INFINITY, illumination.distance);
    assert_eq!(0.8, illumination.intensity);
}

#[test]
fn light_kind_comes_from_the_type_tag() {
    let light: Light = serde_json::from_str(
        r#"{"type": "point", "position": {"x": 0.0, "y": 1.0, "z": 0.0}, "color": [1.0, 1.0, 1.0]}"#,
    )
    .unwrap();

    match light {
        Light::Point { intensity, .. } => assert_eq!(1.0, intensity),
        Light::Directional { .. } => panic!("expected a point light"),
    }

    assert!(serde_json::from_str::<Light>(r#"{"type": "spot"}"#).is_err());
}
