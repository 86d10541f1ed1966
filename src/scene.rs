use std::fs::File;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::color::Color;
use crate::geometry::{Geometry, Model, Plane, Sphere};
use crate::intersection::Intersection;
use crate::light::Light;
use crate::material::Material;
use crate::ray::Ray;

/// Errors surfaced while building a scene. The tracer itself assumes a
/// well-formed scene and never validates mid-trace.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("failed to read scene file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed scene document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model {index}: unknown geometry type {kind:?}")]
    UnknownGeometry { index: usize, kind: String },

    #[error("model {index}: missing geometry type")]
    MissingGeometryType { index: usize },

    #[error("model {index}: sphere radius must be positive, got {radius}")]
    InvalidRadius { index: usize, radius: f64 },

    #[error("model {index}: plane normal must be non-zero")]
    DegenerateNormal { index: usize },

    #[error("light {index}: directional light needs a non-zero direction")]
    DegenerateLightDirection { index: usize },
}

/// Flat collection of surfaces and lights. Insertion order does not affect
/// rendering, but iteration is stable so renders are deterministic.
pub struct Scene {
    pub objects: Vec<Model<Box<dyn Geometry + Sync>>>,
    pub lights: Vec<Light>,
    pub background: Color,
}

impl Scene {
    pub fn new(background: Color) -> Self {
        Self {
            objects: Vec::new(),
            lights: Vec::new(),
            background,
        }
    }

    pub fn add_object<G>(&mut self, geometry: G, material: Material)
    where
        G: Geometry + Sync + 'static,
    {
        self.objects.push(Model {
            geometry: Box::new(geometry),
            material,
        });
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn load<P: AsRef<Path>>(path: &P) -> Result<Self, SceneError> {
        let file = File::open(path)?;
        let value: serde_json::Value = serde_json::from_reader(file)?;

        Scene::from_value(&value)
    }

    pub fn from_json(document: &str) -> Result<Self, SceneError> {
        let value: serde_json::Value = serde_json::from_str(document)?;

        Scene::from_value(&value)
    }

    fn from_value(value: &serde_json::Value) -> Result<Self, SceneError> {
        let root = &value["scene"];

        let background = match &root["background"] {
            serde_json::Value::Null => Color::new(0.1, 0.1, 0.1),
            value => Deserialize::deserialize(value)?,
        };

        let mut scene = Scene::new(background);

        for (index, model) in root["models"].as_array().into_iter().flatten().enumerate() {
            let geometry = &model["geometry"];
            let geometry = match geometry["type"].as_str() {
                Some("sphere") => {
                    let sphere: Sphere = Deserialize::deserialize(geometry)?;
                    if sphere.radius <= 0.0 {
                        return Err(SceneError::InvalidRadius {
                            index,
                            radius: sphere.radius,
                        });
                    }
                    Box::new(sphere) as Box<dyn Geometry + Sync>
                }
                Some("plane") => {
                    let mut plane: Plane = Deserialize::deserialize(geometry)?;
                    if plane.normal.len() == 0.0 {
                        return Err(SceneError::DegenerateNormal { index });
                    }
                    plane.normal = plane.normal.unit();
                    Box::new(plane) as Box<dyn Geometry + Sync>
                }
                Some(kind) => {
                    return Err(SceneError::UnknownGeometry {
                        index,
                        kind: kind.to_owned(),
                    })
                }
                None => return Err(SceneError::MissingGeometryType { index }),
            };

            let material: Material = Deserialize::deserialize(&model["material"])?;

            scene.objects.push(Model { geometry, material });
        }

        for (index, value) in root["lights"].as_array().into_iter().flatten().enumerate() {
            let mut light: Light = Deserialize::deserialize(value)?;

            if let Light::Directional { direction, .. } = &mut light {
                if direction.len() == 0.0 {
                    return Err(SceneError::DegenerateLightDirection { index });
                }
                *direction = direction.unit();
            }

            scene.lights.push(light);
        }

        Ok(scene)
    }

    /// Nearest hit over every object: a plain linear scan, first-encountered
    /// wins exact ties.
    pub fn closest_intersection(
        &self,
        ray: &Ray,
    ) -> Option<(&Model<Box<dyn Geometry + Sync>>, Intersection)> {
        let mut nearest = f64::INFINITY;
        let mut closest = None;

        for model in &self.objects {
            if let Some(intersection) = model.geometry.intersection(ray) {
                if intersection.distance < nearest && ray.contains(intersection.distance) {
                    nearest = intersection.distance;
                    closest = Some((model, intersection));
                }
            }
        }

        closest
    }
}

#[cfg(test)]
use crate::vec3::Vec3;

#[test]
fn closest_intersection_picks_the_nearest_object() {
    let mut scene = Scene::new(Color::BLACK);
    scene.add_object(
        Sphere {
            center: Vec3::new(0.0, 0.0, 10.0),
            radius: 1.0,
        },
        Material::new(Color::WHITE),
    );
    scene.add_object(
        Sphere {
            center: Vec3::new(0.0, 0.0, 5.0),
            radius: 1.0,
        },
        Material::new(Color::WHITE),
    );

    let ray = Ray::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0));
    let (_, intersection) = scene.closest_intersection(&ray).unwrap();

    assert!((intersection.distance - 4.0).abs() < 1e-9);
}

#[test]
fn empty_scene_has_no_intersection() {
    let scene = Scene::new(Color::BLACK);
    let ray = Ray::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0));

    assert!(scene.closest_intersection(&ray).is_none());
}

#[test]
fn loads_a_scene_document() {
    let scene = Scene::from_json(
        r#"{
            "scene": {
                "background": [0.2, 0.2, 0.3],
                "models": [
                    {
                        "geometry": {"type": "sphere", "center": {"x": 0.0, "y": 0.0, "z": 5.0}, "radius": 1.0},
                        "material": {"color": [0.9, 0.1, 0.1], "reflection": 0.5}
                    },
                    {
                        "geometry": {"type": "plane", "point": {"x": 0.0, "y": -1.0, "z": 0.0}, "normal": {"x": 0.0, "y": 2.0, "z": 0.0}},
                        "material": {"color": [0.8, 0.8, 0.8]}
                    }
                ],
                "lights": [
                    {"type": "point", "position": {"x": 0.0, "y": 5.0, "z": 0.0}, "color": [1.0, 1.0, 1.0], "intensity": 2.0},
                    {"type": "directional", "direction": {"x": 0.0, "y": -3.0, "z": 0.0}, "color": [1.0, 1.0, 0.9]}
                ]
            }
        }"#,
    )
    .unwrap();

    assert_eq!(2, scene.objects.len());
    assert_eq!(2, scene.lights.len());
    assert_eq!(Color::new(0.2, 0.2, 0.3), scene.background);
    assert_eq!(0.5, scene.objects[0].material.reflection);

    // Directions are normalized once, at load time.
    match &scene.lights[1] {
        Light::Directional { direction, .. } => {
            assert_eq!(Vec3::new(0.0, -1.0, 0.0), *direction)
        }
        Light::Point { .. } => panic!("expected a directional light"),
    }
}

#[test]
fn rejects_a_non_positive_sphere_radius() {
    let result = Scene::from_json(
        r#"{
            "scene": {
                "models": [
                    {
                        "geometry": {"type": "sphere", "center": {"x": 0.0, "y": 0.0, "z": 0.0}, "radius": -1.0},
                        "material": {"color": [1.0, 1.0, 1.0]}
                    }
                ]
            }
        }"#,
    );

    assert!(matches!(
        result,
        Err(SceneError::InvalidRadius { index: 0, radius }) if radius == -1.0
    ));
}

#[test]
fn rejects_an_unknown_geometry_kind() {
    let result = Scene::from_json(
        r#"{
            "scene": {
                "models": [
                    {
                        "geometry": {"type": "torus"},
                        "material": {"color": [1.0, 1.0, 1.0]}
                    }
                ]
            }
        }"#,
    );

    assert!(matches!(
        result,
        Err(SceneError::UnknownGeometry { index: 0, ref kind }) if kind == "torus"
    ));
}

#[test]
fn rejects_an_unknown_light_kind() {
    let result = Scene::from_json(
        r#"{
            "scene": {
                "lights": [
                    {"type": "spot", "position": {"x": 0.0, "y": 0.0, "z": 0.0}, "color": [1.0, 1.0, 1.0]}
                ]
            }
        }"#,
    );

    assert!(matches!(result, Err(SceneError::Json(_))));
}
