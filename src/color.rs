use std::ops::{Add, Mul};

use serde::{Deserialize, Deserializer};

/// Linear RGB with channels nominally in `[0, 1]`. Intermediate shading sums
/// may exceed the range; `clamp` brings a value back before it leaves the
/// tracer.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };

    #[inline]
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub fn scale(&self, factor: f64) -> Color {
        Color {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
        }
    }

    #[inline]
    pub fn clamp(&self) -> Color {
        Color {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
        }
    }

    /// 8-bit RGBA, alpha always opaque.
    #[inline]
    pub fn to_rgba(&self) -> [u8; 4] {
        let c = self.clamp();

        [
            (c.r * 255.0).floor() as u8,
            (c.g * 255.0).floor() as u8,
            (c.b * 255.0).floor() as u8,
            255,
        ]
    }
}

impl Add for Color {
    type Output = Color;

    #[inline]
    fn add(self, other: Color) -> Self::Output {
        Color {
            r: self.r + other.r,
            g: self.g + other.g,
            b: self.b + other.b,
        }
    }
}

impl Mul for Color {
    type Output = Color;

    #[inline]
    fn mul(self, other: Color) -> Self::Output {
        Color {
            r: self.r * other.r,
            g: self.g * other.g,
            b: self.b * other.b,
        }
    }
}

/// Scene files spell colors as `[r, g, b]` triples.
impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(de: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (r, g, b) = Deserialize::deserialize(de)?;

        Ok(Color::new(r, g, b))
    }
}

#[test]
fn clamp_bounds_each_channel() {
    let c = Color::new(1.5, -0.25, 0.5).clamp();

    assert_eq!(Color::new(1.0, 0.0, 0.5), c);
}

#[test]
fn to_rgba_is_opaque_and_floored() {
    assert_eq!([255, 0, 127, 255], Color::new(2.0, -1.0, 0.5).to_rgba());
    assert_eq!([255, 255, 255, 255], Color::WHITE.to_rgba());
}

#[test]
fn deserializes_from_triple() {
    let c: Color = serde_json::from_str("[0.25, 0.5, 1.0]").unwrap();

    assert_eq!(Color::new(0.25, 0.5, 1.0), c);
}
