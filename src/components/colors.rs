// ============================================================================
// COLORS: RGBA value type shared by the buffer, instruments and marquee
// ============================================================================

use egui::Color32;
use image::Rgba;
use serde::{Deserialize, Serialize};

/// Straight (non-premultiplied) 8-bit RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// Tolerance comparison: every channel's `|Δ| / 255` must be `<= deviation`.
    ///
    /// Reflexive and symmetric, but NOT transitive once `deviation > 0`.
    pub fn is_equal(&self, other: &Color, deviation: f32) -> bool {
        let within = |a: u8, b: u8| (a as f32 - b as f32).abs() / 255.0 <= deviation;
        within(self.r, other.r)
            && within(self.g, other.g)
            && within(self.b, other.b)
            && within(self.a, other.a)
    }

    /// Flatten alpha onto white: `out = c·a/255 + 255·(1 − a/255)`.
    pub fn to_opaque(&self) -> Color {
        if self.a == 255 {
            return *self;
        }
        let ratio = self.a as f32 / 255.0;
        let flatten = |c: u8| (c as f32 * ratio + 255.0 * (1.0 - ratio)).round() as u8;
        Color::rgb(flatten(self.r), flatten(self.g), flatten(self.b))
    }

    pub fn to_array(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(c: [u8; 4]) -> Self {
        Self::rgba(c[0], c[1], c[2], c[3])
    }

    /// Serialize as "r,g,b,a"
    pub fn to_config_string(&self) -> String {
        format!("{},{},{},{}", self.r, self.g, self.b, self.a)
    }

    /// Parse "r,g,b,a" (alpha optional, defaults to 255)
    pub fn from_config_string(s: &str) -> Option<Color> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }
        let r = parts[0].trim().parse::<u8>().ok()?;
        let g = parts[1].trim().parse::<u8>().ok()?;
        let b = parts[2].trim().parse::<u8>().ok()?;
        let a = match parts.get(3) {
            Some(a) => a.trim().parse::<u8>().ok()?,
            None => 255,
        };
        Some(Color::rgba(r, g, b, a))
    }
}

impl From<Rgba<u8>> for Color {
    fn from(px: Rgba<u8>) -> Self {
        Color::from_array(px.0)
    }
}

impl From<Color> for Rgba<u8> {
    fn from(c: Color) -> Self {
        Rgba(c.to_array())
    }
}

impl From<Color> for Color32 {
    fn from(c: Color) -> Self {
        Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
    }
}
