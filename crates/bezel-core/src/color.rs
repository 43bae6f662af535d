use serde::{Deserialize, Serialize};

/// Linear RGBA colour, each channel in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Rgba {
    fn default() -> Self {
        Self::GREY
    }
}

impl Rgba {
    pub const GREY: Self = Self::rgba(0.5, 0.5, 0.5, 1.0);
    pub const HIGHLIGHT: Self = Self::rgba(0.4, 0.4, 0.4, 0.8);
    pub const FLIGHT_PATH: Self = Self::rgba(1.0, 0.0, 0.2, 0.6);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(&self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..*self
        }
    }

    /// Scale the alpha channel, keeping it inside `[0, 1]`.
    pub fn fade(&self, factor: f32) -> Self {
        self.with_alpha(self.a * factor)
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [c(self.r), c(self.g), c(self.b), c(self.a)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_clamps() {
        let c = Rgba::rgba(1.0, 0.0, 0.0, 0.5);
        assert!((c.fade(0.5).a - 0.25).abs() < 1e-6);
        assert_eq!(c.fade(4.0).a, 1.0);
        assert_eq!(c.fade(-1.0).a, 0.0);
    }

    #[test]
    fn test_to_rgba8() {
        assert_eq!(Rgba::GREY.to_rgba8(), [128, 128, 128, 255]);
    }
}
