//! Packed RGB colors and the HSL conversion used for label colors.
//!
//! Label colors travel through the scene as a packed `0xRRGGBB` integer
//! ([`Rgb`]) so they stay comparable and reproducible. Renderers expand them
//! into linear `Vec3`/`Vec4` components when they need to blend.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// A color packed as `0xRRGGBB`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u32);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xffffff);

    /// Pack 8-bit channels.
    pub const fn from_channels(r: u8, g: u8, b: u8) -> Self {
        Rgb(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// The packed value.
    #[inline]
    pub fn hex(self) -> u32 {
        self.0
    }

    /// 8-bit channels as `[r, g, b]`.
    pub fn channels(self) -> [u8; 3] {
        [
            ((self.0 >> 16) & 0xff) as u8,
            ((self.0 >> 8) & 0xff) as u8,
            (self.0 & 0xff) as u8,
        ]
    }

    /// Channels as floats in `0.0..=1.0`.
    pub fn to_vec3(self) -> Vec3 {
        let [r, g, b] = self.channels();
        Vec3::new(r as f32, g as f32, b as f32) / 255.0
    }

    /// Channels with an alpha component.
    pub fn with_alpha(self, alpha: f32) -> Vec4 {
        self.to_vec3().extend(alpha.clamp(0.0, 1.0))
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

impl From<u32> for Rgb {
    fn from(hex: u32) -> Self {
        Rgb(hex & 0x00ff_ffff)
    }
}

/// Convert HSL to a packed color.
///
/// `h` is in degrees (`0..360`), `s` and `l` are percentages (`0..=100`).
/// Channels are rounded half-up to the nearest 8-bit value.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgb {
    let h = h / 360.0;
    let s = s / 100.0;
    let l = l / 100.0;

    let (r, g, b) = if s == 0.0 {
        (l, l, l)
    } else {
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        (
            hue_to_channel(p, q, h + 1.0 / 3.0),
            hue_to_channel(p, q, h),
            hue_to_channel(p, q, h - 1.0 / 3.0),
        )
    };

    Rgb::from_channels(round_channel(r), round_channel(g), round_channel(b))
}

fn hue_to_channel(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 0.5 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

fn round_channel(v: f64) -> u8 {
    (v * 255.0 + 0.5).floor().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 100.0, 50.0), Rgb(0xff0000));
        assert_eq!(hsl_to_rgb(120.0, 100.0, 50.0), Rgb(0x00ff00));
        assert_eq!(hsl_to_rgb(240.0, 100.0, 50.0), Rgb(0x0000ff));
    }

    #[test]
    fn test_hsl_grayscale() {
        // Zero saturation ignores hue
        assert_eq!(hsl_to_rgb(300.0, 0.0, 100.0), Rgb::WHITE);
        assert_eq!(hsl_to_rgb(60.0, 0.0, 0.0), Rgb(0x000000));
    }

    #[test]
    fn test_channels_round_trip() {
        let c = Rgb::from_channels(0x1d, 0xfc, 0xfc);
        assert_eq!(c.hex(), 0x1dfcfc);
        assert_eq!(c.channels(), [0x1d, 0xfc, 0xfc]);
        assert_eq!(c.to_string(), "#1dfcfc");
    }

    #[test]
    fn test_with_alpha_clamps() {
        let v = Rgb::WHITE.with_alpha(2.0);
        assert_eq!(v.w, 1.0);
        assert!((v.x - 1.0).abs() < 1e-6);
    }
}
