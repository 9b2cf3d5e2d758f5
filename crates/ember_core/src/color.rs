//! Packed byte colors.

use ember_math::Vec3;

/// A 4-byte color stored in B,G,R,A channel order, matching the pixel
/// layout of the TGA format so image bytes round-trip without shuffling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { b: 0, g: 0, r: 0, a: 255 };
    pub const WHITE: Color = Color { b: 255, g: 255, r: 255, a: 255 };

    /// Construct from R,G,B,A bytes.
    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }

    /// Construct from an R,G,B float triple. Each component is clamped to
    /// [0, 1], scaled to 255 and rounded. Alpha is opaque.
    pub fn from_rgb_f32(r: f32, g: f32, b: f32) -> Self {
        let quantize = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self {
            b: quantize(b),
            g: quantize(g),
            r: quantize(r),
            a: 255,
        }
    }

    /// Construct from a linear color vector (clamped like `from_rgb_f32`).
    pub fn from_vec3(v: Vec3) -> Self {
        Self::from_rgb_f32(v.x, v.y, v.z)
    }

    /// A pass-through grayscale byte: all three color channels take the
    /// same value.
    pub fn from_gray(v: u8) -> Self {
        Self { b: v, g: v, r: v, a: 255 }
    }

    /// Read from a packed pixel of 1, 3, or 4 bytes in B,G,R,A order.
    /// Other channel counts read as black.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match bytes.len() {
            1 => Self::from_gray(bytes[0]),
            3 => Self { b: bytes[0], g: bytes[1], r: bytes[2], a: 255 },
            4 => Self { b: bytes[0], g: bytes[1], r: bytes[2], a: bytes[3] },
            _ => Self::BLACK,
        }
    }

    /// Write the first `channels` bytes of the packed B,G,R,A layout.
    pub fn write_bytes(&self, out: &mut [u8]) {
        let bytes = [self.b, self.g, self.r, self.a];
        let n = out.len().min(4);
        out[..n].copy_from_slice(&bytes[..n]);
    }

    /// R,G,B as linear floats in [0, 1].
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

impl std::ops::Add for Color {
    type Output = Color;

    /// Channelwise saturating add.
    fn add(self, rhs: Color) -> Color {
        Color {
            b: self.b.saturating_add(rhs.b),
            g: self.g.saturating_add(rhs.g),
            r: self.r.saturating_add(rhs.r),
            a: self.a.saturating_add(rhs.a),
        }
    }
}

impl std::ops::Mul<f32> for Color {
    type Output = Color;

    /// Scale every channel, saturating to [0, 255].
    fn mul(self, rhs: f32) -> Color {
        let scale = |v: u8| (v as f32 * rhs).round().clamp(0.0, 255.0) as u8;
        Color {
            b: scale(self.b),
            g: scale(self.g),
            r: scale(self.r),
            a: scale(self.a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgb_f32_clamps_and_rounds() {
        let c = Color::from_rgb_f32(0.5, 2.0, -1.0);
        assert_eq!(c.r, 128);
        assert_eq!(c.g, 255);
        assert_eq!(c.b, 0);
        assert_eq!(c.a, 255);
    }

    #[test]
    fn test_from_bytes_channel_counts() {
        assert_eq!(Color::from_bytes(&[7]), Color::from_gray(7));
        assert_eq!(Color::from_bytes(&[1, 2, 3]), Color::rgba(3, 2, 1, 255));
        assert_eq!(Color::from_bytes(&[1, 2, 3, 4]), Color::rgba(3, 2, 1, 4));
    }

    #[test]
    fn test_add_saturates() {
        let c = Color::rgba(200, 10, 0, 255) + Color::rgba(100, 10, 5, 255);
        assert_eq!(c, Color::rgba(255, 20, 5, 255));
    }

    #[test]
    fn test_mul_saturates() {
        let c = Color::rgba(100, 200, 4, 255) * 2.0;
        assert_eq!(c, Color::rgba(200, 255, 8, 255));

        let dim = Color::WHITE * 0.5;
        assert_eq!(dim.r, 128);
    }

    #[test]
    fn test_vec3_round_trip() {
        let c = Color::from_vec3(Vec3::new(1.0, 0.0, 0.5));
        let v = c.to_vec3();
        assert!((v.x - 1.0).abs() < 1e-2);
        assert!(v.y.abs() < 1e-2);
        assert!((v.z - 0.5).abs() < 1e-2);
    }
}
