//! Fixed-size float vectors.
//!
//! All three types are plain `Copy` value types with operator overloads.
//! Only the operations the renderers actually need are provided; this is
//! not a general-purpose linear algebra library.

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// A 2D float vector, used for texture coordinates and screen positions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, rhs: Vec2) -> f32 {
        self.x * rhs.x + self.y * rhs.y
    }

    /// 2D cross product (the z component of the 3D cross of the embedded vectors).
    pub fn cross(self, rhs: Vec2) -> f32 {
        self.x * rhs.y - self.y * rhs.x
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }
}

/// A 3D float vector - positions, directions, normals, and linear colors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Vec3 = Vec3 { x: 1.0, y: 1.0, z: 1.0 };
    pub const X: Vec3 = Vec3 { x: 1.0, y: 0.0, z: 0.0 };
    pub const Y: Vec3 = Vec3 { x: 0.0, y: 1.0, z: 0.0 };
    pub const Z: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 1.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Create a vector with all components set to `v`.
    pub fn splat(v: f32) -> Self {
        Self { x: v, y: v, z: v }
    }

    pub fn dot(self, rhs: Vec3) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(self, rhs: Vec3) -> Vec3 {
        Vec3::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Divide by the Euclidean norm. Undefined for a zero-length vector;
    /// callers guard.
    pub fn normalize(self) -> Vec3 {
        self / self.length()
    }

    /// Componentwise minimum.
    pub fn min(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x.min(rhs.x), self.y.min(rhs.y), self.z.min(rhs.z))
    }

    /// Componentwise maximum.
    pub fn max(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x.max(rhs.x), self.y.max(rhs.y), self.z.max(rhs.z))
    }

    /// Component by axis index (0=X, 1=Y, 2=Z).
    pub fn axis(self, n: usize) -> f32 {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A 4D float vector, used for homogeneous/clip-space coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const ZERO: Vec4 = Vec4 { x: 0.0, y: 0.0, z: 0.0, w: 0.0 };

    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Embed a point (w = 1).
    pub fn from_point(p: Vec3) -> Self {
        Self { x: p.x, y: p.y, z: p.z, w: 1.0 }
    }

    /// Embed a direction (w = 0, translation has no effect).
    pub fn from_direction(d: Vec3) -> Self {
        Self { x: d.x, y: d.y, z: d.z, w: 0.0 }
    }

    pub fn dot(self, rhs: Vec4) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z + self.w * rhs.w
    }

    /// Drop the w component.
    pub fn truncate(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

macro_rules! impl_vector_ops {
    ($type:ty { $($field:ident),+ }) => {
        impl Add for $type {
            type Output = $type;
            fn add(self, rhs: $type) -> $type {
                <$type>::new($(self.$field + rhs.$field),+)
            }
        }

        impl AddAssign for $type {
            fn add_assign(&mut self, rhs: $type) {
                $(self.$field += rhs.$field;)+
            }
        }

        impl Sub for $type {
            type Output = $type;
            fn sub(self, rhs: $type) -> $type {
                <$type>::new($(self.$field - rhs.$field),+)
            }
        }

        impl SubAssign for $type {
            fn sub_assign(&mut self, rhs: $type) {
                $(self.$field -= rhs.$field;)+
            }
        }

        impl Neg for $type {
            type Output = $type;
            fn neg(self) -> $type {
                <$type>::new($(-self.$field),+)
            }
        }

        // Componentwise product (used for albedo modulation).
        impl Mul for $type {
            type Output = $type;
            fn mul(self, rhs: $type) -> $type {
                <$type>::new($(self.$field * rhs.$field),+)
            }
        }

        impl Mul<f32> for $type {
            type Output = $type;
            fn mul(self, rhs: f32) -> $type {
                <$type>::new($(self.$field * rhs),+)
            }
        }

        impl Mul<$type> for f32 {
            type Output = $type;
            fn mul(self, rhs: $type) -> $type {
                <$type>::new($(self * rhs.$field),+)
            }
        }

        impl MulAssign<f32> for $type {
            fn mul_assign(&mut self, rhs: f32) {
                $(self.$field *= rhs;)+
            }
        }

        impl Div<f32> for $type {
            type Output = $type;
            fn div(self, rhs: f32) -> $type {
                <$type>::new($(self.$field / rhs),+)
            }
        }

        impl DivAssign<f32> for $type {
            fn div_assign(&mut self, rhs: f32) {
                $(self.$field /= rhs;)+
            }
        }
    };
}

impl_vector_ops!(Vec2 { x, y });
impl_vector_ops!(Vec3 { x, y, z });
impl_vector_ops!(Vec4 { x, y, z, w });

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_arithmetic() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(2.0 * a, a * 2.0);
        assert_eq!(b / 2.0, Vec3::new(2.0, 2.5, 3.0));
        assert_eq!(-a, Vec3::new(-1.0, -2.0, -3.0));
    }

    #[test]
    fn test_vec3_dot() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a.dot(b), 32.0);
    }

    #[test]
    fn test_vec3_cross_follows_right_hand_rule() {
        assert_eq!(Vec3::X.cross(Vec3::Y), Vec3::Z);
        assert_eq!(Vec3::Y.cross(Vec3::Z), Vec3::X);
        assert_eq!(Vec3::Z.cross(Vec3::X), Vec3::Y);

        // Anti-commutative
        assert_eq!(Vec3::Y.cross(Vec3::X), -Vec3::Z);
    }

    #[test]
    fn test_vec3_normalize() {
        let v = Vec3::new(3.0, 0.0, 4.0).normalize();
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert!((v.x - 0.6).abs() < 1e-6);
        assert!((v.z - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_vec3_componentwise_product() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(0.5, 0.5, 2.0);
        assert_eq!(a * b, Vec3::new(0.5, 1.0, 6.0));
    }

    #[test]
    fn test_vec2_cross_sign() {
        let e1 = Vec2::new(1.0, 0.0);
        let e2 = Vec2::new(0.0, 1.0);
        assert_eq!(e1.cross(e2), 1.0);
        assert_eq!(e2.cross(e1), -1.0);
    }

    #[test]
    fn test_vec4_point_direction() {
        let p = Vec4::from_point(Vec3::new(1.0, 2.0, 3.0));
        let d = Vec4::from_direction(Vec3::new(1.0, 2.0, 3.0));

        assert_eq!(p.w, 1.0);
        assert_eq!(d.w, 0.0);
        assert_eq!(p.truncate(), d.truncate());
    }
}
