//! Surface description for the path tracer.

use ember_math::Vec3;

/// How a surface emits or scatters light.
///
/// A single uniform random number picks the scattering branch: values below
/// `specular_rate` reflect, values between `specular_rate` and
/// `refract_rate` refract, everything else scatters diffusely. Emissive
/// surfaces end the path and return `color` directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    /// True for light sources; `color` is the emitted radiance.
    pub emissive: bool,

    /// Base albedo (or emitted radiance for emissive surfaces).
    pub color: Vec3,

    /// Name of an albedo texture in the scene texture table.
    pub texture: Option<String>,

    /// Probability threshold for mirror reflection.
    pub specular_rate: f32,

    /// Upper probability threshold for refraction.
    pub refract_rate: f32,

    /// Blend toward the random hemisphere direction after reflection.
    pub roughness: f32,

    /// Blend toward the negated random direction after refraction.
    pub refract_roughness: f32,
}

impl Material {
    /// A purely diffuse surface.
    pub fn diffuse(color: Vec3) -> Self {
        Self { color, ..Default::default() }
    }

    /// A diffuse surface with an albedo texture from the scene table.
    pub fn textured(color: Vec3, texture: impl Into<String>) -> Self {
        Self {
            color,
            texture: Some(texture.into()),
            ..Default::default()
        }
    }

    /// A light source emitting `color`.
    pub fn light(color: Vec3) -> Self {
        Self { emissive: true, color, ..Default::default() }
    }

    /// A mirror with the given roughness (0 = perfect).
    pub fn mirror(color: Vec3, roughness: f32) -> Self {
        Self {
            color,
            specular_rate: 1.0,
            refract_rate: 1.0,
            roughness: roughness.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    /// A refractive surface (glass-like).
    pub fn glass(color: Vec3, refract_roughness: f32) -> Self {
        Self {
            color,
            specular_rate: 0.0,
            refract_rate: 1.0,
            refract_roughness: refract_roughness.clamp(0.0, 1.0),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_thresholds() {
        let m = Material::mirror(Vec3::ONE, 0.1);
        assert_eq!(m.specular_rate, 1.0);

        let g = Material::glass(Vec3::ONE, 0.0);
        assert_eq!(g.specular_rate, 0.0);
        assert_eq!(g.refract_rate, 1.0);

        let d = Material::diffuse(Vec3::ONE);
        assert_eq!(d.specular_rate, 0.0);
        assert_eq!(d.refract_rate, 0.0);
        assert!(!d.emissive);
    }

    #[test]
    fn test_light_is_emissive() {
        let l = Material::light(Vec3::splat(4.0));
        assert!(l.emissive);
        assert_eq!(l.color, Vec3::splat(4.0));
    }
}
