//! Triangle primitive with plane/barycentric ray intersection.

use ember_math::{Aabb, Ray, Vec2, Vec3};

use crate::Material;

/// Rays closer than this along the direction are treated as self-hits.
const HIT_EPSILON: f32 = 1e-4;

/// Near-parallel threshold for the ray/plane test. World-space units; the
/// rasterizer's screen-space degeneracy threshold is intentionally much
/// larger.
const PARALLEL_EPSILON: f32 = 1e-9;

/// Result of a ray-triangle intersection.
///
/// Carries a snapshot of the material so shading never has to reach back
/// into the scene primitive array.
#[derive(Debug, Clone)]
pub struct HitRecord {
    /// Distance along the ray, in units of the ray direction length.
    pub distance: f32,
    /// World-space intersection point.
    pub point: Vec3,
    /// Face normal, flipped to face the ray origin.
    pub normal: Vec3,
    /// Interpolated texture coordinates (zero when the triangle has none).
    pub uv: Vec2,
    pub material: Material,
}

/// A triangle with optional per-vertex attributes and a material.
///
/// The tangent/bitangent pair is shared by the whole triangle.
#[derive(Debug, Clone)]
pub struct Triangle {
    pub positions: [Vec3; 3],
    pub normals: Option<[Vec3; 3]>,
    pub uvs: Option<[Vec2; 3]>,
    pub tangent: Option<(Vec3, Vec3)>,
    pub material: Material,
}

impl Triangle {
    pub fn new(positions: [Vec3; 3], material: Material) -> Self {
        Self {
            positions,
            normals: None,
            uvs: None,
            tangent: None,
            material,
        }
    }

    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for &p in &self.positions {
            bounds.grow(p);
        }
        bounds
    }

    pub fn centroid(&self) -> Vec3 {
        (self.positions[0] + self.positions[1] + self.positions[2]) / 3.0
    }

    /// Barycentric coordinates of `point` projected into the triangle's
    /// plane. Degenerate triangles (parallelogram area near zero) return an
    /// out-of-range sentinel so the caller's sign check rejects the hit.
    pub fn barycentric(&self, point: Vec3) -> Vec3 {
        let v0 = self.positions[1] - self.positions[0];
        let v1 = self.positions[2] - self.positions[0];
        let v2 = point - self.positions[0];

        let d00 = v0.dot(v0);
        let d01 = v0.dot(v1);
        let d11 = v1.dot(v1);
        let d20 = v2.dot(v0);
        let d21 = v2.dot(v1);

        let denom = d00 * d11 - d01 * d01;
        if denom.abs() < PARALLEL_EPSILON {
            return Vec3::new(-1.0, 1.0, 1.0);
        }

        let v = (d11 * d20 - d01 * d21) / denom;
        let w = (d00 * d21 - d01 * d20) / denom;
        Vec3::new(1.0 - v - w, v, w)
    }

    /// Plane intersection followed by a barycentric containment test.
    pub fn intersect(&self, ray: &Ray) -> Option<HitRecord> {
        let edge1 = self.positions[1] - self.positions[0];
        let edge2 = self.positions[2] - self.positions[0];

        let normal = edge1.cross(edge2);
        if normal.length_squared() == 0.0 {
            return None;
        }
        let mut normal = normal.normalize();

        // Face the ray origin.
        if normal.dot(ray.origin - self.positions[0]) < 0.0 {
            normal = -normal;
        }

        let denom = normal.dot(ray.direction);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }

        let t = normal.dot(self.positions[0] - ray.origin) / denom;
        if t < HIT_EPSILON {
            return None;
        }

        let point = ray.at(t);
        let bary = self.barycentric(point);
        if bary.x < 0.0 || bary.y < 0.0 || bary.z < 0.0 {
            return None;
        }

        let uv = match self.uvs {
            Some(uvs) => uvs[0] * bary.x + uvs[1] * bary.y + uvs[2] * bary.z,
            None => Vec2::ZERO,
        };

        Some(HitRecord {
            distance: t,
            point,
            normal,
            uv,
            material: self.material.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Triangle {
        Triangle::new(
            [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            Material::diffuse(Vec3::ONE),
        )
    }

    #[test]
    fn test_barycentric_inside() {
        let tri = unit_triangle();
        let bary = tri.barycentric(Vec3::new(0.25, 0.25, 0.0));

        assert!(bary.x > 0.0 && bary.x < 1.0);
        assert!(bary.y > 0.0 && bary.y < 1.0);
        assert!(bary.z > 0.0 && bary.z < 1.0);
        assert!((bary.x + bary.y + bary.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_barycentric_outside_has_negative_component() {
        let tri = unit_triangle();
        let bary = tri.barycentric(Vec3::new(2.0, 2.0, 0.0));
        assert!(bary.x < 0.0 || bary.y < 0.0 || bary.z < 0.0);
    }

    #[test]
    fn test_barycentric_degenerate_sentinel() {
        let tri = Triangle::new([Vec3::ZERO, Vec3::ZERO, Vec3::ZERO], Material::default());
        let bary = tri.barycentric(Vec3::new(0.5, 0.5, 0.0));
        assert!(bary.x < 0.0);
    }

    #[test]
    fn test_intersect_hit() {
        let tri = unit_triangle();
        let ray = Ray::new(Vec3::new(0.25, 0.25, -2.0), Vec3::Z);

        let hit = tri.intersect(&ray).expect("ray hits the triangle");
        assert!((hit.distance - 2.0).abs() < 1e-5);
        assert!((hit.point - Vec3::new(0.25, 0.25, 0.0)).length() < 1e-5);
        // Normal faces back toward the ray origin.
        assert!(hit.normal.dot(ray.direction) < 0.0);
    }

    #[test]
    fn test_intersect_miss_and_behind() {
        let tri = unit_triangle();

        // Outside the triangle
        let ray = Ray::new(Vec3::new(2.0, 2.0, -1.0), Vec3::Z);
        assert!(tri.intersect(&ray).is_none());

        // Triangle behind the origin
        let ray = Ray::new(Vec3::new(0.25, 0.25, -1.0), -Vec3::Z);
        assert!(tri.intersect(&ray).is_none());

        // Near-parallel ray
        let ray = Ray::new(Vec3::new(-5.0, 0.25, 0.0), Vec3::X);
        assert!(tri.intersect(&ray).is_none());
    }

    #[test]
    fn test_intersect_interpolates_uv() {
        let mut tri = unit_triangle();
        tri.uvs = Some([
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
        ]);

        let ray = Ray::new(Vec3::new(0.5, 0.25, 1.0), -Vec3::Z);
        let hit = tri.intersect(&ray).unwrap();
        assert!((hit.uv.x - 0.5).abs() < 1e-5);
        assert!((hit.uv.y - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_bounds_and_centroid() {
        let tri = unit_triangle();
        let bounds = tri.bounds();

        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 0.0));
        assert!((tri.centroid() - Vec3::new(1.0 / 3.0, 1.0 / 3.0, 0.0)).length() < 1e-6);
    }
}
