//! Axis-aligned bounding boxes for the BVH.

use crate::{Ray, Vec3};

/// An axis-aligned box given by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// The empty box: grows correctly under `grow`/`union`, contains nothing.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3 { x: f32::INFINITY, y: f32::INFINITY, z: f32::INFINITY },
        max: Vec3 { x: f32::NEG_INFINITY, y: f32::NEG_INFINITY, z: f32::NEG_INFINITY },
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The box spanning two arbitrary corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self { min: a.min(b), max: a.max(b) }
    }

    /// Expand the box to contain `point`.
    pub fn grow(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// The smallest box containing both inputs.
    pub fn union(a: &Aabb, b: &Aabb) -> Aabb {
        Aabb {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    pub fn contains_box(&self, other: &Aabb) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.min.z <= other.min.z
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
            && self.max.z >= other.max.z
    }

    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Surface area, the quantity the SAH split cost weighs.
    pub fn surface_area(&self) -> f32 {
        let d = self.size();
        if d.x < 0.0 || d.y < 0.0 || d.z < 0.0 {
            return 0.0;
        }
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Slab-method ray intersection.
    ///
    /// Per-axis entry/exit parameters come from the reciprocal direction;
    /// the box is hit iff the largest entry does not exceed the smallest
    /// exit. Returns the entry distance when it is positive, the exit
    /// distance when the origin is inside the box, and `None` when the ray
    /// misses or the box lies entirely behind the origin.
    pub fn hit_distance(&self, ray: &Ray) -> Option<f32> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;

        for axis in 0..3 {
            let inv = 1.0 / ray.direction.axis(axis);
            let t0 = (self.min.axis(axis) - ray.origin.axis(axis)) * inv;
            let t1 = (self.max.axis(axis) - ray.origin.axis(axis)) * inv;
            let (near, far) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
            t_enter = t_enter.max(near);
            t_exit = t_exit.min(far);
        }

        if t_exit < t_enter || t_exit < 0.0 {
            None
        } else if t_enter > 0.0 {
            Some(t_enter)
        } else {
            Some(t_exit)
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Aabb::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grow_and_union() {
        let mut aabb = Aabb::EMPTY;
        aabb.grow(Vec3::new(1.0, 2.0, 3.0));
        aabb.grow(Vec3::new(-1.0, 0.0, 5.0));

        assert_eq!(aabb.min, Vec3::new(-1.0, 0.0, 3.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 2.0, 5.0));

        let other = Aabb::from_points(Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0));
        let merged = Aabb::union(&aabb, &other);
        assert!(merged.contains_box(&aabb));
        assert!(merged.contains_box(&other));
    }

    #[test]
    fn test_surface_area() {
        let unit = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        assert!((unit.surface_area() - 6.0).abs() < 1e-6);

        assert_eq!(Aabb::EMPTY.surface_area(), 0.0);
    }

    #[test]
    fn test_hit_distance_outside() {
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));

        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let t = aabb.hit_distance(&ray).expect("hits the box");
        assert!((t - 4.0).abs() < 1e-5);

        // Pointing away
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z);
        assert!(aabb.hit_distance(&ray).is_none());

        // Parallel miss
        let ray = Ray::new(Vec3::new(10.0, 0.0, -5.0), Vec3::Z);
        assert!(aabb.hit_distance(&ray).is_none());
    }

    #[test]
    fn test_hit_distance_from_inside_returns_exit() {
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);

        let t = aabb.hit_distance(&ray).expect("origin is inside");
        assert!((t - 1.0).abs() < 1e-5);
    }
}
