//! Scene state shared by both render backends.

use std::collections::HashMap;

use ember_core::{Image, Mesh};
use ember_math::{Mat4, Ray, Vec2, Vec3};

use crate::{Bvh, HitRecord, Material, Triangle};

/// Everything a frame needs: primitives, camera matrices, named textures,
/// and the acceleration structure.
///
/// Triangles are registered before `build_bvh`; registering more afterwards
/// invalidates the hierarchy, and queries fall back to the linear scan
/// until it is rebuilt.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    triangles: Vec<Triangle>,
    bvh: Option<Bvh>,

    pub camera_position: Vec3,
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub viewport: Mat4,

    textures: HashMap<String, Image>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.bvh = None;
        self.triangles.push(triangle);
    }

    /// Register every face of a mesh with the given material.
    pub fn add_mesh(&mut self, mesh: &Mesh, material: &Material) {
        for face in 0..mesh.face_count() {
            let positions = [0, 1, 2].map(|c| mesh.position(face, c));
            let uvs = mesh.uv(face, 0).map(|_| {
                [0, 1, 2].map(|c| mesh.uv(face, c).unwrap_or(Vec2::ZERO))
            });
            let normals = mesh.normal(face, 0).map(|_| {
                [0, 1, 2].map(|c| mesh.normal(face, c).unwrap_or(Vec3::Z))
            });

            self.add_triangle(Triangle {
                positions,
                normals,
                uvs,
                tangent: None,
                material: material.clone(),
            });
        }
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Store a texture under a name materials can reference.
    pub fn add_texture(&mut self, name: impl Into<String>, image: Image) {
        self.textures.insert(name.into(), image);
    }

    pub fn texture(&self, name: &str) -> Option<&Image> {
        self.textures.get(name)
    }

    /// Build the acceleration structure over the current triangles.
    pub fn build_bvh(&mut self, leaf_capacity: usize) {
        self.bvh = Bvh::build(&self.triangles, leaf_capacity);
    }

    pub fn has_bvh(&self) -> bool {
        self.bvh.is_some()
    }

    /// Nearest hit, through the BVH when one is built and a linear scan
    /// otherwise.
    pub fn closest_hit(&self, ray: &Ray) -> Option<HitRecord> {
        match &self.bvh {
            Some(bvh) => bvh.closest_hit(&self.triangles, ray),
            None => self.closest_hit_linear(ray),
        }
    }

    /// Brute-force nearest hit over every triangle.
    pub fn closest_hit_linear(&self, ray: &Ray) -> Option<HitRecord> {
        let mut closest: Option<HitRecord> = None;
        for triangle in &self.triangles {
            if let Some(hit) = triangle.intersect(ray) {
                if closest.as_ref().map_or(true, |c| hit.distance < c.distance) {
                    closest = Some(hit);
                }
            }
        }
        closest
    }

    /// Albedo of a material at `uv`: the named texture when present in the
    /// table, the base color otherwise.
    pub fn sample_albedo(&self, material: &Material, uv: Vec2) -> Vec3 {
        material
            .texture
            .as_deref()
            .and_then(|name| self.textures.get(name))
            .map(|texture| texture.sample(uv.x, uv.y).to_vec3())
            .unwrap_or(material.color)
    }
}
