//! Triangle mesh input.
//!
//! Both renderers consume meshes through the same narrow contract: per face
//! and per corner (0, 1, 2) a position, an optional texture coordinate and
//! an optional normalized normal, plus the global vertex and face counts.

use std::fs;
use std::path::Path;

use thiserror::Error;

use ember_math::{Aabb, Vec2, Vec3};

/// Errors that can occur while loading a mesh.
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse file: {0}")]
    Parse(#[from] wavefront_obj::ParseError),
}

/// Index triples of one triangular face. The attribute streams are indexed
/// independently, as OBJ allows a corner to combine any position with any
/// texture coordinate or normal.
#[derive(Debug, Clone, Copy)]
pub struct Face {
    pub positions: [usize; 3],
    pub uvs: Option<[usize; 3]>,
    pub normals: Option<[usize; 3]>,
}

/// A triangle mesh with positions and optional UV/normal streams.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    normals: Vec<Vec3>,
    faces: Vec<Face>,
}

impl Mesh {
    /// Load a Wavefront OBJ file. Non-triangle primitives are skipped.
    pub fn load_obj(path: impl AsRef<Path>) -> Result<Mesh, MeshError> {
        let content = fs::read_to_string(path)?;
        Self::from_obj_source(content)
    }

    /// Parse OBJ source text. All objects in the set are merged.
    pub fn from_obj_source(source: impl Into<String>) -> Result<Mesh, MeshError> {
        let parsed = wavefront_obj::obj::parse(source.into())?;
        let mut mesh = Mesh::default();

        for object in parsed.objects {
            let position_base = mesh.positions.len();
            let uv_base = mesh.uvs.len();
            let normal_base = mesh.normals.len();

            mesh.positions.extend(
                object
                    .vertices
                    .iter()
                    .map(|v| Vec3::new(v.x as f32, v.y as f32, v.z as f32)),
            );
            mesh.uvs.extend(
                object
                    .tex_vertices
                    .iter()
                    .map(|t| Vec2::new(t.u as f32, t.v as f32)),
            );
            // Normals are normalized once here so consumers never have to.
            mesh.normals.extend(object.normals.iter().map(|n| {
                let n = Vec3::new(n.x as f32, n.y as f32, n.z as f32);
                if n.length_squared() > 0.0 { n.normalize() } else { n }
            }));

            for geometry in object.geometry {
                for shape in geometry.shapes {
                    let wavefront_obj::obj::Primitive::Triangle(a, b, c) = shape.primitive
                    else {
                        log::warn!("skipping non-triangle primitive");
                        continue;
                    };

                    let corners = [a, b, c];
                    let positions =
                        [0, 1, 2].map(|i| position_base + corners[i].0);
                    let uvs = corners[0]
                        .1
                        .and_then(|_| {
                            let uv = [corners[0].1?, corners[1].1?, corners[2].1?];
                            Some(uv.map(|i| uv_base + i))
                        });
                    let normals = corners[0]
                        .2
                        .and_then(|_| {
                            let n = [corners[0].2?, corners[1].2?, corners[2].2?];
                            Some(n.map(|i| normal_base + i))
                        });

                    mesh.faces.push(Face { positions, uvs, normals });
                }
            }
        }

        log::debug!(
            "loaded mesh: {} vertices, {} faces",
            mesh.vertex_count(),
            mesh.face_count()
        );
        Ok(mesh)
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Position of corner `corner` (0, 1, 2) of face `face`.
    pub fn position(&self, face: usize, corner: usize) -> Vec3 {
        self.positions[self.faces[face].positions[corner]]
    }

    /// Texture coordinate of a face corner, when the mesh carries UVs.
    pub fn uv(&self, face: usize, corner: usize) -> Option<Vec2> {
        self.faces[face].uvs.map(|uvs| self.uvs[uvs[corner]])
    }

    /// Unit normal of a face corner, when the mesh carries normals.
    pub fn normal(&self, face: usize, corner: usize) -> Option<Vec3> {
        self.faces[face].normals.map(|ns| self.normals[ns[corner]])
    }

    /// Bounding box over every vertex position.
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for &p in &self.positions {
            bounds.grow(p);
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD_OBJ: &str = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
";

    #[test]
    fn test_parse_quad() {
        let mesh = Mesh::from_obj_source(QUAD_OBJ).expect("valid obj");

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.position(0, 1), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(mesh.uv(0, 2), Some(Vec2::new(1.0, 1.0)));
        assert_eq!(mesh.normal(1, 0), Some(Vec3::Z));
    }

    #[test]
    fn test_positions_only() {
        let source = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
f 1 2 3
";
        let mesh = Mesh::from_obj_source(source).expect("valid obj");

        assert_eq!(mesh.face_count(), 1);
        assert!(mesh.uv(0, 0).is_none());
        assert!(mesh.normal(0, 0).is_none());
    }

    #[test]
    fn test_normals_are_normalized() {
        let source = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vn 0.0 0.0 5.0
f 1//1 2//1 3//1
";
        let mesh = Mesh::from_obj_source(source).expect("valid obj");
        let n = mesh.normal(0, 0).unwrap();
        assert!((n.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_bounds() {
        let mesh = Mesh::from_obj_source(QUAD_OBJ).expect("valid obj");
        let bounds = mesh.bounds();
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_parse_error_is_reported() {
        assert!(matches!(
            Mesh::from_obj_source("v 1.0\n"),
            Err(MeshError::Parse(_))
        ));
    }
}
