//! Programmable shading contract for the rasterizer.
//!
//! A shader is a closed set of variants rather than a trait object, so the
//! per-pixel fragment call is a direct match instead of dynamic dispatch.
//! Every variant shares the same `ShaderState`: the transform matrices and
//! a texture table keyed by role.

use std::collections::HashMap;

use ember_core::{Color, Image};
use ember_math::{Mat4, Vec2, Vec3, Vec4};

/// Roles a bound texture can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Normal,
    Specular,
    Emissive,
}

/// Transform matrices and textures shared by all shader variants.
#[derive(Debug, Clone, Default)]
pub struct ShaderState {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    textures: HashMap<TextureKind, Image>,
}

impl ShaderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a texture to a role. The shader stores its own deep copy; later
    /// changes to the source image do not show through.
    pub fn set_texture(&mut self, kind: TextureKind, image: &Image) {
        self.textures.insert(kind, image.clone());
    }

    pub fn texture(&self, kind: TextureKind) -> Option<&Image> {
        self.textures.get(&kind)
    }

    /// Sample a texture role at `uv`. An absent role yields the default
    /// zero color rather than an error.
    pub fn sample(&self, kind: TextureKind, uv: Vec2) -> Color {
        self.textures
            .get(&kind)
            .map(|t| t.sample(uv.x, uv.y))
            .unwrap_or_default()
    }

    pub fn mvp(&self) -> Mat4 {
        self.projection * self.view * self.model
    }
}

/// Object-space attributes of one triangle entering the vertex stage.
/// Every attribute except the positions is optional.
#[derive(Debug, Clone, Default)]
pub struct VertexInput {
    pub positions: [Vec3; 3],
    pub uvs: Option<[Vec2; 3]>,
    pub normals: Option<[Vec3; 3]>,
    /// Tangent/bitangent pair shared by the whole triangle.
    pub tangent: Option<(Vec3, Vec3)>,
}

/// Clip-space triangle leaving the vertex stage. A missing clip position
/// array aborts the draw.
#[derive(Debug, Clone, Default)]
pub struct VertexOutput {
    pub clip_positions: Option<[Vec4; 3]>,
    pub uvs: Option<[Vec2; 3]>,
    pub normals: Option<[Vec3; 3]>,
    pub tangent: Option<(Vec3, Vec3)>,
}

/// Interpolated attributes of a single fragment.
#[derive(Debug, Clone, Default)]
pub struct FragmentInput {
    /// Screen-space position: pixel x, pixel y, interpolated depth.
    pub position: Vec3,
    pub uv: Option<Vec2>,
    pub normal: Option<Vec3>,
    pub tangent: Option<(Vec3, Vec3)>,
}

/// Uniform-color shading.
#[derive(Debug, Clone)]
pub struct FlatShader {
    pub state: ShaderState,
    pub color: Color,
}

/// Diffuse texture modulated by a directional Lambert term.
#[derive(Debug, Clone)]
pub struct TexturedShader {
    pub state: ShaderState,
    /// Direction the light travels, world space.
    pub light_direction: Vec3,
    /// Lower bound of the Lambert term so back faces stay visible.
    pub ambient: f32,
}

/// Tangent-space normal mapping on top of the textured shading.
#[derive(Debug, Clone)]
pub struct NormalMappedShader {
    pub state: ShaderState,
    pub light_direction: Vec3,
    pub ambient: f32,
}

/// The closed set of shaders the rasterizer can run.
#[derive(Debug, Clone)]
pub enum Shader {
    Flat(FlatShader),
    Textured(TexturedShader),
    NormalMapped(NormalMappedShader),
}

impl Shader {
    pub fn flat(color: Color) -> Self {
        Shader::Flat(FlatShader { state: ShaderState::new(), color })
    }

    pub fn textured(light_direction: Vec3) -> Self {
        Shader::Textured(TexturedShader {
            state: ShaderState::new(),
            light_direction: light_direction.normalize(),
            ambient: 0.1,
        })
    }

    pub fn normal_mapped(light_direction: Vec3) -> Self {
        Shader::NormalMapped(NormalMappedShader {
            state: ShaderState::new(),
            light_direction: light_direction.normalize(),
            ambient: 0.1,
        })
    }

    pub fn state(&self) -> &ShaderState {
        match self {
            Shader::Flat(s) => &s.state,
            Shader::Textured(s) => &s.state,
            Shader::NormalMapped(s) => &s.state,
        }
    }

    pub fn state_mut(&mut self) -> &mut ShaderState {
        match self {
            Shader::Flat(s) => &mut s.state,
            Shader::Textured(s) => &mut s.state,
            Shader::NormalMapped(s) => &mut s.state,
        }
    }

    /// Vertex stage: object space in, clip space out.
    ///
    /// All variants share the transform; normals and tangents move to world
    /// space through the model matrix.
    pub fn vertex(&self, input: &VertexInput) -> VertexOutput {
        let state = self.state();
        let mvp = state.mvp();

        let clip = input.positions.map(|p| mvp * Vec4::from_point(p));
        let normals = input
            .normals
            .map(|ns| ns.map(|n| state.model.transform_vector(n).normalize()));
        let tangent = input.tangent.map(|(t, b)| {
            (
                state.model.transform_vector(t),
                state.model.transform_vector(b),
            )
        });

        VertexOutput {
            clip_positions: Some(clip),
            uvs: input.uvs,
            normals,
            tangent,
        }
    }

    /// Fragment stage. `None` discards the fragment.
    pub fn fragment(&self, input: &FragmentInput) -> Option<Color> {
        match self {
            Shader::Flat(shader) => Some(shader.color),
            Shader::Textured(shader) => {
                let albedo = match input.uv {
                    Some(uv) if shader.state.texture(TextureKind::Diffuse).is_some() => {
                        let texel = shader.state.sample(TextureKind::Diffuse, uv);
                        if texel.a == 0 {
                            // Alpha cutout
                            return None;
                        }
                        texel
                    }
                    _ => Color::WHITE,
                };
                Some(albedo * lambert(input.normal, shader.light_direction, shader.ambient))
            }
            Shader::NormalMapped(shader) => {
                let (uv, normal, (tangent, bitangent)) =
                    match (input.uv, input.normal, input.tangent) {
                        (Some(uv), Some(n), Some(tb)) => (uv, n, tb),
                        // Without a tangent frame fall back to plain shading.
                        _ => {
                            return Some(
                                Color::WHITE
                                    * lambert(
                                        input.normal,
                                        shader.light_direction,
                                        shader.ambient,
                                    ),
                            );
                        }
                    };

                let texel = shader.state.sample(TextureKind::Normal, uv).to_vec3();
                let sampled = texel * 2.0 - Vec3::ONE;
                let world = (tangent * sampled.x + bitangent * sampled.y + normal * sampled.z)
                    .normalize();

                let albedo = if shader.state.texture(TextureKind::Diffuse).is_some() {
                    shader.state.sample(TextureKind::Diffuse, uv)
                } else {
                    Color::WHITE
                };
                Some(albedo * lambert(Some(world), shader.light_direction, shader.ambient))
            }
        }
    }
}

/// Directional Lambert factor with an ambient floor. A missing normal
/// shades fully lit.
fn lambert(normal: Option<Vec3>, light_direction: Vec3, ambient: f32) -> f32 {
    match normal {
        Some(n) => n.dot(-light_direction).max(ambient),
        None => 1.0,
    }
}
