//! Ember renderer - scanline rasterization and CPU path tracing.
//!
//! Two backends over one scene model:
//!
//! - **Rasterizer**: depth-buffered triangle scan conversion with a
//!   programmable shader contract
//! - **Path tracer**: Monte Carlo light transport over a SAH-built BVH,
//!   optionally spread across a worker pool

mod bvh;
mod engine;
mod integrator;
mod material;
mod pool;
mod rasterizer;
mod scene;
mod shader;
mod triangle;

pub use bvh::Bvh;
pub use engine::{Engine, EngineKind};
pub use integrator::{trace, render, RenderSettings, SettingsError, CONTINUE_PROBABILITY};
pub use material::Material;
pub use pool::{TaskHandle, TaskPool};
pub use rasterizer::Rasterizer;
pub use scene::Scene;
pub use shader::{
    FlatShader, FragmentInput, NormalMappedShader, Shader, ShaderState, TextureKind,
    TexturedShader, VertexInput, VertexOutput,
};
pub use triangle::{HitRecord, Triangle};

/// Re-export the math and image types the public API is built from.
pub use ember_core::{Color, Image, Mesh};
pub use ember_math::{Aabb, Mat4, Ray, Vec2, Vec3, Vec4};
