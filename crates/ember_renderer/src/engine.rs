//! Facade over the two render backends.
//!
//! Callers pick a backend once at construction and drive it through one
//! shared camera-setup surface; the matrices land in the scene and, for the
//! rasterizer, in the bound shader before every draw.

use std::sync::Arc;

use ember_core::{Color, Image, Mesh};
use ember_math::{Mat4, Vec3};

use crate::{
    integrator, Material, Rasterizer, RenderSettings, Scene, Shader, TaskPool, Triangle,
    VertexInput,
};

/// Which backend an engine drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Rasterizer,
    RayTracer,
}

enum Backend {
    Raster(Box<Rasterizer>),
    Trace,
}

/// A configured renderer: scene state plus one backend.
pub struct Engine {
    kind: EngineKind,
    backend: Backend,
    scene: Arc<Scene>,
}

impl Engine {
    /// Create an engine of the requested kind targeting a
    /// `width` x `height` frame.
    pub fn new(kind: EngineKind, width: u32, height: u32) -> Self {
        let mut scene = Scene::new();
        scene.viewport = Mat4::viewport(0.0, 0.0, width as f32, height as f32);

        let backend = match kind {
            EngineKind::Rasterizer => Backend::Raster(Box::new(Rasterizer::new(width, height))),
            EngineKind::RayTracer => Backend::Trace,
        };

        Self {
            kind,
            backend,
            scene: Arc::new(scene),
        }
    }

    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut Scene {
        // Nobody holds a second reference outside a running render call.
        Arc::make_mut(&mut self.scene)
    }

    // Camera setup, shared by both backends.

    pub fn set_look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        let scene = self.scene_mut();
        scene.camera_position = eye;
        scene.view = Mat4::look_at(eye, target, up);
    }

    pub fn set_perspective(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) {
        self.scene_mut().projection = Mat4::perspective(fov_y, aspect, near, far);
    }

    pub fn set_orthographic(&mut self, half_width: f32, half_height: f32, near: f32, far: f32) {
        self.scene_mut().projection =
            Mat4::orthographic(half_width, half_height, near, far);
    }

    pub fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let viewport = Mat4::viewport(x, y, width, height);
        self.scene_mut().viewport = viewport;
        if let Backend::Raster(raster) = &mut self.backend {
            raster.set_viewport(viewport);
        }
    }

    pub fn set_model(&mut self, model: Mat4) {
        self.scene_mut().model = model;
    }

    // Rasterizer surface. Calls against the wrong backend are no-ops that
    // warn once per call site rather than failing.

    pub fn bind_shader(&mut self, shader: Shader) {
        match &mut self.backend {
            Backend::Raster(raster) => raster.bind_shader(shader),
            Backend::Trace => log::warn!("bind_shader ignored by the ray tracing backend"),
        }
    }

    pub fn shader_mut(&mut self) -> Option<&mut Shader> {
        match &mut self.backend {
            Backend::Raster(raster) => raster.shader_mut(),
            Backend::Trace => None,
        }
    }

    /// Rasterize one triangle with the bound shader.
    pub fn draw_triangle(&mut self, input: &VertexInput) {
        self.sync_shader_matrices();
        match &mut self.backend {
            Backend::Raster(raster) => raster.draw_triangle(input),
            Backend::Trace => log::warn!("draw_triangle ignored by the ray tracing backend"),
        }
    }

    /// Rasterize every face of a mesh with the bound shader.
    pub fn draw_mesh(&mut self, mesh: &Mesh) {
        self.sync_shader_matrices();
        let Backend::Raster(raster) = &mut self.backend else {
            log::warn!("draw_mesh ignored by the ray tracing backend");
            return;
        };

        for face in 0..mesh.face_count() {
            let input = VertexInput {
                positions: [0, 1, 2].map(|c| mesh.position(face, c)),
                uvs: mesh
                    .uv(face, 0)
                    .map(|_| [0, 1, 2].map(|c| mesh.uv(face, c).unwrap_or_default())),
                normals: mesh
                    .normal(face, 0)
                    .map(|_| [0, 1, 2].map(|c| mesh.normal(face, c).unwrap_or(Vec3::Z))),
                tangent: None,
            };
            raster.draw_triangle(&input);
        }
    }

    /// Fill a flat-colored triangle in screen space, bypassing the shader.
    pub fn draw_triangle_flat(
        &mut self,
        v0: (i32, i32),
        v1: (i32, i32),
        v2: (i32, i32),
        color: Color,
    ) {
        match &mut self.backend {
            Backend::Raster(raster) => raster.draw_triangle_flat(v0, v1, v2, color),
            Backend::Trace => log::warn!("draw_triangle_flat ignored by the ray tracing backend"),
        }
    }

    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        match &mut self.backend {
            Backend::Raster(raster) => raster.draw_line(x0, y0, x1, y1, color),
            Backend::Trace => log::warn!("draw_line ignored by the ray tracing backend"),
        }
    }

    /// Copy the scene's transform matrices into the bound shader.
    fn sync_shader_matrices(&mut self) {
        let (model, view, projection) =
            (self.scene.model, self.scene.view, self.scene.projection);
        if let Backend::Raster(raster) = &mut self.backend {
            if let Some(shader) = raster.shader_mut() {
                let state = shader.state_mut();
                state.model = model;
                state.view = view;
                state.projection = projection;
            }
        }
    }

    // Ray tracing surface.

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.scene_mut().add_triangle(triangle);
    }

    pub fn add_mesh(&mut self, mesh: &Mesh, material: &Material) {
        self.scene_mut().add_mesh(mesh, material);
    }

    pub fn add_texture(&mut self, name: impl Into<String>, image: Image) {
        self.scene_mut().add_texture(name, image);
    }

    pub fn build_bvh(&mut self, leaf_capacity: usize) {
        self.scene_mut().build_bvh(leaf_capacity);
    }

    /// Path trace a frame. Ignores the bound rasterizer target; the traced
    /// image is returned directly.
    pub fn render(&self, settings: &RenderSettings, pool: Option<&TaskPool>) -> Image {
        if self.kind == EngineKind::Rasterizer {
            log::warn!("render called on the rasterizer backend, tracing the scene anyway");
        }
        integrator::render(&self.scene, settings, pool)
    }

    /// The rasterizer's current target (the ray tracer has none).
    pub fn image(&self) -> Option<&Image> {
        match &self.backend {
            Backend::Raster(raster) => Some(raster.image()),
            Backend::Trace => None,
        }
    }

    /// Consume the engine and hand back the rasterizer target.
    pub fn into_image(self) -> Option<Image> {
        match self.backend {
            Backend::Raster(raster) => Some(raster.into_image()),
            Backend::Trace => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::Mesh;
    use ember_math::Vec2;

    #[test]
    fn test_rasterizer_engine_draws_mesh() {
        let source = "\
v -1.0 -1.0 0.0
v 1.0 -1.0 0.0
v 1.0 1.0 0.0
v -1.0 1.0 0.0
f 1 2 3
f 1 3 4
";
        let mesh = Mesh::from_obj_source(source).unwrap();

        let mut engine = Engine::new(EngineKind::Rasterizer, 32, 32);
        engine.bind_shader(Shader::flat(Color::WHITE));
        engine.draw_mesh(&mesh);

        let image = engine.into_image().expect("rasterizer owns a target");
        assert_eq!(image.get(16, 16), Color::WHITE);
        assert_eq!(image.get(0, 31), Color::WHITE);
    }

    #[test]
    fn test_camera_setup_is_shared() {
        for kind in [EngineKind::Rasterizer, EngineKind::RayTracer] {
            let mut engine = Engine::new(kind, 16, 16);
            engine.set_look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
            engine.set_perspective(45.0, 1.0, 0.1, 50.0);
            engine.set_viewport(0.0, 0.0, 16.0, 16.0);

            assert_eq!(engine.scene().camera_position, Vec3::new(0.0, 0.0, 5.0));
            assert!(engine.scene().projection != Mat4::IDENTITY);
        }
    }

    #[test]
    fn test_ray_tracer_engine_renders() {
        let mut engine = Engine::new(EngineKind::RayTracer, 8, 8);
        engine.set_look_at(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y);
        engine.set_perspective(60.0, 1.0, 0.1, 100.0);

        // A light filling the view.
        let light = Material::light(Vec3::ONE);
        engine.add_triangle(Triangle::new(
            [
                Vec3::new(-20.0, -20.0, 0.0),
                Vec3::new(20.0, -20.0, 0.0),
                Vec3::new(0.0, 20.0, 0.0),
            ],
            light,
        ));
        engine.build_bvh(4);

        let settings = RenderSettings {
            width: 8,
            height: 8,
            samples_per_pixel: 2,
            max_depth: 2,
        };
        let image = engine.render(&settings, None);

        assert_eq!(image.width(), 8);
        assert_eq!(image.get(4, 4), Color::WHITE);
    }

    #[test]
    fn test_wrong_backend_calls_are_no_ops() {
        let mut engine = Engine::new(EngineKind::RayTracer, 8, 8);
        engine.bind_shader(Shader::flat(Color::WHITE));
        engine.draw_triangle(&VertexInput {
            positions: [Vec3::ZERO, Vec3::X, Vec3::Y],
            uvs: Some([Vec2::ZERO; 3]),
            ..Default::default()
        });
        assert!(engine.image().is_none());
        assert!(engine.into_image().is_none());
    }

    #[test]
    fn test_textures_reach_the_scene_table() {
        let mut engine = Engine::new(EngineKind::RayTracer, 8, 8);
        engine.add_texture("checker", Image::new(2, 2, 3));
        assert!(engine.scene().texture("checker").is_some());
    }
}
