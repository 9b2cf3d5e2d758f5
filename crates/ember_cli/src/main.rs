//! Command-line driver for the Ember renderers.
//!
//! `ember raster` scan-converts an OBJ mesh with a chosen shader;
//! `ember trace` path traces an OBJ mesh inside a small light box.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use ember_core::{tga, Color, Mesh};
use ember_math::Vec3;
use ember_renderer::{
    Engine, EngineKind, Material, RenderSettings, Shader, TaskPool, TextureKind, Triangle,
};

#[derive(Parser)]
#[command(name = "ember", about = "Software rasterizer and path tracer")]
struct Cli {
    /// Output image width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Output image height in pixels
    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Output TGA path
    #[arg(short, long, default_value = "output.tga")]
    output: PathBuf,

    /// Write the output without run-length encoding
    #[arg(long)]
    uncompressed: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rasterize an OBJ mesh
    Raster {
        /// Mesh to draw
        obj: PathBuf,

        /// Shading model
        #[arg(long, value_enum, default_value = "textured")]
        shader: ShaderChoice,

        /// Diffuse texture (TGA)
        #[arg(long)]
        texture: Option<PathBuf>,
    },
    /// Path trace an OBJ mesh inside a light box
    Trace {
        /// Mesh to trace; omit for an empty box
        obj: Option<PathBuf>,

        /// Samples per pixel
        #[arg(long, default_value_t = 64)]
        samples: u32,

        /// Maximum path depth
        #[arg(long, default_value_t = 6)]
        max_depth: u32,

        /// Render settings JSON; overrides the other quality flags
        #[arg(long)]
        settings: Option<PathBuf>,

        /// BVH leaf capacity
        #[arg(long, default_value_t = 4)]
        leaf_capacity: usize,

        /// Render on the calling thread only
        #[arg(long)]
        serial: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ShaderChoice {
    Flat,
    Textured,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let image = match &cli.command {
        Command::Raster { obj, shader, texture } => raster(&cli, obj, *shader, texture.as_deref())?,
        Command::Trace {
            obj,
            samples,
            max_depth,
            settings,
            leaf_capacity,
            serial,
        } => trace(
            &cli,
            obj.as_deref(),
            *samples,
            *max_depth,
            settings.as_deref(),
            *leaf_capacity,
            *serial,
        )?,
    };

    tga::write(&image, &cli.output, !cli.uncompressed)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    log::info!("wrote {}", cli.output.display());
    Ok(())
}

fn raster(
    cli: &Cli,
    obj: &std::path::Path,
    shader: ShaderChoice,
    texture: Option<&std::path::Path>,
) -> anyhow::Result<ember_core::Image> {
    let mesh = Mesh::load_obj(obj).with_context(|| format!("loading {}", obj.display()))?;

    let mut engine = Engine::new(EngineKind::Rasterizer, cli.width, cli.height);
    frame_camera(&mut engine, &mesh, cli.width as f32 / cli.height as f32);

    let mut shader = match shader {
        ShaderChoice::Flat => Shader::flat(Color::WHITE),
        ShaderChoice::Textured => Shader::textured(Vec3::new(0.3, -1.0, -0.5)),
    };
    if let Some(path) = texture {
        let image = tga::read(path).with_context(|| format!("reading {}", path.display()))?;
        shader
            .state_mut()
            .set_texture(TextureKind::Diffuse, &image);
    }
    engine.bind_shader(shader);

    engine.draw_mesh(&mesh);
    log::info!("rasterized {} faces", mesh.face_count());

    Ok(engine.into_image().expect("rasterizer backend owns a target"))
}

fn trace(
    cli: &Cli,
    obj: Option<&std::path::Path>,
    samples: u32,
    max_depth: u32,
    settings: Option<&std::path::Path>,
    leaf_capacity: usize,
    serial: bool,
) -> anyhow::Result<ember_core::Image> {
    let mut engine = Engine::new(EngineKind::RayTracer, cli.width, cli.height);
    engine.set_look_at(
        Vec3::new(0.0, 1.0, 3.5),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::Y,
    );
    engine.set_perspective(
        60.0,
        cli.width as f32 / cli.height as f32,
        0.1,
        100.0,
    );

    build_light_box(&mut engine);
    if let Some(path) = obj {
        let mesh =
            Mesh::load_obj(path).with_context(|| format!("loading {}", path.display()))?;
        engine.add_mesh(&mesh, &Material::diffuse(Vec3::splat(0.73)));
        log::info!("traced mesh has {} faces", mesh.face_count());
    }
    engine.build_bvh(leaf_capacity);

    let settings = match settings {
        Some(path) => RenderSettings::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => RenderSettings {
            width: cli.width,
            height: cli.height,
            samples_per_pixel: samples,
            max_depth,
        },
    };

    let image = if serial {
        engine.render(&settings, None)
    } else {
        let pool = TaskPool::with_default_size();
        engine.render(&settings, Some(&pool))
    };
    Ok(image)
}

/// Aim the camera at the mesh bounds from a distance that frames them.
fn frame_camera(engine: &mut Engine, mesh: &Mesh, aspect: f32) {
    let bounds = mesh.bounds();
    let center = bounds.centroid();
    let radius = bounds.size().length().max(1e-3) * 0.5;

    let eye = center + Vec3::new(0.0, radius * 0.4, radius * 2.2);
    engine.set_look_at(eye, center, Vec3::Y);
    engine.set_perspective(50.0, aspect, radius * 0.05, radius * 10.0);
}

/// The standard two-wall light box the traced mesh sits in.
fn build_light_box(engine: &mut Engine) {
    let white = Material::diffuse(Vec3::splat(0.73));
    let light = Material::light(Vec3::splat(4.0));

    // Floor
    add_quad(
        engine,
        [
            Vec3::new(-2.0, 0.0, -2.0),
            Vec3::new(2.0, 0.0, -2.0),
            Vec3::new(2.0, 0.0, 2.0),
            Vec3::new(-2.0, 0.0, 2.0),
        ],
        &white,
    );
    // Back wall
    add_quad(
        engine,
        [
            Vec3::new(-2.0, 0.0, -2.0),
            Vec3::new(-2.0, 3.0, -2.0),
            Vec3::new(2.0, 3.0, -2.0),
            Vec3::new(2.0, 0.0, -2.0),
        ],
        &white,
    );
    // Ceiling light
    add_quad(
        engine,
        [
            Vec3::new(-1.0, 2.8, -1.0),
            Vec3::new(-1.0, 2.8, 1.0),
            Vec3::new(1.0, 2.8, 1.0),
            Vec3::new(1.0, 2.8, -1.0),
        ],
        &light,
    );
}

fn add_quad(engine: &mut Engine, corners: [Vec3; 4], material: &Material) {
    let [a, b, c, d] = corners;
    engine.add_triangle(Triangle::new([a, b, c], material.clone()));
    engine.add_triangle(Triangle::new([a, c, d], material.clone()));
}
