//! Simple path tracer example.
//!
//! Renders a small Cornell-style box and saves it as a TGA file.

use ember_core::tga;
use ember_math::Vec3;
use ember_renderer::{
    Engine, EngineKind, Material, RenderSettings, TaskPool, Triangle,
};

fn main() {
    println!("Ember Path Tracer - Simple Example");
    println!("==================================");

    let mut engine = Engine::new(EngineKind::RayTracer, 400, 400);
    engine.set_look_at(
        Vec3::new(0.0, 1.0, 3.5),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::Y,
    );
    engine.set_perspective(60.0, 1.0, 0.1, 100.0);

    build_scene(&mut engine);

    let start = std::time::Instant::now();
    engine.build_bvh(4);
    println!("BVH built in {:?}", start.elapsed());

    let settings = RenderSettings {
        width: 400,
        height: 400,
        samples_per_pixel: 128,
        max_depth: 6,
    };
    println!(
        "Rendering {}x{} @ {} spp...",
        settings.width, settings.height, settings.samples_per_pixel
    );

    let pool = TaskPool::with_default_size();
    let start = std::time::Instant::now();
    let image = engine.render(&settings, Some(&pool));
    println!("Rendered in {:?}", start.elapsed());

    let filename = "output.tga";
    tga::write(&image, filename, true).expect("Failed to save image");
    println!("Saved to {}", filename);
}

/// Walls, a ceiling light, and two boxes worth of triangles.
fn build_scene(engine: &mut Engine) {
    let white = Material::diffuse(Vec3::splat(0.73));
    let red = Material::diffuse(Vec3::new(0.65, 0.05, 0.05));
    let green = Material::diffuse(Vec3::new(0.12, 0.45, 0.15));
    let mirror = Material::mirror(Vec3::splat(0.9), 0.05);
    let light = Material::light(Vec3::splat(4.0));

    // Floor, ceiling, back wall
    add_quad(
        engine,
        [
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(-1.0, 0.0, 1.0),
        ],
        &white,
    );
    add_quad(
        engine,
        [
            Vec3::new(-1.0, 2.0, -1.0),
            Vec3::new(-1.0, 2.0, 1.0),
            Vec3::new(1.0, 2.0, 1.0),
            Vec3::new(1.0, 2.0, -1.0),
        ],
        &white,
    );
    add_quad(
        engine,
        [
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(-1.0, 2.0, -1.0),
            Vec3::new(1.0, 2.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
        ],
        &mirror,
    );

    // Colored side walls
    add_quad(
        engine,
        [
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(-1.0, 0.0, 1.0),
            Vec3::new(-1.0, 2.0, 1.0),
            Vec3::new(-1.0, 2.0, -1.0),
        ],
        &red,
    );
    add_quad(
        engine,
        [
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(1.0, 2.0, -1.0),
            Vec3::new(1.0, 2.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
        ],
        &green,
    );

    // Ceiling light
    add_quad(
        engine,
        [
            Vec3::new(-0.4, 1.99, -0.4),
            Vec3::new(-0.4, 1.99, 0.4),
            Vec3::new(0.4, 1.99, 0.4),
            Vec3::new(0.4, 1.99, -0.4),
        ],
        &light,
    );
}

fn add_quad(engine: &mut Engine, corners: [Vec3; 4], material: &Material) {
    let [a, b, c, d] = corners;
    engine.add_triangle(Triangle::new([a, b, c], material.clone()));
    engine.add_triangle(Triangle::new([a, c, d], material.clone()));
}
