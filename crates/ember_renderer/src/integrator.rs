//! Monte Carlo path tracing.
//!
//! `trace` is the recursive estimator; `render` walks every pixel and
//! sample, either on the calling thread or partitioned into row ranges
//! across a `TaskPool`. Row ranges are disjoint and exhaustive, so the
//! parallel mode needs no locking around the output pixels.

use std::f32::consts::PI;
use std::path::Path;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ember_core::{Color, Image};
use ember_math::{Mat4, Ray, Vec3, Vec4};

use crate::{HitRecord, Scene, TaskPool};

/// Russian-roulette continuation probability. Survivors are divided by
/// this to keep the estimator unbiased.
pub const CONTINUE_PROBABILITY: f32 = 0.8;

/// Fixed relative index of refraction for the refractive branch.
const REFRACTIVE_INDEX: f32 = 1.5;

/// Resolution and quality knobs for a path-traced frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u32,
    pub max_depth: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            samples_per_pixel: 64,
            max_depth: 6,
        }
    }
}

/// Errors that can occur while loading render settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Json(#[from] serde_json::Error),
}

impl RenderSettings {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Recursive radiance estimate along `ray`.
///
/// Terminates with black past `max_depth`, on a miss, or when Russian
/// roulette stops the path; emissive hits return their radiance directly.
pub fn trace(
    scene: &Scene,
    ray: &Ray,
    depth: u32,
    max_depth: u32,
    rng: &mut impl Rng,
) -> Vec3 {
    if depth > max_depth {
        return Vec3::ZERO;
    }
    let Some(hit) = scene.closest_hit(ray) else {
        return Vec3::ZERO;
    };
    if hit.material.emissive {
        return hit.material.color;
    }

    if rng.gen::<f32>() > CONTINUE_PROBABILITY {
        return Vec3::ZERO;
    }

    let incoming = ray.direction.normalize();
    shade(scene, incoming, &hit, depth, max_depth, rng) / CONTINUE_PROBABILITY
}

/// Scatter at a non-emissive hit and estimate the incoming radiance.
///
/// One uniform random number selects mirror reflection, refraction, or the
/// diffuse bounce against the material's rate thresholds; every branch
/// scales the recursive radiance by |cos| of the incoming angle.
fn shade(
    scene: &Scene,
    incoming: Vec3,
    hit: &HitRecord,
    depth: u32,
    max_depth: u32,
    rng: &mut impl Rng,
) -> Vec3 {
    let normal = hit.normal;
    let random_direction = hemisphere_direction(normal, rng);
    let cosine = (-incoming).dot(normal).abs();
    let material = &hit.material;

    let choice: f32 = rng.gen();
    let radiance = if choice < material.specular_rate {
        let reflected = reflect(incoming, normal);
        let direction = lerp(reflected, random_direction, material.roughness);
        trace(
            scene,
            &Ray::new(hit.point, direction),
            depth + 1,
            max_depth,
            rng,
        )
    } else if choice <= material.refract_rate {
        // Zero on total internal reflection, which traces to a miss.
        let refracted = refract(incoming, normal, 1.0 / REFRACTIVE_INDEX);
        let direction = lerp(refracted, -random_direction, material.refract_roughness);
        trace(
            scene,
            &Ray::new(hit.point, direction),
            depth + 1,
            max_depth,
            rng,
        )
    } else {
        let albedo = scene.sample_albedo(material, hit.uv);
        let bounced = trace(
            scene,
            &Ray::new(hit.point, random_direction),
            depth + 1,
            max_depth,
            rng,
        );
        bounced * albedo
    };

    radiance * cosine
}

/// Radiance of a primary camera ray: emissive hits return directly,
/// everything else scatters through the same branch logic as `trace`.
fn primary(scene: &Scene, ray: &Ray, settings: &RenderSettings, rng: &mut impl Rng) -> Vec3 {
    let Some(hit) = scene.closest_hit(ray) else {
        return Vec3::ZERO;
    };
    if hit.material.emissive {
        return hit.material.color;
    }
    shade(
        scene,
        ray.direction.normalize(),
        &hit,
        0,
        settings.max_depth,
        rng,
    )
}

/// Render a frame, single-threaded or partitioned into row ranges over
/// `pool`.
pub fn render(scene: &Arc<Scene>, settings: &RenderSettings, pool: Option<&TaskPool>) -> Image {
    let started = std::time::Instant::now();
    let mut image = Image::new(settings.width, settings.height, 3);

    match pool {
        Some(pool) => {
            // Contiguous, non-overlapping row ranges, rounded up so the
            // final partial chunk is covered.
            let rows_per_task = (settings.height / pool.worker_count() as u32).max(1);
            let mut handles = Vec::new();
            let mut row = 0;
            while row < settings.height {
                let end = (row + rows_per_task).min(settings.height);
                let scene = Arc::clone(scene);
                let settings = settings.clone();
                handles.push((
                    row,
                    pool.commit(move || {
                        let mut rng = rand::thread_rng();
                        render_rows(&scene, &settings, row, end, &mut rng)
                    }),
                ));
                row = end;
            }

            for (row_start, handle) in handles {
                blit_rows(&mut image, row_start, &handle.wait());
            }
        }
        None => {
            let mut rng = rand::thread_rng();
            let rows = render_rows(scene, settings, 0, settings.height, &mut rng);
            blit_rows(&mut image, 0, &rows);
        }
    }

    log::info!(
        "path traced {}x{} @ {} spp in {:.2}s",
        settings.width,
        settings.height,
        settings.samples_per_pixel,
        started.elapsed().as_secs_f32()
    );
    image
}

/// Accumulate every sample of the rows `[row_start, row_end)`.
///
/// Each sample is weighted by `2 pi / samples_per_pixel` and added into the
/// existing pixel value with the color type's saturating add.
fn render_rows(
    scene: &Scene,
    settings: &RenderSettings,
    row_start: u32,
    row_end: u32,
    rng: &mut impl Rng,
) -> Vec<Color> {
    let width = settings.width;
    let mut pixels = vec![Color::default(); (width * (row_end - row_start)) as usize];
    let weight = 2.0 * PI / settings.samples_per_pixel as f32;

    let inverse_projection = inverse_or_identity(&scene.projection, "projection");
    let inverse_view = inverse_or_identity(&scene.view, "view");

    for _ in 0..settings.samples_per_pixel {
        for y in row_start..row_end {
            for x in 0..width {
                let ray = camera_ray(
                    scene,
                    &inverse_projection,
                    &inverse_view,
                    settings,
                    x,
                    y,
                    rng,
                );
                let radiance = primary(scene, &ray, settings, rng);

                let index = ((y - row_start) * width + x) as usize;
                pixels[index] = pixels[index] + Color::from_vec3(radiance) * weight;
            }
        }
    }

    pixels
}

/// Build the jittered primary ray for pixel (x, y): a near-plane point in
/// NDC is pulled back through the inverse projection and view transforms,
/// and the ray runs from the camera through that world-space point.
fn camera_ray(
    scene: &Scene,
    inverse_projection: &Mat4,
    inverse_view: &Mat4,
    settings: &RenderSettings,
    x: u32,
    y: u32,
    rng: &mut impl Rng,
) -> Ray {
    let ndc_x = ((x as f32 + rng.gen::<f32>()) * 2.0 / settings.width as f32 - 1.0)
        .clamp(-1.0, 1.0);
    let ndc_y = ((y as f32 + rng.gen::<f32>()) * 2.0 / settings.height as f32 - 1.0)
        .clamp(-1.0, 1.0);

    let clip = Vec4::new(ndc_x, ndc_y, -1.0, 1.0);
    let camera_space = *inverse_projection * clip;
    let camera_space = camera_space.truncate() / camera_space.w;
    let world = (*inverse_view * Vec4::from_point(camera_space)).truncate();

    Ray::new(scene.camera_position, world - scene.camera_position)
}

fn blit_rows(image: &mut Image, row_start: u32, pixels: &[Color]) {
    let width = image.width();
    for (i, &color) in pixels.iter().enumerate() {
        let x = i as u32 % width;
        let y = row_start + i as u32 / width;
        image.set(x, y, color);
    }
}

fn inverse_or_identity(matrix: &Mat4, name: &str) -> Mat4 {
    matrix.try_inverse().unwrap_or_else(|| {
        log::warn!("{} matrix is singular, using identity", name);
        Mat4::IDENTITY
    })
}

/// Uniform random direction on the hemisphere around `normal`.
fn hemisphere_direction(normal: Vec3, rng: &mut impl Rng) -> Vec3 {
    // Rejection-sample the unit sphere, then flip into the hemisphere.
    loop {
        let v = Vec3::new(
            rng.gen::<f32>() * 2.0 - 1.0,
            rng.gen::<f32>() * 2.0 - 1.0,
            rng.gen::<f32>() * 2.0 - 1.0,
        );
        let len_sq = v.length_squared();
        if len_sq > 1e-6 && len_sq <= 1.0 {
            let v = v / len_sq.sqrt();
            return if v.dot(normal) < 0.0 { -v } else { v };
        }
    }
}

/// Mirror `v` about the normal.
fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - n * (2.0 * v.dot(n))
}

/// Refract `v` (unit length) through the normal by Snell's law. Returns
/// the zero vector on total internal reflection.
fn refract(v: Vec3, n: Vec3, eta: f32) -> Vec3 {
    let cos_theta = (-v).dot(n).min(1.0);
    let sin2_theta = 1.0 - cos_theta * cos_theta;
    if eta * eta * sin2_theta > 1.0 {
        return Vec3::ZERO;
    }
    let out_perpendicular = (v + n * cos_theta) * eta;
    let out_parallel = -n * (1.0 - out_perpendicular.length_squared()).abs().sqrt();
    out_perpendicular + out_parallel
}

fn lerp(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a * (1.0 - t) + b * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Material, Triangle};
    use rand::SeedableRng;

    /// A big emissive quad below the origin plus a diffuse floor above it.
    fn light_box_scene() -> Scene {
        let mut scene = Scene::new();

        let light = Material::light(Vec3::splat(2.0));
        let a = Vec3::new(-50.0, -1.0, -50.0);
        let b = Vec3::new(50.0, -1.0, -50.0);
        let c = Vec3::new(50.0, -1.0, 50.0);
        let d = Vec3::new(-50.0, -1.0, 50.0);
        scene.add_triangle(Triangle::new([a, b, c], light.clone()));
        scene.add_triangle(Triangle::new([a, c, d], light));

        let gray = Material::diffuse(Vec3::splat(0.5));
        let a = Vec3::new(-50.0, 1.0, -50.0);
        let b = Vec3::new(50.0, 1.0, -50.0);
        let c = Vec3::new(50.0, 1.0, 50.0);
        scene.add_triangle(Triangle::new([a, b, c], gray));

        scene.build_bvh(2);
        scene
    }

    #[test]
    fn test_trace_beyond_max_depth_is_black() {
        let scene = light_box_scene();
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let ray = Ray::new(Vec3::ZERO, -Vec3::Y);

        assert_eq!(trace(&scene, &ray, 10, 5, &mut rng), Vec3::ZERO);
    }

    #[test]
    fn test_trace_miss_is_black() {
        let scene = light_box_scene();
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let ray = Ray::new(Vec3::ZERO, Vec3::X);

        assert_eq!(trace(&scene, &ray, 0, 5, &mut rng), Vec3::ZERO);
    }

    #[test]
    fn test_trace_emissive_hit_returns_radiance() {
        let scene = light_box_scene();
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let ray = Ray::new(Vec3::ZERO, -Vec3::Y);

        assert_eq!(trace(&scene, &ray, 0, 5, &mut rng), Vec3::splat(2.0));
    }

    #[test]
    fn test_radiance_is_finite_and_non_negative() {
        let scene = light_box_scene();
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);

        for i in 0..500 {
            let angle = i as f32 * 0.013;
            let direction = Vec3::new(angle.sin(), -angle.cos().abs() - 0.1, angle.cos());
            let ray = Ray::new(Vec3::ZERO, direction);
            let radiance = trace(&scene, &ray, 0, 8, &mut rng);

            assert!(radiance.is_finite());
            assert!(radiance.x >= 0.0 && radiance.y >= 0.0 && radiance.z >= 0.0);
        }
    }

    #[test]
    fn test_refract_straight_through_and_tir() {
        // Head-on rays pass straight through.
        let out = refract(-Vec3::Z, Vec3::Z, 1.0 / REFRACTIVE_INDEX);
        assert!((out - -Vec3::Z).length() < 1e-5);

        // A grazing ray leaving a dense medium reflects internally.
        let grazing = Vec3::new(0.99, 0.0, -0.141).normalize();
        let out = refract(grazing, Vec3::Z, REFRACTIVE_INDEX);
        assert_eq!(out, Vec3::ZERO);
    }

    #[test]
    fn test_reflect_inverts_normal_component() {
        let out = reflect(Vec3::new(1.0, -1.0, 0.0).normalize(), Vec3::Y);
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!((out - expected).length() < 1e-5);
    }

    /// Only the emissive quad, with the camera staring straight at it, so
    /// every primary ray terminates on the light deterministically.
    fn light_cover_scene() -> Scene {
        let mut scene = Scene::new();

        let light = Material::light(Vec3::splat(2.0));
        let a = Vec3::new(-50.0, -1.0, -50.0);
        let b = Vec3::new(50.0, -1.0, -50.0);
        let c = Vec3::new(50.0, -1.0, 50.0);
        let d = Vec3::new(-50.0, -1.0, 50.0);
        scene.add_triangle(Triangle::new([a, b, c], light.clone()));
        scene.add_triangle(Triangle::new([a, c, d], light));
        scene.build_bvh(2);

        scene.camera_position = Vec3::new(0.0, 10.0, 0.0);
        scene.view = Mat4::look_at(scene.camera_position, Vec3::new(0.0, -1.0, 0.0), Vec3::Z);
        scene.projection = Mat4::perspective(60.0, 1.0, 0.1, 100.0);
        scene
    }

    #[test]
    fn test_render_saturates_on_emissive_cover() {
        // Every primary ray hits the emissive quad, so the accumulated
        // weight (2 pi) saturates each pixel deterministically.
        let scene = Arc::new(light_cover_scene());

        let settings = RenderSettings {
            width: 8,
            height: 8,
            samples_per_pixel: 4,
            max_depth: 4,
        };

        let image = render(&scene, &settings, None);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(image.get(x, y), Color::WHITE);
            }
        }
    }

    #[test]
    fn test_parallel_render_matches_serial() {
        let scene = Arc::new(light_cover_scene());

        let settings = RenderSettings {
            width: 16,
            height: 11, // deliberately not divisible by the worker count
            samples_per_pixel: 2,
            max_depth: 3,
        };

        let serial = render(&scene, &settings, None);
        let pool = TaskPool::new(4);
        let parallel = render(&scene, &settings, Some(&pool));

        // The scene is fully emissive from this camera, so both modes are
        // deterministic and must agree pixel for pixel.
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_settings_default_round_trip() {
        let settings = RenderSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: RenderSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.width, settings.width);
        assert_eq!(back.samples_per_pixel, settings.samples_per_pixel);

        // Partial JSON fills the rest from defaults.
        let partial: RenderSettings = serde_json::from_str("{\"width\": 32}").unwrap();
        assert_eq!(partial.width, 32);
        assert_eq!(partial.height, RenderSettings::default().height);
    }
}
