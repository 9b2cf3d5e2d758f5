//! Depth-buffered triangle rasterization.

use ember_core::{Color, Image};
use ember_math::{Mat4, Vec2, Vec3};

use crate::shader::{FragmentInput, Shader, VertexInput};

/// Screen-space degenerate-area threshold, in pixel units. Deliberately far
/// larger than the world-space ray/triangle epsilon: sub-pixel slivers are
/// not worth scanning.
const DEGENERATE_AREA_EPSILON: f32 = 1e-2;

/// Tolerance when deciding whether scanline boundaries crossed over.
const BOUNDARY_SWAP_EPSILON: f32 = 0.5;

/// Scan converter over an owned target image.
///
/// Holds the bound shader and a per-pixel depth buffer initialized to the
/// far value 1.0 whenever a target is bound. One draw call at a time; the
/// depth buffer is not shared between concurrent draws.
#[derive(Debug)]
pub struct Rasterizer {
    image: Image,
    depth: Vec<f32>,
    viewport: Mat4,
    shader: Option<Shader>,
}

impl Rasterizer {
    /// Create a rasterizer over a fresh BGR target of the given size, with
    /// the viewport matching the full target.
    pub fn new(width: u32, height: u32) -> Self {
        let mut rasterizer = Self {
            image: Image::new(0, 0, 3),
            depth: Vec::new(),
            viewport: Mat4::viewport(0.0, 0.0, width as f32, height as f32),
            shader: None,
        };
        rasterizer.bind_image(Image::new(width, height, 3));
        rasterizer
    }

    /// Bind a new target. Resets every depth value to the far plane.
    pub fn bind_image(&mut self, image: Image) {
        self.depth = vec![1.0; (image.width() * image.height()) as usize];
        self.image = image;
    }

    pub fn bind_shader(&mut self, shader: Shader) {
        self.shader = Some(shader);
    }

    pub fn shader_mut(&mut self) -> Option<&mut Shader> {
        self.shader.as_mut()
    }

    pub fn set_viewport(&mut self, viewport: Mat4) {
        self.viewport = viewport;
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn into_image(self) -> Image {
        self.image
    }

    /// Rasterize one shaded triangle.
    ///
    /// Runs the vertex stage, snaps the projected vertices to integer
    /// pixels, then walks the bounding box testing barycentric containment,
    /// the depth buffer, and finally the fragment stage.
    pub fn draw_triangle(&mut self, input: &VertexInput) {
        let Some(shader) = &self.shader else {
            return;
        };

        let out = shader.vertex(input);
        let Some(clip) = out.clip_positions else {
            return;
        };

        let width = self.image.width();
        let height = self.image.height();
        if width == 0 || height == 0 {
            return;
        }

        // Perspective divide, viewport transform, then snap to the pixel
        // grid and clamp depth to [0, 1].
        let mut screen = [Vec3::ZERO; 3];
        for i in 0..3 {
            let ndc = clip[i].truncate() / clip[i].w;
            let v = self.viewport.transform_point(ndc);
            screen[i] = Vec3::new(
                v.x.round().clamp(0.0, (width - 1) as f32),
                v.y.round().clamp(0.0, (height - 1) as f32),
                v.z.clamp(0.0, 1.0),
            );
        }

        let min_x = screen.iter().map(|v| v.x).fold(f32::INFINITY, f32::min) as u32;
        let max_x = screen.iter().map(|v| v.x).fold(0.0, f32::max) as u32;
        let min_y = screen.iter().map(|v| v.y).fold(f32::INFINITY, f32::min) as u32;
        let max_y = screen.iter().map(|v| v.y).fold(0.0, f32::max) as u32;

        let corners = screen.map(|v| Vec2::new(v.x, v.y));
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let point = Vec2::new(x as f32, y as f32);
                let Some(bary) = screen_barycentric(&corners, point) else {
                    continue;
                };
                if bary.x < 0.0 || bary.y < 0.0 || bary.z < 0.0 {
                    continue;
                }

                let depth = bary.x * screen[0].z + bary.y * screen[1].z + bary.z * screen[2].z;
                let index = (y * width + x) as usize;
                if depth >= self.depth[index] {
                    continue;
                }
                self.depth[index] = depth;

                let uv = out
                    .uvs
                    .map(|uvs| uvs[0] * bary.x + uvs[1] * bary.y + uvs[2] * bary.z);
                let normal = out.normals.map(|ns| {
                    (ns[0] * bary.x + ns[1] * bary.y + ns[2] * bary.z).normalize()
                });
                // The tangent pair is shared by the triangle, so all three
                // weights land on the same vectors and sum back to them.
                let tangent = out.tangent.map(|(t, b)| {
                    let w = bary.x + bary.y + bary.z;
                    (t * w, b * w)
                });

                let fragment = FragmentInput {
                    position: Vec3::new(point.x, point.y, depth),
                    uv,
                    normal,
                    tangent,
                };
                if let Some(color) = shader.fragment(&fragment) {
                    self.image.set(x, y, color);
                }
            }
        }
    }

    /// Flat-colored scanline fill, bypassing the shader and depth buffer.
    ///
    /// Sorts the vertices by Y, splits the triangle into an upper and a
    /// lower trapezoid, and interpolates the left/right boundary along the
    /// edges for every scanline.
    pub fn draw_triangle_flat(
        &mut self,
        v0: (i32, i32),
        v1: (i32, i32),
        v2: (i32, i32),
        color: Color,
    ) {
        let mut v = [v0, v1, v2];
        v.sort_by_key(|p| p.1);
        let [(x0, y0), (x1, y1), (x2, y2)] = v;

        let total_height = y2 - y0;
        if total_height == 0 {
            let min = x0.min(x1).min(x2);
            let max = x0.max(x1).max(x2);
            self.draw_line(min, y0, max, y0, color);
            return;
        }

        for y in y0..=y2 {
            let second_half = y > y1 || y1 == y0;
            let segment_height = if second_half { y2 - y1 } else { y1 - y0 };

            let alpha = (y - y0) as f32 / total_height as f32;
            let beta = if segment_height == 0 {
                0.0
            } else {
                (y - if second_half { y1 } else { y0 }) as f32 / segment_height as f32
            };

            let mut left = x0 as f32 + (x2 - x0) as f32 * alpha;
            let mut right = if second_half {
                x1 as f32 + (x2 - x1) as f32 * beta
            } else {
                x0 as f32 + (x1 - x0) as f32 * beta
            };
            if left > right + BOUNDARY_SWAP_EPSILON {
                std::mem::swap(&mut left, &mut right);
            }

            for x in left.round() as i32..=right.round() as i32 {
                self.set_pixel(x, y, color);
            }
        }
    }

    /// Integer line drawing with a doubled error accumulator; no floating
    /// point in the stepping loop.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        let (mut x0, mut y0, mut x1, mut y1) = (x0, y0, x1, y1);

        // Step along the dominant axis; transpose if the line is steep.
        let steep = (y1 - y0).abs() > (x1 - x0).abs();
        if steep {
            std::mem::swap(&mut x0, &mut y0);
            std::mem::swap(&mut x1, &mut y1);
        }
        // Always walk left to right.
        if x0 > x1 {
            std::mem::swap(&mut x0, &mut x1);
            std::mem::swap(&mut y0, &mut y1);
        }

        let dx = x1 - x0;
        let dy = y1 - y0;
        let derror2 = dy.abs() * 2;
        let mut error2 = 0;
        let mut y = y0;

        for x in x0..=x1 {
            if steep {
                self.set_pixel(y, x, color);
            } else {
                self.set_pixel(x, y, color);
            }
            error2 += derror2;
            if error2 > dx {
                y += if dy > 0 { 1 } else { -1 };
                error2 -= dx * 2;
            }
        }
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 {
            return;
        }
        self.image.set(x as u32, y as u32, color);
    }
}

/// Barycentric weights of `point` against a screen-space triangle, from the
/// 2D cross products of `(point - v0, v1 - v0, v2 - v0)`. Returns `None`
/// when the doubled signed area is below the degeneracy threshold.
fn screen_barycentric(corners: &[Vec2; 3], point: Vec2) -> Option<Vec3> {
    let e1 = corners[1] - corners[0];
    let e2 = corners[2] - corners[0];
    let q = point - corners[0];

    let area = e1.cross(e2);
    if area.abs() < DEGENERATE_AREA_EPSILON {
        return None;
    }

    let v = q.cross(e2) / area;
    let w = e1.cross(q) / area;
    Some(Vec3::new(1.0 - v - w, v, w))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fullscreen_quad() -> [VertexInput; 2] {
        // Clip space corners of the whole viewport at z = 0.
        let a = Vec3::new(-1.0, -1.0, 0.0);
        let b = Vec3::new(1.0, -1.0, 0.0);
        let c = Vec3::new(1.0, 1.0, 0.0);
        let d = Vec3::new(-1.0, 1.0, 0.0);
        [
            VertexInput { positions: [a, b, c], ..Default::default() },
            VertexInput { positions: [a, c, d], ..Default::default() },
        ]
    }

    fn quad_at_depth(z: f32) -> [VertexInput; 2] {
        let mut quad = fullscreen_quad();
        for input in &mut quad {
            for p in &mut input.positions {
                p.z = z;
            }
        }
        quad
    }

    #[test]
    fn test_fullscreen_quad_covers_every_pixel() {
        let mut raster = Rasterizer::new(800, 800);
        raster.bind_shader(Shader::flat(Color::WHITE));

        for input in fullscreen_quad() {
            raster.draw_triangle(&input);
        }

        for y in 0..800 {
            for x in 0..800 {
                assert_eq!(raster.image().get(x, y), Color::WHITE, "pixel {},{}", x, y);
            }
        }
    }

    #[test]
    fn test_depth_is_clamped_to_unit_range() {
        // Depths far outside [0, 1] clamp and still pass the far-plane
        // test, leaving the output identical to the in-range quad.
        let mut raster = Rasterizer::new(64, 64);
        raster.bind_shader(Shader::flat(Color::WHITE));
        for input in quad_at_depth(-40.0) {
            raster.draw_triangle(&input);
        }

        for y in 0..64 {
            for x in 0..64 {
                assert_eq!(raster.image().get(x, y), Color::WHITE);
            }
        }
    }

    #[test]
    fn test_depth_test_keeps_nearest_regardless_of_order() {
        for near_first in [false, true] {
            let mut raster = Rasterizer::new(32, 32);

            let draw_at = |raster: &mut Rasterizer, z: f32, color: Color| {
                raster.bind_shader(Shader::flat(color));
                for input in quad_at_depth(z) {
                    raster.draw_triangle(&input);
                }
            };

            let near = Color::rgba(0, 0, 255, 255);
            let far = Color::rgba(255, 0, 0, 255);
            if near_first {
                draw_at(&mut raster, -0.5, near);
                draw_at(&mut raster, 0.5, far);
            } else {
                draw_at(&mut raster, 0.5, far);
                draw_at(&mut raster, -0.5, near);
            }

            assert_eq!(raster.image().get(16, 16), near, "near_first={}", near_first);
        }
    }

    #[test]
    fn test_draw_without_shader_is_a_no_op() {
        let mut raster = Rasterizer::new(8, 8);
        raster.draw_triangle(&fullscreen_quad()[0]);
        assert_eq!(raster.image().get(4, 4), Color::default());
    }

    #[test]
    fn test_barycentric_interior_and_exterior() {
        let corners = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 10.0),
        ];

        let inside = screen_barycentric(&corners, Vec2::new(2.0, 3.0)).unwrap();
        assert!(inside.x > 0.0 && inside.x < 1.0);
        assert!(inside.y > 0.0 && inside.y < 1.0);
        assert!(inside.z > 0.0 && inside.z < 1.0);
        assert!((inside.x + inside.y + inside.z - 1.0).abs() < 1e-6);

        let outside = screen_barycentric(&corners, Vec2::new(20.0, 20.0)).unwrap();
        assert!(outside.x < 0.0 || outside.y < 0.0 || outside.z < 0.0);
    }

    #[test]
    fn test_barycentric_rejects_degenerate_triangle() {
        let corners = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(20.0, 0.0),
        ];
        assert!(screen_barycentric(&corners, Vec2::new(5.0, 0.0)).is_none());
    }

    #[test]
    fn test_flat_triangle_fills_interior() {
        let mut raster = Rasterizer::new(32, 32);
        let color = Color::rgba(0, 255, 0, 255);
        raster.draw_triangle_flat((2, 2), (28, 2), (2, 28), color);

        assert_eq!(raster.image().get(8, 8), color);
        assert_eq!(raster.image().get(3, 26), color);
        assert_eq!(raster.image().get(30, 30), Color::default());
    }

    #[test]
    fn test_line_endpoints_and_diagonal() {
        let mut raster = Rasterizer::new(16, 16);
        raster.draw_line(0, 0, 15, 15, Color::WHITE);

        assert_eq!(raster.image().get(0, 0), Color::WHITE);
        assert_eq!(raster.image().get(15, 15), Color::WHITE);
        assert_eq!(raster.image().get(7, 7), Color::WHITE);
    }

    #[test]
    fn test_steep_line_is_continuous() {
        let mut raster = Rasterizer::new(16, 16);
        raster.draw_line(3, 0, 5, 15, Color::WHITE);

        // Each row must contain exactly one lit pixel.
        for y in 0..16 {
            let lit = (0..16).filter(|&x| raster.image().get(x, y) == Color::WHITE).count();
            assert_eq!(lit, 1, "row {}", y);
        }
    }
}
