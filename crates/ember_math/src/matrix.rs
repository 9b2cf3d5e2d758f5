//! 4x4 float matrices, row-major.
//!
//! Provides the transform toolbox both renderers share: model/view/projection
//! constructors, the viewport mapping, and an explicit Gauss-Jordan inverse
//! used to walk camera rays back from clip space to world space.

use crate::{Vec3, Vec4};

/// A 4x4 matrix with row-major storage: `m[row][column]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub m: [[f32; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const ZERO: Mat4 = Mat4 { m: [[0.0; 4]; 4] };

    pub fn new(rows: [[f32; 4]; 4]) -> Self {
        Self { m: rows }
    }

    pub fn row(&self, r: usize) -> Vec4 {
        Vec4::new(self.m[r][0], self.m[r][1], self.m[r][2], self.m[r][3])
    }

    pub fn col(&self, c: usize) -> Vec4 {
        Vec4::new(self.m[0][c], self.m[1][c], self.m[2][c], self.m[3][c])
    }

    pub fn set_row(&mut self, r: usize, v: Vec4) {
        self.m[r] = [v.x, v.y, v.z, v.w];
    }

    pub fn set_col(&mut self, c: usize, v: Vec4) {
        self.m[0][c] = v.x;
        self.m[1][c] = v.y;
        self.m[2][c] = v.z;
        self.m[3][c] = v.w;
    }

    pub fn transpose(&self) -> Mat4 {
        let mut out = Mat4::ZERO;
        for r in 0..4 {
            for c in 0..4 {
                out.m[c][r] = self.m[r][c];
            }
        }
        out
    }

    /// Determinant of the 3x3 matrix left after removing `row` and `col`.
    pub fn minor(&self, row: usize, col: usize) -> f32 {
        let mut sub = [[0.0f32; 3]; 3];
        let mut sr = 0;
        for r in 0..4 {
            if r == row {
                continue;
            }
            let mut sc = 0;
            for c in 0..4 {
                if c == col {
                    continue;
                }
                sub[sr][sc] = self.m[r][c];
                sc += 1;
            }
            sr += 1;
        }
        sub[0][0] * (sub[1][1] * sub[2][2] - sub[1][2] * sub[2][1])
            - sub[0][1] * (sub[1][0] * sub[2][2] - sub[1][2] * sub[2][0])
            + sub[0][2] * (sub[1][0] * sub[2][1] - sub[1][1] * sub[2][0])
    }

    pub fn cofactor(&self, row: usize, col: usize) -> f32 {
        let sign = if (row + col) % 2 == 0 { 1.0 } else { -1.0 };
        sign * self.minor(row, col)
    }

    /// Transposed cofactor matrix.
    pub fn adjugate(&self) -> Mat4 {
        let mut out = Mat4::ZERO;
        for r in 0..4 {
            for c in 0..4 {
                out.m[c][r] = self.cofactor(r, c);
            }
        }
        out
    }

    pub fn determinant(&self) -> f32 {
        (0..4).map(|c| self.m[0][c] * self.cofactor(0, c)).sum()
    }

    /// Inverse by Gauss-Jordan elimination with partial pivoting.
    ///
    /// Returns `None` when no usable pivot can be found, i.e. the matrix is
    /// singular (or numerically close enough that elimination breaks down).
    pub fn try_inverse(&self) -> Option<Mat4> {
        let mut a = self.m;
        let mut b = Mat4::IDENTITY.m;

        for col in 0..4 {
            // Partial pivot: bring the largest remaining entry of this
            // column onto the diagonal.
            let pivot_row = (col..4)
                .max_by(|&r1, &r2| {
                    a[r1][col]
                        .abs()
                        .partial_cmp(&a[r2][col].abs())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .unwrap_or(col);
            if a[pivot_row][col].abs() < 1e-12 {
                return None;
            }
            a.swap(col, pivot_row);
            b.swap(col, pivot_row);

            let pivot = a[col][col];
            for c in 0..4 {
                a[col][c] /= pivot;
                b[col][c] /= pivot;
            }

            for r in 0..4 {
                if r == col {
                    continue;
                }
                let factor = a[r][col];
                for c in 0..4 {
                    a[r][c] -= factor * a[col][c];
                    b[r][c] -= factor * b[col][c];
                }
            }
        }

        Some(Mat4::new(b))
    }

    pub fn translation(offset: Vec3) -> Mat4 {
        Mat4::new([
            [1.0, 0.0, 0.0, offset.x],
            [0.0, 1.0, 0.0, offset.y],
            [0.0, 0.0, 1.0, offset.z],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn scaling(factor: Vec3) -> Mat4 {
        Mat4::new([
            [factor.x, 0.0, 0.0, 0.0],
            [0.0, factor.y, 0.0, 0.0],
            [0.0, 0.0, factor.z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Right-handed view matrix looking from `eye` toward `target`.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(forward);

        Mat4::new([
            [right.x, right.y, right.z, -right.dot(eye)],
            [up.x, up.y, up.z, -up.dot(eye)],
            [-forward.x, -forward.y, -forward.z, forward.dot(eye)],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Perspective projection. `fov_y` is the vertical field of view in
    /// degrees; `near` and `far` are positive distances along -Z.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let f = 1.0 / (fov_y.to_radians() / 2.0).tan();
        Mat4::new([
            [f / aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [
                0.0,
                0.0,
                (far + near) / (near - far),
                2.0 * far * near / (near - far),
            ],
            [0.0, 0.0, -1.0, 0.0],
        ])
    }

    /// Orthographic projection with a symmetric frustum of the given half
    /// extents.
    pub fn orthographic(half_width: f32, half_height: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new([
            [1.0 / half_width, 0.0, 0.0, 0.0],
            [0.0, 1.0 / half_height, 0.0, 0.0],
            [
                0.0,
                0.0,
                -2.0 / (far - near),
                -(far + near) / (far - near),
            ],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Maps NDC `[-1, 1]` to the pixel rectangle at `(x, y)` of size
    /// `width` x `height`, and NDC depth to `[0, 1]`.
    pub fn viewport(x: f32, y: f32, width: f32, height: f32) -> Mat4 {
        Mat4::new([
            [width / 2.0, 0.0, 0.0, x + width / 2.0],
            [0.0, height / 2.0, 0.0, y + height / 2.0],
            [0.0, 0.0, 0.5, 0.5],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Transform a point (w = 1) and drop the homogeneous coordinate
    /// without dividing.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        (*self * Vec4::from_point(p)).truncate()
    }

    /// Transform a direction (w = 0); translation has no effect.
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        (*self * Vec4::from_direction(v)).truncate()
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Mat4::IDENTITY
    }
}

impl std::ops::Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = Mat4::ZERO;
        for r in 0..4 {
            for c in 0..4 {
                out.m[r][c] = (0..4).map(|k| self.m[r][k] * rhs.m[k][c]).sum();
            }
        }
        out
    }
}

impl std::ops::Mul<Vec4> for Mat4 {
    type Output = Vec4;

    fn mul(self, rhs: Vec4) -> Vec4 {
        Vec4::new(
            self.row(0).dot(rhs),
            self.row(1).dot(rhs),
            self.row(2).dot(rhs),
            self.row(3).dot(rhs),
        )
    }
}
