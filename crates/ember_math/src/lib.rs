//! Ember math - linear algebra foundation for the software renderers.
//!
//! This crate provides:
//!
//! - **Vector types**: `Vec2`, `Vec3`, `Vec4` with the usual arithmetic
//! - **4x4 matrices**: `Mat4` with camera constructors and Gauss-Jordan inversion
//! - **Geometry helpers**: `Ray` and `Aabb` shared by both render paths

mod aabb;
mod matrix;
mod ray;
mod vector;

pub use aabb::Aabb;
pub use matrix::Mat4;
pub use ray::Ray;
pub use vector::{Vec2, Vec3, Vec4};
