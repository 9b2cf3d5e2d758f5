//! Ember core - images, the TGA codec, and mesh input.
//!
//! This crate provides:
//!
//! - **Color**: packed 4-byte B,G,R,A color with saturating arithmetic
//! - **Image**: an owned pixel buffer with flips, scaling, and UV sampling
//! - **TGA codec**: plain and run-length-encoded read/write
//! - **Mesh**: triangle mesh input consumed by both renderers

pub mod color;
pub mod image;
pub mod mesh;
pub mod tga;

pub use color::Color;
pub use image::Image;
pub use mesh::{Mesh, MeshError};
pub use tga::TgaError;
