//! Math types for scene transforms.
//!
//! World space is right-handed: +X right, +Y up, the camera looks down -Z.
//! Matrices are column-major `[f32; 16]`, the layout GL uniforms expect.

mod color;
mod mat4;
mod rect;
mod vec;

pub use color::Color;
pub use mat4::Mat4;
pub use rect::Rect;
pub use vec::{Vec2, Vec3};
