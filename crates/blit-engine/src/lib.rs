//! Blit engine crate.
//!
//! Platform, math and scene layers built on top of `blit-gl`: window and GL
//! context creation, the frame loop, input tracking, and the sprite/camera
//! types that turn scene state into draw calls.

pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod math;
pub mod scene;
pub mod time;
pub mod window;

pub use blit_gl as gl;
