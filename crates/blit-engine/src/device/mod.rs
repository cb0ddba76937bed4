//! GL context + surface management.
//!
//! Responsible for:
//! - creating the glutin display, config, window surface and context
//! - loading `glow` and wrapping it as the shared [`GlContext`](blit_gl::GlContext)
//! - swap interval, resize and buffer swaps

mod graphics;
mod init;

pub use graphics::Graphics;
pub use init::GlInit;
