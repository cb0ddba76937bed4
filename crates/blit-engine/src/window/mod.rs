//! Window + runtime loop.
//!
//! Owns the winit `EventLoop` and the single window, and wires it to the GL
//! device, the input state and the application.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
