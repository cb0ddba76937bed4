//! Contracts between the runtime loop and applications.
//!
//! Applications implement [`App`]; the runtime hands them a [`FrameCtx`]
//! each frame and input events as they arrive.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
