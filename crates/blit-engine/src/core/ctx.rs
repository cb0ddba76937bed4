use blit_gl::{state, GlContext};

use crate::input::InputState;
use crate::math::{Color, Rect};
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
pub struct FrameCtx<'a> {
    pub gl: &'a GlContext,
    pub input: &'a InputState,
    pub time: FrameTime,
    /// Framebuffer size in physical pixels.
    pub viewport: (u32, u32),
    pub runtime: &'a mut RuntimeCtx,
}

impl FrameCtx<'_> {
    /// Full-window viewport as a rectangle.
    pub fn viewport_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.viewport.0 as f32, self.viewport.1 as f32)
    }

    /// Width over height of the framebuffer.
    pub fn aspect(&self) -> f32 {
        self.viewport_rect().aspect()
    }

    /// Clears the current draw target to `color`.
    pub fn clear(&self, color: Color) {
        state::set_clear_color(&**self.gl, color.normalized());
        state::clear(&**self.gl);
    }
}
