//! Global fixed-function state.

use crate::driver::Driver;

/// Blend equation factor.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BlendFactor {
    One,
    Zero,
    SrcAlpha,
    DstAlpha,
    OneMinusSrcAlpha,
    OneMinusDstAlpha,
}

impl BlendFactor {
    pub const fn gl(self) -> u32 {
        match self {
            BlendFactor::One => glow::ONE,
            BlendFactor::Zero => glow::ZERO,
            BlendFactor::SrcAlpha => glow::SRC_ALPHA,
            BlendFactor::DstAlpha => glow::DST_ALPHA,
            BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
            BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
        }
    }
}

/// Sets the color used by [`clear`], components in `[0, 1]`.
pub fn set_clear_color(gl: &dyn Driver, rgba: [f32; 4]) {
    gl.clear_color(rgba[0], rgba[1], rgba[2], rgba[3]);
}

/// Clears color and depth of the current draw target.
pub fn clear(gl: &dyn Driver) {
    gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
}

/// Restricts drawing to a rectangle: sets both viewport and scissor box.
pub fn set_bounds(gl: &dyn Driver, x: i32, y: i32, width: i32, height: i32) {
    gl.viewport(x, y, width, height);
    gl.scissor(x, y, width, height);
}

/// Current viewport as `[x, y, width, height]`.
pub fn viewport(gl: &dyn Driver) -> [i32; 4] {
    gl.get_viewport()
}

/// Width over height of the current viewport; `1.0` when degenerate.
pub fn aspect(gl: &dyn Driver) -> f32 {
    let [_, _, w, h] = gl.get_viewport();
    if w <= 0 || h <= 0 {
        return 1.0;
    }
    w as f32 / h as f32
}

pub fn enable_msaa(gl: &dyn Driver) {
    gl.enable(glow::MULTISAMPLE);
}

pub fn disable_msaa(gl: &dyn Driver) {
    gl.disable(glow::MULTISAMPLE);
}

pub fn enable_blend(gl: &dyn Driver) {
    gl.enable(glow::BLEND);
}

pub fn disable_blend(gl: &dyn Driver) {
    gl.disable(glow::BLEND);
}

pub fn blend_func(gl: &dyn Driver, src: BlendFactor, dst: BlendFactor) {
    gl.blend_func(src.gl(), dst.gl());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Headless;

    #[test]
    fn bounds_set_viewport_and_scissor() {
        let gl = Headless::with_surface(640, 480);
        assert_eq!(aspect(&gl), 640.0 / 480.0);

        set_bounds(&gl, 0, 0, 200, 100);
        assert_eq!(viewport(&gl), [0, 0, 200, 100]);
        assert_eq!(gl.scissor_box(), [0, 0, 200, 100]);
        assert_eq!(aspect(&gl), 2.0);

        set_bounds(&gl, 0, 0, 200, 0);
        assert_eq!(aspect(&gl), 1.0);
    }

    #[test]
    fn toggles_and_blend() {
        let gl = Headless::new();
        enable_msaa(&gl);
        enable_blend(&gl);
        assert!(gl.is_enabled(glow::MULTISAMPLE) && gl.is_enabled(glow::BLEND));
        disable_msaa(&gl);
        assert!(!gl.is_enabled(glow::MULTISAMPLE));

        blend_func(&gl, BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
        assert_eq!(gl.blend(), (glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA));
    }

    #[test]
    fn clear_fills_the_surface() {
        let gl = Headless::with_surface(2, 2);
        set_clear_color(&gl, [0.0, 0.0, 1.0, 1.0]);
        clear(&gl);
        assert_eq!(gl.surface_pixels(), [0u8, 0, 255, 255].repeat(4));
    }
}
