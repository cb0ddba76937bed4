//! Graphics driver seam.
//!
//! Everything in this crate talks to the GPU through [`Driver`]. Two
//! implementations exist:
//! - [`OpenGl`]: the real backend over a current `glow` context
//! - `Headless`: an in-memory software driver for tests, built under
//!   `cfg(test)` or the `headless` feature
//!
//! Object ids are plain `u32` names with `0` meaning "none", and enums are the
//! raw GL tokens, so callers can pass `glow::*` constants straight through.

#[cfg(any(test, feature = "headless"))]
mod headless;
mod opengl;

use std::rc::Rc;

use crate::error::GlError;

#[cfg(any(test, feature = "headless"))]
pub use headless::{AttribPointer, Call, Headless, UniformData};
pub use opengl::OpenGl;

/// Shared handle to the active driver.
///
/// Not `Send`: GL state belongs to the thread that made the context current.
pub type GlContext = Rc<dyn Driver>;

/// One active uniform or vertex attribute reported by a linked program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveVariable {
    pub name: String,
    /// GL type token (e.g. `FLOAT_VEC4`).
    pub ty: u32,
    /// Array length; `1` for non-arrays.
    pub size: i32,
}

/// Driver primitives consumed by the GL wrappers.
///
/// Texture entry points always operate on RGBA8 pixel data.
pub trait Driver {
    // ── queries ─────────────────────────────────────────────────────────
    fn get_integer(&self, pname: u32) -> i32;
    fn get_viewport(&self) -> [i32; 4];

    // ── buffers ─────────────────────────────────────────────────────────
    fn create_buffer(&self) -> Result<u32, GlError>;
    fn delete_buffer(&self, id: u32);
    fn bind_buffer(&self, target: u32, id: u32);
    fn buffer_data(&self, target: u32, data: &[u8], usage: u32);
    fn buffer_sub_data(&self, target: u32, offset: usize, data: &[u8]);
    fn get_buffer_sub_data(&self, target: u32, offset: usize, out: &mut [u8]);

    // ── vertex arrays ───────────────────────────────────────────────────
    fn create_vertex_array(&self) -> Result<u32, GlError>;
    fn delete_vertex_array(&self, id: u32);
    fn bind_vertex_array(&self, id: u32);
    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        ty: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    fn enable_vertex_attrib_array(&self, index: u32);

    // ── draws ───────────────────────────────────────────────────────────
    fn draw_arrays(&self, mode: u32, first: i32, count: i32);
    fn draw_elements(&self, mode: u32, count: i32, ty: u32, offset: i32);

    // ── shaders / programs ──────────────────────────────────────────────
    fn create_shader(&self, stage: u32) -> Result<u32, GlError>;
    fn shader_source(&self, shader: u32, source: &str);
    fn compile_shader(&self, shader: u32);
    fn shader_compile_status(&self, shader: u32) -> bool;
    fn shader_info_log(&self, shader: u32) -> String;
    fn delete_shader(&self, shader: u32);

    fn create_program(&self) -> Result<u32, GlError>;
    fn attach_shader(&self, program: u32, shader: u32);
    fn detach_shader(&self, program: u32, shader: u32);
    fn link_program(&self, program: u32);
    fn program_link_status(&self, program: u32) -> bool;
    fn program_info_log(&self, program: u32) -> String;
    fn use_program(&self, program: u32);
    fn delete_program(&self, program: u32);

    fn active_uniforms(&self, program: u32) -> u32;
    fn active_uniform(&self, program: u32, index: u32) -> Option<ActiveVariable>;
    fn uniform_location(&self, program: u32, name: &str) -> Option<u32>;
    fn active_attributes(&self, program: u32) -> u32;
    fn active_attribute(&self, program: u32, index: u32) -> Option<ActiveVariable>;
    fn attrib_location(&self, program: u32, name: &str) -> Option<u32>;

    /// Sets a 1 to 4 component float uniform on the program in use.
    fn uniform_f32(&self, location: u32, values: &[f32]);
    fn uniform_i32(&self, location: u32, value: i32);
    fn uniform_u32(&self, location: u32, value: u32);
    /// Sets a `dim x dim` column-major matrix uniform.
    fn uniform_matrix(&self, location: u32, dim: usize, values: &[f32]);
    /// Sets a non-square `cols x rows` column-major matrix uniform.
    fn uniform_matrix_nxm(&self, location: u32, cols: usize, rows: usize, values: &[f32]);

    // ── textures ────────────────────────────────────────────────────────
    fn create_texture(&self) -> Result<u32, GlError>;
    fn delete_texture(&self, id: u32);
    fn bind_texture(&self, target: u32, id: u32);
    fn tex_image_2d(&self, target: u32, width: i32, height: i32, pixels: Option<&[u8]>);
    fn tex_sub_image_2d(&self, target: u32, x: i32, y: i32, width: i32, height: i32, pixels: &[u8]);
    fn get_tex_image(&self, target: u32, out: &mut [u8]);
    fn tex_parameter_i32(&self, target: u32, pname: u32, value: i32);
    fn tex_parameter_f32_slice(&self, target: u32, pname: u32, values: &[f32]);

    // ── framebuffers ────────────────────────────────────────────────────
    fn create_framebuffer(&self) -> Result<u32, GlError>;
    fn delete_framebuffer(&self, id: u32);
    fn bind_framebuffer(&self, target: u32, id: u32);
    fn framebuffer_texture_2d(&self, target: u32, attachment: u32, tex_target: u32, texture: u32);
    /// Copies `src` (`x0, y0, x1, y1`) of the read framebuffer into `dst` of the draw framebuffer.
    fn blit_framebuffer(&self, src: [i32; 4], dst: [i32; 4], mask: u32, filter: u32);

    // ── fixed-function state ────────────────────────────────────────────
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn clear(&self, mask: u32);
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn scissor(&self, x: i32, y: i32, width: i32, height: i32);
    fn enable(&self, cap: u32);
    fn disable(&self, cap: u32);
    fn blend_func(&self, src: u32, dst: u32);
}
