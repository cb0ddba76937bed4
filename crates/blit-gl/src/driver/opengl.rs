use std::num::NonZeroU32;

use glow::HasContext;

use super::{ActiveVariable, Driver};
use crate::error::GlError;

/// OpenGL backend over a `glow` context.
pub struct OpenGl {
    gl: glow::Context,
}

impl OpenGl {
    /// Wraps a loaded `glow` context.
    ///
    /// # Safety
    ///
    /// The context must be current on the calling thread for the whole
    /// lifetime of the returned value, and every call must happen on that
    /// thread.
    pub unsafe fn new(gl: glow::Context) -> Self {
        log::debug!(
            "OpenGL driver: {}",
            // SAFETY: the caller guarantees a current context.
            unsafe { gl.get_parameter_string(glow::VERSION) }
        );
        Self { gl }
    }

    pub fn raw(&self) -> &glow::Context {
        &self.gl
    }
}

fn name(id: u32) -> Option<NonZeroU32> {
    NonZeroU32::new(id)
}

fn location(id: u32) -> glow::NativeUniformLocation {
    glow::NativeUniformLocation(id)
}

// SAFETY (all methods): `OpenGl::new` requires the context to be current on
// this thread, and the wrapper is `!Send`, so every raw call below runs with a
// valid current context. Ids come from the matching `create_*` call.
impl Driver for OpenGl {
    fn get_integer(&self, pname: u32) -> i32 {
        unsafe { self.gl.get_parameter_i32(pname) }
    }

    fn get_viewport(&self) -> [i32; 4] {
        let mut out = [0; 4];
        unsafe { self.gl.get_parameter_i32_slice(glow::VIEWPORT, &mut out) };
        out
    }

    fn create_buffer(&self) -> Result<u32, GlError> {
        unsafe { self.gl.create_buffer() }
            .map(|b| b.0.get())
            .map_err(GlError::Create)
    }

    fn delete_buffer(&self, id: u32) {
        if let Some(n) = name(id) {
            unsafe { self.gl.delete_buffer(glow::NativeBuffer(n)) };
        }
    }

    fn bind_buffer(&self, target: u32, id: u32) {
        unsafe { self.gl.bind_buffer(target, name(id).map(glow::NativeBuffer)) };
    }

    fn buffer_data(&self, target: u32, data: &[u8], usage: u32) {
        unsafe { self.gl.buffer_data_u8_slice(target, data, usage) };
    }

    fn buffer_sub_data(&self, target: u32, offset: usize, data: &[u8]) {
        unsafe { self.gl.buffer_sub_data_u8_slice(target, offset as i32, data) };
    }

    fn get_buffer_sub_data(&self, target: u32, offset: usize, out: &mut [u8]) {
        unsafe { self.gl.get_buffer_sub_data(target, offset as i32, out) };
    }

    fn create_vertex_array(&self) -> Result<u32, GlError> {
        unsafe { self.gl.create_vertex_array() }
            .map(|v| v.0.get())
            .map_err(GlError::Create)
    }

    fn delete_vertex_array(&self, id: u32) {
        if let Some(n) = name(id) {
            unsafe { self.gl.delete_vertex_array(glow::NativeVertexArray(n)) };
        }
    }

    fn bind_vertex_array(&self, id: u32) {
        unsafe { self.gl.bind_vertex_array(name(id).map(glow::NativeVertexArray)) };
    }

    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        ty: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, size, ty, normalized, stride, offset)
        };
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) };
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(mode, first, count) };
    }

    fn draw_elements(&self, mode: u32, count: i32, ty: u32, offset: i32) {
        unsafe { self.gl.draw_elements(mode, count, ty, offset) };
    }

    fn create_shader(&self, stage: u32) -> Result<u32, GlError> {
        unsafe { self.gl.create_shader(stage) }
            .map(|s| s.0.get())
            .map_err(GlError::Create)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        if let Some(n) = name(shader) {
            unsafe { self.gl.shader_source(glow::NativeShader(n), source) };
        }
    }

    fn compile_shader(&self, shader: u32) {
        if let Some(n) = name(shader) {
            unsafe { self.gl.compile_shader(glow::NativeShader(n)) };
        }
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        name(shader)
            .map(|n| unsafe { self.gl.get_shader_compile_status(glow::NativeShader(n)) })
            .unwrap_or(false)
    }

    fn shader_info_log(&self, shader: u32) -> String {
        name(shader)
            .map(|n| unsafe { self.gl.get_shader_info_log(glow::NativeShader(n)) })
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: u32) {
        if let Some(n) = name(shader) {
            unsafe { self.gl.delete_shader(glow::NativeShader(n)) };
        }
    }

    fn create_program(&self) -> Result<u32, GlError> {
        unsafe { self.gl.create_program() }
            .map(|p| p.0.get())
            .map_err(GlError::Create)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        if let (Some(p), Some(s)) = (name(program), name(shader)) {
            unsafe {
                self.gl
                    .attach_shader(glow::NativeProgram(p), glow::NativeShader(s))
            };
        }
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        if let (Some(p), Some(s)) = (name(program), name(shader)) {
            unsafe {
                self.gl
                    .detach_shader(glow::NativeProgram(p), glow::NativeShader(s))
            };
        }
    }

    fn link_program(&self, program: u32) {
        if let Some(p) = name(program) {
            unsafe { self.gl.link_program(glow::NativeProgram(p)) };
        }
    }

    fn program_link_status(&self, program: u32) -> bool {
        name(program)
            .map(|p| unsafe { self.gl.get_program_link_status(glow::NativeProgram(p)) })
            .unwrap_or(false)
    }

    fn program_info_log(&self, program: u32) -> String {
        name(program)
            .map(|p| unsafe { self.gl.get_program_info_log(glow::NativeProgram(p)) })
            .unwrap_or_default()
    }

    fn use_program(&self, program: u32) {
        unsafe { self.gl.use_program(name(program).map(glow::NativeProgram)) };
    }

    fn delete_program(&self, program: u32) {
        if let Some(p) = name(program) {
            unsafe { self.gl.delete_program(glow::NativeProgram(p)) };
        }
    }

    fn active_uniforms(&self, program: u32) -> u32 {
        name(program)
            .map(|p| unsafe { self.gl.get_active_uniforms(glow::NativeProgram(p)) })
            .unwrap_or(0)
    }

    fn active_uniform(&self, program: u32, index: u32) -> Option<ActiveVariable> {
        let p = glow::NativeProgram(name(program)?);
        let u = unsafe { self.gl.get_active_uniform(p, index) }?;
        Some(ActiveVariable { name: u.name, ty: u.utype, size: u.size })
    }

    fn uniform_location(&self, program: u32, uniform: &str) -> Option<u32> {
        let p = glow::NativeProgram(name(program)?);
        unsafe { self.gl.get_uniform_location(p, uniform) }.map(|l| l.0)
    }

    fn active_attributes(&self, program: u32) -> u32 {
        name(program)
            .map(|p| unsafe { self.gl.get_active_attributes(glow::NativeProgram(p)) })
            .unwrap_or(0)
    }

    fn active_attribute(&self, program: u32, index: u32) -> Option<ActiveVariable> {
        let p = glow::NativeProgram(name(program)?);
        let a = unsafe { self.gl.get_active_attribute(p, index) }?;
        Some(ActiveVariable { name: a.name, ty: a.atype, size: a.size })
    }

    fn attrib_location(&self, program: u32, attribute: &str) -> Option<u32> {
        let p = glow::NativeProgram(name(program)?);
        unsafe { self.gl.get_attrib_location(p, attribute) }
    }

    fn uniform_f32(&self, loc: u32, values: &[f32]) {
        let l = location(loc);
        unsafe {
            match *values {
                [x] => self.gl.uniform_1_f32(Some(&l), x),
                [x, y] => self.gl.uniform_2_f32(Some(&l), x, y),
                [x, y, z] => self.gl.uniform_3_f32(Some(&l), x, y, z),
                [x, y, z, w] => self.gl.uniform_4_f32(Some(&l), x, y, z, w),
                _ => log::warn!("uniform_f32: unsupported component count {}", values.len()),
            }
        }
    }

    fn uniform_i32(&self, loc: u32, value: i32) {
        unsafe { self.gl.uniform_1_i32(Some(&location(loc)), value) };
    }

    fn uniform_u32(&self, loc: u32, value: u32) {
        unsafe { self.gl.uniform_1_u32(Some(&location(loc)), value) };
    }

    fn uniform_matrix(&self, loc: u32, dim: usize, values: &[f32]) {
        let l = location(loc);
        unsafe {
            match dim {
                2 => self.gl.uniform_matrix_2_f32_slice(Some(&l), false, values),
                3 => self.gl.uniform_matrix_3_f32_slice(Some(&l), false, values),
                4 => self.gl.uniform_matrix_4_f32_slice(Some(&l), false, values),
                _ => log::warn!("uniform_matrix: unsupported dimension {dim}"),
            }
        }
    }

    fn uniform_matrix_nxm(&self, loc: u32, cols: usize, rows: usize, values: &[f32]) {
        let l = location(loc);
        unsafe {
            match (cols, rows) {
                (2, 3) => self.gl.uniform_matrix_2x3_f32_slice(Some(&l), false, values),
                (2, 4) => self.gl.uniform_matrix_2x4_f32_slice(Some(&l), false, values),
                (3, 2) => self.gl.uniform_matrix_3x2_f32_slice(Some(&l), false, values),
                (3, 4) => self.gl.uniform_matrix_3x4_f32_slice(Some(&l), false, values),
                (4, 2) => self.gl.uniform_matrix_4x2_f32_slice(Some(&l), false, values),
                (4, 3) => self.gl.uniform_matrix_4x3_f32_slice(Some(&l), false, values),
                _ => log::warn!("uniform_matrix_nxm: unsupported shape {cols}x{rows}"),
            }
        }
    }

    fn create_texture(&self) -> Result<u32, GlError> {
        unsafe { self.gl.create_texture() }
            .map(|t| t.0.get())
            .map_err(GlError::Create)
    }

    fn delete_texture(&self, id: u32) {
        if let Some(n) = name(id) {
            unsafe { self.gl.delete_texture(glow::NativeTexture(n)) };
        }
    }

    fn bind_texture(&self, target: u32, id: u32) {
        unsafe { self.gl.bind_texture(target, name(id).map(glow::NativeTexture)) };
    }

    fn tex_image_2d(&self, target: u32, width: i32, height: i32, pixels: Option<&[u8]>) {
        unsafe {
            self.gl.tex_image_2d(
                target,
                0,
                glow::RGBA8 as i32,
                width,
                height,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(pixels),
            )
        };
    }

    fn tex_sub_image_2d(&self, target: u32, x: i32, y: i32, width: i32, height: i32, pixels: &[u8]) {
        unsafe {
            self.gl.tex_sub_image_2d(
                target,
                0,
                x,
                y,
                width,
                height,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(pixels)),
            )
        };
    }

    fn get_tex_image(&self, target: u32, out: &mut [u8]) {
        unsafe {
            self.gl.get_tex_image(
                target,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(Some(out)),
            )
        };
    }

    fn tex_parameter_i32(&self, target: u32, pname: u32, value: i32) {
        unsafe { self.gl.tex_parameter_i32(target, pname, value) };
    }

    fn tex_parameter_f32_slice(&self, target: u32, pname: u32, values: &[f32]) {
        unsafe { self.gl.tex_parameter_f32_slice(target, pname, values) };
    }

    fn create_framebuffer(&self) -> Result<u32, GlError> {
        unsafe { self.gl.create_framebuffer() }
            .map(|f| f.0.get())
            .map_err(GlError::Create)
    }

    fn delete_framebuffer(&self, id: u32) {
        if let Some(n) = name(id) {
            unsafe { self.gl.delete_framebuffer(glow::NativeFramebuffer(n)) };
        }
    }

    fn bind_framebuffer(&self, target: u32, id: u32) {
        unsafe { self.gl.bind_framebuffer(target, name(id).map(glow::NativeFramebuffer)) };
    }

    fn framebuffer_texture_2d(&self, target: u32, attachment: u32, tex_target: u32, texture: u32) {
        unsafe {
            self.gl.framebuffer_texture_2d(
                target,
                attachment,
                tex_target,
                name(texture).map(glow::NativeTexture),
                0,
            )
        };
    }

    fn blit_framebuffer(&self, src: [i32; 4], dst: [i32; 4], mask: u32, filter: u32) {
        unsafe {
            self.gl.blit_framebuffer(
                src[0], src[1], src[2], src[3], dst[0], dst[1], dst[2], dst[3], mask, filter,
            )
        };
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { self.gl.clear_color(r, g, b, a) };
    }

    fn clear(&self, mask: u32) {
        unsafe { self.gl.clear(mask) };
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) };
    }

    fn scissor(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.scissor(x, y, width, height) };
    }

    fn enable(&self, cap: u32) {
        unsafe { self.gl.enable(cap) };
    }

    fn disable(&self, cap: u32) {
        unsafe { self.gl.disable(cap) };
    }

    fn blend_func(&self, src: u32, dst: u32) {
        unsafe { self.gl.blend_func(src, dst) };
    }
}
