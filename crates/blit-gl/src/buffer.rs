//! Vertex and index buffers.

use std::cell::Cell;

use bytemuck::Pod;

use crate::binder::{BindGuard, Binder, Binding};
use crate::driver::GlContext;
use crate::error::GlError;

/// Allocation hint passed with each full upload.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Usage {
    Static,
    #[default]
    Dynamic,
    Stream,
}

impl Usage {
    pub const fn gl(self) -> u32 {
        match self {
            Usage::Static => glow::STATIC_DRAW,
            Usage::Dynamic => glow::DYNAMIC_DRAW,
            Usage::Stream => glow::STREAM_DRAW,
        }
    }
}

/// Primitive topology.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum DrawMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl DrawMode {
    pub const fn gl(self) -> u32 {
        match self {
            DrawMode::Points => glow::POINTS,
            DrawMode::Lines => glow::LINES,
            DrawMode::LineLoop => glow::LINE_LOOP,
            DrawMode::LineStrip => glow::LINE_STRIP,
            DrawMode::Triangles => glow::TRIANGLES,
            DrawMode::TriangleStrip => glow::TRIANGLE_STRIP,
            DrawMode::TriangleFan => glow::TRIANGLE_FAN,
        }
    }
}

/// GPU vertex buffer.
///
/// `len` counts elements of the type last passed to [`set_data`](Self::set_data).
pub struct VertexBuffer {
    gl: GlContext,
    binder: Binder,
    len: Cell<usize>,
    byte_len: Cell<usize>,
    usage: Cell<Usage>,
    mode: Cell<DrawMode>,
}

impl VertexBuffer {
    pub fn new(gl: GlContext) -> Result<Self, GlError> {
        let id = gl.create_buffer()?;
        Ok(Self {
            binder: Binder::new(gl.clone(), Binding::ArrayBuffer, id),
            gl,
            len: Cell::new(0),
            byte_len: Cell::new(0),
            usage: Cell::new(Usage::default()),
            mode: Cell::new(DrawMode::default()),
        })
    }

    pub fn id(&self) -> u32 {
        self.binder.id()
    }

    pub fn len(&self) -> usize {
        self.len.get()
    }

    pub fn is_empty(&self) -> bool {
        self.len.get() == 0
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len.get()
    }

    pub fn usage(&self) -> Usage {
        self.usage.get()
    }

    /// Takes effect on the next [`set_data`](Self::set_data).
    pub fn set_usage(&self, usage: Usage) {
        self.usage.set(usage);
    }

    pub fn mode(&self) -> DrawMode {
        self.mode.get()
    }

    pub fn set_mode(&self, mode: DrawMode) {
        self.mode.set(mode);
    }

    pub fn bind(&self) -> BindGuard<'_> {
        self.binder.scope()
    }

    /// Replaces the whole buffer.
    pub fn set_data<T: Pod>(&self, data: &[T]) {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let _bound = self.binder.scope();
        self.gl.buffer_data(glow::ARRAY_BUFFER, bytes, self.usage.get().gl());
        self.len.set(data.len());
        self.byte_len.set(bytes.len());
    }

    /// Reads the whole buffer back as `T`s.
    pub fn data<T: Pod>(&self) -> Result<Vec<T>, GlError> {
        let size = std::mem::size_of::<T>().max(1);
        let byte_len = self.byte_len.get();
        if byte_len % size != 0 {
            return Err(GlError::ShapeMismatch {
                what: "buffer readback",
                expected: byte_len / size * size,
                found: byte_len,
            });
        }
        let mut out = vec![T::zeroed(); byte_len / size];
        self.read_bytes(0, bytemuck::cast_slice_mut(&mut out))?;
        Ok(out)
    }

    pub(crate) fn write_bytes(&self, offset: usize, bytes: &[u8]) -> Result<(), GlError> {
        self.check_range(offset, bytes.len())?;
        if bytes.is_empty() {
            return Ok(());
        }
        let _bound = self.binder.scope();
        self.gl.buffer_sub_data(glow::ARRAY_BUFFER, offset, bytes);
        Ok(())
    }

    pub(crate) fn read_bytes(&self, offset: usize, out: &mut [u8]) -> Result<(), GlError> {
        self.check_range(offset, out.len())?;
        if out.is_empty() {
            return Ok(());
        }
        let _bound = self.binder.scope();
        self.gl.get_buffer_sub_data(glow::ARRAY_BUFFER, offset, out);
        Ok(())
    }

    fn check_range(&self, offset: usize, len: usize) -> Result<(), GlError> {
        if offset + len > self.byte_len.get() {
            return Err(GlError::OutOfBounds { what: "vertex buffer" });
        }
        Ok(())
    }

    /// Draws `[0, len)`. No-op while empty.
    ///
    /// A vertex array describing the layout must already be bound.
    pub fn draw(&self) {
        let _bound = self.binder.scope();
        if self.len.get() == 0 {
            return;
        }
        self.gl
            .draw_arrays(self.mode.get().gl(), 0, self.len.get() as i32);
    }
}

impl Drop for VertexBuffer {
    fn drop(&mut self) {
        self.gl.delete_buffer(self.binder.id());
    }
}

impl std::fmt::Debug for VertexBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexBuffer")
            .field("id", &self.id())
            .field("len", &self.len())
            .field("usage", &self.usage())
            .finish()
    }
}

/// GPU index buffer of `u32` indices.
///
/// `len` is the primitive count passed to the draw call; it is tracked
/// separately from the byte length.
pub struct IndexBuffer {
    gl: GlContext,
    binder: Binder,
    len: Cell<usize>,
    byte_len: Cell<usize>,
    usage: Cell<Usage>,
    mode: Cell<DrawMode>,
}

impl IndexBuffer {
    pub fn new(gl: GlContext) -> Result<Self, GlError> {
        let id = gl.create_buffer()?;
        Ok(Self {
            binder: Binder::new(gl.clone(), Binding::ElementArrayBuffer, id),
            gl,
            len: Cell::new(0),
            byte_len: Cell::new(0),
            usage: Cell::new(Usage::default()),
            mode: Cell::new(DrawMode::default()),
        })
    }

    pub fn id(&self) -> u32 {
        self.binder.id()
    }

    pub fn len(&self) -> usize {
        self.len.get()
    }

    pub fn is_empty(&self) -> bool {
        self.len.get() == 0
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len.get()
    }

    pub fn set_usage(&self, usage: Usage) {
        self.usage.set(usage);
    }

    pub fn mode(&self) -> DrawMode {
        self.mode.get()
    }

    pub fn set_mode(&self, mode: DrawMode) {
        self.mode.set(mode);
    }

    pub fn bind(&self) -> BindGuard<'_> {
        self.binder.scope()
    }

    pub fn set_data(&self, indices: &[u32]) {
        let bytes: &[u8] = bytemuck::cast_slice(indices);
        let _bound = self.binder.scope();
        self.gl
            .buffer_data(glow::ELEMENT_ARRAY_BUFFER, bytes, self.usage.get().gl());
        self.len.set(indices.len());
        self.byte_len.set(bytes.len());
    }

    pub fn data(&self) -> Vec<u32> {
        let mut out = vec![0u32; self.byte_len.get() / 4];
        if !out.is_empty() {
            let _bound = self.binder.scope();
            self.gl.get_buffer_sub_data(
                glow::ELEMENT_ARRAY_BUFFER,
                0,
                bytemuck::cast_slice_mut(&mut out),
            );
        }
        out
    }

    /// Issues an indexed draw over all indices. No-op while empty.
    pub fn draw(&self) {
        let _bound = self.binder.scope();
        if self.len.get() == 0 {
            return;
        }
        self.gl.draw_elements(
            self.mode.get().gl(),
            self.len.get() as i32,
            glow::UNSIGNED_INT,
            0,
        );
    }
}

impl Drop for IndexBuffer {
    fn drop(&mut self) {
        self.gl.delete_buffer(self.binder.id());
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::driver::{Call, Headless};

    fn setup() -> (Rc<Headless>, GlContext) {
        let h = Rc::new(Headless::new());
        let gl: GlContext = h.clone();
        (h, gl)
    }

    fn draws(h: &Headless) -> Vec<Call> {
        h.calls().into_iter().filter(Call::is_draw).collect()
    }

    #[test]
    fn set_data_replaces_contents_and_len() {
        let (h, gl) = setup();
        let vbo = VertexBuffer::new(gl).unwrap();
        vbo.set_data(&[1.0f32, 2.0, 3.0]);
        vbo.set_data(&[4.0f32, 5.0]);

        assert_eq!(vbo.len(), 2);
        assert_eq!(vbo.byte_len(), 8);
        assert_eq!(vbo.data::<f32>().unwrap(), vec![4.0, 5.0]);
        assert_eq!(h.bound(glow::ARRAY_BUFFER_BINDING), 0);
    }

    #[test]
    fn empty_buffer_draw_is_a_no_op() {
        let (h, gl) = setup();
        let vbo = VertexBuffer::new(gl).unwrap();
        vbo.draw();
        assert!(draws(&h).is_empty());
    }

    #[test]
    fn draw_spans_whole_buffer_with_mode() {
        let (h, gl) = setup();
        gl.bind_vertex_array(1);
        let vbo = VertexBuffer::new(gl).unwrap();
        vbo.set_mode(DrawMode::TriangleStrip);
        vbo.set_data(&[[0.0f32; 2]; 4]);
        vbo.draw();

        let d = draws(&h);
        assert_eq!(d.len(), 1);
        assert!(matches!(
            d[0],
            Call::DrawArrays { mode: glow::TRIANGLE_STRIP, first: 0, count: 4, .. }
        ));
    }

    #[test]
    fn sub_range_outside_buffer_is_rejected() {
        let (_h, gl) = setup();
        let vbo = VertexBuffer::new(gl).unwrap();
        vbo.set_data(&[0u8; 8]);
        assert!(vbo.write_bytes(4, &[1; 4]).is_ok());
        assert!(vbo.write_bytes(6, &[1; 4]).is_err());
        let mut out = [0u8; 2];
        assert!(vbo.read_bytes(4, &mut out).is_ok());
        assert_eq!(out, [1, 1]);
    }

    #[test]
    fn index_buffer_draws_its_primitive_count() {
        let (h, gl) = setup();
        let ebo = IndexBuffer::new(gl).unwrap();
        ebo.set_data(&[0, 1, 2, 2, 3, 0]);
        assert_eq!(ebo.byte_len(), 24);
        assert_eq!(ebo.data(), vec![0, 1, 2, 2, 3, 0]);

        ebo.draw();
        let d = draws(&h);
        assert_eq!(d.len(), 1);
        assert!(matches!(d[0], Call::DrawElements { count: 6, .. }));
        assert!(h.errors().is_empty());
    }

    #[test]
    fn drop_releases_the_buffer() {
        let (h, gl) = setup();
        let vbo = VertexBuffer::new(gl.clone()).unwrap();
        let ebo = IndexBuffer::new(gl).unwrap();
        assert_eq!(h.live_objects(), 2);
        drop(vbo);
        drop(ebo);
        assert_eq!(h.live_objects(), 0);
    }
}
