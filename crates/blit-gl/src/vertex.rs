//! Vertex arrays and growable vertex slices.
//!
//! A [`VertexArray`] pairs one vertex buffer with the attribute pointers of
//! an [`AttrFormat`] and reserves a fixed number of vertex slots. A
//! [`VertexSlice`] is a cheap view `[begin, end)` into those slots; clones
//! and sub-slices alias the same array.
//!
//! Growing a slice past its capacity moves it onto a freshly allocated array.
//! Other slices that aliased the old array keep pointing at it: they stay
//! valid to use, but no longer observe writes made through the grown slice.
//! Do not keep a slice across a growth of a sibling view.

use std::rc::Rc;

use crate::attr::AttrFormat;
use crate::binder::{BindGuard, Binder, Binding};
use crate::buffer::{DrawMode, VertexBuffer};
use crate::driver::GlContext;
use crate::error::GlError;
use crate::program::Program;

const MIN_CAPACITY: usize = 4;
const DOUBLING_LIMIT: usize = 1024;

/// Vertex buffer plus attribute layout.
pub struct VertexArray {
    gl: GlContext,
    vao: Binder,
    vbo: VertexBuffer,
    capacity: usize,
    format: AttrFormat,
    stride: usize,
    mode: DrawMode,
}

impl VertexArray {
    /// Reserves `capacity` (at least 4) zeroed vertices laid out by `format`.
    ///
    /// Every attribute must be a float scalar or vector.
    pub fn new(
        gl: GlContext,
        format: &AttrFormat,
        capacity: usize,
        mode: DrawMode,
    ) -> Result<Self, GlError> {
        if let Some(attr) = format.iter().find(|a| !a.ty.is_float_vector()) {
            return Err(GlError::UnsupportedType {
                name: attr.name.clone(),
                ty: attr.ty,
            });
        }

        let capacity = capacity.max(MIN_CAPACITY);
        let stride = format.stride();

        let vbo = VertexBuffer::new(gl.clone())?;
        vbo.set_mode(mode);
        let vao = Binder::new(gl.clone(), Binding::VertexArray, gl.create_vertex_array()?);

        {
            let _vao = vao.scope();
            vbo.set_data(&vec![0u8; capacity * stride]);

            let _vbo = vbo.bind();
            for (attr, offset) in format.iter().zip(format.offsets()) {
                gl.vertex_attrib_pointer(
                    attr.location,
                    attr.ty.element_count() as i32,
                    glow::FLOAT,
                    attr.normalized,
                    stride as i32,
                    offset as i32,
                );
                gl.enable_vertex_attrib_array(attr.location);
            }
        }

        Ok(Self {
            gl,
            vao,
            vbo,
            capacity,
            format: format.clone(),
            stride,
            mode,
        })
    }

    pub fn id(&self) -> u32 {
        self.vao.id()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes per vertex.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> &AttrFormat {
        &self.format
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    pub fn buffer(&self) -> &VertexBuffer {
        &self.vbo
    }

    pub fn bind(&self) -> BindGuard<'_> {
        self.vao.scope()
    }

    /// Draws vertices `[i, j)`. No-op for an empty range.
    pub fn draw(&self, i: usize, j: usize) {
        if j <= i {
            return;
        }
        let _vao = self.vao.scope();
        self.gl
            .draw_arrays(self.mode.gl(), i as i32, (j - i) as i32);
    }

    /// Writes whole vertices starting at slot `i`.
    pub fn write(&self, i: usize, data: &[f32]) -> Result<(), GlError> {
        self.vbo
            .write_bytes(i * self.stride, bytemuck::cast_slice(data))
    }

    /// Reads whole vertices starting at slot `i`.
    pub fn read(&self, i: usize, out: &mut [f32]) -> Result<(), GlError> {
        self.vbo
            .read_bytes(i * self.stride, bytemuck::cast_slice_mut(out))
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        self.gl.delete_vertex_array(self.vao.id());
    }
}

impl std::fmt::Debug for VertexArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexArray")
            .field("id", &self.id())
            .field("capacity", &self.capacity)
            .field("stride", &self.stride)
            .field("mode", &self.mode)
            .finish()
    }
}

/// View `[begin, end)` into a shared [`VertexArray`].
#[derive(Clone)]
pub struct VertexSlice {
    array: Rc<VertexArray>,
    begin: usize,
    end: usize,
}

impl VertexSlice {
    /// Allocates an array of `cap` vertices and views its first `len`.
    pub fn new(
        gl: GlContext,
        format: &AttrFormat,
        len: usize,
        cap: usize,
        mode: DrawMode,
    ) -> Result<Self, GlError> {
        if len > cap {
            return Err(GlError::LenExceedsCap { len, cap });
        }
        let array = VertexArray::new(gl, format, cap, mode)?;
        Ok(Self {
            array: Rc::new(array),
            begin: 0,
            end: len,
        })
    }

    /// Same as [`new`](Self::new), laid out by `program`'s vertex attributes.
    pub fn from_program(
        program: &Program,
        len: usize,
        cap: usize,
        mode: DrawMode,
    ) -> Result<Self, GlError> {
        Self::new(program.context().clone(), program.vertex_format(), len, cap, mode)
    }

    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.begin
    }

    /// Slots available from `begin` to the end of the underlying array.
    pub fn cap(&self) -> usize {
        self.array.capacity() - self.begin
    }

    /// Floats per vertex.
    pub fn stride(&self) -> usize {
        self.array.format().element_count()
    }

    pub fn format(&self) -> &AttrFormat {
        self.array.format()
    }

    pub fn array(&self) -> &VertexArray {
        &self.array
    }

    pub fn shares_array_with(&self, other: &VertexSlice) -> bool {
        Rc::ptr_eq(&self.array, &other.array)
    }

    /// Resizes the view, reallocating when `len` exceeds [`cap`](Self::cap).
    ///
    /// Existing vertices up to the old length are preserved. After a
    /// reallocation this slice no longer aliases its former siblings.
    pub fn set_len(&mut self, len: usize) -> Result<(), GlError> {
        *self = self.grow(len)?;
        Ok(())
    }

    fn grow(&self, len: usize) -> Result<VertexSlice, GlError> {
        if len <= self.cap() {
            return Ok(VertexSlice {
                array: Rc::clone(&self.array),
                begin: self.begin,
                end: self.begin + len,
            });
        }

        let mut new_cap = self.cap();
        if new_cap < DOUBLING_LIMIT {
            new_cap *= 2;
        } else {
            new_cap += new_cap / 4;
        }
        let new_cap = new_cap.max(len);

        let old = &self.array;
        let array = VertexArray::new(old.gl.clone(), old.format(), new_cap, old.mode())?;

        let mut kept = vec![0.0f32; self.len() * self.stride()];
        old.read(self.begin, &mut kept)?;
        array.write(0, &kept)?;

        log::trace!(
            "vertex slice grew {} -> {} (capacity {})",
            self.len(),
            len,
            array.capacity()
        );

        Ok(VertexSlice {
            array: Rc::new(array),
            begin: 0,
            end: len,
        })
    }

    /// Sub-view `[i, j)` relative to this slice, aliasing the same array.
    ///
    /// # Panics
    ///
    /// If `j < i` or `j` reaches past the array's capacity.
    pub fn slice(&self, i: usize, j: usize) -> VertexSlice {
        assert!(i <= j, "vertex slice: invalid range {i}..{j}");
        assert!(
            self.begin + j <= self.array.capacity(),
            "vertex slice: {j} out of capacity {}",
            self.cap()
        );
        VertexSlice {
            array: Rc::clone(&self.array),
            begin: self.begin + i,
            end: self.begin + j,
        }
    }

    /// Overwrites every vertex in the slice.
    ///
    /// `data` must hold exactly `len() * stride()` floats.
    pub fn set_vertex_data(&self, data: &[f32]) -> Result<(), GlError> {
        let expected = self.len() * self.stride();
        if data.len() != expected {
            return Err(GlError::ShapeMismatch {
                what: "vertex data",
                expected,
                found: data.len(),
            });
        }
        self.array.write(self.begin, data)
    }

    pub fn vertex_data(&self) -> Result<Vec<f32>, GlError> {
        let mut out = vec![0.0; self.len() * self.stride()];
        self.array.read(self.begin, &mut out)?;
        Ok(out)
    }

    /// Draws exactly `[begin, end)` of the underlying array.
    pub fn draw(&self) {
        self.array.draw(self.begin, self.end);
    }

    /// Binds the underlying vertex array until the guard drops.
    pub fn bind(&self) -> BindGuard<'_> {
        self.array.bind()
    }
}

impl std::fmt::Debug for VertexSlice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexSlice")
            .field("array", &self.array.id())
            .field("range", &(self.begin..self.end))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::{Attr, AttrType};
    use crate::driver::{Call, Headless};

    fn setup() -> (Rc<Headless>, GlContext) {
        let h = Rc::new(Headless::new());
        let gl: GlContext = h.clone();
        (h, gl)
    }

    /// `pos: vec2, uv: vec2`, four floats per vertex.
    fn quad_format() -> AttrFormat {
        [
            Attr::new("pos", AttrType::Vec2f, 0),
            Attr::new("uv", AttrType::Vec2f, 1),
        ]
        .into_iter()
        .collect()
    }

    fn ramp(n: usize) -> Vec<f32> {
        (0..n).map(|i| i as f32).collect()
    }

    fn arrays_created(h: &Headless) -> usize {
        h.calls()
            .iter()
            .filter(|c| matches!(c, Call::Create { kind: "vertex_array", .. }))
            .count()
    }

    // ── VertexArray ─────────────────────────────────────────────────────

    #[test]
    fn array_binds_attribute_pointers() {
        let (h, gl) = setup();
        let array = VertexArray::new(gl, &quad_format(), 1, DrawMode::Triangles).unwrap();
        assert_eq!(array.capacity(), 4);
        assert_eq!(array.stride(), 16);
        assert_eq!(array.buffer().byte_len(), 64);

        let ptrs = h.attrib_pointers(array.id());
        assert_eq!(ptrs.len(), 2);
        assert_eq!((ptrs[0].index, ptrs[0].size, ptrs[0].offset), (0, 2, 0));
        assert_eq!((ptrs[1].index, ptrs[1].stride, ptrs[1].offset), (1, 16, 8));
        assert!(ptrs.iter().all(|p| p.enabled && p.buffer == array.buffer().id()));

        assert_eq!(h.bound(glow::VERTEX_ARRAY_BINDING), 0);
        assert_eq!(h.bound(glow::ARRAY_BUFFER_BINDING), 0);
        assert!(h.errors().is_empty());
    }

    #[test]
    fn array_rejects_non_float_attributes() {
        let (_h, gl) = setup();
        let format: AttrFormat = [Attr::new("m", AttrType::Mat4f, 0)].into_iter().collect();
        let err = VertexArray::new(gl, &format, 4, DrawMode::Triangles).unwrap_err();
        assert!(matches!(err, GlError::UnsupportedType { ty: AttrType::Mat4f, .. }));
    }

    // ── VertexSlice construction ────────────────────────────────────────

    #[test]
    fn len_above_cap_is_rejected() {
        let (_h, gl) = setup();
        let err = VertexSlice::new(gl, &quad_format(), 9, 8, DrawMode::Triangles).unwrap_err();
        assert_eq!(err, GlError::LenExceedsCap { len: 9, cap: 8 });
    }

    // ── growth ──────────────────────────────────────────────────────────

    #[test]
    fn growth_preserves_contents() {
        let (_h, gl) = setup();
        let mut s = VertexSlice::new(gl, &quad_format(), 6, 6, DrawMode::Triangles).unwrap();
        let data = ramp(6 * 4);
        s.set_vertex_data(&data).unwrap();
        assert_eq!((s.len(), s.cap()), (6, 6));

        s.set_len(10).unwrap();
        assert_eq!((s.len(), s.cap()), (10, 12));

        let after = s.vertex_data().unwrap();
        assert_eq!(&after[..data.len()], &data[..]);
        assert!(after[data.len()..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn growth_within_capacity_keeps_array() {
        let (h, gl) = setup();
        let mut s = VertexSlice::new(gl, &quad_format(), 0, 16, DrawMode::Triangles).unwrap();
        let before = s.clone();
        s.set_len(16).unwrap();
        assert!(s.shares_array_with(&before));
        assert_eq!(arrays_created(&h), 1);

        s.set_len(3).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.cap(), 16);
    }

    #[test]
    fn large_capacities_grow_by_a_quarter() {
        let (_h, gl) = setup();
        let mut s = VertexSlice::new(gl, &quad_format(), 2048, 2048, DrawMode::Points).unwrap();
        s.set_len(2049).unwrap();
        assert_eq!(s.cap(), 2560);
        // A jump past the policy is clamped up to the requested length.
        s.set_len(10_000).unwrap();
        assert_eq!(s.cap(), 10_000);
    }

    #[test]
    fn appending_one_by_one_reallocates_logarithmically() {
        let (h, gl) = setup();
        let mut s = VertexSlice::new(gl, &quad_format(), 0, 0, DrawMode::Triangles).unwrap();
        let n = 5000;
        for len in 1..=n {
            s.set_len(len).unwrap();
        }
        assert_eq!(s.len(), n);

        // 4 -> 1024 by doubling, then x1.25 up to 5000.
        let reallocs = arrays_created(&h) - 1;
        assert!(reallocs <= 16, "{reallocs} reallocations");
    }

    #[test]
    fn grown_slice_detaches_from_siblings() {
        let (_h, gl) = setup();
        let mut s = VertexSlice::new(gl, &quad_format(), 4, 4, DrawMode::Triangles).unwrap();
        let sibling = s.slice(0, 4);
        s.set_len(5).unwrap();
        assert!(!s.shares_array_with(&sibling));

        s.set_vertex_data(&vec![1.0; 5 * 4]).unwrap();
        assert!(sibling.vertex_data().unwrap().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn growing_offset_sub_slice_rebases_its_vertices() {
        let (_h, gl) = setup();
        let parent = VertexSlice::new(gl, &quad_format(), 6, 6, DrawMode::Triangles).unwrap();
        let data = ramp(6 * 4);
        parent.set_vertex_data(&data).unwrap();

        let mut child = parent.slice(2, 4);
        assert_eq!((child.len(), child.cap()), (2, 4));
        child.set_len(5).unwrap();
        assert_eq!((child.len(), child.cap()), (5, 8));
        assert!(!child.shares_array_with(&parent));

        let moved = child.vertex_data().unwrap();
        assert_eq!(&moved[..8], &data[8..16]);
        assert!(moved[8..].iter().all(|v| *v == 0.0));

        child.set_vertex_data(&[9.0; 5 * 4]).unwrap();
        assert_eq!(parent.vertex_data().unwrap(), data);
    }

    // ── slicing ─────────────────────────────────────────────────────────

    #[test]
    fn sub_slice_writes_are_visible_through_parent() {
        let (_h, gl) = setup();
        let parent = VertexSlice::new(gl, &quad_format(), 6, 6, DrawMode::Triangles).unwrap();
        let child = parent.slice(2, 4);
        assert_eq!(child.len(), 2);
        assert_eq!(child.cap(), 4);

        child.set_vertex_data(&[7.0; 8]).unwrap();

        let all = parent.vertex_data().unwrap();
        assert!(all[..8].iter().all(|v| *v == 0.0));
        assert!(all[8..16].iter().all(|v| *v == 7.0));
        assert!(all[16..].iter().all(|v| *v == 0.0));
    }

    #[test]
    #[should_panic(expected = "invalid range")]
    fn reversed_bounds_panic() {
        let (_h, gl) = setup();
        let s = VertexSlice::new(gl, &quad_format(), 4, 4, DrawMode::Triangles).unwrap();
        let _ = s.slice(3, 1);
    }

    #[test]
    #[should_panic(expected = "out of capacity")]
    fn bounds_past_capacity_panic() {
        let (_h, gl) = setup();
        let s = VertexSlice::new(gl, &quad_format(), 4, 4, DrawMode::Triangles).unwrap();
        let _ = s.slice(1, 3).slice(0, 4);
    }

    // ── data and draw ───────────────────────────────────────────────────

    #[test]
    fn vertex_data_length_must_match() {
        let (_h, gl) = setup();
        let s = VertexSlice::new(gl, &quad_format(), 3, 4, DrawMode::Triangles).unwrap();
        let err = s.set_vertex_data(&ramp(8)).unwrap_err();
        assert_eq!(
            err,
            GlError::ShapeMismatch { what: "vertex data", expected: 12, found: 8 }
        );
    }

    #[test]
    fn draw_covers_exactly_the_view() {
        let (h, gl) = setup();
        let s = VertexSlice::new(gl, &quad_format(), 8, 8, DrawMode::Triangles).unwrap();
        h.clear_calls();

        s.slice(2, 5).draw();
        s.slice(3, 3).draw();

        let draws: Vec<_> = h.calls().into_iter().filter(Call::is_draw).collect();
        assert_eq!(draws.len(), 1);
        assert!(matches!(
            draws[0],
            Call::DrawArrays { first: 2, count: 3, vertex_array, .. } if vertex_array == s.array().id()
        ));
    }
}
