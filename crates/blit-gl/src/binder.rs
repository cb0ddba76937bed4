//! Save/restore binding stacks.
//!
//! GL has one "currently bound" slot per object kind. A [`Binder`] remembers
//! what occupied that slot before it bound its own object and puts it back on
//! restore, so operations can nest freely:
//!
//! ```text
//! a.bind()      stack [0]      bound a
//!   b.bind()    stack [a]      bound b
//!   b.restore() stack []       bound a
//! a.restore()   stack []       bound 0
//! ```
//!
//! Prefer [`Binder::scope`], which restores when the guard drops.

use std::cell::{Cell, RefCell};

use crate::driver::{Driver, GlContext};
use crate::error::GlError;

/// Binding slot kinds.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Binding {
    ArrayBuffer,
    ElementArrayBuffer,
    VertexArray,
    Program,
    Texture2D,
    /// Both read and draw framebuffer slots. Queried through the draw slot.
    Framebuffer,
    ReadFramebuffer,
    DrawFramebuffer,
}

impl Binding {
    /// `glGetIntegerv` token reporting the bound id.
    pub const fn query(self) -> u32 {
        match self {
            Binding::ArrayBuffer => glow::ARRAY_BUFFER_BINDING,
            Binding::ElementArrayBuffer => glow::ELEMENT_ARRAY_BUFFER_BINDING,
            Binding::VertexArray => glow::VERTEX_ARRAY_BINDING,
            Binding::Program => glow::CURRENT_PROGRAM,
            Binding::Texture2D => glow::TEXTURE_BINDING_2D,
            Binding::Framebuffer => glow::FRAMEBUFFER_BINDING,
            Binding::ReadFramebuffer => glow::READ_FRAMEBUFFER_BINDING,
            Binding::DrawFramebuffer => glow::DRAW_FRAMEBUFFER_BINDING,
        }
    }

    pub fn bind(self, gl: &dyn Driver, id: u32) {
        match self {
            Binding::ArrayBuffer => gl.bind_buffer(glow::ARRAY_BUFFER, id),
            Binding::ElementArrayBuffer => gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, id),
            Binding::VertexArray => gl.bind_vertex_array(id),
            Binding::Program => gl.use_program(id),
            Binding::Texture2D => gl.bind_texture(glow::TEXTURE_2D, id),
            Binding::Framebuffer => gl.bind_framebuffer(glow::FRAMEBUFFER, id),
            Binding::ReadFramebuffer => gl.bind_framebuffer(glow::READ_FRAMEBUFFER, id),
            Binding::DrawFramebuffer => gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, id),
        }
    }

    pub fn current(self, gl: &dyn Driver) -> u32 {
        gl.get_integer(self.query()) as u32
    }
}

/// Binding stack for one object of one kind.
pub struct Binder {
    gl: GlContext,
    kind: Binding,
    id: Cell<u32>,
    prev: RefCell<Vec<u32>>,
}

impl Binder {
    pub fn new(gl: GlContext, kind: Binding, id: u32) -> Self {
        Self {
            gl,
            kind,
            id: Cell::new(id),
            prev: RefCell::new(Vec::new()),
        }
    }

    pub fn kind(&self) -> Binding {
        self.kind
    }

    /// Id this binder binds.
    pub fn id(&self) -> u32 {
        self.id.get()
    }

    /// Retargets the binder. Only valid while no bind is outstanding.
    pub fn set_id(&self, id: u32) {
        debug_assert_eq!(self.depth(), 0, "retargeting a binder with outstanding binds");
        self.id.set(id);
    }

    /// Number of outstanding binds.
    pub fn depth(&self) -> usize {
        self.prev.borrow().len()
    }

    /// Records the current binding and binds this binder's id if it differs.
    pub fn bind(&self) {
        let current = self.kind.current(&*self.gl);
        self.prev.borrow_mut().push(current);
        if current != self.id.get() {
            self.kind.bind(&*self.gl, self.id.get());
        }
    }

    /// Rebinds whatever was bound before the matching [`bind`](Self::bind).
    pub fn restore(&self) -> Result<(), GlError> {
        let prev = self
            .prev
            .borrow_mut()
            .pop()
            .ok_or(GlError::UnbalancedRestore(self.kind))?;
        if prev != self.id.get() {
            self.kind.bind(&*self.gl, prev);
        }
        Ok(())
    }

    /// Binds and returns a guard that restores on drop.
    pub fn scope(&self) -> BindGuard<'_> {
        self.bind();
        BindGuard { binder: self }
    }
}

impl std::fmt::Debug for Binder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("kind", &self.kind)
            .field("id", &self.id.get())
            .field("depth", &self.depth())
            .finish()
    }
}

/// Restores its binder when dropped.
#[must_use = "the binding is restored as soon as the guard is dropped"]
pub struct BindGuard<'a> {
    binder: &'a Binder,
}

impl BindGuard<'_> {
    pub fn binder(&self) -> &Binder {
        self.binder
    }
}

impl Drop for BindGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.binder.restore() {
            log::error!("{e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::driver::{Call, Headless};

    fn setup() -> (Rc<Headless>, GlContext) {
        let headless = Rc::new(Headless::new());
        let gl: GlContext = headless.clone();
        (headless, gl)
    }

    fn bound(h: &Headless) -> u32 {
        h.bound(glow::ARRAY_BUFFER_BINDING)
    }

    fn nest(binders: &[Binder], depth: usize) {
        for i in 0..depth {
            binders[i % binders.len()].bind();
        }
        for i in (0..depth).rev() {
            binders[i % binders.len()].restore().unwrap();
        }
    }

    // ── round trip ──────────────────────────────────────────────────────

    #[test]
    fn nested_binds_restore_original_binding() {
        for depth in [1, 2, 5] {
            let (h, gl) = setup();
            gl.bind_buffer(glow::ARRAY_BUFFER, 42);

            let binders: Vec<_> = (1..=3)
                .map(|id| Binder::new(gl.clone(), Binding::ArrayBuffer, id))
                .collect();
            nest(&binders, depth);

            assert_eq!(bound(&h), 42, "depth {depth}");
            assert!(binders.iter().all(|b| b.depth() == 0));
        }
    }

    #[test]
    fn same_binder_nests() {
        let (h, gl) = setup();
        let b = Binder::new(gl.clone(), Binding::ArrayBuffer, 9);
        nest(std::slice::from_ref(&b), 5);
        assert_eq!(bound(&h), 0);
    }

    #[test]
    fn guard_restores_on_drop() {
        let (h, gl) = setup();
        let a = Binder::new(gl.clone(), Binding::Texture2D, 3);
        let b = Binder::new(gl.clone(), Binding::Texture2D, 4);
        {
            let _ga = a.scope();
            assert_eq!(h.bound(glow::TEXTURE_BINDING_2D), 3);
            {
                let _gb = b.scope();
                assert_eq!(h.bound(glow::TEXTURE_BINDING_2D), 4);
            }
            assert_eq!(h.bound(glow::TEXTURE_BINDING_2D), 3);
        }
        assert_eq!(h.bound(glow::TEXTURE_BINDING_2D), 0);
    }

    // ── redundant calls ─────────────────────────────────────────────────

    #[test]
    fn rebinding_the_bound_id_issues_no_bind() {
        let (h, gl) = setup();
        gl.use_program(5);
        h.clear_calls();

        let b = Binder::new(gl.clone(), Binding::Program, 5);
        b.bind();
        b.restore().unwrap();

        assert!(!h.calls().iter().any(|c| matches!(c, Call::Bind { .. })));
    }

    // ── misuse ──────────────────────────────────────────────────────────

    #[test]
    fn restore_without_bind_is_detected() {
        let (_h, gl) = setup();
        let b = Binder::new(gl, Binding::VertexArray, 1);
        assert_eq!(b.restore(), Err(GlError::UnbalancedRestore(Binding::VertexArray)));
    }
}
