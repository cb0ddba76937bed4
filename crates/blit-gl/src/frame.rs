//! Off-screen render targets.

use crate::binder::{BindGuard, Binder, Binding};
use crate::driver::GlContext;
use crate::error::GlError;
use crate::texture::{Filter, Region, Texture};

/// Framebuffer with an owned color texture.
///
/// Blits bind the read and draw slots separately, so a frame carries three
/// binders: the combined slot for rendering into it and one each for the
/// read/draw sides of a copy.
pub struct Frame {
    gl: GlContext,
    fb: Binder,
    rf: Binder,
    df: Binder,
    texture: Texture,
}

impl Frame {
    /// Creates a fully transparent `width x height` frame.
    pub fn new(gl: GlContext, width: usize, height: usize, filter: Filter) -> Result<Self, GlError> {
        let texture = Texture::new(gl.clone(), width, height, filter, None)?;
        let id = gl.create_framebuffer()?;

        let fb = Binder::new(gl.clone(), Binding::Framebuffer, id);
        {
            let _bound = fb.scope();
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                texture.id(),
            );
        }

        Ok(Self {
            rf: Binder::new(gl.clone(), Binding::ReadFramebuffer, id),
            df: Binder::new(gl.clone(), Binding::DrawFramebuffer, 0),
            gl,
            fb,
            texture,
        })
    }

    pub fn id(&self) -> u32 {
        self.fb.id()
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn width(&self) -> usize {
        self.texture.width()
    }

    pub fn height(&self) -> usize {
        self.texture.height()
    }

    /// Directs drawing into this frame until the guard drops.
    pub fn begin(&self) -> BindGuard<'_> {
        self.fb.scope()
    }

    /// Copies `src` of this frame into `dst_region` of `dst`, or of the window
    /// surface when `dst` is `None`.
    ///
    /// Mismatched sizes stretch, resampled with the destination frame's
    /// filter (this frame's when targeting the surface).
    pub fn blit(&self, dst: Option<&Frame>, src: Region, dst_region: Region) {
        let (target, filter) = match dst {
            Some(f) => (f.id(), f.texture.filter()),
            None => (0, self.texture.filter()),
        };
        self.df.set_id(target);

        let _read = self.rf.scope();
        let _draw = self.df.scope();
        self.gl.blit_framebuffer(
            src.corners(),
            dst_region.corners(),
            glow::COLOR_BUFFER_BIT,
            filter.gl(),
        );
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        self.gl.delete_framebuffer(self.fb.id());
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("id", &self.id())
            .field("texture", &self.texture)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::driver::Headless;

    fn setup() -> (Rc<Headless>, GlContext) {
        let h = Rc::new(Headless::with_surface(8, 8));
        let gl: GlContext = h.clone();
        (h, gl)
    }

    fn fill(frame: &Frame, px: [u8; 4]) {
        let data: Vec<u8> = std::iter::repeat_n(px, frame.width() * frame.height())
            .flatten()
            .collect();
        frame
            .texture()
            .set_pixels(Region::full(frame.width(), frame.height()), &data)
            .unwrap();
    }

    #[test]
    fn new_frame_attaches_its_texture() {
        let (h, gl) = setup();
        let frame = Frame::new(gl, 4, 4, Filter::Nearest).unwrap();
        assert_eq!(h.framebuffer_attachment(frame.id()), Some(frame.texture().id()));
        assert_eq!(h.bound(glow::FRAMEBUFFER_BINDING), 0);
    }

    #[test]
    fn begin_targets_frame_until_dropped() {
        let (h, gl) = setup();
        let frame = Frame::new(gl.clone(), 2, 2, Filter::Nearest).unwrap();
        {
            let _target = frame.begin();
            assert_eq!(h.bound(glow::DRAW_FRAMEBUFFER_BINDING), frame.id());
            gl.clear_color(1.0, 0.0, 0.0, 1.0);
            gl.clear(glow::COLOR_BUFFER_BIT);
        }
        assert_eq!(h.bound(glow::DRAW_FRAMEBUFFER_BINDING), 0);
        assert_eq!(
            frame.texture().pixels(Region::new(1, 1, 1, 1)).unwrap(),
            vec![255, 0, 0, 255]
        );
    }

    #[test]
    fn blit_stretches_into_destination() {
        let (h, gl) = setup();
        let src = Frame::new(gl.clone(), 2, 2, Filter::Nearest).unwrap();
        let dst = Frame::new(gl, 4, 4, Filter::Nearest).unwrap();
        fill(&src, [0, 255, 0, 255]);

        src.blit(Some(&dst), Region::full(2, 2), Region::full(4, 4));

        let out = dst.texture().pixels(Region::full(4, 4)).unwrap();
        assert!(out.chunks(4).all(|px| px == [0, 255, 0, 255]));
        assert_eq!(h.bound(glow::READ_FRAMEBUFFER_BINDING), 0);
        assert_eq!(h.bound(glow::DRAW_FRAMEBUFFER_BINDING), 0);
    }

    #[test]
    fn blit_to_surface_restores_nested_binding() {
        let (h, gl) = setup();
        let a = Frame::new(gl.clone(), 2, 2, Filter::Linear).unwrap();
        let b = Frame::new(gl, 2, 2, Filter::Nearest).unwrap();
        fill(&a, [7, 7, 7, 255]);

        let _outer = b.begin();
        a.blit(None, Region::full(2, 2), Region::new(0, 0, 2, 2));

        assert_eq!(h.bound(glow::DRAW_FRAMEBUFFER_BINDING), b.id());
        assert_eq!(h.bound(glow::READ_FRAMEBUFFER_BINDING), b.id());
        assert_eq!(&h.surface_pixels()[..4], &[7, 7, 7, 255]);
    }
}
