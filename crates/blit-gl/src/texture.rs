//! RGBA8 2D textures.

use std::cell::Cell;

use crate::binder::{BindGuard, Binder, Binding};
use crate::driver::GlContext;
use crate::error::GlError;

/// Sampling filter used for both minification and magnification.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Filter {
    /// Pixel-exact.
    #[default]
    Nearest,
    /// Bilinear.
    Linear,
}

impl Filter {
    pub const fn gl(self) -> u32 {
        match self {
            Filter::Nearest => glow::NEAREST,
            Filter::Linear => glow::LINEAR,
        }
    }
}

/// Axis-aligned pixel rectangle.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Region {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Region {
    pub const fn new(x: usize, y: usize, w: usize, h: usize) -> Self {
        Self { x, y, w, h }
    }

    /// Region covering a whole `w x h` image.
    pub const fn full(w: usize, h: usize) -> Self {
        Self::new(0, 0, w, h)
    }

    pub const fn byte_len(&self) -> usize {
        self.w * self.h * 4
    }

    /// `[x0, y0, x1, y1]` corners as passed to framebuffer blits.
    pub const fn corners(&self) -> [i32; 4] {
        [
            self.x as i32,
            self.y as i32,
            (self.x + self.w) as i32,
            (self.y + self.h) as i32,
        ]
    }

    fn fits(&self, width: usize, height: usize) -> bool {
        self.x + self.w <= width && self.y + self.h <= height
    }
}

/// Fixed-size RGBA8 texture.
///
/// Addressing clamps to a transparent border, so sampling outside `[0, 1]`
/// yields transparent black.
pub struct Texture {
    gl: GlContext,
    binder: Binder,
    width: usize,
    height: usize,
    filter: Cell<Filter>,
}

impl Texture {
    /// Creates a `width x height` texture.
    ///
    /// `pixels` must hold exactly `width * height * 4` bytes; `None` starts
    /// fully transparent.
    pub fn new(
        gl: GlContext,
        width: usize,
        height: usize,
        filter: Filter,
        pixels: Option<&[u8]>,
    ) -> Result<Self, GlError> {
        let expected = width * height * 4;
        let zeroes;
        let pixels = match pixels {
            Some(px) if px.len() != expected => {
                return Err(GlError::ShapeMismatch {
                    what: "texture pixels",
                    expected,
                    found: px.len(),
                });
            }
            Some(px) => px,
            None => {
                zeroes = vec![0u8; expected];
                &zeroes
            }
        };

        let id = gl.create_texture()?;
        let tex = Self {
            binder: Binder::new(gl.clone(), Binding::Texture2D, id),
            gl,
            width,
            height,
            filter: Cell::new(filter),
        };

        {
            let _bound = tex.binder.scope();
            let gl = &tex.gl;
            gl.tex_image_2d(glow::TEXTURE_2D, width as i32, height as i32, Some(pixels));
            gl.tex_parameter_f32_slice(glow::TEXTURE_2D, glow::TEXTURE_BORDER_COLOR, &[0.0; 4]);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_BORDER as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_BORDER as i32);
            tex.apply_filter();
        }

        Ok(tex)
    }

    pub fn id(&self) -> u32 {
        self.binder.id()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn filter(&self) -> Filter {
        self.filter.get()
    }

    pub fn set_filter(&self, filter: Filter) {
        self.filter.set(filter);
        let _bound = self.binder.scope();
        self.apply_filter();
    }

    fn apply_filter(&self) {
        let f = self.filter.get().gl() as i32;
        self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, f);
        self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, f);
    }

    /// Converts a pixel position to texture coordinates.
    pub fn uv(&self, x: f32, y: f32) -> [f32; 2] {
        [x / self.width as f32, y / self.height as f32]
    }

    /// Binds the texture until the guard drops.
    pub fn bind(&self) -> BindGuard<'_> {
        self.binder.scope()
    }

    /// Overwrites `region` with RGBA bytes.
    ///
    /// Fails without touching the texture if `pixels` is not exactly
    /// `region.w * region.h * 4` bytes or the region leaves the texture.
    pub fn set_pixels(&self, region: Region, pixels: &[u8]) -> Result<(), GlError> {
        if pixels.len() != region.byte_len() {
            return Err(GlError::ShapeMismatch {
                what: "texture pixels",
                expected: region.byte_len(),
                found: pixels.len(),
            });
        }
        if !region.fits(self.width, self.height) {
            return Err(GlError::OutOfBounds { what: "texture" });
        }
        if pixels.is_empty() {
            return Ok(());
        }

        let _bound = self.binder.scope();
        self.gl.tex_sub_image_2d(
            glow::TEXTURE_2D,
            region.x as i32,
            region.y as i32,
            region.w as i32,
            region.h as i32,
            pixels,
        );
        Ok(())
    }

    /// Reads `region` back as RGBA bytes, row by row.
    pub fn pixels(&self, region: Region) -> Result<Vec<u8>, GlError> {
        if !region.fits(self.width, self.height) {
            return Err(GlError::OutOfBounds { what: "texture" });
        }

        let mut all = vec![0u8; self.width * self.height * 4];
        {
            let _bound = self.binder.scope();
            self.gl.get_tex_image(glow::TEXTURE_2D, &mut all);
        }

        let row = region.w * 4;
        let mut out = Vec::with_capacity(region.byte_len());
        for y in region.y..region.y + region.h {
            let start = (y * self.width + region.x) * 4;
            out.extend_from_slice(&all[start..start + row]);
        }
        Ok(out)
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.gl.delete_texture(self.binder.id());
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id())
            .field("size", &(self.width, self.height))
            .field("filter", &self.filter())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::driver::Headless;

    fn setup() -> (Rc<Headless>, GlContext) {
        let h = Rc::new(Headless::new());
        let gl: GlContext = h.clone();
        (h, gl)
    }

    fn checker(w: usize, h: usize) -> Vec<u8> {
        (0..w * h).flat_map(|i| [i as u8, 0, 0, 255]).collect()
    }

    #[test]
    fn creation_sets_border_and_filter() {
        let (h, gl) = setup();
        let tex = Texture::new(gl, 4, 2, Filter::Linear, None).unwrap();

        assert_eq!(
            h.texture_param(tex.id(), glow::TEXTURE_WRAP_S),
            Some(glow::CLAMP_TO_BORDER as i32)
        );
        assert_eq!(
            h.texture_param(tex.id(), glow::TEXTURE_MAG_FILTER),
            Some(glow::LINEAR as i32)
        );
        assert_eq!(h.texture_border(tex.id()), Some([0.0; 4]));
        assert_eq!(h.texture_pixels(tex.id()), Some(vec![0; 32]));
        assert_eq!(h.bound(glow::TEXTURE_BINDING_2D), 0);

        tex.set_filter(Filter::Nearest);
        assert_eq!(
            h.texture_param(tex.id(), glow::TEXTURE_MIN_FILTER),
            Some(glow::NEAREST as i32)
        );
    }

    #[test]
    fn wrong_initial_size_is_rejected() {
        let (h, gl) = setup();
        let err = Texture::new(gl, 2, 2, Filter::Nearest, Some(&[0; 15])).unwrap_err();
        assert!(matches!(err, GlError::ShapeMismatch { expected: 16, found: 15, .. }));
        assert_eq!(h.live_objects(), 0);
    }

    #[test]
    fn sub_region_round_trip() {
        let (_h, gl) = setup();
        let tex = Texture::new(gl, 4, 4, Filter::Nearest, Some(&checker(4, 4))).unwrap();

        let patch = vec![9u8; 2 * 2 * 4];
        tex.set_pixels(Region::new(1, 2, 2, 2), &patch).unwrap();

        assert_eq!(tex.pixels(Region::new(1, 2, 2, 2)).unwrap(), patch);
        // Untouched neighbour keeps its original value.
        assert_eq!(tex.pixels(Region::new(0, 2, 1, 1)).unwrap(), vec![8, 0, 0, 255]);
    }

    #[test]
    fn set_pixels_size_mismatch_leaves_texture_unchanged() {
        let (h, gl) = setup();
        let original = checker(3, 3);
        let tex = Texture::new(gl, 3, 3, Filter::Nearest, Some(&original)).unwrap();

        let err = tex.set_pixels(Region::full(3, 3), &[1; 35]).unwrap_err();
        assert!(matches!(err, GlError::ShapeMismatch { expected: 36, found: 35, .. }));
        assert!(tex.set_pixels(Region::new(2, 2, 2, 2), &[1; 16]).is_err());

        assert_eq!(h.texture_pixels(tex.id()), Some(original));
    }

    #[test]
    fn uv_normalizes_by_size() {
        let (_h, gl) = setup();
        let tex = Texture::new(gl, 64, 32, Filter::Nearest, None).unwrap();
        assert_eq!(tex.uv(16.0, 16.0), [0.25, 0.5]);
    }
}
