use std::rc::Rc;

use bytemuck::{Pod, Zeroable};

use blit_gl::{DrawMode, GlError, Program, Texture, VertexSlice};

use crate::math::{Color, Mat4, Rect};

use super::orienter::Orienter;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct QuadVertex {
    x: f32,
    y: f32,
    u: f32,
    v: f32,
}

const QUAD_VERTICES: usize = 6;

/// Textured unit quad centered on its orienter.
///
/// The program and texture are shared; the sprite owns only its vertices.
/// `rect` selects the texture region in pixels, origin top-left.
pub struct Sprite {
    orienter: Orienter,
    program: Rc<Program>,
    texture: Rc<Texture>,
    slice: VertexSlice,
    rect: Rect,
    /// Multiplied into every sampled texel.
    pub mask: Color,
    pub visible: bool,
}

impl Sprite {
    pub fn new(program: Rc<Program>, texture: Rc<Texture>, rect: Rect) -> Result<Self, GlError> {
        let slice = VertexSlice::from_program(&program, QUAD_VERTICES, QUAD_VERTICES, DrawMode::Triangles)?;
        let sprite = Self {
            orienter: Orienter::new(),
            program,
            texture,
            slice,
            rect,
            mask: Color::WHITE,
            visible: true,
        };
        sprite.write_quad()?;
        Ok(sprite)
    }

    pub fn orienter(&self) -> &Orienter {
        &self.orienter
    }

    pub fn program(&self) -> &Rc<Program> {
        &self.program
    }

    pub fn texture(&self) -> &Rc<Texture> {
        &self.texture
    }

    pub fn slice(&self) -> &VertexSlice {
        &self.slice
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Points the quad at another texture region.
    pub fn set_rect(&mut self, rect: Rect) -> Result<(), GlError> {
        self.rect = rect;
        self.write_quad()
    }

    pub fn mat(&self) -> Mat4 {
        self.orienter.mat()
    }

    /// Two triangles: TL, BL, BR and TR, TL, BR.
    fn quad(&self) -> [QuadVertex; QUAD_VERTICES] {
        let Rect { x, y, w, h } = self.rect;
        let vertex = |qx: f32, qy: f32, px: f32, py: f32| {
            let [u, v] = self.texture.uv(px, py);
            QuadVertex { x: qx, y: qy, u, v }
        };

        let tl = vertex(-0.5, 0.5, x, y);
        let bl = vertex(-0.5, -0.5, x, y + h);
        let br = vertex(0.5, -0.5, x + w, y + h);
        let tr = vertex(0.5, 0.5, x + w, y);
        [tl, bl, br, tr, tl, br]
    }

    fn write_quad(&self) -> Result<(), GlError> {
        let quad = self.quad();
        self.slice.set_vertex_data(bytemuck::cast_slice(&quad))
    }

    /// Draws the sprite with its mask and model matrix.
    ///
    /// Invisible sprites return immediately without touching the driver.
    pub fn draw(&self) -> Result<(), GlError> {
        if !self.visible {
            return Ok(());
        }

        let _program = self.program.bind();
        self.program.set_uniform("color", self.mask)?;
        self.program.set_uniform("modl", self.mat())?;

        let _texture = self.texture.bind();
        let _vertices = self.slice.bind();
        let _buffer = self.slice.array().buffer().bind();
        self.slice.draw();
        Ok(())
    }
}

impl std::fmt::Debug for Sprite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sprite")
            .field("orienter", &self.orienter)
            .field("rect", &self.rect)
            .field("mask", &self.mask)
            .field("visible", &self.visible)
            .finish()
    }
}
