use blit_gl::{GlError, Program};

use crate::math::{Mat4, Rect, Vec3};

use super::orienter::Orienter;

const NEAR: f32 = 0.1;
const FAR: f32 = 100.0;
const MIN_FOV: f32 = 1.0;
const MAX_FOV: f32 = 170.0;

/// Perspective camera that always looks straight down -Z.
///
/// Rotation on the orienter is ignored: the view targets the point below the
/// camera on the `z = 0` plane, with +Y up.
#[derive(Debug, Clone)]
pub struct Camera {
    orienter: Orienter,
    fov: f32,
    viewport: Rect,
}

impl Camera {
    /// Camera at `(0, 0, 1)` with a vertical field of view in degrees.
    pub fn new(fov: f32, viewport: Rect) -> Self {
        Self {
            orienter: Orienter::at(Vec3::new(0.0, 0.0, 1.0)),
            fov: fov.clamp(MIN_FOV, MAX_FOV),
            viewport,
        }
    }

    pub fn orienter(&self) -> &Orienter {
        &self.orienter
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov.clamp(MIN_FOV, MAX_FOV);
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    pub fn view(&self) -> Mat4 {
        let eye = self.orienter.pos();
        Mat4::look_at(eye, Vec3::new(eye.x, eye.y, 0.0), Vec3::Y)
    }

    pub fn proj(&self, aspect: f32) -> Mat4 {
        Mat4::perspective(self.fov, aspect, NEAR, FAR)
    }

    /// Uploads `view` and `proj` (at the viewport's aspect) to `program`.
    pub fn apply(&self, program: &Program) -> Result<(), GlError> {
        program.set_uniform("view", self.view())?;
        program.set_uniform("proj", self.proj(self.viewport.aspect()))
    }

    /// Moves the camera in the view plane.
    pub fn pan(&self, dx: f32, dy: f32) {
        self.orienter.translate(Vec3::new(dx, dy, 0.0));
    }

    /// Narrows the field of view by `delta` degrees; negative widens it.
    pub fn zoom(&mut self, delta: f32) {
        self.set_fov(self.fov - delta);
    }
}
