use blit_gl::GlError;

use crate::math::Rect;

use super::sprite::Sprite;

/// Looping sequence of texture regions.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    frames: Vec<Rect>,
    current: usize,
    /// Seconds each frame stays up when driven by [`update`](Self::update).
    frame_time: f32,
    elapsed: f32,
}

impl Animation {
    pub fn new(frames: Vec<Rect>) -> Self {
        Self {
            frames,
            current: 0,
            frame_time: 0.1,
            elapsed: 0.0,
        }
    }

    pub fn with_frame_time(mut self, seconds: f32) -> Self {
        self.frame_time = seconds.max(f32::EPSILON);
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<Rect> {
        self.frames.get(self.current).copied()
    }

    /// Steps to the next frame, wrapping to the first after the last.
    pub fn advance(&mut self) -> usize {
        if !self.frames.is_empty() {
            self.current = (self.current + 1) % self.frames.len();
        }
        self.current
    }

    /// Advances by elapsed time; returns whether the frame changed.
    ///
    /// Non-finite or negative `dt` is ignored. Long gaps skip whole loops.
    pub fn update(&mut self, dt: f32) -> bool {
        if self.frames.len() < 2 || !dt.is_finite() || dt <= 0.0 {
            return false;
        }
        self.elapsed += dt;
        if self.elapsed < self.frame_time {
            return false;
        }

        let n = self.frames.len();
        let steps = (self.elapsed / self.frame_time).floor();
        self.elapsed = self.elapsed.rem_euclid(self.frame_time);

        let skip = (steps % n as f32) as usize;
        self.current = (self.current + skip) % n;
        skip != 0
    }

    pub fn reset(&mut self) {
        self.current = 0;
        self.elapsed = 0.0;
    }

    /// Points `sprite` at the current frame. Empty animations leave it alone.
    pub fn apply(&self, sprite: &mut Sprite) -> Result<(), GlError> {
        match self.current() {
            Some(rect) if rect != sprite.rect() => sprite.set_rect(rect),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use blit_gl::driver::Headless;
    use blit_gl::{Filter, GlContext, Program, Texture};

    use super::*;

    fn strip(n: usize) -> Vec<Rect> {
        (0..n).map(|i| Rect::new(i as f32 * 16.0, 0.0, 16.0, 16.0)).collect()
    }

    #[test]
    fn advance_wraps() {
        let mut a = Animation::new(strip(3));
        assert_eq!(a.advance(), 1);
        assert_eq!(a.advance(), 2);
        assert_eq!(a.advance(), 0);
        assert_eq!(a.current(), Some(Rect::new(0.0, 0.0, 16.0, 16.0)));
    }

    #[test]
    fn empty_animation_is_inert() {
        let mut a = Animation::new(Vec::new());
        assert_eq!(a.advance(), 0);
        assert!(!a.update(10.0));
        assert_eq!(a.current(), None);
    }

    #[test]
    fn update_steps_by_frame_time() {
        let mut a = Animation::new(strip(4)).with_frame_time(0.25);
        assert!(!a.update(0.2));
        assert!(a.update(0.1));
        assert_eq!(a.index(), 1);
        assert!(a.update(0.5));
        assert_eq!(a.index(), 3);

        a.reset();
        assert_eq!(a.index(), 0);
    }

    #[test]
    fn long_gap_wraps_whole_loops() {
        let mut a = Animation::new(strip(3)).with_frame_time(1.0);
        assert!(a.update(7.5));
        assert_eq!(a.index(), 1);
        assert!(a.update(0.5));
        assert_eq!(a.index(), 2);

        // Exactly one full loop lands on the same frame.
        assert!(!a.update(3.0));
        assert_eq!(a.index(), 2);
    }

    #[test]
    fn non_finite_dt_is_ignored() {
        let mut a = Animation::new(strip(3)).with_frame_time(0.5);
        assert!(!a.update(f32::INFINITY));
        assert!(!a.update(f32::NAN));
        assert!(!a.update(-1.0));
        assert_eq!(a.index(), 0);

        assert!(a.update(0.5));
        assert_eq!(a.index(), 1);
    }

    #[test]
    fn huge_dt_with_tiny_frame_time_returns() {
        let mut a = Animation::new(strip(3)).with_frame_time(0.0);
        a.update(1.0e6);
        assert!(a.index() < 3);
        assert!(a.current().is_some());
    }

    #[test]
    fn apply_sets_sprite_rect() {
        let h = Rc::new(Headless::new());
        let gl: GlContext = h.clone();
        let program = Rc::new(Program::default_program(gl.clone()).unwrap());
        let texture = Rc::new(Texture::new(gl, 64, 16, Filter::Nearest, None).unwrap());
        let mut sprite = Sprite::new(program, texture, Rect::new(0.0, 0.0, 16.0, 16.0)).unwrap();

        let mut a = Animation::new(strip(4));
        a.advance();
        a.apply(&mut sprite).unwrap();
        assert_eq!(sprite.rect(), Rect::new(16.0, 0.0, 16.0, 16.0));
    }
}
