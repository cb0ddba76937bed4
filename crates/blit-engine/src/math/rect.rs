use super::vec::Vec2;

/// Axis-aligned rectangle `{x, y, w, h}`.
///
/// Used both for viewports (window pixels) and for sprite regions in texture
/// pixels, where the origin is the top-left of the image.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        Vec2::new(self.x + self.w, self.y + self.h)
    }

    #[inline]
    pub fn size(self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }

    #[inline]
    pub fn area(self) -> f32 {
        self.w * self.h
    }

    /// Width over height; `1.0` for a degenerate rectangle.
    #[inline]
    pub fn aspect(self) -> f32 {
        if self.w <= 0.0 || self.h <= 0.0 {
            1.0
        } else {
            self.w / self.h
        }
    }

    /// Half-open containment: `[min, max)`.
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        p.x >= self.x && p.y >= self.y && p.x < self.x + self.w && p.y < self.y + self.h
    }
}

impl From<[f32; 4]> for Rect {
    fn from([x, y, w, h]: [f32; 4]) -> Self {
        Rect::new(x, y, w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extents() {
        let r = Rect::new(1.0, 2.0, 10.0, 20.0);
        assert_eq!(r.min(), Vec2::new(1.0, 2.0));
        assert_eq!(r.max(), Vec2::new(11.0, 22.0));
        assert_eq!(r.area(), 200.0);
        assert_eq!(r.aspect(), 0.5);
        assert_eq!(Rect::default().aspect(), 1.0);
    }

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Vec2::new(0.0, 0.0)));
        assert!(r.contains(Vec2::new(9.9, 5.0)));
        assert!(!r.contains(Vec2::new(10.0, 10.0)));
        assert!(!r.contains(Vec2::new(-1.0, 5.0)));
    }
}
